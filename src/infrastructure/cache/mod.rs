mod memory_kv_store;

pub use memory_kv_store::MemoryKeyValueStore;
