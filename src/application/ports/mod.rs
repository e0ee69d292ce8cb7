mod content_provider;
mod job_store;
mod key_value_store;

pub use content_provider::{ContentProvider, ContentProviderError};
pub use job_store::{JobStore, StoreError};
pub use key_value_store::{KeyValueStore, KeyValueStoreError};
