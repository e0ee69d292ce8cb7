mod canned_provider;
mod openai_provider;

pub use canned_provider::CannedProvider;
pub use openai_provider::OpenAiProvider;
