pub mod groq;
pub mod model;

pub use groq::GroqClient;
pub use model::{LanguageModel, Message, MessageRole, ModelConfig};
