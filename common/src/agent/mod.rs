pub mod generator;
pub mod parser;
pub mod prompt;

pub use generator::SqlGenerator;
pub use parser::strip_code_fences;
pub use prompt::{compose, PromptPayload, SQL_CONVENTIONS};
