//! Prompt construction, the generation call and answer parsing

pub mod parser;
pub mod prompt;
pub mod requester;

pub use parser::ResponseParser;
pub use prompt::{DocumentReference, Prompt, PromptBuilder};
pub use requester::AnswerRequester;
