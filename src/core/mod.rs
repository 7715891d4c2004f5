pub mod assembler;
pub mod dictionary;
pub mod extractor;
pub mod processor;
pub mod resolver;
pub mod units;

pub use crate::domain::model::{Component, Message, MessageKind, ProcessingResult};
pub use crate::domain::ports::AbbreviationLookup;
pub use crate::utils::error::Result;
