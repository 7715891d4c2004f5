pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::AppConfig;
pub use core::assembler::{ShortNameAssembler, MAX_SHORT_NAME_LENGTH};
pub use core::dictionary::AbbreviationDictionary;
pub use core::processor::ShortNameProcessor;
pub use domain::model::{Component, Message, MessageKind, ProcessingResult};
pub use utils::error::{Result, ShortNameError};
