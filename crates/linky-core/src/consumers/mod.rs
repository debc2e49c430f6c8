//! Built-in consumers.

mod jsonl;
mod log;

pub use jsonl::{JsonLinesConsumer, JsonLinesOptions};
pub use log::{LogConsumer, LogOptions};
