mod format;

pub use format::{BatchLogEvent, StructuredLogger};
