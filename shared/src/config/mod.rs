//! Configuration structures shared by the server and the CLI.

pub mod retention;

pub use retention::{DataType, RetentionConfig, RetentionConfigError};
