//! Core helpers shared by the gapi crates: tracing setup and
//! date/timestamp normalization for tool inputs.

pub mod time;
pub mod tracing;

pub use self::time::{EventTime, TimeError, expand_timestamp, is_date_only};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
