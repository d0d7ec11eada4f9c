//! Observability for the publisher: structured logging and span macros

pub mod logging;

pub use logging::{init_logging, LogFormat, LogSettings};

// Span macros for structured logging
pub use logging::{mqtt_span, publish_span};
