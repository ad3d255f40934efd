//! Request/response transformations for the tool-name prefixing proxy.
//!
//! This module provides:
//! - `tool_names`: oc_ prefix handling and the model activation check
//! - `request`: Prepare an inbound body for the upstream
//! - `decoder`: Incremental UTF-8 decoding of byte streams
//! - `streaming`: Response body stream transformation

pub mod decoder;
pub mod request;
pub mod streaming;
pub mod tool_names;

// Re-export commonly used items
pub use request::prepare_request;
pub use streaming::stream_strip_oc_prefix;
