//! Utility modules for sql_assistant.
//!
//! # Available Utilities
//!
//! - [`values`] - Rendering of column values, field-value mappings and model identities

pub mod values;

pub use values::{describe_active_model, primary_key_values, render_identity, render_value};
