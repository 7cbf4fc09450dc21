//! Core types shared across Bindery facilities
//!
//! - **Correlation types**: SessionId, used to tie log events to one unit of work
//! - **Sensitive data**: Sensitive<T> and connection URI masking
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::SessionId;
pub use sensitive::{mask_uri, Sensitive};
