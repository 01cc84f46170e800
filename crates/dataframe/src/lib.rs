//! Self-describing hierarchical binary frames.
//!
//! A frame is an ordered multimap of named or unnamed fields whose values
//! carry their own type codes, so any reader can walk a document without a
//! schema.
//!
//! # Crate Structure
//!
//! - [`frame`]: frames, fields, codecs, the wire format and path selectors
//! - [`json`]: JSON text parsing and rendering (behind the `json` feature)

/// Re-export core types.
pub mod frame {
    pub use dataframe_core::*;
}

/// Re-export JSON front-end types (requires `json` feature).
#[cfg(feature = "json")]
pub mod json {
    pub use dataframe_json::*;
}
