//! # Formats
//!
//! Serialization formats for opgraph state. Pure byte transformations;
//! file I/O lives in the app layer.

pub mod persistence;

pub use persistence::{
    PersistenceHeader, editor_from_bytes, editor_to_bytes, MAX_PERSISTENCE_PAYLOAD_SIZE,
};
