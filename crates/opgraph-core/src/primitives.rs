//! # Engine Limits
//!
//! Hardcoded runtime constants for the opgraph engine.
//!
//! These limits are compiled into the binary and are immutable at runtime.
//! They bound registration input so that a malformed or hostile caller
//! cannot exhaust memory through the editing surface.

/// Magic bytes for the opgraph binary snapshot header.
///
/// - File header = magic bytes ("OPGR") + version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"OPGR";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// REGISTRATION VALIDATION LIMITS
// =============================================================================

/// Maximum length for operation name strings.
///
/// Registrations with longer names are rejected.
pub const MAX_OP_NAME_LENGTH: usize = 256;

/// Maximum length for device placement strings.
///
/// Enforced at registration time; later placement writes are unconditional.
pub const MAX_DEVICE_LENGTH: usize = 256;

/// Maximum number of input or output ports on a single operation.
///
/// Bounds the per-op shape bookkeeping allocated at registration time.
pub const MAX_PORTS_PER_OP: usize = 1024;

/// Maximum rank of a known shape.
///
/// Shapes with more dimensions are rejected at registration time.
pub const MAX_SHAPE_RANK: usize = 255;
