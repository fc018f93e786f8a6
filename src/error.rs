//! Stable error codes shared by every module error type.
//!
//! Each module owns its own `thiserror` enum; this trait gives the host a
//! machine-readable code for any of them without matching on variants.

/// Map an error to a stable, machine-readable code.
pub trait ErrorCode {
    /// Code string such as `"E_LAYER_LOCKED"`.
    fn error_code(&self) -> &'static str;

    /// Whether the engine absorbs this error as an expected no-op.
    fn is_absorbed(&self) -> bool {
        false
    }
}
