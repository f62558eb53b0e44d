//! Top-level error type (spec §7): aggregates the per-module error enums at
//! the driver facade only. Everything below this layer degrades gracefully
//! and logs instead of propagating — this type exists for the narrow case
//! of programmer-facing misconfiguration at construction time.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Audio(#[from] crate::audio::Error),
}
