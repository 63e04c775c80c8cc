//! Per-client request admission.
//!
//! Each API endpoint owns its own limiter instance and keys it by an advisory
//! client identifier taken from proxy headers.
//!
//! ## Flow
//!
//! ```text
//! HeaderMap → client_identifier() → RateLimiter::is_limited() → admit / 429
//! ```

pub mod fixed_window;
pub mod identity;

pub use fixed_window::{spawn_sweeper, FixedWindowLimiter};
pub use identity::{client_fingerprint, client_identifier, UNKNOWN_CLIENT};

/// Admission check keyed by client identifier.
///
/// Returns `true` when the request must be rejected. Implementations never
/// fail; a shared external counter can stand in for the in-memory one.
pub trait RateLimiter: Send + Sync {
    fn is_limited(&self, identifier: &str) -> bool;
}
