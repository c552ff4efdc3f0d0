//! Shared test utilities for the OceanDB workspace.
//!
//! This crate provides common testing infrastructure including:
//! - A small synthetic basin world with known connectivity
//! - Generators for along-track and eddy store rows
//! - An in-memory [`QueryBackend`](storage::QueryBackend) that records batches
//! - Skip macros for tests that need a live database
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{toy_basin_world, RecordingBackend};
//! ```

pub mod backend;
pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use backend::*;
pub use fixtures::*;
pub use generators::*;

/// Environment variable naming the database used by live tests.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Connection string of the live test database, if one is configured.
pub fn database_url() -> Option<String> {
    std::env::var(DATABASE_URL_VAR)
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// Deadline for a whole live query call.
pub const LIVE_QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Await `future`, panicking if it runs past [`LIVE_QUERY_TIMEOUT`].
pub async fn within_deadline<F: std::future::Future>(future: F) -> F::Output {
    match tokio::time::timeout(LIVE_QUERY_TIMEOUT, future).await {
        Ok(output) => output,
        Err(_) => panic!("live query exceeded {:?}", LIVE_QUERY_TIMEOUT),
    }
}

/// Macro to skip a test if no database is configured.
///
/// Live tests run against a database loaded with the OceanDB tables. When
/// `DATABASE_URL` is unset the test prints a skip message and returns early.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_database;
///
/// #[tokio::test]
/// async fn test_live_radius_query() {
///     let url = require_database!();
///     // Test code using url...
/// }
/// ```
#[macro_export]
macro_rules! require_database {
    () => {{
        match $crate::database_url() {
            Some(url) => url,
            None => {
                eprintln!(
                    "SKIPPED: {} not set. Point it at a loaded OceanDB database to run this test.",
                    $crate::DATABASE_URL_VAR
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of `(lat, lon)` or `(x, y)` pairs.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_coords_approx_eq;
///
/// assert_coords_approx_eq!((1.0001, 2.0001), (1.0, 2.0), 0.001);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.0, -5.00001, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.0, 2.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 0.0, 1.0);
    }

    #[tokio::test]
    async fn test_within_deadline_passes_output_through() {
        assert_eq!(super::within_deadline(async { 7 }).await, 7);
    }

    #[test]
    fn test_assert_coords_approx_eq() {
        assert_coords_approx_eq!((-69.0, 28.1), (-69.00001, 28.10001), 0.001);
    }
}
