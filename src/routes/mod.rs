/// Router Module Index
///
/// Splits the HTTP surface by purpose. All of it is mounted behind the access gate;
/// what bypasses evaluation is decided by the exclusion matcher, not by mounting.

/// Health check. `/health` is an exact exclusion, so it is never redirected.
pub mod public;

/// JSON endpoints next to the dashboard pages. Handlers can rely on `CurrentUser` for
/// protected paths.
pub mod authenticated;

/// The exported dashboard, served as the fallback.
pub mod dashboard;
