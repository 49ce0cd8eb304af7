//! Schema versioning for the persisted statistics snapshot.

/// Current schema version of the persisted snapshot.
///
/// Version 1 had no transition matrix; version 2 added `transitionCounts`.
pub const SCHEMA_VERSION: u32 = 2;

/// Oldest snapshot schema the loader still understands.
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

/// Check if a persisted schema version can be loaded.
///
/// Snapshots never carried an explicit version field, so a missing version
/// is treated as compatible.
pub fn is_compatible(version: Option<u32>) -> bool {
    match version {
        None => true,
        Some(v) => (MIN_COMPATIBLE_VERSION..=SCHEMA_VERSION).contains(&v),
    }
}
