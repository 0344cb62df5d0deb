//! Centralized default constants for quire.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for the groups scope.
pub const GROUPS_TAKE: u32 = 20;

/// Maximum page size for the groups scope.
pub const GROUPS_TAKE_MAX: u32 = 100;

/// Default page size for the subgroups scope.
pub const SUBGROUPS_TAKE: u32 = 10;

/// Maximum page size for the subgroups scope.
pub const SUBGROUPS_TAKE_MAX: u32 = 50;

/// Default page size for the entries scope.
pub const ENTRIES_TAKE: u32 = 20;

/// Maximum page size for the entries scope.
pub const ENTRIES_TAKE_MAX: u32 = 100;

/// Rows read per round trip when the legacy traversal walks a level to its end.
pub const LEGACY_FETCH_BATCH: i64 = 10_000;

// =============================================================================
// NOTEBOOK
// =============================================================================

/// Level aliases used when a notebook does not name its levels.
pub const LEVEL_ALIASES: [&str; 3] = ["Group", "Subgroup", "Entry"];

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Path prefix of the notebook API.
pub const API_PREFIX: &str = "/api/v1/notebooks";

/// Default maximum number of database connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;
