//! Query parameter normalization for tree and list requests.
//!
//! Raw directives arrive as strings. Everything here turns them into bounded,
//! typed values or fails with [`Error::InvalidInput`] before any store access.
//! List-valued and cursor-map parameters are lenient: malformed items are
//! dropped rather than failing the request.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use quire_core::defaults::{
    ENTRIES_TAKE, ENTRIES_TAKE_MAX, GROUPS_TAKE, GROUPS_TAKE_MAX, SUBGROUPS_TAKE,
    SUBGROUPS_TAKE_MAX,
};
use quire_core::{probe_options, Error, ListOptions, Result};

/// Pagination scope. Each level has its own default and maximum page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Groups,
    Subgroups,
    Entries,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Groups => "groups",
            Scope::Subgroups => "subgroups",
            Scope::Entries => "entries",
        }
    }

    pub fn default_take(&self) -> u32 {
        match self {
            Scope::Groups => GROUPS_TAKE,
            Scope::Subgroups => SUBGROUPS_TAKE,
            Scope::Entries => ENTRIES_TAKE,
        }
    }

    pub fn max_take(&self) -> u32 {
        match self {
            Scope::Groups => GROUPS_TAKE_MAX,
            Scope::Subgroups => SUBGROUPS_TAKE_MAX,
            Scope::Entries => ENTRIES_TAKE_MAX,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tree request directives exactly as received.
///
/// Unknown keys are ignored. A repeated key is rejected by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawTreeQuery {
    pub include: Option<String>,
    #[serde(rename = "groups.take")]
    pub groups_take: Option<String>,
    #[serde(rename = "groups.skip")]
    pub groups_skip: Option<String>,
    #[serde(rename = "groups.cursor")]
    pub groups_cursor: Option<String>,
    #[serde(rename = "subgroups.take")]
    pub subgroups_take: Option<String>,
    #[serde(rename = "subgroups.for")]
    pub subgroups_for: Option<String>,
    #[serde(rename = "subgroups.cursor")]
    pub subgroups_cursor: Option<String>,
    #[serde(rename = "entries.take")]
    pub entries_take: Option<String>,
    #[serde(rename = "entries.for")]
    pub entries_for: Option<String>,
    #[serde(rename = "entries.cursor")]
    pub entries_cursor: Option<String>,
    #[serde(rename = "entries.includeArchived")]
    pub entries_include_archived: Option<String>,
}

impl RawTreeQuery {
    /// Decode a `application/x-www-form-urlencoded` query string.
    pub fn from_query_str(query: &str) -> Result<Self> {
        decode_query(query)
    }
}

/// Decode a query string into a raw directive struct.
///
/// Percent-escapes that are not valid UTF-8 decode to U+FFFD, so they fail
/// the typed checks downstream instead of vanishing.
pub fn decode_query<T: DeserializeOwned>(query: &str) -> Result<T> {
    serde_urlencoded::from_str(query)
        .map_err(|e| Error::InvalidInput(format!("Invalid query string: {}", e)))
}

/// Split a comma-separated value: trimmed, empty items dropped, duplicates
/// removed keeping the first occurrence.
pub fn split_csv(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !items.iter().any(|seen| seen == item) {
            items.push(item.to_string());
        }
    }
    items
}

/// Parse a page size, applying the scope default when absent.
pub fn parse_take(name: &str, scope: Scope, raw: Option<&str>) -> Result<u32> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(scope.default_take());
    };
    let max = scope.max_take();
    let take: u32 = raw.parse().map_err(|_| {
        Error::InvalidInput(format!(
            "{} must be an integer between 1 and {}, got '{}'",
            name, max, raw
        ))
    })?;
    if take == 0 || take > max {
        return Err(Error::InvalidInput(format!(
            "{} must be between 1 and {}, got {}",
            name, max, take
        )));
    }
    Ok(take)
}

/// Parse an optional non-negative offset.
pub fn parse_skip(name: &str, raw: Option<&str>) -> Result<Option<u32>> {
    raw.map(str::trim)
        .map(|raw| {
            raw.parse::<u32>().map_err(|_| {
                Error::InvalidInput(format!(
                    "{} must be a non-negative integer, got '{}'",
                    name, raw
                ))
            })
        })
        .transpose()
}

/// Parse an optional cursor. An empty value is a validation error.
pub fn parse_cursor(name: &str, raw: Option<&str>) -> Result<Option<Uuid>> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", name)));
    }
    Uuid::parse_str(raw)
        .map(Some)
        .map_err(|_| Error::InvalidInput(format!("{} is not a valid id: '{}'", name, raw)))
}

/// Parse a boolean flag. Only "true" and "false" are accepted, in any case.
pub fn parse_bool(name: &str, raw: Option<&str>) -> Result<Option<bool>> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.eq_ignore_ascii_case("true") {
        Ok(Some(true))
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(Some(false))
    } else {
        Err(Error::InvalidInput(format!(
            "{} must be 'true' or 'false', got '{}'",
            name, raw
        )))
    }
}

/// Parse a `for` id list.
///
/// Returns `None` when the list is absent or has no usable ids, which means
/// default expansion. Items that are not ids are ignored.
pub fn parse_id_list(raw: Option<&str>) -> Option<Vec<Uuid>> {
    let ids: Vec<Uuid> = split_csv(raw?)
        .iter()
        .filter_map(|item| Uuid::parse_str(item).ok())
        .collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

/// Per-parent cursors decoded from `parentId:cursor` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorMap(HashMap<Uuid, Uuid>);

impl CursorMap {
    /// Parse a cursor map. Pairs missing either side, or with a side that is
    /// not an id, are dropped. The first pair for a parent wins.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut map = HashMap::new();
        let Some(raw) = raw else {
            return Self(map);
        };
        for item in split_csv(raw) {
            let Some((parent, cursor)) = item.split_once(':') else {
                continue;
            };
            let (Ok(parent), Ok(cursor)) = (
                Uuid::parse_str(parent.trim()),
                Uuid::parse_str(cursor.trim()),
            ) else {
                continue;
            };
            map.entry(parent).or_insert(cursor);
        }
        Self(map)
    }

    pub fn get(&self, parent: Uuid) -> Option<Uuid> {
        self.0.get(&parent).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The `{take, skip, cursor}` triple for one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub take: u32,
    pub skip: Option<u32>,
    pub cursor: Option<Uuid>,
}

impl PageParams {
    /// First page of a scope with its default size.
    pub fn first(scope: Scope) -> Self {
        Self {
            take: scope.default_take(),
            skip: None,
            cursor: None,
        }
    }

    /// Normalize one scope. `prefix` names the parameters in messages, e.g.
    /// `groups.` for tree requests or empty for flat lists.
    pub fn parse(
        prefix: &str,
        scope: Scope,
        take: Option<&str>,
        skip: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Self> {
        let take = parse_take(&format!("{}take", prefix), scope, take)?;
        let skip = parse_skip(&format!("{}skip", prefix), skip)?;
        let cursor = parse_cursor(&format!("{}cursor", prefix), cursor)?;
        if skip.is_some() && cursor.is_some() {
            return Err(Error::InvalidInput(format!(
                "{}skip and {}cursor cannot be combined",
                prefix, prefix
            )));
        }
        Ok(Self { take, skip, cursor })
    }

    /// Store options for a take+1 probing read.
    pub fn probe(&self) -> ListOptions {
        probe_options(self.take, self.skip, self.cursor)
    }
}

/// Requested expansion levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    requested_subgroups: bool,
    requested_entries: bool,
}

impl Include {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let mut include = Self::default();
        let Some(raw) = raw else {
            return Ok(include);
        };
        for item in split_csv(raw) {
            match item.to_ascii_lowercase().as_str() {
                "subgroups" => include.requested_subgroups = true,
                "entries" => include.requested_entries = true,
                _ => {
                    return Err(Error::InvalidInput(format!(
                        "include accepts 'subgroups' and 'entries', got '{}'",
                        item
                    )))
                }
            }
        }
        Ok(include)
    }

    /// Include subgroups and entries.
    pub fn all() -> Self {
        Self {
            requested_subgroups: true,
            requested_entries: true,
        }
    }

    /// Subgroups are traversed when either level is requested.
    pub fn subgroups(&self) -> bool {
        self.requested_subgroups || self.requested_entries
    }

    pub fn entries(&self) -> bool {
        self.requested_entries
    }

    /// The include value as the caller spelled it, for link re-encoding.
    pub fn encode(&self) -> Option<String> {
        match (self.requested_subgroups, self.requested_entries) {
            (true, true) => Some("subgroups,entries".to_string()),
            (true, false) => Some("subgroups".to_string()),
            (false, true) => Some("entries".to_string()),
            (false, false) => None,
        }
    }
}

/// Page size, target ids and per-parent cursors for a nested scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedParams {
    pub take: u32,
    /// Explicit targets; `None` means every parent on the current page.
    pub for_ids: Option<Vec<Uuid>>,
    pub cursors: CursorMap,
}

impl ScopedParams {
    pub fn parse(
        scope: Scope,
        take: Option<&str>,
        for_ids: Option<&str>,
        cursors: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            take: parse_take(&format!("{}.take", scope), scope, take)?,
            for_ids: parse_id_list(for_ids),
            cursors: CursorMap::parse(cursors),
        })
    }

    /// Default page size, default expansion, no cursors.
    pub fn defaults(scope: Scope) -> Self {
        Self {
            take: scope.default_take(),
            for_ids: None,
            cursors: CursorMap::default(),
        }
    }

    /// Resolve target parents among the ones actually available, keeping
    /// page order. Requested ids that are not available are dropped.
    pub fn targets(&self, available: &[Uuid]) -> Vec<Uuid> {
        match &self.for_ids {
            Some(ids) => available
                .iter()
                .copied()
                .filter(|id| ids.contains(id))
                .collect(),
            None => available.to_vec(),
        }
    }

    /// Store options for one parent's take+1 probing read.
    pub fn probe(&self, parent: Uuid) -> ListOptions {
        probe_options(self.take, None, self.cursor(parent))
    }

    pub fn cursor(&self, parent: Uuid) -> Option<Uuid> {
        self.cursors.get(parent)
    }
}

/// Fully normalized tree directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeParams {
    pub include: Include,
    pub groups: PageParams,
    pub subgroups: ScopedParams,
    pub entries: ScopedParams,
    pub include_archived: bool,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            include: Include::default(),
            groups: PageParams::first(Scope::Groups),
            subgroups: ScopedParams::defaults(Scope::Subgroups),
            entries: ScopedParams::defaults(Scope::Entries),
            include_archived: false,
        }
    }
}

impl TreeParams {
    pub fn from_raw(raw: &RawTreeQuery) -> Result<Self> {
        Ok(Self {
            include: Include::parse(raw.include.as_deref())?,
            groups: PageParams::parse(
                "groups.",
                Scope::Groups,
                raw.groups_take.as_deref(),
                raw.groups_skip.as_deref(),
                raw.groups_cursor.as_deref(),
            )?,
            subgroups: ScopedParams::parse(
                Scope::Subgroups,
                raw.subgroups_take.as_deref(),
                raw.subgroups_for.as_deref(),
                raw.subgroups_cursor.as_deref(),
            )?,
            entries: ScopedParams::parse(
                Scope::Entries,
                raw.entries_take.as_deref(),
                raw.entries_for.as_deref(),
                raw.entries_cursor.as_deref(),
            )?,
            include_archived: parse_bool(
                "entries.includeArchived",
                raw.entries_include_archived.as_deref(),
            )?
            .unwrap_or(false),
        })
    }

    pub fn from_query_str(query: &str) -> Result<Self> {
        Self::from_raw(&RawTreeQuery::from_query_str(query)?)
    }
}
