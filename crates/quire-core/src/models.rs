//! Entity model for notebooks and their three nested levels.
//!
//! These are read views as consumed by the tree engine. Writes happen
//! elsewhere; nothing in this workspace mutates them outside of fixtures.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::LEVEL_ALIASES;
use crate::error::Error;

/// Top-level container owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Display names for the group, subgroup and entry levels.
    pub aliases: [String; 3],
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Build the alias tuple from stored values, falling back to the defaults
/// when the stored array does not have exactly three names.
pub fn level_aliases(stored: Vec<String>) -> [String; 3] {
    match <[String; 3]>::try_from(stored) {
        Ok(aliases) => aliases,
        Err(_) => LEVEL_ALIASES.map(String::from),
    }
}

/// First level below a notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub user_sort: i32,
    pub notebook_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of subgroups under this group (computed alongside the page).
    #[serde(skip)]
    pub subgroup_count: i64,
}

/// Second level, always under one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subgroup {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub user_sort: i32,
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of entries including archived ones (computed).
    #[serde(skip)]
    pub entry_count: i64,
    /// Number of non-archived entries (computed).
    #[serde(skip)]
    pub active_entry_count: i64,
}

impl Subgroup {
    /// Entry total matching the effective archived filter.
    pub fn entry_total(&self, include_archived: bool) -> i64 {
        if include_archived {
            self.entry_count
        } else {
            self.active_entry_count
        }
    }
}

/// Lifecycle status of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Draft,
    Active,
    Done,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Active => "active",
            EntryStatus::Done => "done",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EntryStatus::Draft),
            "active" => Ok(EntryStatus::Active),
            "done" => Ok(EntryStatus::Done),
            other => Err(Error::Serialization(format!(
                "unknown entry status '{}'",
                other
            ))),
        }
    }
}

/// Tag attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTag {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

/// Leaf level, always under one subgroup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub title: String,
    /// Rich-text body; absent when the read projected it away.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub status: EntryStatus,
    pub archived: bool,
    pub user_sort: i32,
    pub subgroup_id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<EntryTag>,
}

/// Filter for entry count/list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryFilter {
    pub subgroup_id: Uuid,
    pub owner_id: Uuid,
    /// `Some(false)` hides archived entries; `None` returns both.
    pub archived: Option<bool>,
    /// Whether list reads should carry the rich-text content.
    pub with_content: bool,
}

impl EntryFilter {
    /// Filter for non-archived entries without content.
    pub fn new(subgroup_id: Uuid, owner_id: Uuid) -> Self {
        Self {
            subgroup_id,
            owner_id,
            archived: Some(false),
            with_content: false,
        }
    }

    /// Include archived entries when `include` is true.
    pub fn include_archived(mut self, include: bool) -> Self {
        self.archived = if include { None } else { Some(false) };
        self
    }

    /// Load entry content in list reads.
    pub fn with_content(mut self) -> Self {
        self.with_content = true;
        self
    }
}
