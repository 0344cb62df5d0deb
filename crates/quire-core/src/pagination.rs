//! Pagination primitives shared by every list scope.
//!
//! Pages are fetched with one extra "probe" row: if the store returns more
//! rows than were asked for, another page exists and no second count query is
//! needed to say so. Cursors are exclusive, so the continuation cursor is the
//! id of the last row actually delivered.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Entry, Group, Subgroup};

/// Anything that can serve as a pagination anchor.
pub trait HasId {
    fn id(&self) -> Uuid;
}

impl HasId for Group {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl HasId for Subgroup {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl HasId for Entry {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Options passed to store list operations.
///
/// Rows are ordered by `user_sort` ascending (ties by id). With a cursor the
/// page starts strictly after the anchor row; an anchor that no longer exists
/// yields an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub take: i64,
    pub skip: Option<i64>,
    pub cursor: Option<Uuid>,
}

impl ListOptions {
    /// Plain options with no offset and no cursor.
    pub fn take(take: i64) -> Self {
        Self {
            take,
            skip: None,
            cursor: None,
        }
    }
}

/// List options for a `take + 1` probing read.
pub fn probe_options(take: u32, skip: Option<u32>, cursor: Option<Uuid>) -> ListOptions {
    ListOptions {
        take: i64::from(take) + 1,
        skip: skip.map(i64::from),
        cursor,
    }
}

/// Trim the probe row off a page.
///
/// Returns the rows to deliver and, when the probe row was present, the
/// cursor that resumes right after the last delivered row.
pub fn split_probe<T: HasId>(mut rows: Vec<T>, take: u32) -> (Vec<T>, Option<Uuid>) {
    let take = take as usize;
    if rows.len() > take {
        rows.truncate(take);
        let next = rows.last().map(HasId::id);
        (rows, next)
    } else {
        (rows, None)
    }
}

/// Continuation links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    pub next: String,
}

/// Pagination metadata attached to every page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub take: u32,
    pub count: i64,
    pub total: i64,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Uuid>,
    /// Id of the last row delivered on this page, not the first row of the
    /// next one. Cursors are exclusive: passing it back as `cursor` resumes
    /// strictly after this row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<PageLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_archived: Option<bool>,
}

impl PageMeta {
    /// Metadata for a probed page.
    ///
    /// `has_more` is true when the probe row was found. Without it, a cursor
    /// page is the last one, an offset page compares `skip + count` against
    /// the total, and a first page compares `count` against the total.
    pub fn paged(
        take: u32,
        skip: Option<u32>,
        cursor: Option<Uuid>,
        count: usize,
        total: i64,
        next_cursor: Option<Uuid>,
    ) -> Self {
        let count = count as i64;
        let has_more = if next_cursor.is_some() {
            true
        } else if cursor.is_some() {
            false
        } else if let Some(skip) = skip {
            i64::from(skip) + count < total
        } else {
            count < total
        };

        Self {
            take,
            count,
            total,
            has_more,
            skip,
            cursor,
            next_cursor,
            links: None,
            include_archived: None,
        }
    }

    /// Metadata for a fully materialised page: everything was delivered.
    pub fn complete(take: u32, count: usize) -> Self {
        let count = count as i64;
        Self {
            take,
            count,
            total: count,
            has_more: false,
            skip: None,
            cursor: None,
            next_cursor: None,
            links: None,
            include_archived: None,
        }
    }

    /// Metadata for a block whose children were not loaded.
    ///
    /// `total` still reports how many children exist so callers can tell
    /// that expansion is available.
    pub fn unexpanded(take: u32, total: i64) -> Self {
        Self {
            take,
            count: 0,
            total,
            has_more: total > 0,
            skip: None,
            cursor: None,
            next_cursor: None,
            links: None,
            include_archived: None,
        }
    }

    /// Attach a `links.next` URL, if any.
    pub fn with_next_link(mut self, next: Option<String>) -> Self {
        self.links = next.map(|next| PageLinks { next });
        self
    }

    /// Echo the effective archived filter.
    pub fn with_include_archived(mut self, include_archived: bool) -> Self {
        self.include_archived = Some(include_archived);
        self
    }
}

/// One page of items with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, meta: PageMeta) -> Self {
        Self { data, meta }
    }

    /// A page with no data.
    pub fn empty(meta: PageMeta) -> Self {
        Self {
            data: Vec::new(),
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(Uuid);

    impl HasId for Row {
        fn id(&self) -> Uuid {
            self.0
        }
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n).map(|_| Row(Uuid::new_v4())).collect()
    }

    #[test]
    fn test_probe_options_adds_one() {
        let opts = probe_options(20, Some(5), None);
        assert_eq!(opts.take, 21);
        assert_eq!(opts.skip, Some(5));
        assert_eq!(opts.cursor, None);
    }

    #[test]
    fn test_split_probe_with_extra_row() {
        let input = rows(4);
        let last_kept = input[2].0;
        let probe_row = input[3].0;
        let (kept, next) = split_probe(input, 3);
        assert_eq!(kept.len(), 3);
        assert_eq!(next, Some(last_kept));
        assert_ne!(next, Some(probe_row));
    }

    #[test]
    fn test_split_probe_exact_page() {
        let (kept, next) = split_probe(rows(3), 3);
        assert_eq!(kept.len(), 3);
        assert_eq!(next, None);
    }

    #[test]
    fn test_split_probe_short_page() {
        let (kept, next) = split_probe(rows(1), 3);
        assert_eq!(kept.len(), 1);
        assert!(next.is_none());
    }

    #[test]
    fn test_has_more_from_probe() {
        let meta = PageMeta::paged(2, None, None, 2, 5, Some(Uuid::nil()));
        assert!(meta.has_more);
    }

    #[test]
    fn test_has_more_cursor_page_without_probe() {
        let meta = PageMeta::paged(2, None, Some(Uuid::nil()), 1, 5, None);
        assert!(!meta.has_more);
    }

    #[test]
    fn test_has_more_offset_page() {
        assert!(PageMeta::paged(2, Some(2), None, 2, 5, None).has_more);
        assert!(!PageMeta::paged(2, Some(4), None, 1, 5, None).has_more);
    }

    #[test]
    fn test_has_more_first_page() {
        assert!(!PageMeta::paged(20, None, None, 3, 3, None).has_more);
    }

    #[test]
    fn test_unexpanded_meta_advertises_children() {
        let meta = PageMeta::unexpanded(10, 4);
        assert_eq!(meta.count, 0);
        assert_eq!(meta.total, 4);
        assert!(meta.has_more);
        assert!(!PageMeta::unexpanded(10, 0).has_more);
    }

    #[test]
    fn test_meta_serialization_omits_absent_fields() {
        let meta = PageMeta::complete(20, 2);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"take": 20, "count": 2, "total": 2, "hasMore": false})
        );

        let meta = PageMeta::paged(1, None, None, 1, 2, Some(Uuid::nil()))
            .with_next_link(Some("/next".to_string()))
            .with_include_archived(false);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["links"]["next"], "/next");
        assert_eq!(json["includeArchived"], false);
        assert_eq!(json["nextCursor"], Uuid::nil().to_string());
    }
}
