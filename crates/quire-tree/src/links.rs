//! Continuation links.
//!
//! A link is the request path plus a query string that, fetched verbatim,
//! returns the next page of one scope while preserving the caller's
//! expansion intent. Scoped links name their parent through `{scope}.for` and
//! carry cursors as `parentId:cursor` so several parents can page through one
//! shared cursor-map parameter.

use uuid::Uuid;

use crate::params::{PageParams, Scope, TreeParams};

/// Ordered query-string writer.
#[derive(Debug, Default)]
struct QueryWriter {
    pairs: Vec<(&'static str, String)>,
}

impl QueryWriter {
    fn push(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    fn push_opt(&mut self, key: &'static str, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    fn render(&self, base_path: &str) -> String {
        if self.pairs.is_empty() {
            return base_path.to_string();
        }
        let query: Vec<String> = self
            .pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        format!("{}?{}", base_path, query.join("&"))
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn cursor_pair(parent: Uuid, cursor: Uuid) -> String {
    format!("{}:{}", parent, cursor)
}

/// Builds continuation links for one tree request.
#[derive(Debug, Clone, Copy)]
pub struct LinkBuilder<'a> {
    base_path: &'a str,
    params: &'a TreeParams,
}

impl<'a> LinkBuilder<'a> {
    pub fn new(base_path: &'a str, params: &'a TreeParams) -> Self {
        Self { base_path, params }
    }

    /// Next page of groups. Re-encodes `include` and the targeted expansion
    /// lists so the next page expands the same way.
    pub fn groups_next(&self, next: Option<Uuid>) -> Option<String> {
        let next = next?;
        let params = self.params;
        let mut q = QueryWriter::default();
        q.push_opt("include", params.include.encode());
        q.push("groups.take", params.groups.take);
        q.push("groups.cursor", next);
        if params.include.subgroups() {
            q.push("subgroups.take", params.subgroups.take);
            q.push_opt("subgroups.for", params.subgroups.for_ids.as_deref().map(join_ids));
        }
        if params.include.entries() {
            q.push("entries.take", params.entries.take);
            q.push_opt("entries.for", params.entries.for_ids.as_deref().map(join_ids));
        }
        self.push_archived(&mut q);
        Some(q.render(self.base_path))
    }

    /// Next page of one group's subgroups.
    pub fn subgroups_next(&self, group_id: Uuid, next: Option<Uuid>) -> Option<String> {
        let next = next?;
        Some(self.subgroups_link(group_id, self.params.subgroups.take, Some(next)))
    }

    /// Advertises a group whose subgroups were not expanded.
    pub fn subgroups_hint(&self, group_id: Uuid) -> String {
        self.subgroups_link(group_id, Scope::Subgroups.default_take(), None)
    }

    /// Next page of one subgroup's entries.
    pub fn entries_next(&self, group_id: Uuid, subgroup_id: Uuid, next: Option<Uuid>) -> Option<String> {
        let next = next?;
        Some(self.entries_link(group_id, subgroup_id, self.params.entries.take, Some(next)))
    }

    /// Advertises a subgroup whose entries were not expanded.
    pub fn entries_hint(&self, group_id: Uuid, subgroup_id: Uuid) -> String {
        self.entries_link(group_id, subgroup_id, Scope::Entries.default_take(), None)
    }

    fn subgroups_link(&self, group_id: Uuid, take: u32, cursor: Option<Uuid>) -> String {
        let params = self.params;
        let mut q = QueryWriter::default();
        q.push("include", params.include.encode().unwrap_or_else(|| "subgroups".to_string()));
        push_page(&mut q, &params.groups);
        q.push("subgroups.take", take);
        q.push("subgroups.for", group_id);
        q.push_opt("subgroups.cursor", cursor.map(|c| cursor_pair(group_id, c)));
        if params.include.entries() {
            q.push("entries.take", params.entries.take);
        }
        self.push_archived(&mut q);
        q.render(self.base_path)
    }

    fn entries_link(&self, group_id: Uuid, subgroup_id: Uuid, take: u32, cursor: Option<Uuid>) -> String {
        let params = self.params;
        let mut q = QueryWriter::default();
        q.push("include", params.include.encode().unwrap_or_else(|| "entries".to_string()));
        push_page(&mut q, &params.groups);
        q.push("subgroups.take", params.subgroups.take);
        q.push("subgroups.for", group_id);
        q.push_opt(
            "subgroups.cursor",
            params.subgroups.cursor(group_id).map(|c| cursor_pair(group_id, c)),
        );
        q.push("entries.take", take);
        q.push("entries.for", subgroup_id);
        q.push_opt("entries.cursor", cursor.map(|c| cursor_pair(subgroup_id, c)));
        self.push_archived(&mut q);
        q.render(self.base_path)
    }

    fn push_archived(&self, q: &mut QueryWriter) {
        if self.params.include.entries() && self.params.include_archived {
            q.push("entries.includeArchived", true);
        }
    }

    /// Next page of a flat list endpoint.
    pub fn list_next(
        base_path: &str,
        take: u32,
        next: Option<Uuid>,
        include_archived: Option<bool>,
    ) -> Option<String> {
        let next = next?;
        let mut q = QueryWriter::default();
        q.push("take", take);
        q.push("cursor", next);
        q.push_opt("includeArchived", include_archived.filter(|flag| *flag));
        Some(q.render(base_path))
    }
}

/// Current groups paging, so a scoped link re-materializes the same page.
fn push_page(q: &mut QueryWriter, page: &PageParams) {
    q.push("groups.take", page.take);
    q.push_opt("groups.skip", page.skip);
    q.push_opt("groups.cursor", page.cursor);
}
