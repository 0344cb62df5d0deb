//! In-memory tree store.
//!
//! Mirrors the ordering and cursor semantics of [`PgTreeRepository`] over
//! plain vectors. Used by tests and local fixtures; it also counts store
//! round trips and can be told to fail a chosen operation.
//!
//! [`PgTreeRepository`]: crate::PgTreeRepository

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use quire_core::defaults::LEVEL_ALIASES;
use quire_core::{
    Entry, EntryFilter, EntryStatus, Error, Group, ListOptions, Notebook, Result, StoreLease,
    StoreProvider, Subgroup, TreeStore,
};

/// Store operations, for call accounting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetNotebook,
    CountGroups,
    ListGroups,
    GetGroup,
    CountSubgroups,
    ListSubgroups,
    GetSubgroup,
    CountEntries,
    ListEntries,
}

#[derive(Default)]
struct MemoryData {
    notebooks: Vec<Notebook>,
    groups: Vec<Group>,
    subgroups: Vec<Subgroup>,
    entries: Vec<Entry>,
}

/// TreeStore over in-process vectors.
#[derive(Default)]
pub struct MemoryTreeStore {
    data: RwLock<MemoryData>,
    calls: Mutex<HashMap<StoreOp, usize>>,
    /// Operations that fail, optionally only for one parent id.
    failures: Mutex<Vec<(StoreOp, Option<Uuid>)>>,
}

fn lock_poisoned<T>(_: T) -> Error {
    Error::Internal("memory store lock poisoned".to_string())
}

/// Apply the exclusive-cursor, skip and take rules to rows already in order.
///
/// `anchor_scope` is every row under the parent (before any row filter), so
/// an anchor hidden by a filter still positions the page.
fn paginate<T: Clone>(
    rows: Vec<T>,
    anchor_scope: &[T],
    key: impl Fn(&T) -> (i32, Uuid),
    opts: &ListOptions,
) -> Vec<T> {
    let rows = match opts.cursor {
        Some(cursor) => match anchor_scope.iter().map(&key).find(|(_, id)| *id == cursor) {
            Some(anchor) => rows.into_iter().filter(|r| key(r) > anchor).collect(),
            None => return Vec::new(),
        },
        None => rows,
    };

    rows.into_iter()
        .skip(opts.skip.unwrap_or(0).max(0) as usize)
        .take(opts.take.max(0) as usize)
        .collect()
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls made to one operation.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(&op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total store round trips so far.
    pub fn round_trips(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    /// Make `op` fail. With `parent`, only calls scoped to that parent fail.
    pub fn fail_on(&self, op: StoreOp, parent: Option<Uuid>) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((op, parent));
        }
    }

    fn record(&self, op: StoreOp, parent: Uuid) -> Result<()> {
        *self
            .calls
            .lock()
            .map_err(lock_poisoned)?
            .entry(op)
            .or_insert(0) += 1;

        let failures = self.failures.lock().map_err(lock_poisoned)?;
        let fails = failures
            .iter()
            .any(|(failing, scope)| *failing == op && scope.map_or(true, |id| id == parent));
        if fails {
            return Err(Error::Internal(format!(
                "injected {:?} failure for {}",
                op, parent
            )));
        }
        Ok(())
    }

    pub fn insert_notebook(&self, notebook: Notebook) {
        if let Ok(mut data) = self.data.write() {
            data.notebooks.push(notebook);
        }
    }

    pub fn insert_group(&self, group: Group) {
        if let Ok(mut data) = self.data.write() {
            data.groups.push(group);
        }
    }

    pub fn insert_subgroup(&self, subgroup: Subgroup) {
        if let Ok(mut data) = self.data.write() {
            data.subgroups.push(subgroup);
        }
    }

    pub fn insert_entry(&self, entry: Entry) {
        if let Ok(mut data) = self.data.write() {
            data.entries.push(entry);
        }
    }

    /// Add a notebook with default aliases and return its id.
    pub fn add_notebook(&self, owner_id: Uuid, title: &str) -> Uuid {
        let id = Uuid::now_v7();
        let now = Utc::now();
        self.insert_notebook(Notebook {
            id,
            title: title.to_string(),
            description: None,
            aliases: LEVEL_ALIASES.map(String::from),
            owner_id,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Add a group and return its id.
    pub fn add_group(&self, notebook_id: Uuid, name: &str, user_sort: i32) -> Uuid {
        let id = Uuid::now_v7();
        let now = Utc::now();
        self.insert_group(Group {
            id,
            name: name.to_string(),
            description: None,
            user_sort,
            notebook_id,
            created_at: now,
            updated_at: now,
            subgroup_count: 0,
        });
        id
    }

    /// Add a subgroup and return its id.
    pub fn add_subgroup(&self, group_id: Uuid, name: &str, user_sort: i32) -> Uuid {
        let id = Uuid::now_v7();
        let now = Utc::now();
        self.insert_subgroup(Subgroup {
            id,
            name: name.to_string(),
            description: None,
            user_sort,
            group_id,
            created_at: now,
            updated_at: now,
            entry_count: 0,
            active_entry_count: 0,
        });
        id
    }

    /// Add an entry with generated content and return its id.
    pub fn add_entry(
        &self,
        subgroup_id: Uuid,
        owner_id: Uuid,
        title: &str,
        user_sort: i32,
        archived: bool,
    ) -> Uuid {
        let id = Uuid::now_v7();
        let now = Utc::now();
        self.insert_entry(Entry {
            id,
            title: title.to_string(),
            content: Some(format!("<p>{}</p>", title)),
            status: EntryStatus::Active,
            archived,
            user_sort,
            subgroup_id,
            owner_id,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
        });
        id
    }

    fn annotate_group(data: &MemoryData, group: &Group) -> Group {
        let mut group = group.clone();
        group.subgroup_count = data
            .subgroups
            .iter()
            .filter(|s| s.group_id == group.id)
            .count() as i64;
        group
    }

    fn annotate_subgroup(data: &MemoryData, subgroup: &Subgroup) -> Subgroup {
        let id = subgroup.id;
        let mut subgroup = subgroup.clone();
        let entries = data.entries.iter().filter(|e| e.subgroup_id == id);
        subgroup.entry_count = entries.clone().count() as i64;
        subgroup.active_entry_count = entries.filter(|e| !e.archived).count() as i64;
        subgroup
    }

    fn sorted_groups(data: &MemoryData, notebook_id: Uuid) -> Vec<Group> {
        let mut groups: Vec<Group> = data
            .groups
            .iter()
            .filter(|g| g.notebook_id == notebook_id)
            .map(|g| Self::annotate_group(data, g))
            .collect();
        groups.sort_by_key(|g| (g.user_sort, g.id));
        groups
    }

    fn sorted_subgroups(data: &MemoryData, group_id: Uuid) -> Vec<Subgroup> {
        let mut subgroups: Vec<Subgroup> = data
            .subgroups
            .iter()
            .filter(|s| s.group_id == group_id)
            .map(|s| Self::annotate_subgroup(data, s))
            .collect();
        subgroups.sort_by_key(|s| (s.user_sort, s.id));
        subgroups
    }

    fn sorted_entries(data: &MemoryData, subgroup_id: Uuid) -> Vec<Entry> {
        let mut entries: Vec<Entry> = data
            .entries
            .iter()
            .filter(|e| e.subgroup_id == subgroup_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.user_sort, e.id));
        entries
    }

    fn matches(filter: &EntryFilter, entry: &Entry) -> bool {
        entry.owner_id == filter.owner_id && filter.archived.map_or(true, |a| entry.archived == a)
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn get_notebook(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Notebook>> {
        self.record(StoreOp::GetNotebook, id)?;
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .notebooks
            .iter()
            .find(|n| n.id == id && n.owner_id == owner_id)
            .cloned())
    }

    async fn count_groups(&self, notebook_id: Uuid) -> Result<i64> {
        self.record(StoreOp::CountGroups, notebook_id)?;
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .groups
            .iter()
            .filter(|g| g.notebook_id == notebook_id)
            .count() as i64)
    }

    async fn list_groups(&self, notebook_id: Uuid, opts: &ListOptions) -> Result<Vec<Group>> {
        self.record(StoreOp::ListGroups, notebook_id)?;
        let data = self.data.read().map_err(lock_poisoned)?;
        let groups = Self::sorted_groups(&data, notebook_id);
        Ok(paginate(groups.clone(), &groups, |g| (g.user_sort, g.id), opts))
    }

    async fn get_group(&self, notebook_id: Uuid, group_id: Uuid) -> Result<Option<Group>> {
        self.record(StoreOp::GetGroup, group_id)?;
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .groups
            .iter()
            .find(|g| g.id == group_id && g.notebook_id == notebook_id)
            .map(|g| Self::annotate_group(&data, g)))
    }

    async fn count_subgroups(&self, group_id: Uuid) -> Result<i64> {
        self.record(StoreOp::CountSubgroups, group_id)?;
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .subgroups
            .iter()
            .filter(|s| s.group_id == group_id)
            .count() as i64)
    }

    async fn list_subgroups(&self, group_id: Uuid, opts: &ListOptions) -> Result<Vec<Subgroup>> {
        self.record(StoreOp::ListSubgroups, group_id)?;
        let data = self.data.read().map_err(lock_poisoned)?;
        let subgroups = Self::sorted_subgroups(&data, group_id);
        Ok(paginate(
            subgroups.clone(),
            &subgroups,
            |s| (s.user_sort, s.id),
            opts,
        ))
    }

    async fn get_subgroup(&self, group_id: Uuid, subgroup_id: Uuid) -> Result<Option<Subgroup>> {
        self.record(StoreOp::GetSubgroup, subgroup_id)?;
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .subgroups
            .iter()
            .find(|s| s.id == subgroup_id && s.group_id == group_id)
            .map(|s| Self::annotate_subgroup(&data, s)))
    }

    async fn count_entries(&self, filter: &EntryFilter) -> Result<i64> {
        self.record(StoreOp::CountEntries, filter.subgroup_id)?;
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data
            .entries
            .iter()
            .filter(|e| e.subgroup_id == filter.subgroup_id && Self::matches(filter, e))
            .count() as i64)
    }

    async fn list_entries(&self, filter: &EntryFilter, opts: &ListOptions) -> Result<Vec<Entry>> {
        self.record(StoreOp::ListEntries, filter.subgroup_id)?;
        let data = self.data.read().map_err(lock_poisoned)?;
        let scope = Self::sorted_entries(&data, filter.subgroup_id);
        let visible: Vec<Entry> = scope
            .iter()
            .filter(|e| Self::matches(filter, e))
            .cloned()
            .collect();

        let mut page = paginate(visible, &scope, |e| (e.user_sort, e.id), opts);
        if !filter.with_content {
            for entry in &mut page {
                entry.content = None;
            }
        }
        Ok(page)
    }
}

/// Provider handing out leases on one shared memory store.
///
/// Counts acquisitions and releases so tests can check that every lease is
/// released exactly once.
pub struct MemoryStoreProvider {
    store: Arc<MemoryTreeStore>,
    acquired: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl MemoryStoreProvider {
    pub fn new(store: Arc<MemoryTreeStore>) -> Self {
        Self {
            store,
            acquired: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn store(&self) -> &Arc<MemoryTreeStore> {
        &self.store
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreProvider for MemoryStoreProvider {
    async fn acquire(&self) -> Result<StoreLease> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let released = self.released.clone();
        let store: Arc<dyn TreeStore> = self.store.clone();
        Ok(StoreLease::with_release(store, move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }
}
