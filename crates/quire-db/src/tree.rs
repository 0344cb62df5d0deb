//! Notebook tree repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quire_core::{
    level_aliases, Entry, EntryFilter, EntryStatus, EntryTag, Error, Group, ListOptions, Notebook,
    Result, Subgroup, TreeStore,
};

const GROUP_COLUMNS: &str = r#"
    g.id, g.name, g.description, g.user_sort, g.notebook_id, g.created_at, g.updated_at,
    (SELECT COUNT(*) FROM notebook_subgroup s WHERE s.group_id = g.id) AS subgroup_count
"#;

const SUBGROUP_COLUMNS: &str = r#"
    s.id, s.name, s.description, s.user_sort, s.group_id, s.created_at, s.updated_at,
    (SELECT COUNT(*) FROM entry e WHERE e.subgroup_id = s.id) AS entry_count,
    (SELECT COUNT(*) FROM entry e WHERE e.subgroup_id = s.id AND NOT e.archived) AS active_entry_count
"#;

/// PostgreSQL implementation of TreeStore.
#[derive(Clone)]
pub struct PgTreeRepository {
    pool: Pool<Postgres>,
}

impl PgTreeRepository {
    /// Create a new PgTreeRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn notebook_from_row(r: &PgRow) -> Notebook {
    Notebook {
        id: r.get("id"),
        title: r.get("title"),
        description: r.get("description"),
        aliases: level_aliases(r.get("level_aliases")),
        owner_id: r.get("owner_id"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn group_from_row(r: &PgRow) -> Group {
    Group {
        id: r.get("id"),
        name: r.get("name"),
        description: r.get("description"),
        user_sort: r.get("user_sort"),
        notebook_id: r.get("notebook_id"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
        subgroup_count: r.get("subgroup_count"),
    }
}

fn subgroup_from_row(r: &PgRow) -> Subgroup {
    Subgroup {
        id: r.get("id"),
        name: r.get("name"),
        description: r.get("description"),
        user_sort: r.get("user_sort"),
        group_id: r.get("group_id"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
        entry_count: r.get("entry_count"),
        active_entry_count: r.get("active_entry_count"),
    }
}

fn entry_from_row(r: &PgRow) -> Result<Entry> {
    let status: String = r.get("status");
    let tags: serde_json::Value = r.get("tags");
    Ok(Entry {
        id: r.get("id"),
        title: r.get("title"),
        content: r.get("content"),
        status: status.parse::<EntryStatus>()?,
        archived: r.get("archived"),
        user_sort: r.get("user_sort"),
        subgroup_id: r.get("subgroup_id"),
        owner_id: r.get("owner_id"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
        tags: serde_json::from_value::<Vec<EntryTag>>(tags)?,
    })
}

#[async_trait]
impl TreeStore for PgTreeRepository {
    async fn get_notebook(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Notebook>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, level_aliases, owner_id, created_at, updated_at
            FROM notebook
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(notebook_from_row))
    }

    async fn count_groups(&self, notebook_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notebook_group WHERE notebook_id = $1")
            .bind(notebook_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn list_groups(&self, notebook_id: Uuid, opts: &ListOptions) -> Result<Vec<Group>> {
        let sql = format!(
            r#"
            SELECT {GROUP_COLUMNS}
            FROM notebook_group g
            WHERE g.notebook_id = $1
              AND ($2::uuid IS NULL OR (g.user_sort, g.id) > (
                    SELECT a.user_sort, a.id FROM notebook_group a
                    WHERE a.id = $2 AND a.notebook_id = $1))
            ORDER BY g.user_sort, g.id
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(notebook_id)
            .bind(opts.cursor)
            .bind(opts.take)
            .bind(opts.skip.unwrap_or(0))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(group_from_row).collect())
    }

    async fn get_group(&self, notebook_id: Uuid, group_id: Uuid) -> Result<Option<Group>> {
        let sql = format!(
            "SELECT {GROUP_COLUMNS} FROM notebook_group g WHERE g.id = $1 AND g.notebook_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(group_id)
            .bind(notebook_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(group_from_row))
    }

    async fn count_subgroups(&self, group_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notebook_subgroup WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn list_subgroups(&self, group_id: Uuid, opts: &ListOptions) -> Result<Vec<Subgroup>> {
        let sql = format!(
            r#"
            SELECT {SUBGROUP_COLUMNS}
            FROM notebook_subgroup s
            WHERE s.group_id = $1
              AND ($2::uuid IS NULL OR (s.user_sort, s.id) > (
                    SELECT a.user_sort, a.id FROM notebook_subgroup a
                    WHERE a.id = $2 AND a.group_id = $1))
            ORDER BY s.user_sort, s.id
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(group_id)
            .bind(opts.cursor)
            .bind(opts.take)
            .bind(opts.skip.unwrap_or(0))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(subgroup_from_row).collect())
    }

    async fn get_subgroup(&self, group_id: Uuid, subgroup_id: Uuid) -> Result<Option<Subgroup>> {
        let sql = format!(
            "SELECT {SUBGROUP_COLUMNS} FROM notebook_subgroup s WHERE s.id = $1 AND s.group_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(subgroup_id)
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(subgroup_from_row))
    }

    async fn count_entries(&self, filter: &EntryFilter) -> Result<i64> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM entry
            WHERE subgroup_id = $1 AND owner_id = $2
              AND ($3::bool IS NULL OR archived = $3)
            "#,
        )
        .bind(filter.subgroup_id)
        .bind(filter.owner_id)
        .bind(filter.archived)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn list_entries(&self, filter: &EntryFilter, opts: &ListOptions) -> Result<Vec<Entry>> {
        // Tags come back as one ordered JSON array per entry.
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.title,
                   CASE WHEN $3 THEN e.content ELSE NULL END AS content,
                   e.status, e.archived, e.user_sort, e.subgroup_id, e.owner_id,
                   e.created_at, e.updated_at,
                   COALESCE(
                       (SELECT json_agg(json_build_object('id', t.id, 'name', t.name, 'code', t.code)
                                        ORDER BY et.position)
                        FROM entry_tag et JOIN tag t ON t.id = et.tag_id
                        WHERE et.entry_id = e.id),
                       '[]'::json
                   ) AS tags
            FROM entry e
            WHERE e.subgroup_id = $1 AND e.owner_id = $2
              AND ($4::bool IS NULL OR e.archived = $4)
              AND ($5::uuid IS NULL OR (e.user_sort, e.id) > (
                    SELECT a.user_sort, a.id FROM entry a
                    WHERE a.id = $5 AND a.subgroup_id = $1))
            ORDER BY e.user_sort, e.id
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filter.subgroup_id)
        .bind(filter.owner_id)
        .bind(filter.with_content)
        .bind(filter.archived)
        .bind(opts.cursor)
        .bind(opts.take)
        .bind(opts.skip.unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(entry_from_row).collect()
    }
}
