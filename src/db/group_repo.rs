use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;

use super::{ensure_schema, parse_timestamp, timestamp, StoreError};
use crate::models::{normalize_name, rename_value, Group, Member, DEFAULT_GROUP_NAME};

pub struct GroupRepository {
    pool: SqlitePool,
}

// Row types for database queries
#[derive(sqlx::FromRow)]
struct GroupRow {
    id: i64,
    name: String,
    created_at: String,
}

#[derive(sqlx::FromRow)]
pub(super) struct MemberRow {
    pub(super) id: i64,
    pub(super) group_id: i64,
    pub(super) name: String,
    pub(super) checked_in: bool,
    pub(super) created_at: String,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Member {
            id: row.id,
            group_id: row.group_id,
            name: row.name,
            checked_in: row.checked_in,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Group {
            id: row.id,
            name: row.name,
            created_at: parse_timestamp(&row.created_at),
            members: Vec::new(),
        }
    }
}

impl GroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns every group with its members, both ordered by creation.
    ///
    /// Groups and members are fetched in two queries and stitched together
    /// by group id.
    pub async fn list_all(&self) -> Result<Vec<Group>, StoreError> {
        ensure_schema(&self.pool).await?;

        let groups: Vec<GroupRow> = sqlx::query_as(
            "SELECT id, name, created_at FROM roast_groups ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let members: Vec<MemberRow> = sqlx::query_as(
            "SELECT id, group_id, name, checked_in, created_at FROM roast_members ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_group: HashMap<i64, Vec<Member>> = HashMap::new();
        for row in members {
            by_group.entry(row.group_id).or_default().push(row.into());
        }

        Ok(groups
            .into_iter()
            .map(|row| {
                let members = by_group.remove(&row.id).unwrap_or_default();
                Group::from(row).with_members(members)
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Group>, StoreError> {
        let row: Option<GroupRow> =
            sqlx::query_as("SELECT id, name, created_at FROM roast_groups WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => self.hydrate_group(row).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn create(&self, name: Option<&str>) -> Result<Group, StoreError> {
        let name = normalize_name(name, DEFAULT_GROUP_NAME);
        let created_at = timestamp(Utc::now());

        let result = sqlx::query("INSERT INTO roast_groups (name, created_at) VALUES (?, ?)")
            .bind(&name)
            .bind(&created_at)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, name = %name, "Created group");

        self.get_by_id(id)
            .await?
            .ok_or(StoreError::NotFound("Group"))
    }

    /// Renames a group. A blank name leaves the group untouched.
    pub async fn rename(&self, id: i64, name: &str) -> Result<Group, StoreError> {
        if let Some(name) = rename_value(name) {
            let result = sqlx::query("UPDATE roast_groups SET name = ? WHERE id = ?")
                .bind(&name)
                .bind(id)
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound("Group"));
            }
        }

        self.get_by_id(id)
            .await?
            .ok_or(StoreError::NotFound("Group"))
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        // CASCADE will handle members
        let result = sqlx::query("DELETE FROM roast_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(id, deleted = result.rows_affected(), "Deleted group");
        Ok(())
    }

    async fn hydrate_group(&self, row: GroupRow) -> Result<Group, StoreError> {
        let members: Vec<MemberRow> = sqlx::query_as(
            "SELECT id, group_id, name, checked_in, created_at FROM roast_members WHERE group_id = ? ORDER BY created_at, id",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Group::from(row).with_members(members.into_iter().map(Member::from).collect()))
    }
}
