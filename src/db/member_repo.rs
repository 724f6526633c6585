use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::group_repo::MemberRow;
use super::{timestamp, StoreError};
use crate::models::{normalize_name, rename_value, Member, MemberUpdate, DEFAULT_MEMBER_NAME};

pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Member>, StoreError> {
        let row: Option<MemberRow> = sqlx::query_as(
            "SELECT id, group_id, name, checked_in, created_at FROM roast_members WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Member::from))
    }

    /// Adds a member to `group_id`. Fails with `NotFound` when the group
    /// does not exist.
    pub async fn create(&self, group_id: i64, name: Option<&str>) -> Result<Member, StoreError> {
        let name = normalize_name(name, DEFAULT_MEMBER_NAME);
        let created_at = timestamp(Utc::now());

        let result = sqlx::query(
            "INSERT INTO roast_members (group_id, name, checked_in, created_at) VALUES (?, ?, 0, ?)",
        )
        .bind(group_id)
        .bind(&name)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_foreign_key_violation() => StoreError::NotFound("Group"),
            _ => StoreError::Database(e),
        })?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, group_id, name = %name, "Created member");

        self.get_by_id(id)
            .await?
            .ok_or(StoreError::NotFound("Member"))
    }

    /// Applies the present fields of `update` in a single statement.
    ///
    /// A blank name is ignored; if nothing else remains to write the member
    /// is returned unchanged.
    pub async fn update(&self, id: i64, update: &MemberUpdate) -> Result<Member, StoreError> {
        if update.is_empty() {
            return Err(StoreError::NoFieldsProvided);
        }

        let name = update.name.as_deref().and_then(rename_value);

        if name.is_some() || update.checked_in.is_some() {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE roast_members SET ");
            {
                let mut fields = builder.separated(", ");
                if let Some(name) = name {
                    fields.push("name = ").push_bind_unseparated(name);
                }
                if let Some(checked_in) = update.checked_in {
                    fields.push("checked_in = ").push_bind_unseparated(checked_in);
                }
            }
            builder.push(" WHERE id = ").push_bind(id);

            let result = builder.build().execute(&self.pool).await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound("Member"));
            }
        }

        self.get_by_id(id)
            .await?
            .ok_or(StoreError::NotFound("Member"))
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM roast_members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::{test_store, TestStore};
    use crate::db::StoreError;
    use crate::models::MemberUpdate;

    async fn setup() -> (TestStore, i64) {
        let ctx = test_store();
        let group = ctx
            .store
            .groups()
            .await
            .unwrap()
            .create(Some("Panel 1"))
            .await
            .unwrap();
        (ctx, group.id)
    }

    #[tokio::test]
    async fn test_create_member_defaults() {
        let (ctx, group_id) = setup().await;
        let repo = ctx.store.members().await.unwrap();

        let member = repo.create(group_id, None).await.unwrap();
        assert_eq!(member.name, "New Member");
        assert_eq!(member.group_id, group_id);
        assert!(!member.checked_in);

        let named = repo.create(group_id, Some("  Alice ")).await.unwrap();
        assert_eq!(named.name, "Alice");
        assert!(named.id > member.id);
    }

    #[tokio::test]
    async fn test_create_member_in_missing_group() {
        let (ctx, _) = setup().await;
        let repo = ctx.store.members().await.unwrap();

        let err = repo.create(999, Some("Ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Group")));
    }

    #[tokio::test]
    async fn test_update_check_in() {
        let (ctx, group_id) = setup().await;
        let repo = ctx.store.members().await.unwrap();

        let member = repo.create(group_id, Some("Alice")).await.unwrap();
        let updated = repo
            .update(member.id, &MemberUpdate::checked_in(true))
            .await
            .unwrap();
        assert!(updated.checked_in);
        assert_eq!(updated.name, "Alice");

        let fetched = repo.get_by_id(member.id).await.unwrap().unwrap();
        assert!(fetched.checked_in);
    }

    #[tokio::test]
    async fn test_update_both_fields() {
        let (ctx, group_id) = setup().await;
        let repo = ctx.store.members().await.unwrap();

        let member = repo.create(group_id, Some("Alice")).await.unwrap();
        let update = MemberUpdate {
            name: Some("Alicia".to_string()),
            checked_in: Some(true),
        };
        let updated = repo.update(member.id, &update).await.unwrap();
        assert_eq!(updated.name, "Alicia");
        assert!(updated.checked_in);
        assert_eq!(updated.created_at, member.created_at);
    }

    #[tokio::test]
    async fn test_update_without_fields_fails() {
        let (ctx, group_id) = setup().await;
        let repo = ctx.store.members().await.unwrap();

        let member = repo.create(group_id, Some("Alice")).await.unwrap();
        let err = repo
            .update(member.id, &MemberUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NoFieldsProvided));
    }

    #[tokio::test]
    async fn test_update_blank_name_is_noop() {
        let (ctx, group_id) = setup().await;
        let repo = ctx.store.members().await.unwrap();

        let member = repo.create(group_id, Some("Alice")).await.unwrap();
        let updated = repo
            .update(member.id, &MemberUpdate::name("  "))
            .await
            .unwrap();
        assert_eq!(updated, member);
    }

    #[tokio::test]
    async fn test_update_missing_member() {
        let (ctx, _) = setup().await;
        let repo = ctx.store.members().await.unwrap();

        let err = repo
            .update(7, &MemberUpdate::checked_in(true))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Member not found");

        let err = repo.update(7, &MemberUpdate::name(" ")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Member")));
    }

    #[tokio::test]
    async fn test_delete_member() {
        let (ctx, group_id) = setup().await;
        let repo = ctx.store.members().await.unwrap();

        let member = repo.create(group_id, Some("Alice")).await.unwrap();
        repo.delete(member.id).await.unwrap();
        assert!(repo.get_by_id(member.id).await.unwrap().is_none());
    }
}
