//! Role repository
//!
//! Schema consumed (not owned) by this subsystem:
//!
//! - `roles (id CHAR(36), name, application_scope, permissions JSON,
//!    created_at, updated_at)`
//! - `identity_roles (identity_id CHAR(36), role_id CHAR(36), granted_at)`

use crate::domain::{CreateRoleInput, Role, StringUuid, UpdateRoleInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    // Roles
    async fn create_role(&self, input: &CreateRoleInput) -> Result<Role>;
    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>>;
    async fn find_roles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Role>>;
    async fn update_role(&self, id: Uuid, input: &UpdateRoleInput) -> Result<Role>;
    async fn delete_role(&self, id: Uuid) -> Result<()>;

    // Identity-Role assignment
    async fn find_identity_roles(&self, identity_id: Uuid) -> Result<Vec<Role>>;
    async fn assign_roles_to_identity(&self, identity_id: Uuid, role_ids: &[Uuid]) -> Result<()>;
    async fn remove_role_from_identity(&self, identity_id: Uuid, role_id: Uuid) -> Result<()>;
}

/// Row shape for the `roles` table; permissions live in a JSON column
#[derive(sqlx::FromRow)]
struct RoleRow {
    id: StringUuid,
    name: String,
    application_scope: String,
    permissions: Json<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            name: row.name,
            application_scope: row.application_scope,
            permissions: row.permissions.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ROLE_COLUMNS: &str = "id, name, application_scope, permissions, created_at, updated_at";

pub struct RoleRepositoryImpl {
    pool: MySqlPool,
}

impl RoleRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for RoleRepositoryImpl {
    async fn create_role(&self, input: &CreateRoleInput) -> Result<Role> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO roles (id, name, application_scope, permissions, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.application_scope)
        .bind(Json(&input.permissions))
        .execute(&self.pool)
        .await?;

        self.find_role_by_id(*id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create role")))
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>> {
        let sql = format!("SELECT {} FROM roles WHERE id = ?", ROLE_COLUMNS);
        let row = sqlx::query_as::<_, RoleRow>(&sql)
            .bind(StringUuid::from(id))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Role::from))
    }

    async fn find_roles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Role>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM roles WHERE id IN ({})",
            ROLE_COLUMNS, placeholders
        );

        let mut query = sqlx::query_as::<_, RoleRow>(&sql);
        for id in ids {
            query = query.bind(StringUuid::from(*id));
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn update_role(&self, id: Uuid, input: &UpdateRoleInput) -> Result<Role> {
        let existing = self
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);
        let application_scope = input
            .application_scope
            .as_ref()
            .unwrap_or(&existing.application_scope);
        let permissions = input.permissions.as_ref().unwrap_or(&existing.permissions);

        sqlx::query(
            r#"
            UPDATE roles
            SET name = ?, application_scope = ?, permissions = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(application_scope)
        .bind(Json(permissions))
        .bind(StringUuid::from(id))
        .execute(&self.pool)
        .await?;

        self.find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update role")))
    }

    async fn delete_role(&self, id: Uuid) -> Result<()> {
        // Assignments and the role row go together or not at all
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM identity_roles WHERE role_id = ?")
            .bind(StringUuid::from(id))
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(StringUuid::from(id))
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Role {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_identity_roles(&self, identity_id: Uuid) -> Result<Vec<Role>> {
        let sql = format!(
            "SELECT r.{} FROM roles r \
             INNER JOIN identity_roles ir ON r.id = ir.role_id \
             WHERE ir.identity_id = ?",
            ROLE_COLUMNS.replace(", ", ", r.")
        );

        let rows = sqlx::query_as::<_, RoleRow>(&sql)
            .bind(StringUuid::from(identity_id))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn assign_roles_to_identity(&self, identity_id: Uuid, role_ids: &[Uuid]) -> Result<()> {
        // All grants in one call commit together
        let mut tx = self.pool.begin().await?;

        for role_id in role_ids {
            sqlx::query(
                "INSERT IGNORE INTO identity_roles (identity_id, role_id, granted_at) \
                 VALUES (?, ?, NOW())",
            )
            .bind(StringUuid::from(identity_id))
            .bind(StringUuid::from(*role_id))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_role_from_identity(&self, identity_id: Uuid, role_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM identity_roles WHERE identity_id = ? AND role_id = ?")
            .bind(StringUuid::from(identity_id))
            .bind(StringUuid::from(role_id))
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
