use anyhow::Result;
use chrono::Utc;
use shared::{CustomField, RoleStageUsage, RoleType, DEFAULT_STAGES};
use sqlx::{types::Json, QueryBuilder, Sqlite};

use super::{Database, Role};

const ROLE_COLUMNS: &str = "id, company_id, created_by_user_id, name, description, location, role_type, \
     seniority_level, requirements, is_active, custom_fields, color, created_at, updated_at";

/// A role ready to be inserted; custom fields are already normalized
#[derive(Debug, Clone)]
pub struct NewRole {
    pub company_id: i64,
    pub created_by_user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub role_type: RoleType,
    pub seniority_level: Option<String>,
    pub requirements: Vec<String>,
    pub custom_fields: Vec<CustomField>,
    pub is_active: bool,
    pub color: String,
}

#[derive(Debug, Clone, Default)]
pub struct RolePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub role_type: Option<RoleType>,
    pub seniority_level: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub custom_fields: Option<Vec<CustomField>>,
    pub is_active: Option<bool>,
}

impl Database {
    /// Insert a role together with its default pipeline, in one transaction.
    pub async fn create_role_with_default_stages(&self, role: &NewRole) -> Result<i64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let role_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO roles (company_id, created_by_user_id, name, description, location, role_type,
                               seniority_level, requirements, is_active, custom_fields, color, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(role.company_id)
        .bind(role.created_by_user_id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(&role.location)
        .bind(role.role_type.as_str())
        .bind(&role.seniority_level)
        .bind(Json(&role.requirements))
        .bind(role.is_active)
        .bind(Json(&role.custom_fields))
        .bind(&role.color)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for stage in DEFAULT_STAGES.iter() {
            sqlx::query(
                "INSERT INTO stages (role_id, name, sort_order, color, icon, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(role_id)
            .bind(stage.name)
            .bind(stage.order)
            .bind(stage.color)
            .bind(stage.icon)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(role_id)
    }

    pub async fn get_role(&self, id: i64, company_id: i64) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles WHERE id = ? AND company_id = ?",
            ROLE_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    /// Newest first
    pub async fn list_roles(&self, company_id: i64) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles WHERE company_id = ? ORDER BY created_at DESC, id DESC",
            ROLE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn list_active_roles(&self, company_id: i64) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles WHERE company_id = ? AND is_active = 1 ORDER BY created_at DESC, id DESC",
            ROLE_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    /// Apply the present fields of `patch`. Returns false when no row matched.
    pub async fn update_role(&self, id: i64, company_id: i64, patch: &RolePatch) -> Result<bool> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE roles SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(location) = &patch.location {
            qb.push(", location = ").push_bind(location.clone());
        }
        if let Some(role_type) = patch.role_type {
            qb.push(", role_type = ").push_bind(role_type.as_str());
        }
        if let Some(seniority) = &patch.seniority_level {
            qb.push(", seniority_level = ").push_bind(seniority.clone());
        }
        if let Some(requirements) = &patch.requirements {
            qb.push(", requirements = ").push_bind(Json(requirements.clone()));
        }
        if let Some(fields) = &patch.custom_fields {
            qb.push(", custom_fields = ").push_bind(Json(fields.clone()));
        }
        if let Some(is_active) = patch.is_active {
            qb.push(", is_active = ").push_bind(is_active);
        }

        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND company_id = ")
            .push_bind(company_id);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_role_active(&self, id: i64, company_id: i64, is_active: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE roles SET is_active = ?, updated_at = ? WHERE id = ? AND company_id = ?",
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(id)
        .bind(company_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stages go with the role through the cascade.
    pub async fn delete_role(&self, id: i64, company_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = ? AND company_id = ?")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_applications_for_role(&self, role_id: i64, company_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE role_id = ? AND company_id = ?",
        )
        .bind(role_id)
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_active_roles(&self, company_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE company_id = ? AND is_active = 1")
                .bind(company_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Stage count of every role of the company, oldest role first
    pub async fn role_stage_counts(&self, company_id: i64) -> Result<Vec<RoleStageUsage>> {
        let rows: Vec<(i64, String, i64)> = sqlx::query_as(
            r#"
            SELECT r.id, r.name, COUNT(s.id)
            FROM roles r
            LEFT JOIN stages s ON s.role_id = r.id
            WHERE r.company_id = ?
            GROUP BY r.id, r.name
            ORDER BY r.created_at ASC, r.id ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(role_id, role_name, stage_count)| RoleStageUsage {
                role_id,
                role_name,
                stage_count,
            })
            .collect())
    }
}
