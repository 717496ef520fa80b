use anyhow::Result;
use chrono::Utc;
use shared::UpdateStageRequest;
use sqlx::{QueryBuilder, Sqlite};

use super::{Database, Stage};

const STAGE_COLUMNS: &str = "id, role_id, name, sort_order, color, icon, created_at";

impl Database {
    /// Stages of a role in pipeline order
    pub async fn list_stages(&self, role_id: i64) -> Result<Vec<Stage>> {
        let stages = sqlx::query_as::<_, Stage>(&format!(
            "SELECT {} FROM stages WHERE role_id = ? ORDER BY sort_order ASC, id ASC",
            STAGE_COLUMNS
        ))
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stages)
    }

    /// Stage lookup restricted to one role. Callers establish that the role
    /// itself belongs to the tenant before trusting the result.
    pub async fn get_stage_for_role(&self, stage_id: i64, role_id: i64) -> Result<Option<Stage>> {
        let stage = sqlx::query_as::<_, Stage>(&format!(
            "SELECT {} FROM stages WHERE id = ? AND role_id = ?",
            STAGE_COLUMNS
        ))
        .bind(stage_id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stage)
    }

    pub async fn count_stages(&self, role_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stages WHERE role_id = ?")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a stage at `order`. When another stage of the role already holds
    /// that position, it and every later stage move down by one first.
    pub async fn insert_stage(
        &self,
        role_id: i64,
        name: &str,
        order: Option<i64>,
        color: &str,
        icon: &str,
    ) -> Result<Stage> {
        let mut tx = self.pool.begin().await?;

        let order = match order {
            Some(order) => {
                let taken: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM stages WHERE role_id = ? AND sort_order = ?",
                )
                .bind(role_id)
                .bind(order)
                .fetch_one(&mut *tx)
                .await?;

                if taken > 0 {
                    sqlx::query(
                        "UPDATE stages SET sort_order = sort_order + 1 WHERE role_id = ? AND sort_order >= ?",
                    )
                    .bind(role_id)
                    .bind(order)
                    .execute(&mut *tx)
                    .await?;
                }
                order
            }
            None => {
                let max: Option<i64> =
                    sqlx::query_scalar("SELECT MAX(sort_order) FROM stages WHERE role_id = ?")
                        .bind(role_id)
                        .fetch_one(&mut *tx)
                        .await?;
                max.unwrap_or(0).max(0) + 1
            }
        };

        let stage = sqlx::query_as::<_, Stage>(&format!(
            "INSERT INTO stages (role_id, name, sort_order, color, icon, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            STAGE_COLUMNS
        ))
        .bind(role_id)
        .bind(name)
        .bind(order)
        .bind(color)
        .bind(icon)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stage)
    }

    /// Single-row write; concurrent reorders resolve last-write-wins per stage.
    pub async fn update_stage(
        &self,
        stage_id: i64,
        role_id: i64,
        patch: &UpdateStageRequest,
    ) -> Result<Option<Stage>> {
        let has_changes = patch.name.is_some()
            || patch.order.is_some()
            || patch.color.is_some()
            || patch.icon.is_some();

        if has_changes {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE stages SET ");
            let mut set = qb.separated(", ");
            if let Some(name) = &patch.name {
                set.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(order) = patch.order {
                set.push("sort_order = ").push_bind_unseparated(order);
            }
            if let Some(color) = &patch.color {
                set.push("color = ").push_bind_unseparated(color.clone());
            }
            if let Some(icon) = &patch.icon {
                set.push("icon = ").push_bind_unseparated(icon.clone());
            }

            qb.push(" WHERE id = ")
                .push_bind(stage_id)
                .push(" AND role_id = ")
                .push_bind(role_id);
            qb.build().execute(&self.pool).await?;
        }

        self.get_stage_for_role(stage_id, role_id).await
    }

    /// Detach every application parked on the stage, then delete it, as one
    /// transaction. Returns the number of applications detached.
    pub async fn delete_stage_detaching(&self, stage_id: i64, role_id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query(
            "UPDATE applications SET current_stage_id = NULL, updated_at = ? WHERE current_stage_id = ?",
        )
        .bind(Utc::now())
        .bind(stage_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM stages WHERE id = ? AND role_id = ?")
            .bind(stage_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(detached)
    }

    /// Rewrite the orders of a role's stages to 1..n following `stage_ids`.
    pub async fn reorder_stages(&self, role_id: i64, stage_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (index, stage_id) in stage_ids.iter().enumerate() {
            sqlx::query("UPDATE stages SET sort_order = ? WHERE id = ? AND role_id = ?")
                .bind(index as i64 + 1)
                .bind(stage_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
