use anyhow::Result;
use chrono::Utc;
use shared::{Plan, UserRole};

use super::{Company, Database, User};

const COMPANY_COLUMNS: &str = "id, name, slug, description, logo_url, plan, created_at";

// Company and user rows are provisioned elsewhere; the pipeline only reads
// them, apart from these inserts used for bootstrapping and tests.
impl Database {
    pub async fn create_company(&self, name: &str, slug: &str, plan: Plan) -> Result<Company> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "INSERT INTO companies (name, slug, plan, created_at) VALUES (?, ?, ?, ?) RETURNING {}",
            COMPANY_COLUMNS
        ))
        .bind(name)
        .bind(slug)
        .bind(plan.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(company)
    }

    pub async fn get_company(&self, id: i64) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE id = ?",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    pub async fn get_company_by_slug(&self, slug: &str) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE slug = ?",
            COMPANY_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    pub async fn set_company_plan(&self, id: i64, plan: Plan) -> Result<()> {
        sqlx::query("UPDATE companies SET plan = ? WHERE id = ?")
            .bind(plan.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn create_user(
        &self,
        company_id: i64,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> Result<User> {
        let role = match role {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        };
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (company_id, name, email, role, created_at) VALUES (?, ?, ?, ?, ?)
             RETURNING id, company_id, name, email, role, created_at",
        )
        .bind(company_id)
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: i64, company_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, company_id, name, email, role, created_at FROM users WHERE id = ? AND company_id = ?",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user_by_email(&self, company_id: i64, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, company_id, name, email, role, created_at FROM users WHERE company_id = ? AND email = ?",
        )
        .bind(company_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
