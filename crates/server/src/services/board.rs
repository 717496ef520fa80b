//! Unauthenticated job board. Only active roles are visible or open for applications.

use serde::Serialize;
use shared::FormData;

use crate::{
    db::{Company, Database, Role, RoleWithStages},
    error::AppError,
    services::applications::{self, UploadedFile},
    storage::ObjectStorage,
};

/// Company profile as shown to candidates
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCompany {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

impl From<Company> for PublicCompany {
    fn from(c: Company) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            logo_url: c.logo_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicBoard {
    pub company: PublicCompany,
    pub roles: Vec<Role>,
}

async fn find_company(db: &Database, slug: &str) -> Result<Company, AppError> {
    db.get_company_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))
}

async fn find_open_role(db: &Database, company_id: i64, role_id: i64) -> Result<Role, AppError> {
    db.get_role(role_id, company_id)
        .await?
        .filter(|r| r.is_active)
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
}

pub async fn board(db: &Database, slug: &str) -> Result<PublicBoard, AppError> {
    let company = find_company(db, slug).await?;
    let roles = db.list_active_roles(company.id).await?;
    Ok(PublicBoard {
        company: company.into(),
        roles,
    })
}

pub async fn role(db: &Database, slug: &str, role_id: i64) -> Result<RoleWithStages, AppError> {
    let company = find_company(db, slug).await?;
    let role = find_open_role(db, company.id, role_id).await?;
    let stages = db.list_stages(role.id).await?;
    Ok(RoleWithStages { role, stages })
}

pub async fn apply(
    db: &Database,
    storage: &dyn ObjectStorage,
    slug: &str,
    role_id: i64,
    form_data: FormData,
    resume: Option<UploadedFile>,
) -> Result<i64, AppError> {
    let company = find_company(db, slug).await?;
    let role = find_open_role(db, company.id, role_id).await?;

    let application = applications::submit(db, storage, role.id, company.id, form_data, resume).await?;
    Ok(application.id)
}
