use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{CustomField, FormData};
use sqlx::{types::Json, FromRow};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub company_id: i64,
    pub created_by_user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub role_type: String,
    pub seniority_level: Option<String>,
    pub requirements: Json<Vec<String>>,
    pub is_active: bool,
    pub custom_fields: Json<Vec<CustomField>>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleWithStages {
    #[serde(flatten)]
    pub role: Role,
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: i64,
    pub role_id: i64,
    pub name: String,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub color: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub role_id: i64,
    pub company_id: i64,
    pub current_stage_id: Option<i64>,
    pub form_data: Json<FormData>,
    pub resume_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Application joined with its role and current stage
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    #[sqlx(flatten)]
    pub application: Application,
    pub role_name: String,
    pub role_color: String,
    pub stage_name: Option<String>,
    pub stage_color: Option<String>,
    pub stage_icon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    #[serde(flatten)]
    pub application: Application,
    pub role: RoleSummary,
    pub current_stage: Option<StageSummary>,
}

impl From<ApplicationRow> for ApplicationSummary {
    fn from(row: ApplicationRow) -> Self {
        let current_stage = match (
            row.application.current_stage_id,
            row.stage_name,
            row.stage_color,
            row.stage_icon,
        ) {
            (Some(id), Some(name), Some(color), Some(icon)) => {
                Some(StageSummary { id, name, color, icon })
            }
            _ => None,
        };

        Self {
            role: RoleSummary {
                id: row.application.role_id,
                name: row.role_name,
                color: row.role_color,
            },
            current_stage,
            application: row.application,
        }
    }
}

/// Application aggregate with its full timeline, oldest entry first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub summary: ApplicationSummary,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub id: i64,
    pub application_id: i64,
    pub company_id: i64,
    pub stage_id: Option<i64>,
    pub stage_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub id: i64,
    pub application_id: i64,
    pub company_id: i64,
    pub sender_user_id: i64,
    #[serde(rename = "to")]
    pub to_address: String,
    pub subject: String,
    pub body: String,
    pub html: String,
    pub template_id: Option<i64>,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
