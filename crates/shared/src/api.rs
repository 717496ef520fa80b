use serde::{Deserialize, Serialize};

use crate::role::{validate_custom_fields, CustomField, RoleType};

const MAX_ROLE_NAME: usize = 100;
const MAX_DESCRIPTION: usize = 2000;

// ============================================================================
// Envelope
// ============================================================================

/// Success body of every JSON endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

/// Membership role of an authenticated user inside their company
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    User,
}

// ============================================================================
// Roles and stages
// ============================================================================

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub role_type: RoleType,
    #[serde(default)]
    pub seniority_level: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Role name is required".to_string());
    }
    if name.chars().count() > MAX_ROLE_NAME {
        return Err(format!("Role name must be at most {} characters", MAX_ROLE_NAME));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), String> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION => Err(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION
        )),
        _ => Ok(()),
    }
}

impl CreateRoleRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_description(self.description.as_deref())?;
        validate_custom_fields(&self.custom_fields)
    }
}

/// Partial role update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub role_type: Option<RoleType>,
    pub seniority_level: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub custom_fields: Option<Vec<CustomField>>,
    pub is_active: Option<bool>,
}

impl UpdateRoleRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        validate_description(self.description.as_deref())?;
        if let Some(fields) = &self.custom_fields {
            validate_custom_fields(fields)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateStageRequest {
    pub name: String,
    pub order: Option<i64>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStageRequest {
    pub name: Option<String>,
    pub order: Option<i64>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderStagesRequest {
    pub stage_ids: Vec<i64>,
}

// ============================================================================
// Applications
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilter {
    pub role_id: Option<i64>,
    pub search: Option<String>,
}

/// `stageId: null` takes the application out of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveStageRequest {
    pub stage_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTimelineRequest {
    pub stage_id: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedApplication {
    pub id: i64,
}

// ============================================================================
// Email
// ============================================================================

/// Outcome of a candidate email, as reported by the transport
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Sent,
    Failed,
}

impl EmailStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub template_id: Option<i64>,
}

impl SendEmailRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !self.to.contains('@') {
            return Err("A valid recipient address is required".to_string());
        }
        if self.template_id.is_none() && self.subject.trim().is_empty() {
            return Err("Subject is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub status: EmailStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmailTemplateRequest {
    pub name: String,
    pub subject: String,
    pub body: String,
}

impl CreateEmailTemplateRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Template name is required".to_string());
        }
        if self.subject.trim().is_empty() {
            return Err("Template subject is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEmailTemplateRequest {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_role_defaults() {
        let req: CreateRoleRequest =
            serde_json::from_str(r#"{"name":"Backend Engineer","type":"full_time"}"#).unwrap();
        assert!(req.is_active);
        assert!(req.custom_fields.is_empty());
        assert!(req.requirements.is_empty());
        assert_eq!(req.role_type, RoleType::FullTime);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_create_role_rejects_blank_name() {
        let req: CreateRoleRequest =
            serde_json::from_str(r#"{"name":"  ","type":"remote"}"#).unwrap();
        assert_eq!(req.validate().unwrap_err(), "Role name is required");
    }

    #[test]
    fn test_move_stage_null() {
        let req: MoveStageRequest = serde_json::from_str(r#"{"stageId":null}"#).unwrap();
        assert_eq!(req.stage_id, None);
        let req: MoveStageRequest = serde_json::from_str(r#"{"stageId":7}"#).unwrap();
        assert_eq!(req.stage_id, Some(7));
    }

    #[test]
    fn test_envelope_serialization() {
        let json = serde_json::to_string(&ApiResponse::ok(SendEmailResponse {
            status: EmailStatus::Failed,
        }))
        .unwrap();
        assert_eq!(json, r#"{"success":true,"data":{"status":"failed"}}"#);
    }

    #[test]
    fn test_send_email_validation() {
        let req = SendEmailRequest {
            to: "not-an-address".into(),
            subject: "Hi".into(),
            body: "".into(),
            template_id: None,
        };
        assert!(req.validate().is_err());

        let templated = SendEmailRequest {
            to: "ada@example.com".into(),
            subject: "".into(),
            body: "".into(),
            template_id: Some(3),
        };
        assert!(templated.validate().is_ok());
    }
}
