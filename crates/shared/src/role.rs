use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const FULL_NAME_FIELD: &str = "full_name";
pub const EMAIL_FIELD: &str = "email";

/// Synthetic field id under which the uploaded resume is stored
pub const RESUME_FIELD: &str = "resume";

pub const DEFAULT_STAGE_COLOR: &str = "#6366f1";
pub const DEFAULT_STAGE_ICON: &str = "flag";

/// Input type of an application form field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Tel,
    Url,
    File,
    Checkbox,
    Select,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    FullTime,
    PartTime,
    Hybrid,
    Remote,
}

impl RoleType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleType::FullTime => "full_time",
            RoleType::PartTime => "part_time",
            RoleType::Hybrid => "hybrid",
            RoleType::Remote => "remote",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_time" => Ok(RoleType::FullTime),
            "part_time" => Ok(RoleType::PartTime),
            "hybrid" => Ok(RoleType::Hybrid),
            "remote" => Ok(RoleType::Remote),
            other => Err(format!("unknown role type: {}", other)),
        }
    }
}

/// One field of a role's application form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub system: bool,
}

impl CustomField {
    fn system(id: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            required: true,
            placeholder: None,
            options: None,
            system: true,
        }
    }
}

/// The two reserved fields every role form carries
pub fn system_fields() -> Vec<CustomField> {
    vec![
        CustomField::system(FULL_NAME_FIELD, "Full Name", FieldType::Text),
        CustomField::system(EMAIL_FIELD, "Email", FieldType::Email),
    ]
}

pub fn is_system_field(id: &str) -> bool {
    id == FULL_NAME_FIELD || id == EMAIL_FIELD
}

/// Re-inject the system fields at the head of the list.
///
/// A submitted entry for a system id only contributes its label; type,
/// `required` and `system` always come from the built-in definition.
pub fn ensure_system_fields(fields: Vec<CustomField>) -> Vec<CustomField> {
    let mut result: Vec<CustomField> = system_fields()
        .into_iter()
        .map(|mut def| {
            if let Some(submitted) = fields.iter().find(|f| f.id == def.id) {
                if !submitted.label.trim().is_empty() {
                    def.label = submitted.label.clone();
                }
            }
            def
        })
        .collect();

    result.extend(fields.into_iter().filter(|f| !is_system_field(&f.id)));
    result
}

/// Structural checks on a submitted field list
pub fn validate_custom_fields(fields: &[CustomField]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.id.trim().is_empty() {
            return Err("Custom field id must not be empty".to_string());
        }
        if field.label.trim().is_empty() {
            return Err(format!("Custom field '{}' must have a label", field.id));
        }
        if !seen.insert(field.id.as_str()) {
            return Err(format!("Duplicate custom field id '{}'", field.id));
        }
        if field.field_type == FieldType::Select
            && field.options.as_ref().map_or(true, |o| o.is_empty())
        {
            return Err(format!("Select field '{}' needs at least one option", field.id));
        }
    }
    Ok(())
}

/// Stage provisioned with every new role
#[derive(Debug, Clone, Copy)]
pub struct DefaultStage {
    pub name: &'static str,
    pub order: i64,
    pub color: &'static str,
    pub icon: &'static str,
}

pub const DEFAULT_STAGES: [DefaultStage; 3] = [
    DefaultStage { name: "Pending", order: 1, color: "#f97316", icon: "clock" },
    DefaultStage { name: "Accepted", order: 2, color: "#22c55e", icon: "check" },
    DefaultStage { name: "Rejected", order: 3, color: "#f43f5e", icon: "flag" },
];

/// Palette a new role's color is drawn from
pub const ROLE_COLORS: &[&str] = &[
    "#0ea5e9", "#0891b2", "#0f766e", "#10b981", "#22c55e", "#65a30d", "#84cc16", "#a3e635",
    "#eab308", "#ca8a04", "#f59e0b", "#f97316", "#fb923c", "#f43f5e", "#e11d48", "#ec4899",
    "#db2777", "#c084fc", "#8b5cf6", "#7c3aed", "#6366f1", "#4f46e5", "#4338ca", "#3b82f6",
    "#2563eb", "#1d4ed8", "#06b6d4", "#14b8a6", "#38bdf8", "#0f172a", "#475569", "#94a3b8",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: &str, label: &str, field_type: FieldType) -> CustomField {
        CustomField {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            required: false,
            placeholder: None,
            options: None,
            system: false,
        }
    }

    #[test]
    fn test_system_fields_injected_when_missing() {
        let fields = ensure_system_fields(vec![field("github", "GitHub", FieldType::Url)]);
        let ids: Vec<_> = fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["full_name", "email", "github"]);
        assert!(fields[0].system && fields[0].required);
        assert!(fields[1].system && fields[1].required);
    }

    #[test]
    fn test_system_field_label_override_kept_other_changes_dropped() {
        let mut tampered = field("email", "Work email", FieldType::Textarea);
        tampered.required = false;
        tampered.system = false;

        let fields = ensure_system_fields(vec![tampered]);
        let email = fields.iter().find(|f| f.id == "email").unwrap();
        assert_eq!(email.label, "Work email");
        assert_eq!(email.field_type, FieldType::Email);
        assert!(email.required);
        assert!(email.system);
        assert_eq!(fields.iter().filter(|f| f.id == "email").count(), 1);
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty_selects() {
        let dup = vec![field("a", "A", FieldType::Text), field("a", "A2", FieldType::Text)];
        assert!(validate_custom_fields(&dup).is_err());

        let select = vec![field("level", "Level", FieldType::Select)];
        assert!(validate_custom_fields(&select).is_err());

        let mut ok = field("level", "Level", FieldType::Select);
        ok.options = Some(vec!["Junior".into(), "Senior".into()]);
        assert!(validate_custom_fields(&[ok]).is_ok());
    }

    #[test]
    fn test_custom_field_wire_format() {
        let json = r#"{"id":"cv","label":"CV","type":"file","required":true}"#;
        let parsed: CustomField = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.field_type, FieldType::File);
        assert!(parsed.required);
        assert!(!parsed.system);
    }

    #[test]
    fn test_default_stages_are_ordered() {
        let orders: Vec<_> = DEFAULT_STAGES.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(DEFAULT_STAGES[0].name, "Pending");
    }
}
