use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::role::{CustomField, FieldType, EMAIL_FIELD, FULL_NAME_FIELD};

/// A single submitted form value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FormValue {
    Text(String),
    Flag(bool),
}

impl FormValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::Flag(_) => None,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, FormValue::Text(s) if s.trim().is_empty())
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Text(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::Text(s)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Flag(b)
    }
}

/// Candidate answers keyed by custom field id
pub type FormData = BTreeMap<String, FormValue>;

#[derive(Debug, Error, PartialEq)]
pub enum FormDataError {
    #[error("{0} is required")]
    MissingField(String),

    #[error("Unknown form field '{0}'")]
    UnknownField(String),
}

/// Text value of a field, if present
pub fn text_value<'a>(data: &'a FormData, field_id: &str) -> Option<&'a str> {
    data.get(field_id).and_then(FormValue::as_str)
}

/// Check submitted answers against the role's form.
///
/// Keys must be field ids of the form; the two system fields must be non-empty;
/// other required fields must be present unless they are file uploads, which
/// travel outside `formData`.
pub fn validate_form_data(fields: &[CustomField], data: &FormData) -> Result<(), FormDataError> {
    for required in [FULL_NAME_FIELD, EMAIL_FIELD] {
        match data.get(required) {
            Some(value) if !value.is_blank() => {}
            _ => return Err(FormDataError::MissingField(required.to_string())),
        }
    }

    for key in data.keys() {
        if !fields.iter().any(|f| &f.id == key) {
            return Err(FormDataError::UnknownField(key.clone()));
        }
    }

    for field in fields {
        if !field.required || field.field_type == FieldType::File {
            continue;
        }
        match data.get(&field.id) {
            Some(value) if !value.is_blank() => {}
            _ => return Err(FormDataError::MissingField(field.id.clone())),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::{ensure_system_fields, CustomField};

    fn form() -> Vec<CustomField> {
        ensure_system_fields(vec![
            CustomField {
                id: "portfolio".into(),
                label: "Portfolio".into(),
                field_type: FieldType::Url,
                required: true,
                placeholder: None,
                options: None,
                system: false,
            },
            CustomField {
                id: "cv".into(),
                label: "CV".into(),
                field_type: FieldType::File,
                required: true,
                placeholder: None,
                options: None,
                system: false,
            },
            CustomField {
                id: "relocate".into(),
                label: "Willing to relocate".into(),
                field_type: FieldType::Checkbox,
                required: false,
                placeholder: None,
                options: None,
                system: false,
            },
        ])
    }

    fn answers() -> FormData {
        let mut data = FormData::new();
        data.insert("full_name".into(), "Ada Lovelace".into());
        data.insert("email".into(), "ada@example.com".into());
        data.insert("portfolio".into(), "https://ada.dev".into());
        data.insert("relocate".into(), true.into());
        data
    }

    #[test]
    fn test_valid_answers() {
        assert_eq!(validate_form_data(&form(), &answers()), Ok(()));
    }

    #[test]
    fn test_missing_system_field() {
        let mut data = answers();
        data.insert("email".into(), "  ".into());
        assert_eq!(
            validate_form_data(&form(), &data),
            Err(FormDataError::MissingField("email".into()))
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut data = answers();
        data.insert("salary".into(), "lots".into());
        assert_eq!(
            validate_form_data(&form(), &data),
            Err(FormDataError::UnknownField("salary".into()))
        );
    }

    #[test]
    fn test_required_custom_field() {
        let mut data = answers();
        data.remove("portfolio");
        assert_eq!(
            validate_form_data(&form(), &data),
            Err(FormDataError::MissingField("portfolio".into()))
        );
    }

    #[test]
    fn test_form_value_untagged() {
        let data: FormData =
            serde_json::from_str(r#"{"full_name":"Ada","relocate":false}"#).unwrap();
        assert_eq!(data["full_name"], FormValue::Text("Ada".into()));
        assert_eq!(data["relocate"], FormValue::Flag(false));
        assert_eq!(text_value(&data, "relocate"), None);
    }
}
