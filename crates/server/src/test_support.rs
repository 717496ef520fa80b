//! Fixtures shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use shared::{CreateRoleRequest, CustomField, FieldType, FormData, FormValue, Plan, RoleType, UserRole};

use crate::{
    db::Database,
    mailer::{EmailTransport, SendOutcome},
    services::{applications, roles},
    storage::ObjectStorage,
    tenant::TenantContext,
};

/// One company on the team plan with an admin, a plain member and one active role
pub struct Seed {
    pub db: Database,
    pub company_id: i64,
    pub admin: TenantContext,
    pub member: TenantContext,
    pub role_id: i64,
}

pub async fn seed() -> Seed {
    let db = Database::in_memory().await.unwrap();
    seed_into(db).await
}

pub async fn seed_into(db: Database) -> Seed {
    let company = db.create_company("Acme", "acme", Plan::Team).await.unwrap();
    let admin = db
        .create_user(company.id, "Alice Admin", "alice@acme.test", UserRole::Admin)
        .await
        .unwrap();
    let member = db
        .create_user(company.id, "Bob Member", "bob@acme.test", UserRole::User)
        .await
        .unwrap();

    let role = roles::create(&db, company.id, admin.id, role_request("Backend Engineer"))
        .await
        .unwrap();

    Seed {
        company_id: company.id,
        admin: TenantContext {
            company_id: company.id,
            user_id: admin.id,
            role: UserRole::Admin,
        },
        member: TenantContext {
            company_id: company.id,
            user_id: member.id,
            role: UserRole::User,
        },
        role_id: role.role.id,
        db,
    }
}

impl Seed {
    pub async fn create_role(&self, name: &str) -> i64 {
        roles::create(&self.db, self.company_id, self.admin.user_id, role_request(name))
            .await
            .unwrap()
            .role
            .id
    }

    /// Role whose form has an optional text field for every id given
    pub async fn create_role_with_fields(&self, name: &str, field_ids: &[&str]) -> i64 {
        let mut req = role_request(name);
        req.custom_fields = field_ids
            .iter()
            .map(|id| CustomField {
                id: id.to_string(),
                label: id.to_string(),
                field_type: FieldType::Text,
                required: false,
                placeholder: None,
                options: None,
                system: false,
            })
            .collect();
        roles::create(&self.db, self.company_id, self.admin.user_id, req)
            .await
            .unwrap()
            .role
            .id
    }

    pub async fn submit_candidate(&self, full_name: &str) -> i64 {
        applications::submit(
            &self.db,
            &MemoryStorage::default(),
            self.role_id,
            self.company_id,
            candidate_form(full_name),
            None,
        )
        .await
        .unwrap()
        .id
    }

    /// A second tenant, `globex`
    pub async fn other_company(&self) -> i64 {
        if let Some(existing) = self.db.get_company_by_slug("globex").await.unwrap() {
            return existing.id;
        }
        self.db
            .create_company("Globex", "globex", Plan::Team)
            .await
            .unwrap()
            .id
    }
}

pub fn role_request(name: &str) -> CreateRoleRequest {
    CreateRoleRequest {
        name: name.to_string(),
        description: Some("Builds things".to_string()),
        location: Some("Remote".to_string()),
        role_type: RoleType::FullTime,
        seniority_level: None,
        requirements: vec!["Rust".to_string()],
        custom_fields: vec![],
        is_active: true,
    }
}

pub fn candidate_form(full_name: &str) -> FormData {
    let local: String = full_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    let mut form = FormData::new();
    form.insert("full_name".into(), FormValue::from(full_name));
    form.insert("email".into(), FormValue::from(format!("{}@example.com", local)));
    form
}

/// In-process object store
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str) -> Result<String> {
        Ok(format!("memory://{}?token=test", key))
    }
}

/// Storage whose every call fails
pub struct FailingStorage;

#[async_trait]
impl ObjectStorage for FailingStorage {
    async fn upload(&self, _key: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        bail!("storage unavailable")
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        bail!("storage unavailable")
    }

    async fn presigned_get_url(&self, _key: &str) -> Result<String> {
        bail!("storage unavailable")
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub from_display_name: String,
}

/// Transport that accepts everything and remembers it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str, from_display_name: &str) -> SendOutcome {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
            from_display_name: from_display_name.to_string(),
        });
        SendOutcome::sent()
    }
}
