use anyhow::Result;
use serde::{Deserialize, Serialize};
use shared::Plan;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded files are written under
    pub path: String,
    /// Externally reachable base URL of this server, used in presigned links
    pub public_url: String,
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub enabled: bool,
    /// Use local sendmail binary instead of SMTP server
    #[serde(default = "default_true")]
    pub use_sendmail: bool,
    /// SMTP server host (only used if use_sendmail is false)
    #[serde(default)]
    pub host: String,
    /// SMTP server port (only used if use_sendmail is false)
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username (only used if use_sendmail is false)
    #[serde(default)]
    pub username: String,
    /// SMTP password (only used if use_sendmail is false)
    #[serde(default)]
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

/// Company and admin created on startup when missing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub company_name: String,
    pub company_slug: String,
    #[serde(default = "default_plan")]
    pub plan: Plan,
    pub admin_name: String,
    pub admin_email: String,
}

fn default_plan() -> Plan { Plan::Team }
fn default_true() -> bool { true }
fn default_smtp_port() -> u16 { 587 }
fn default_presign_expiry() -> u64 { 900 }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./data/files".to_string(),
            public_url: "http://localhost:8080".to_string(),
            presign_expiry_secs: default_presign_expiry(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            use_sendmail: true,
            host: "".to_string(),
            port: 587,
            username: "".to_string(),
            password: "".to_string(),
            from_email: "noreply@hiring.local".to_string(),
            from_name: "Hiring".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: "./data/hiring.db".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                token_expiry_hours: 24,
            },
            storage: StorageConfig::default(),
            smtp: SmtpConfig::default(),
            bootstrap: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Try to load from environment variable
        if let Ok(path) = std::env::var("HIRING_CONFIG") {
            return Self::load_from_path(&PathBuf::from(path));
        }

        let default_paths = vec![
            PathBuf::from("hiring-server.toml"),
            PathBuf::from("config/hiring-server.toml"),
            PathBuf::from("/etc/hiring/server.toml"),
        ];

        for path in default_paths {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        tracing::warn!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_fills_optional_sections() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [database]
            path = "/tmp/hiring.db"

            [auth]
            jwt_secret = "s3cret"
            token_expiry_hours = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.presign_expiry_secs, 900);
        assert!(!config.smtp.enabled);
    }

    #[test]
    fn test_storage_expiry_default_applies_inside_section() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            path = "hiring.db"

            [auth]
            jwt_secret = "x"
            token_expiry_hours = 1

            [storage]
            path = "/var/lib/hiring"
            public_url = "https://jobs.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.public_url, "https://jobs.example.com");
        assert_eq!(config.storage.presign_expiry_secs, 900);
    }

    #[test]
    fn test_bootstrap_section() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            path = "hiring.db"

            [auth]
            jwt_secret = "x"
            token_expiry_hours = 1

            [bootstrap]
            company_name = "Acme"
            company_slug = "acme"
            plan = "ultimate"
            admin_name = "Alice"
            admin_email = "alice@acme.test"
            "#,
        )
        .unwrap();

        let bootstrap = config.bootstrap.unwrap();
        assert_eq!(bootstrap.plan, Plan::Ultimate);
        assert_eq!(bootstrap.company_slug, "acme");
        assert!(Config::default().bootstrap.is_none());
    }
}
