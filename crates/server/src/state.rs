use crate::{
    config::Config,
    db::Database,
    mailer::{DisabledMailer, EmailTransport, SmtpMailer},
    storage::FileStorage,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub storage: Arc<FileStorage>,
    pub mailer: Arc<dyn EmailTransport>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        let storage = FileStorage::new(&config.storage, &config.auth.jwt_secret);
        let mailer: Arc<dyn EmailTransport> = if config.smtp.enabled {
            Arc::new(SmtpMailer::new(config.smtp.clone()))
        } else {
            Arc::new(DisabledMailer)
        };

        Self {
            db,
            config,
            storage: Arc::new(storage),
            mailer,
        }
    }
}
