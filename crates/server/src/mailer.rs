use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use shared::EmailStatus;

use crate::config::SmtpConfig;

/// What the transport reports back for one message
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    pub status: EmailStatus,
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn sent() -> Self {
        Self { status: EmailStatus::Sent, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { status: EmailStatus::Failed, error: Some(error.into()) }
    }
}

/// Outbound email delivery. Failures are reported in the outcome, never raised.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str, from_display_name: &str) -> SendOutcome;
}

/// Delivery through the local sendmail binary or an SMTP relay
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    async fn deliver(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        from_display_name: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let from_name = if from_display_name.is_empty() {
            self.config.from_name.as_str()
        } else {
            from_display_name
        };

        let email = Message::builder()
            .from(format!("{} <{}>", from_name, self.config.from_email).parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;

        if self.config.use_sendmail {
            let mailer = AsyncSendmailTransport::<Tokio1Executor>::new();
            mailer.send(email).await?;
        } else {
            let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());
            let mailer: AsyncSmtpTransport<Tokio1Executor> =
                AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)?
                    .credentials(creds)
                    .port(self.config.port)
                    .build();
            mailer.send(email).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str, from_display_name: &str) -> SendOutcome {
        match self.deliver(to, subject, html, from_display_name).await {
            Ok(()) => {
                tracing::info!("Email sent to {}", to);
                SendOutcome::sent()
            }
            Err(e) => {
                tracing::error!("Failed to send email to {}: {}", to, e);
                SendOutcome::failed(e.to_string())
            }
        }
    }
}

/// Used when SMTP is switched off in the config
pub struct DisabledMailer;

#[async_trait]
impl EmailTransport for DisabledMailer {
    async fn send(&self, to: &str, _subject: &str, _html: &str, _from: &str) -> SendOutcome {
        tracing::warn!("SMTP not configured, email to {} not sent", to);
        SendOutcome::failed("email transport disabled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_reports_failure() {
        let outcome = DisabledMailer
            .send("ada@example.com", "Hello", "<p>Hi</p>", "Acme")
            .await;
        assert_eq!(outcome.status, EmailStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("email transport disabled"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_a_failed_outcome() {
        let mailer = SmtpMailer::new(SmtpConfig::default());
        let outcome = mailer.send("not an address", "Hello", "<p>Hi</p>", "Acme").await;
        assert_eq!(outcome.status, EmailStatus::Failed);
        assert!(outcome.error.is_some());
    }
}
