pub mod templates;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// Delivers password reset links to users.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_password_reset(
        &self,
        to_email: &str,
        reset_url: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), String>;
}

/// Writes the reset link to the log. Used when no SMTP relay is configured.
pub struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn send_password_reset(
        &self,
        to_email: &str,
        reset_url: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), String> {
        tracing::warn!(
            email = %to_email,
            expires_at = %expires_at.to_rfc3339(),
            "SMTP not configured. Password reset link: {reset_url}"
        );
        Ok(())
    }
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

#[async_trait]
impl ResetNotifier for SmtpNotifier {
    async fn send_password_reset(
        &self,
        to_email: &str,
        reset_url: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), String> {
        let expires = expires_at.format("%Y-%m-%d %H:%M UTC").to_string();
        let html = templates::render_password_reset(reset_url, &expires);
        self.send(to_email, "Reset your DeliveryDesk password", &html)
            .await
    }
}
