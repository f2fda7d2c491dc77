use async_trait::async_trait;
use tracing::info;

/// Outbound notification boundary for activation and reset links.
///
/// Delivery failures are logged by callers and never fail the originating
/// request; the account/token write has already committed by the time a
/// message is handed to the mailer.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation(&self, to: &str, first_name: &str, link: &str) -> anyhow::Result<()>;
    async fn send_password_reset(&self, to: &str, link: &str) -> anyhow::Result<()>;
}

/// Local dev mailer that logs the link instead of sending real email.
/// Production deployments implement `Mailer` over their SMTP relay or API.
#[derive(Clone, Debug)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_activation(&self, to: &str, first_name: &str, link: &str) -> anyhow::Result<()> {
        info!(to_email = %to, first_name = %first_name, link = %link, "activation email stub");
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, link: &str) -> anyhow::Result<()> {
        info!(to_email = %to, link = %link, "password reset email stub");
        Ok(())
    }
}
