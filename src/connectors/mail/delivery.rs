use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::config::SmtpSettings;
use crate::errors::{ActionError, ActionResult};

/// Hands a finished message to a mail server.
#[async_trait]
pub trait MailDelivery: Send + Sync {
    async fn deliver(&self, settings: &SmtpSettings, message: Message) -> ActionResult<()>;
}

/// SMTP submission with `lettre`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpDelivery;

fn smtp_error(e: impl std::fmt::Display) -> ActionError {
    ActionError::Provider(format!("SMTP delivery failed: {e}"))
}

#[async_trait]
impl MailDelivery for SmtpDelivery {
    async fn deliver(&self, settings: &SmtpSettings, message: Message) -> ActionResult<()> {
        let credentials = Credentials::new(settings.user.clone(), settings.password.clone());
        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host).map_err(smtp_error)?
        } else {
            let tls = TlsParameters::new(settings.host.clone()).map_err(smtp_error)?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .tls(Tls::Opportunistic(tls))
        };
        let mailer = builder
            .port(settings.port)
            .credentials(credentials)
            .build();

        let response = mailer.send(message).await.map_err(smtp_error)?;
        info!(
            host = %settings.host,
            code = %response.code(),
            "Mail accepted by SMTP server"
        );
        Ok(())
    }
}
