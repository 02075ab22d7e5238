use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::error::{AppError, Result};
use crate::state::EmailConfig;

/// Outgoing mail. The console backend only logs what would have been sent.
#[derive(Clone)]
pub enum Mailer {
    Console {
        from: String,
    },
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    },
}

impl Mailer {
    pub fn from_config(config: &EmailConfig) -> anyhow::Result<Self> {
        if config.backend != "smtp" {
            return Ok(Mailer::Console {
                from: config.from.clone(),
            });
        }

        let host = config
            .host
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("EMAIL_HOST must be set for the smtp backend"))?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.port);
        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Mailer::Smtp {
            transport: builder.build(),
            from: config.from.parse()?,
        })
    }

    /// Address used as sender and signature.
    pub fn sender(&self) -> String {
        match self {
            Mailer::Console { from } => from.clone(),
            Mailer::Smtp { from, .. } => from.email.to_string(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        match self {
            Mailer::Console { from } => {
                tracing::info!(
                    "Email from {} to {}\nSubject: {}\n\n{}",
                    from,
                    to,
                    subject,
                    body
                );
                Ok(())
            }
            Mailer::Smtp { transport, from } => {
                let recipient: Mailbox = to
                    .parse()
                    .map_err(|e| AppError::Mail(format!("invalid recipient {}: {}", to, e)))?;

                let email = Message::builder()
                    .from(from.clone())
                    .to(recipient)
                    .subject(subject)
                    .body(body.to_string())
                    .map_err(|e| AppError::Mail(e.to_string()))?;

                transport
                    .send(email)
                    .await
                    .map_err(|e| AppError::Mail(e.to_string()))?;
                Ok(())
            }
        }
    }
}
