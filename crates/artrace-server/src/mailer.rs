use std::time::Duration;

use anyhow::{anyhow, Result};
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use artrace_core::config::SmtpConfig;

/// SMTP delivery for registration verification codes.
///
/// Built once at startup from the optional SMTP config; deployments
/// without SMTP run with `None` and log codes instead.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|_| anyhow!("invalid SMTP sender address: {}", config.sender))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .timeout(Some(Duration::from_secs(5)));
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }

    pub async fn send_verification_code(&self, to: &str, code: &str) -> Result<()> {
        let to: Mailbox = to
            .parse()
            .map_err(|_| anyhow!("invalid recipient address: {to}"))?;
        let email = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject("Your ArTrace verification code")
            .body(format!(
                "Your verification code is {code}. It expires in a few minutes."
            ))
            .map_err(|e| anyhow!("smtp message build failed: {e}"))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| anyhow!("smtp send failed: {e}"))?;
        Ok(())
    }
}
