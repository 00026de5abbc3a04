use botdesk_core::config::SmtpConfig;
use botdesk_core::{BotdeskError, BotdeskResult};
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::identity::SIGN_IN_CODE_TTL_MINUTES;

const SIGN_IN_SUBJECT: &str = "Your Botdesk sign-in code";

/// Delivers one-time sign-in codes over an SMTP relay.
pub struct EmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailSender {
    pub fn new(config: &SmtpConfig) -> BotdeskResult<Self> {
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| BotdeskError::InternalError(format!("invalid smtp from address: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| BotdeskError::InternalError(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    pub async fn send_sign_in_code(&self, to: &str, code: &str, app_url: &str) -> BotdeskResult<()> {
        let message = sign_in_message(self.from.clone(), to, code, app_url)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| BotdeskError::Upstream(format!("failed to send sign-in email: {e}")))?;
        tracing::debug!("sign-in code emailed");
        Ok(())
    }
}

fn sign_in_message(from: Mailbox, to: &str, code: &str, app_url: &str) -> BotdeskResult<Message> {
    let to = to
        .parse::<Mailbox>()
        .map_err(|e| BotdeskError::InvalidRequest(format!("invalid recipient address: {e}")))?;

    let body = format!(
        "Your sign-in code is: {code}\n\n\
         Enter it at:\n{}/login\n\n\
         The code expires in {SIGN_IN_CODE_TTL_MINUTES} minutes and works only once.\n\
         If you did not ask to sign in, ignore this message.",
        app_url.trim_end_matches('/')
    );

    Message::builder()
        .from(from)
        .to(to)
        .subject(SIGN_IN_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| BotdeskError::InternalError(format!("failed to build email: {e}")))
}
