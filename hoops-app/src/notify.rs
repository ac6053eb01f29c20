use crate::config::HoopsConfig;
use error_stack::{Report, ResultExt};
use hoops_core::Notifier;
use hoops_core::model::HoopAttributes;
use hoops_core::result::NotifyError;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, instrument};

const SMTP_PORT: u16 = 25;
const SUBJECT: &str = "[hoops] New hoop added";

/// Emails the configured address whenever a hoop is saved.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// `None` unless the SMTP username, password and host are all configured.
    pub fn from_config(config: &HoopsConfig) -> Result<Option<Self>, Report<NotifyError>> {
        if !config.email_enabled() {
            info!("email settings incomplete, new hoop notifications are disabled");
            return Ok(None);
        }

        let from = config
            .email_sending_email
            .parse::<Mailbox>()
            .change_context(NotifyError)
            .attach("EmailSendingEmail")?;
        let to = config
            .notification_email
            .parse::<Mailbox>()
            .change_context(NotifyError)
            .attach("NotificationEmail")?;

        let transport =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.email_sending_host)
                .port(SMTP_PORT)
                .credentials(Credentials::new(
                    config.email_sending_username.clone(),
                    config.email_sending_password.clone(),
                ))
                .build();

        Ok(Some(Self {
            transport,
            from,
            to,
        }))
    }
}

impl Notifier for SmtpNotifier {
    #[instrument(skip_all, name = "smtp#notify", fields(hoop.id = %hoop.id))]
    async fn notify(&self, hoop: &HoopAttributes) -> Result<(), Report<NotifyError>> {
        let message = new_hoop_message(self.from.clone(), self.to.clone(), hoop)?;
        self.transport
            .send(message)
            .await
            .change_context(NotifyError)?;
        debug!("sent new hoop notification to {}", self.to);
        Ok(())
    }
}

fn new_hoop_message(
    from: Mailbox,
    to: Mailbox,
    hoop: &HoopAttributes,
) -> Result<Message, Report<NotifyError>> {
    Message::builder()
        .from(from)
        .to(to)
        .subject(SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(format!("A new hoop has been added. Its ID is {}", hoop.id))
        .change_context(NotifyError)
}
