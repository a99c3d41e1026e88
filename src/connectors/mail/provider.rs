use std::sync::Arc;

use async_trait::async_trait;
use lettre::Message;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use super::config::{AttachmentSource, MailArgs, Outgoing, SmtpSettings, smtp_settings};
use super::delivery::MailDelivery;
use crate::connectors::ConnectorContext;
use crate::core::{Action, ConversationState, HttpTransport, Invocation};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

fn build_error(e: impl std::fmt::Display) -> ActionError {
    ActionError::config(format!("Unable to build the email: {e}"))
}

pub struct SendEmailWithAttachment {
    transport: HttpTransport,
    delivery: Arc<dyn MailDelivery>,
}

impl SendEmailWithAttachment {
    pub fn new(ctx: &ConnectorContext, delivery: Arc<dyn MailDelivery>) -> Self {
        Self {
            transport: ctx.transport.clone(),
            delivery,
        }
    }

    async fn download(&self, source: &AttachmentSource) -> ActionResult<SinglePart> {
        debug!(name = %source.name, "Downloading mail attachment");
        let request = self.transport.request(Method::GET, &source.url);
        let bytes = self.transport.send_bytes(request).await?;
        let content_type = ContentType::parse("application/octet-stream").map_err(build_error)?;
        Ok(Attachment::new(source.name.clone()).body(bytes.to_vec(), content_type))
    }

    /// Build the MIME message. Returns it with its generated Message-ID.
    fn compose(
        outgoing: &Outgoing,
        attachment: Option<SinglePart>,
    ) -> ActionResult<(Message, String)> {
        let from = Mailbox::new(Some(outgoing.from_name.clone()), outgoing.from_email.clone());
        let mut builder = Message::builder()
            .from(from)
            .subject(outgoing.subject.clone())
            .message_id(None);
        for mailbox in &outgoing.to {
            builder = builder.to(mailbox.clone());
        }

        let html = SinglePart::html(outgoing.html.clone());
        let message = match attachment {
            Some(part) => builder.multipart(MultiPart::mixed().singlepart(html).singlepart(part)),
            None => builder.singlepart(html),
        }
        .map_err(build_error)?;

        let message_id = message
            .headers()
            .get_raw("Message-ID")
            .unwrap_or_default()
            .to_string();
        Ok((message, message_id))
    }

    async fn send(&self, settings: &SmtpSettings, outgoing: &Outgoing) -> ActionResult<Value> {
        let attachment = match &outgoing.attachment {
            Some(source) => Some(self.download(source).await?),
            None => None,
        };
        let (message, message_id) = Self::compose(outgoing, attachment)?;
        self.delivery.deliver(settings, message).await?;
        Ok(Value::String(format!("Message sent: {message_id}")))
    }
}

#[async_trait]
impl Action for SendEmailWithAttachment {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("mail", "send_email_with_attachment")
            .with_display_name("Send Email With Attachment")
            .with_description("Sends an HTML email, optionally attaching a file downloaded from a URL")
            .with_aliases(&["sendEmailWithAttachment"])
            .with_secret_fields(&SmtpSettings::FIELDS)
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let settings = smtp_settings(&invocation)?;
        let args: MailArgs = invocation.args()?;
        args.check_required()?;
        let policy = invocation.policy()?;
        policy.require_key("No context store name defined.")?;
        let outgoing = args.outgoing()?;

        info!(recipients = outgoing.to.len(), attachment = outgoing.attachment.is_some(), "Sending email");
        let outcome = self.send(&settings, &outgoing).await;
        policy.settle(state, outcome)
    }
}
