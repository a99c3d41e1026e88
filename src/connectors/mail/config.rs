use std::fmt;

use lettre::Address;
use lettre::message::Mailbox;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{Invocation, Secret, non_empty, require_str};
use crate::errors::{ActionError, ActionResult};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .unwrap()
});

/// Syntactic address check, case-insensitive.
pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(&email.trim().to_lowercase())
}

/// Accepts only addresses that pass [`validate_email`] and that the message builder can use.
fn parse_address(email: &str) -> ActionResult<Address> {
    if !validate_email(email) {
        return Err(invalid_email(email));
    }
    email.parse().map_err(|_| invalid_email(email))
}

fn parse_mailbox(email: &str) -> ActionResult<Mailbox> {
    if !validate_email(email) {
        return Err(invalid_email(email));
    }
    email.parse().map_err(|_| invalid_email(email))
}

fn invalid_email(email: &str) -> ActionError {
    ActionError::config(format!("The email {email} is not valid. Please check it."))
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Implicit TLS (usually port 465). Otherwise STARTTLS is used when offered.
    pub secure: bool,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl SmtpSettings {
    pub const FIELDS: [&'static str; 5] = ["host", "port", "secure", "user", "password"];

    pub fn from_secret(secret: &Secret) -> ActionResult<Self> {
        let field = |name: &str, message: &str| {
            secret
                .get(name)
                .map(str::to_string)
                .ok_or_else(|| ActionError::config(message))
        };
        let host = field(
            "host",
            "No email host defined. This could be something like smtp.example.com.",
        )?;
        let port = field(
            "port",
            "No email port defined. This could be something like 587 or 465.",
        )?;
        let secure = field(
            "secure",
            "No email secure option defined. This could be true or false.",
        )?;
        let user = field("user", "No email user defined. This is your email username.")?;
        let password = field(
            "password",
            "No email password defined. This is your email password.",
        )?;

        let port = port
            .trim()
            .parse()
            .map_err(|_| ActionError::config(format!("The email port {port} is not valid.")))?;
        Ok(Self {
            host,
            port,
            secure: secure.trim().eq_ignore_ascii_case("true"),
            user,
            password,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailArgs {
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub attachment_name: Option<String>,
    pub attachment_url: Option<String>,
}

/// Attachment to download and attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentSource {
    pub name: String,
    pub url: String,
}

/// A fully validated mail, ready to be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub from_name: String,
    pub from_email: Address,
    pub to: Vec<Mailbox>,
    pub subject: String,
    pub html: String,
    pub attachment: Option<AttachmentSource>,
}

impl MailArgs {
    /// Presence checks. Address syntax is checked by [`MailArgs::outgoing`] once the secret
    /// has been validated.
    pub fn check_required(&self) -> ActionResult<()> {
        require_str(
            &self.from_name,
            "No `from` name defined. This could be the name of your company or your employee, for example.",
        )?;
        require_str(&self.from_email, "No `from` email address defined.")?;
        require_str(
            &self.to,
            "No `to` email address defined. You can provide a list of email addresses by just adding them like this: test@test.de, mail@mail.de, ...",
        )?;
        match (non_empty(&self.attachment_name), non_empty(&self.attachment_url)) {
            (Some(_), None) => Err(ActionError::config(
                "You have to define both attachment information. You forgot to define the attachment URL",
            )),
            (None, Some(_)) => Err(ActionError::config(
                "You have to define both attachment information. You forgot to define the attachment name",
            )),
            _ => Ok(()),
        }
    }

    pub fn outgoing(&self) -> ActionResult<Outgoing> {
        self.check_required()?;
        let from_email =
            parse_address(require_str(&self.from_email, "No `from` email address defined.")?.trim())?;

        let to = self
            .to
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|address| parse_mailbox(address.trim()))
            .collect::<ActionResult<Vec<_>>>()?;

        let attachment = match (non_empty(&self.attachment_name), non_empty(&self.attachment_url)) {
            (Some(name), Some(url)) => Some(AttachmentSource {
                name: name.to_string(),
                url: url.to_string(),
            }),
            _ => None,
        };

        Ok(Outgoing {
            from_name: non_empty(&self.from_name).unwrap_or_default().to_string(),
            from_email,
            to,
            subject: self.subject.clone().unwrap_or_default(),
            html: self.message.clone().unwrap_or_default(),
            attachment,
        })
    }
}

pub(super) fn smtp_settings(invocation: &Invocation) -> ActionResult<SmtpSettings> {
    let secret = invocation.secret(
        "No secret defined. You need the secret to proivde the email configuration information.",
    )?;
    SmtpSettings::from_secret(secret)
}
