use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::core::{require_str, string_list};
use crate::errors::{ActionError, ActionResult};

pub(super) const NO_ACCESS_TOKEN: &str =
    "No access token defined. Please use the Azure Custom Module for authenticating the user.";

/// Whose data a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSource {
    Me,
    All,
    Specific,
}

impl UserSource {
    fn parse(raw: Option<&str>) -> ActionResult<Self> {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("me") => Ok(UserSource::Me),
            Some("all") => Ok(UserSource::All),
            Some("specific person") | Some("specific") => Ok(UserSource::Specific),
            Some(other) if !other.is_empty() => Err(ActionError::config(format!(
                "Unknown user source '{other}'. Use 'me', 'all' or 'specific person'."
            ))),
            _ => Err(ActionError::config(
                "No user source defined. If you want to get your own information, use 'me', otherwise get the information of all users by selecting 'all'.",
            )),
        }
    }
}

/// Arguments of every Graph action. Each action reads the subset it needs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphArgs {
    pub access_token: Option<String>,
    pub user_source: Option<String>,
    pub user_mail: Option<String>,
    #[serde(alias = "recipient")]
    pub recipients: Option<Value>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub time_zone: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub attendees: Option<Value>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_addresses: Option<Value>,
    pub business_phones: Option<Value>,
}

/// One Graph call, relative to the API root.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl GraphRequest {
    fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

impl GraphArgs {
    pub fn access_token(&self) -> ActionResult<&str> {
        require_str(&self.access_token, NO_ACCESS_TOKEN)
    }

    fn user_mail(&self) -> ActionResult<&str> {
        let mail = require_str(
            &self.user_mail,
            "You have to define the user's mail who you want to search for.",
        )?;
        if mail.contains(['/', '?', '#']) {
            return Err(ActionError::config(format!("Invalid user mail '{mail}'.")));
        }
        Ok(mail)
    }

    pub fn user_details(&self) -> ActionResult<GraphRequest> {
        Ok(match UserSource::parse(self.user_source.as_deref())? {
            UserSource::Me => GraphRequest::get("/me"),
            UserSource::All => GraphRequest::get("/users"),
            UserSource::Specific => GraphRequest::get(format!("/users/{}", self.user_mail()?)),
        })
    }

    pub fn calendar_events(&self) -> ActionResult<GraphRequest> {
        Ok(match UserSource::parse(self.user_source.as_deref())? {
            UserSource::Me => GraphRequest::get("/me/events"),
            UserSource::All => GraphRequest::get("/me/calendar/events"),
            UserSource::Specific => {
                GraphRequest::get(format!("/users/{}/calendar/events", self.user_mail()?))
            }
        })
    }

    pub fn send_mail(&self) -> ActionResult<GraphRequest> {
        let recipients = string_list(self.recipients.as_ref());
        if recipients.is_empty() {
            return Err(ActionError::config("No email recipients defined."));
        }
        let subject = require_str(&self.subject, "No email subject defined.")?;
        let content = require_str(&self.content, "No email content defined.")?;
        let content_type = require_str(&self.content_type, "No email content type defined.")?;

        let to: Vec<Value> = recipients
            .iter()
            .map(|address| json!({"emailAddress": {"address": address}}))
            .collect();
        Ok(GraphRequest::post(
            "/me/sendMail",
            json!({
                "message": {
                    "subject": subject,
                    "toRecipients": to,
                    "body": {"content": content, "contentType": content_type},
                }
            }),
        ))
    }

    pub fn schedule_meeting(&self) -> ActionResult<GraphRequest> {
        let time_zone = require_str(&self.time_zone, "No time zone defined.")?;
        let start = require_str(&self.start_time, "No start time defined.")?;
        let end = require_str(&self.end_time, "No end time defined.")?;
        let subject = require_str(&self.subject, "No meeting subject defined.")?;
        let content = require_str(&self.content, "No content defined.")?;
        let content_type = require_str(&self.content_type, "No content type defined.")?;

        let attendees: Vec<Value> = string_list(self.attendees.as_ref())
            .iter()
            .map(|address| {
                json!({
                    "emailAddress": {"address": address, "name": "Guest"},
                    "type": "Required"
                })
            })
            .collect();

        Ok(GraphRequest::post(
            "/me/events",
            json!({
                "subject": subject,
                "body": {"contentType": content_type, "content": content},
                "start": {"dateTime": start, "timeZone": time_zone},
                "end": {"dateTime": end, "timeZone": time_zone},
                "attendees": attendees,
            }),
        ))
    }

    pub fn add_contact(&self) -> ActionResult<GraphRequest> {
        let first = require_str(&self.first_name, "No first name defined.")?;
        let last = require_str(&self.last_name, "No last name defined.")?;
        let emails = string_list(self.email_addresses.as_ref());
        if emails.is_empty() {
            return Err(ActionError::config("No email addresses defined."));
        }
        let phones = string_list(self.business_phones.as_ref());
        if phones.is_empty() {
            return Err(ActionError::config("No business phones defined."));
        }

        let display = format!("{first} {last}");
        let addresses: Vec<Value> = emails
            .iter()
            .map(|address| json!({"address": address, "name": display}))
            .collect();

        Ok(GraphRequest::post(
            "/me/contacts",
            json!({
                "givenName": first,
                "surname": last,
                "emailAddresses": addresses,
                "businessPhones": phones,
            }),
        ))
    }
}
