//! Twilio SMS.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::ConnectorContext;
use crate::core::{Action, BoxedAction, ConversationState, HttpTransport, Invocation, require_str};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

const SECRET_INVALID: &str = "Secret not present or keys missing (accountSid, authToken)";
/// Twilio concatenates at most ten segments.
pub const MAX_BODY_CHARS: usize = 1600;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct TwilioSecret {
    account_sid: String,
    auth_token: String,
}

impl fmt::Debug for TwilioSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioSecret")
            .field("account_sid", &self.account_sid)
            .finish_non_exhaustive()
    }
}

impl TwilioSecret {
    fn from_invocation(invocation: &Invocation) -> ActionResult<Self> {
        let secret = invocation.secret(SECRET_INVALID)?;
        match (secret.get("accountSid"), secret.get("authToken")) {
            (Some(sid), Some(token)) => Ok(Self {
                account_sid: sid.to_string(),
                auth_token: token.to_string(),
            }),
            _ => Err(ActionError::config(SECRET_INVALID)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SendSmsArgs {
    pub from: Option<String>,
    pub to: Option<String>,
    pub body: Option<String>,
}

impl SendSmsArgs {
    pub fn validate(&self) -> ActionResult<(&str, &str, &str)> {
        let from = require_str(&self.from, "Sender paramter -from- missing.")?;
        let to = require_str(&self.to, "Recipient paramter -to- missing.")?;
        let body = require_str(&self.body, "SMS body missing or empty.")?;
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(ActionError::config(
                "SMS body too long (max 1600 characters).",
            ));
        }
        Ok((from, to, body))
    }
}

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(SendSms::new(ctx))]
}

pub struct SendSms {
    transport: HttpTransport,
    base_url: String,
}

impl SendSms {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            base_url: ctx.endpoints.twilio_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Action for SendSms {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("twilio", "send_sms")
            .with_display_name("Send SMS")
            .with_description("Sends an SMS through the Twilio Messages API")
            .with_aliases(&["sendSMS"])
            .with_secret_fields(&["accountSid", "authToken"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = TwilioSecret::from_invocation(&invocation)?;
        let policy = invocation.policy()?;
        policy.key()?;
        let args: SendSmsArgs = invocation.args()?;
        let (from, to, body) = args.validate()?;

        info!(to = %to, chars = body.chars().count(), "Sending SMS");
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, secret.account_sid
        );
        let request = self
            .transport
            .request(Method::POST, &url)
            .basic_auth(&secret.account_sid, Some(&secret.auth_token))
            .form(&[("From", from), ("To", to), ("Body", body)]);
        let outcome = self.transport.send_json(request).await;
        policy.settle(state, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::test_support::context_for;
    use crate::core::Secret;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secret() -> Secret {
        Secret::new()
            .with("accountSid", "AC123")
            .with("authToken", "tok")
    }

    #[test]
    fn test_body_limit() {
        let args = SendSmsArgs {
            from: Some("+15005550006".into()),
            to: Some("+4915112345678".into()),
            body: Some("ä".repeat(MAX_BODY_CHARS)),
        };
        assert!(args.validate().is_ok());

        let args = SendSmsArgs {
            body: Some("x".repeat(MAX_BODY_CHARS + 1)),
            ..args
        };
        assert_eq!(
            args.validate().unwrap_err().to_string(),
            "SMS body too long (max 1600 characters)."
        );
    }

    #[tokio::test]
    async fn test_missing_token_makes_no_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let action = SendSms::new(&context_for(&server.uri()));
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({"from": "a", "to": "b", "body": "c", "store": "sms"}))
            .with_secret(Secret::new().with("accountSid", "AC123"));
        let err = action.execute(&mut state, inv).await.unwrap_err();
        assert_eq!(err.to_string(), SECRET_INVALID);
    }

    #[tokio::test]
    async fn test_missing_token_is_reported_before_missing_body() {
        let action = SendSms::new(&ConnectorContext::default());
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({"from": "a", "to": "b", "store": "sms"}))
            .with_secret(Secret::new().with("accountSid", "AC123"));
        let err = action.execute(&mut state, inv).await.unwrap_err();
        assert_eq!(err.to_string(), SECRET_INVALID);

        let inv = Invocation::new(json!({"from": "a", "to": "b", "store": "sms"}))
            .with_secret(secret());
        let err = action.execute(&mut state, inv).await.unwrap_err();
        assert_eq!(err.to_string(), "SMS body missing or empty.");
    }

    #[tokio::test]
    async fn test_send_writes_to_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(header_exists("authorization"))
            .and(body_string_contains("Body=Hello"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"sid": "SM1", "status": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let action = SendSms::new(&context_for(&server.uri()));
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({
            "from": "+15005550006",
            "to": "+4915112345678",
            "body": "Hello",
            "store": "sms",
            "writeToContext": false
        }))
        .with_secret(secret());
        action.execute(&mut state, inv).await.unwrap();

        assert_eq!(state.input["sms"]["sid"], "SM1");
        assert!(state.context.is_empty());
    }
}
