//! Amazon Polly speech for the webchat.
//!
//! The webchat plays a presigned `SynthesizeSpeech` URL directly, so the action only signs a
//! request locally and never talks to AWS itself.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_polly::Client as PollyClient;
use aws_sdk_polly::config::Builder as PollyConfigBuilder;
use aws_sdk_polly::presigning::PresigningConfig;
use aws_sdk_polly::types::{OutputFormat, TextType, VoiceId};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::ConnectorContext;
use crate::core::{Action, BoxedAction, ConversationState, Invocation, require_str};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

pub const SAMPLE_RATE: &str = "8000";
pub const URL_LIFETIME: Duration = Duration::from_secs(3600);

pub fn actions(_ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(SayPolly)]
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct PollySecret {
    access_key_id: String,
    secret_access_key: String,
    region: String,
}

impl fmt::Debug for PollySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollySecret")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Voices offered in the flow editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollyVoice {
    Kimberly,
    Salli,
    Joey,
    Marlene,
    Hans,
    Vicki,
}

impl PollyVoice {
    fn to_sdk(self) -> VoiceId {
        match self {
            PollyVoice::Kimberly => VoiceId::Kimberly,
            PollyVoice::Salli => VoiceId::Salli,
            PollyVoice::Joey => VoiceId::Joey,
            PollyVoice::Marlene => VoiceId::Marlene,
            PollyVoice::Hans => VoiceId::Hans,
            PollyVoice::Vicki => VoiceId::Vicki,
        }
    }
}

impl FromStr for PollyVoice {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kimberly" => Ok(PollyVoice::Kimberly),
            "salli" => Ok(PollyVoice::Salli),
            "joey" => Ok(PollyVoice::Joey),
            "marlene" => Ok(PollyVoice::Marlene),
            "hans" => Ok(PollyVoice::Hans),
            "vicki" => Ok(PollyVoice::Vicki),
            other => Err(ActionError::config(format!(
                "The voice '{other}' is not supported. Use Kimberly, Salli, Joey, Marlene, Hans or Vicki."
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SayPollyArgs {
    pub text: Option<String>,
    pub voice: Option<String>,
}

pub struct SayPolly;

impl SayPolly {
    fn secret(invocation: &Invocation) -> ActionResult<PollySecret> {
        let secret = invocation.secret("Secret not defined.")?;
        Ok(PollySecret {
            access_key_id: secret
                .get("accessKeyId")
                .ok_or_else(|| {
                    ActionError::config("The secret is missing the 'accesskeyId' field")
                })?
                .to_string(),
            secret_access_key: secret
                .get("secretAccessKey")
                .ok_or_else(|| {
                    ActionError::config("The secret is missing the 'secretAccessKey' field.")
                })?
                .to_string(),
            region: secret
                .get("region")
                .ok_or_else(|| ActionError::config("The secret is missing the 'region' field."))?
                .to_string(),
        })
    }

    /// Signs a `SynthesizeSpeech` GET request valid for [`URL_LIFETIME`].
    async fn presign(secret: &PollySecret, voice: PollyVoice, text: &str) -> ActionResult<String> {
        let credentials = Credentials::new(
            secret.access_key_id.clone(),
            secret.secret_access_key.clone(),
            None,
            None,
            "flow-connectors",
        );
        let config = PollyConfigBuilder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(secret.region.clone()))
            .credentials_provider(credentials)
            .build();
        let client = PollyClient::from_conf(config);

        let presigning = PresigningConfig::expires_in(URL_LIFETIME)
            .map_err(|e| ActionError::Provider(format!("Invalid presigning config: {e}")))?;
        let request = client
            .synthesize_speech()
            .output_format(OutputFormat::Mp3)
            .sample_rate(SAMPLE_RATE)
            .text(text)
            .text_type(TextType::Text)
            .voice_id(voice.to_sdk())
            .presigned(presigning)
            .await
            .map_err(|e| ActionError::Provider(format!("Failed to presign Polly request: {e}")))?;
        Ok(request.uri().to_string())
    }
}

#[async_trait]
impl Action for SayPolly {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("aws_polly", "say_polly")
            .with_display_name("Say with Polly")
            .with_description("Lets the webchat read a text aloud with an Amazon Polly voice")
            .with_aliases(&["sayPolly"])
            .with_secret_fields(&["accessKeyId", "secretAccessKey", "region"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = Self::secret(&invocation)?;
        let policy = invocation.policy()?;
        policy.require_key("Context store is missing.")?;
        let args: SayPollyArgs = invocation.args()?;
        let voice: PollyVoice = require_str(&args.voice, "Please select a voice for polly.")?.parse()?;
        let text = require_str(
            &args.text,
            "The text is missing. Please define what Polly should say.",
        )?;

        match Self::presign(&secret, voice, text).await {
            Ok(url) => {
                debug!(voice = ?voice, region = %secret.region, "Presigned Polly speech URL");
                state.output(Some(String::new()), json!({ "read": true, "url": url }));
                Ok(())
            }
            Err(err) => policy.settle(state, Err(err)),
        }
    }
}
