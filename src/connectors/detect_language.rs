//! Language detection of the user's utterance.
//!
//! Runs locally with `whatlang`; nothing leaves the process.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::ConnectorContext;
use crate::core::{Action, BoxedAction, ConversationState, Invocation, non_empty};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

pub fn actions(_ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(DetectLanguage)]
}

#[derive(Debug, Default, Deserialize)]
struct DetectLanguageArgs {
    text: Option<String>,
}

/// Detect the language of `text`.
///
/// The stored value is `{language, code, confidence, reliable}` where `language` is the
/// lowercase English name (`"german"`) and `code` the ISO 639-3 code (`"deu"`).
pub fn detect(text: &str) -> ActionResult<Value> {
    let info = whatlang::detect(text)
        .ok_or_else(|| ActionError::Provider("Unable to detect the language.".to_string()))?;
    Ok(json!({
        "language": info.lang().eng_name().to_lowercase(),
        "code": info.lang().code(),
        "confidence": info.confidence(),
        "reliable": info.is_reliable(),
    }))
}

pub struct DetectLanguage;

#[async_trait]
impl Action for DetectLanguage {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("detect_language", "detect_language")
            .with_display_name("Detect Language")
            .with_description("Detects the language of the text or the user input")
            .with_aliases(&["detectlanguage"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let args: DetectLanguageArgs = invocation.args()?;
        let policy = invocation.policy()?;
        policy.key()?;

        let text = non_empty(&args.text)
            .map(str::to_string)
            .or_else(|| state.input_text().map(str::to_string));
        let outcome = match text {
            Some(text) if !text.trim().is_empty() => {
                debug!(chars = text.chars().count(), "Detecting language");
                detect(&text)
            }
            _ => Err(ActionError::Provider(
                "No text to detect the language of.".to_string(),
            )),
        };
        policy.settle(state, outcome)
    }
}
