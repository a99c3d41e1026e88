//! Webchat presentation directives.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::ConnectorContext;
use crate::core::{Action, BoxedAction, ConversationState, Invocation, require_str};
use crate::errors::ActionResult;
use crate::registry::ActionMetadata;

pub fn actions(_ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(ChangeBotAvatar)]
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeBotAvatarArgs {
    #[serde(alias = "url")]
    avatar_url: Option<String>,
}

/// Replaces the bot avatar shown by the webchat for the rest of the session.
pub struct ChangeBotAvatar;

#[async_trait]
impl Action for ChangeBotAvatar {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("webchat", "change_bot_avatar")
            .with_display_name("Change Bot Avatar")
            .with_description("Overrides the bot avatar image in the webchat")
            .with_aliases(&["changeBotAvatar"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let args: ChangeBotAvatarArgs = invocation.args()?;
        let url = require_str(
            &args.avatar_url,
            "No avatar url defined. You need this to change the avatar image of the bot",
        )?;
        let policy = invocation.policy()?;
        policy.require_key("No context store defined.")?;

        state.output(
            Some(String::new()),
            json!({ "_webchat": { "botAvatarOverrideUrl": url } }),
        );
        policy.settle(
            state,
            Ok(Value::String(format!(
                "Avatar was changed succesfully to {url}"
            ))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_change_avatar() {
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({
            "avatarUrl": "https://cdn.example.com/bot.png",
            "contextStore": "avatar"
        }));
        ChangeBotAvatar.execute(&mut state, inv).await.unwrap();

        assert_eq!(
            state.outputs().next().unwrap(),
            &json!({"_webchat": {"botAvatarOverrideUrl": "https://cdn.example.com/bot.png"}})
        );
        assert_eq!(
            state.context["avatar"],
            "Avatar was changed succesfully to https://cdn.example.com/bot.png"
        );
    }

    #[tokio::test]
    async fn test_missing_url() {
        let mut state = ConversationState::new();
        let err = ChangeBotAvatar
            .execute(&mut state, Invocation::new(json!({"contextStore": "avatar"})))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("No avatar url defined."));
        assert!(state.emissions.is_empty());
    }
}
