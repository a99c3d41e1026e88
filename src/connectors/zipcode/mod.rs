//! Postal code to city lookup for Germany. Local, no network.
//!
//! The code is taken from the `zipcode` argument, then from the `zipcode_germany` keyphrase
//! of the NLU result, then from `input.zipcode_germany`. An unknown code stores `{}`.

mod directory;

pub use directory::{ZipcodeDirectory, ZipcodeEntry, normalize};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::ConnectorContext;
use crate::core::{Action, BoxedAction, ConversationState, Invocation, non_empty};
use crate::errors::ActionResult;
use crate::registry::ActionMetadata;

pub fn actions(ctx: &ConnectorContext) -> Vec<BoxedAction> {
    vec![Arc::new(ZipcodeToCity::new(Arc::clone(&ctx.zipcodes)))]
}

#[derive(Debug, Default, Deserialize)]
struct ZipcodeArgs {
    #[serde(default)]
    zipcode: Option<Value>,
}

fn as_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(&Some(s.clone())).map(str::to_string),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(as_code),
        Value::Object(map) => map.get("keyphrase").and_then(as_code),
        _ => None,
    }
}

/// The postal code this invocation refers to, if any.
fn find_zipcode(args: &ZipcodeArgs, state: &ConversationState) -> Option<String> {
    args.zipcode
        .as_ref()
        .and_then(as_code)
        .or_else(|| {
            state
                .input_pointer("/keyphrases/zipcode_germany/0/keyphrase")
                .and_then(as_code)
        })
        .or_else(|| state.input_pointer("/zipcode_germany").and_then(as_code))
}

pub struct ZipcodeToCity {
    directory: Arc<ZipcodeDirectory>,
}

impl ZipcodeToCity {
    pub fn new(directory: Arc<ZipcodeDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Action for ZipcodeToCity {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("zipcode", "zipcode_to_city")
            .with_display_name("Zipcode To City")
            .with_description("City and state of a German postal code")
            .with_aliases(&["zipcodeToCity"])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let args: ZipcodeArgs = invocation.args()?;
        let policy = invocation.policy()?;
        policy.key()?;

        let zipcode = find_zipcode(&args, state);
        let result = zipcode
            .as_deref()
            .and_then(|code| self.directory.lookup(code))
            .map(|entry| {
                json!({
                    "city": entry.city,
                    "city_addon": entry.city_addon,
                    "state": entry.state,
                })
            })
            .unwrap_or_else(|| json!({}));
        debug!(zipcode = zipcode.as_deref().unwrap_or_default(), "Zipcode lookup");
        policy.settle(state, Ok(result))
    }
}
