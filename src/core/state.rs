//! Conversation state handed to every action.
//!
//! The flow engine owns this structure. An action reads the user input, writes results into
//! the context store and records emissions (outputs, log lines, lexicon keyphrases) that the
//! host forwards to the engine after the action returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a result is written. Most actions write to the context store; some legacy
/// actions allow writing into the input object instead (`writeToContext: false`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTarget {
    #[default]
    Context,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A side effect requested by an action that the engine must apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Emission {
    /// Send a message to the channel. `data` carries plugin directives such as `_plugin`.
    Output {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        data: Value,
    },
    Log { level: LogLevel, message: String },
    /// Add a keyphrase to a lexicon
    LexiconKeyphrase {
        lexicon_id: String,
        keyphrase: String,
        tags: Vec<String>,
        synonyms: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    #[serde(default)]
    pub input: Map<String, Value>,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emissions: Vec<Emission>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: Value) -> Self {
        let input = match input {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            input,
            ..Self::default()
        }
    }

    /// The user's utterance (`input.text`), if any.
    pub fn input_text(&self) -> Option<&str> {
        self.input.get("text").and_then(Value::as_str)
    }

    /// Look up a nested input value by JSON pointer, e.g. `/keyphrases/zipcode_germany/0`.
    pub fn input_pointer(&self, pointer: &str) -> Option<&Value> {
        if pointer.is_empty() {
            return None;
        }
        let (head, rest) = match pointer.trim_start_matches('/').split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (pointer.trim_start_matches('/'), None),
        };
        let root = self.input.get(head)?;
        match rest {
            Some(rest) => root.pointer(&format!("/{rest}")),
            None => Some(root),
        }
    }

    pub fn add_to_context(&mut self, key: impl Into<String>, value: Value) {
        self.context.insert(key.into(), value);
    }

    pub fn store(&mut self, target: StoreTarget, key: impl Into<String>, value: Value) {
        match target {
            StoreTarget::Context => self.add_to_context(key, value),
            StoreTarget::Input => {
                self.input.insert(key.into(), value);
            }
        }
    }

    pub fn output(&mut self, text: Option<String>, data: Value) {
        self.emissions.push(Emission::Output { text, data });
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.emissions.push(Emission::Log {
            level,
            message: message.into(),
        });
    }

    pub fn add_lexicon_keyphrase(
        &mut self,
        lexicon_id: impl Into<String>,
        keyphrase: impl Into<String>,
        tags: Vec<String>,
        synonyms: Vec<String>,
    ) {
        self.emissions.push(Emission::LexiconKeyphrase {
            lexicon_id: lexicon_id.into(),
            keyphrase: keyphrase.into(),
            tags,
            synonyms,
        });
    }

    /// Outputs emitted so far, in order.
    pub fn outputs(&self) -> impl Iterator<Item = &Value> {
        self.emissions.iter().filter_map(|emission| match emission {
            Emission::Output { data, .. } => Some(data),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_input_ignores_non_objects() {
        let state = ConversationState::with_input(json!("hello"));
        assert!(state.input.is_empty());

        let state = ConversationState::with_input(json!({"text": "hello"}));
        assert_eq!(state.input_text(), Some("hello"));
    }

    #[test]
    fn test_store_targets() {
        let mut state = ConversationState::new();
        state.store(StoreTarget::Context, "a", json!(1));
        state.store(StoreTarget::Input, "b", json!(2));

        assert_eq!(state.context.get("a"), Some(&json!(1)));
        assert_eq!(state.input.get("b"), Some(&json!(2)));
        assert!(state.context.get("b").is_none());
    }

    #[test]
    fn test_input_pointer() {
        let state = ConversationState::with_input(json!({
            "keyphrases": {"zipcode_germany": [{"keyphrase": "98646"}]}
        }));
        assert_eq!(
            state.input_pointer("/keyphrases/zipcode_germany/0/keyphrase"),
            Some(&json!("98646"))
        );
        assert!(state.input_pointer("/keyphrases/missing").is_none());
        assert!(state.input_pointer("").is_none());
    }

    #[test]
    fn test_emissions_serialize_tagged() {
        let mut state = ConversationState::new();
        state.output(None, json!({"_webchat": {"botAvatarOverrideUrl": "x"}}));
        state.log(LogLevel::Error, "oops");

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["emissions"][0]["type"], "output");
        assert_eq!(value["emissions"][1]["level"], "error");
        assert_eq!(state.outputs().count(), 1);
    }
}
