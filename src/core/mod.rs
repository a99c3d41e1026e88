pub mod action;
pub mod http;
pub mod poll;
pub mod secret;
pub mod state;

pub use action::{
    Action, BoxedAction, Invocation, StorePolicy, non_empty, require_str, string_list,
};
pub use http::{HttpTransport, TransportOptions};
pub use poll::{PollPolicy, poll_until};
pub use secret::Secret;
pub use state::{ConversationState, Emission, LogLevel, StoreTarget};
