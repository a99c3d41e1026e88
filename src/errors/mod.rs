pub mod action_error;
pub mod auth_error;

pub use action_error::{ActionError, ActionResult};
pub use auth_error::{AuthError, AuthResult};
