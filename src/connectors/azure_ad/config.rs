use std::fmt;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::{Invocation, require_str};
use crate::errors::ActionResult;

pub(super) const SECRET_MISSING: &str = "Secret not defined.";
pub(super) const STORE_MISSING: &str = "Context store not defined.";

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AzureAdSecret {
    pub client_id: String,
    pub client_secret: String,
}

impl AzureAdSecret {
    pub const FIELDS: [&'static str; 2] = ["clientId", "clientSecret"];

    pub fn from_invocation(invocation: &Invocation) -> ActionResult<Self> {
        let secret = invocation.secret(SECRET_MISSING)?;
        Ok(Self {
            client_id: secret.require("clientId")?.to_string(),
            client_secret: secret.require("clientSecret")?.to_string(),
        })
    }
}

impl fmt::Debug for AzureAdSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureAdSecret")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAuthenticationArgs {
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
}

impl StartAuthenticationArgs {
    pub fn validate(&self) -> ActionResult<(&str, &str)> {
        Ok((
            require_str(&self.redirect_uri, "The URI to redirect is not defined.")?,
            require_str(&self.scope, "Scope is not defined.")?,
        ))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequestArgs {
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    #[serde(alias = "code")]
    pub auth_code: Option<String>,
}

/// Validated authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest<'a> {
    pub redirect_uri: &'a str,
    pub scope: &'a str,
    pub code: &'a str,
}

impl TokenRequestArgs {
    pub fn validate(&self) -> ActionResult<TokenRequest<'_>> {
        Ok(TokenRequest {
            redirect_uri: require_str(&self.redirect_uri, "The URI to redirect is not defined.")?,
            scope: require_str(&self.scope, "Scope is not defined.")?,
            code: require_str(
                &self.auth_code,
                "Microsoft authentication code from callback URI is not defined.",
            )?,
        })
    }
}
