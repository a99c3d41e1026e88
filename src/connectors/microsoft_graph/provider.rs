use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::config::{GraphArgs, GraphRequest};
use crate::connectors::ConnectorContext;
use crate::core::{Action, ConversationState, HttpTransport, Invocation};
use crate::errors::ActionResult;
use crate::registry::ActionMetadata;

const CONNECTOR: &str = "microsoft_graph";

#[derive(Debug, Clone)]
pub struct GraphClient {
    transport: HttpTransport,
    base_url: String,
}

impl GraphClient {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            base_url: ctx
                .endpoints
                .microsoft_graph_url
                .trim_end_matches('/')
                .to_string(),
        }
    }

    pub async fn send(&self, token: &str, request: GraphRequest) -> ActionResult<Value> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, path = %request.path, "Calling Microsoft Graph");
        let mut builder = self.transport.request(request.method, &url).bearer_auth(token);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        self.transport.send_json(builder).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphOperation {
    GetUserDetails,
    GetEventsFromCalendar,
    SendMail,
    ScheduleMeeting,
    GetContacts,
    AddContact,
    GetSharepointLists,
}

impl GraphOperation {
    pub const ALL: [GraphOperation; 7] = [
        GraphOperation::GetUserDetails,
        GraphOperation::GetEventsFromCalendar,
        GraphOperation::SendMail,
        GraphOperation::ScheduleMeeting,
        GraphOperation::GetContacts,
        GraphOperation::AddContact,
        GraphOperation::GetSharepointLists,
    ];

    /// (id, display name, legacy name)
    fn names(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            GraphOperation::GetUserDetails => {
                ("get_user_details", "Get User Details", "getUserDetails")
            }
            GraphOperation::GetEventsFromCalendar => (
                "get_events_from_calendar",
                "Get Events From Calendar",
                "getEventsFromCalendar",
            ),
            GraphOperation::SendMail => ("send_mail", "Send Mail", "sendMail"),
            GraphOperation::ScheduleMeeting => {
                ("schedule_meeting", "Schedule Meeting", "scheduleMeeting")
            }
            GraphOperation::GetContacts => ("get_contacts", "Get Contacts", "getContacts"),
            GraphOperation::AddContact => ("add_contact", "Add Contact", "addContact"),
            GraphOperation::GetSharepointLists => (
                "get_sharepoint_lists",
                "Get SharePoint Lists",
                "getSharepointLists",
            ),
        }
    }

    fn build(&self, args: &GraphArgs) -> ActionResult<GraphRequest> {
        match self {
            GraphOperation::GetUserDetails => args.user_details(),
            GraphOperation::GetEventsFromCalendar => args.calendar_events(),
            GraphOperation::SendMail => args.send_mail(),
            GraphOperation::ScheduleMeeting => args.schedule_meeting(),
            GraphOperation::GetContacts => Ok(GraphRequest {
                method: reqwest::Method::GET,
                path: "/me/contacts".to_string(),
                body: None,
            }),
            GraphOperation::AddContact => args.add_contact(),
            GraphOperation::GetSharepointLists => Ok(GraphRequest {
                method: reqwest::Method::GET,
                path: "/sites/root/lists".to_string(),
                body: None,
            }),
        }
    }
}

/// One Graph operation exposed as an action.
pub struct GraphAction {
    client: GraphClient,
    operation: GraphOperation,
}

impl GraphAction {
    pub fn new(client: GraphClient, operation: GraphOperation) -> Self {
        Self { client, operation }
    }
}

#[async_trait]
impl Action for GraphAction {
    fn metadata(&self) -> ActionMetadata {
        let (id, display, legacy) = self.operation.names();
        ActionMetadata::new(CONNECTOR, id)
            .with_display_name(display)
            .with_description("Microsoft Graph call authorised by the `accessToken` argument")
            .with_aliases(&[legacy])
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let policy = invocation.policy()?;
        let args: GraphArgs = invocation.args()?;
        let token = args.access_token()?;
        let request = self.operation.build(&args)?;
        policy.key()?;

        let outcome = self.client.send(token, request).await.map(|value| {
            // sendMail answers 202 without a body
            if value.is_null() && self.operation == GraphOperation::SendMail {
                Value::String("Mail sent".to_string())
            } else {
                value
            }
        });
        policy.settle(state, outcome)
    }
}
