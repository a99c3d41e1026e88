use super::config::*;
use super::provider::*;
use crate::connectors::test_support::context_for;
use crate::core::{Action, ConversationState, Invocation};
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod request_tests {
    use super::*;

    fn args(value: serde_json::Value) -> GraphArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_user_details_paths() {
        let me = args(json!({"userSource": "me"})).user_details().unwrap();
        assert_eq!(me.path, "/me");
        assert_eq!(me.method, Method::GET);

        let all = args(json!({"userSource": "all"})).user_details().unwrap();
        assert_eq!(all.path, "/users");

        let one = args(json!({"userSource": "specific person", "userMail": "ada@contoso.com"}))
            .user_details()
            .unwrap();
        assert_eq!(one.path, "/users/ada@contoso.com");
    }

    #[test]
    fn test_specific_person_requires_mail() {
        let err = args(json!({"userSource": "specific person"}))
            .calendar_events()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "You have to define the user's mail who you want to search for."
        );
    }

    #[test]
    fn test_calendar_paths() {
        assert_eq!(
            args(json!({"userSource": "all"}))
                .calendar_events()
                .unwrap()
                .path,
            "/me/calendar/events"
        );
    }

    #[test]
    fn test_meeting_attendees() {
        let request = args(json!({
            "timeZone": "UTC",
            "startTime": "2024-05-01T10:00:00",
            "endTime": "2024-05-01T11:00:00",
            "subject": "Sync",
            "content": "Agenda",
            "contentType": "text",
            "attendees": "a@contoso.com, b@contoso.com"
        }))
        .schedule_meeting()
        .unwrap();

        let body = request.body.unwrap();
        assert_eq!(body["start"], json!({"dateTime": "2024-05-01T10:00:00", "timeZone": "UTC"}));
        assert_eq!(body["attendees"].as_array().unwrap().len(), 2);
        assert_eq!(body["attendees"][1]["emailAddress"]["name"], "Guest");
        assert_eq!(body["attendees"][1]["type"], "Required");
    }

    #[test]
    fn test_contact_body() {
        let request = args(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "emailAddresses": ["ada@contoso.com"],
            "businessPhones": ["+44 20 1234"]
        }))
        .add_contact()
        .unwrap();

        assert_eq!(
            request.body.unwrap(),
            json!({
                "givenName": "Ada",
                "surname": "Lovelace",
                "emailAddresses": [{"address": "ada@contoso.com", "name": "Ada Lovelace"}],
                "businessPhones": ["+44 20 1234"]
            })
        );
    }
}

mod action_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_makes_no_calls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let action = GraphAction::new(GraphClient::new(&ctx), GraphOperation::GetContacts);
        let mut state = ConversationState::new();
        let err = action
            .execute(&mut state, Invocation::new(json!({"contextStore": "contacts"})))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("No access token defined."));
    }

    #[tokio::test]
    async fn test_send_mail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1.0/me/sendMail"))
            .and(header("authorization", "Bearer graph-token"))
            .and(body_json(json!({
                "message": {
                    "subject": "Hello",
                    "toRecipients": [{"emailAddress": {"address": "ada@contoso.com"}}],
                    "body": {"content": "<b>Hi</b>", "contentType": "html"}
                }
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let action = GraphAction::new(GraphClient::new(&ctx), GraphOperation::SendMail);
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({
            "accessToken": "graph-token",
            "recipients": ["ada@contoso.com"],
            "subject": "Hello",
            "content": "<b>Hi</b>",
            "contentType": "html",
            "contextStore": "mail"
        }));

        action.execute(&mut state, inv).await.unwrap();
        assert_eq!(state.context["mail"], json!("Mail sent"));
    }

    #[tokio::test]
    async fn test_user_details_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/me"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"displayName": "Ada Lovelace"})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let action = GraphAction::new(GraphClient::new(&ctx), GraphOperation::GetUserDetails);
        let inv = Invocation::new(json!({
            "accessToken": "t",
            "userSource": "me",
            "contextStore": "user"
        }));

        let mut first = ConversationState::new();
        action.execute(&mut first, inv.clone()).await.unwrap();
        let mut second = ConversationState::new();
        action.execute(&mut second, inv).await.unwrap();
        assert_eq!(first.context, second.context);
        assert_eq!(first.context["user"]["displayName"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_expired_token_soft_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1.0/sites/root/lists"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"code": "InvalidAuthenticationToken"}})),
            )
            .mount(&server)
            .await;

        let ctx = context_for(&server.uri());
        let action = GraphAction::new(GraphClient::new(&ctx), GraphOperation::GetSharepointLists);
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({"accessToken": "t", "contextStore": "lists"}));

        action.execute(&mut state, inv).await.unwrap();
        let message = state.context["lists"]["error"].as_str().unwrap();
        assert!(message.contains("InvalidAuthenticationToken"));
    }
}
