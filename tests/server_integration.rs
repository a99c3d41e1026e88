//! Router tests driven through `tower::ServiceExt::oneshot`.

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::app_state_for;
use flow_connectors::routes::create_app;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_app(app_state_for("http://127.0.0.1:9", Some("token")));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "OK");
}

#[tokio::test]
async fn test_list_actions() {
    let app = create_app(app_state_for("http://127.0.0.1:9", None));
    let response = app
        .oneshot(Request::builder().uri("/actions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let ids: Vec<&str> = body["actions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["id"].as_str())
        .collect();
    assert_eq!(body["total_count"], ids.len());
    assert!(ids.contains(&"uipath.add_queue_item"));
    assert!(ids.contains(&"file_upload.upload_to_azure_container"));
}

#[tokio::test]
async fn test_get_action_by_alias() {
    let app = create_app(app_state_for("http://127.0.0.1:9", None));
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/actions/twilio.sendSMS")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], "twilio.send_sms");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/actions/twilio.fax")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invoke_action_returns_state_and_emissions() {
    let app = create_app(app_state_for("http://127.0.0.1:9", None));
    let response = app
        .oneshot(post_json(
            "/actions/webchat.change_bot_avatar",
            json!({
                "state": {"input": {"text": "hi"}, "context": {"kept": 1}},
                "args": {"avatarUrl": "https://cdn.example.com/bot.png", "contextStore": "avatar"}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["state"]["context"]["kept"], 1);
    assert_eq!(
        body["state"]["context"]["avatar"],
        "Avatar was changed succesfully to https://cdn.example.com/bot.png"
    );
    assert_eq!(body["emissions"][0]["type"], "output");
    assert_eq!(
        body["emissions"][0]["data"]["_webchat"]["botAvatarOverrideUrl"],
        "https://cdn.example.com/bot.png"
    );
}

#[tokio::test]
async fn test_invoke_error_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/singlesearch/shows"))
        .and(query_param("q", "girls"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = create_app(app_state_for(&server.uri(), None));

    let response = app
        .clone()
        .oneshot(post_json(
            "/actions/tvmaze.search_single_show",
            json!({"args": {"contextStore": "show"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No search query defined.");

    let response = app
        .clone()
        .oneshot(post_json(
            "/actions/tvmaze.search_single_show",
            json!({"args": {"query": "girls", "contextStore": "show", "stopOnError": true}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = app
        .oneshot(post_json("/actions/nope.nothing", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_secret_required() {
    let app = create_app(app_state_for("http://127.0.0.1:9", Some("flow-token")));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/actions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/actions")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/actions")
                .header(header::AUTHORIZATION, "Bearer flow-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
