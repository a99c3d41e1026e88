//! Tests for the file upload prompts.

use super::config::*;
use super::provider::*;
use super::signing::{self, ContainerSas};
use crate::connectors::test_support::context_for;
use crate::core::{Action, ConversationState, Emission, Invocation, Secret};
use serde_json::json;
use time::macros::datetime;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// "flow-connectors-test-key" in base64
const ACCOUNT_KEY: &str = "Zmxvdy1jb25uZWN0b3JzLXRlc3Qta2V5";

fn aws_secret() -> Secret {
    Secret::new()
        .with("access_key_id", "AKIDEXAMPLE")
        .with("secret_access_key", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
}

fn azure_secret() -> Secret {
    Secret::new().with("secret_access_key", ACCOUNT_KEY)
}

// =============================================================================
// Arguments
// =============================================================================

mod args_tests {
    use super::*;

    #[test]
    fn test_s3_defaults() {
        let args = S3UploadArgs::default();
        assert_eq!(args.region(), DEFAULT_REGION);
        assert_eq!(args.bucket(), DEFAULT_BUCKET);
        assert_eq!(args.key(), DEFAULT_KEY);
        assert!(args.check_signature_version().is_ok());

        let v3 = S3UploadArgs {
            signature_version: Some("v3".into()),
            ..Default::default()
        };
        assert!(v3.check_signature_version().unwrap_err().is_configuration());
    }

    #[test]
    fn test_sas_lifetime() {
        let lifetime = |timeout| {
            let args: AzureUploadArgs =
                serde_json::from_value(json!({ "Timeout": timeout })).unwrap();
            args.lifetime_minutes()
        };
        assert_eq!(lifetime(json!(30)), 30);
        assert_eq!(lifetime(json!("45")), 45);
        assert_eq!(lifetime(json!(61)), DEFAULT_SAS_MINUTES);
        assert_eq!(lifetime(json!(0)), DEFAULT_SAS_MINUTES);
        assert_eq!(lifetime(json!(null)), DEFAULT_SAS_MINUTES);
    }

    #[test]
    fn test_generated_container_name() {
        let args = AzureUploadArgs::default();
        let name = args.container();
        assert_eq!(name.len(), 36);
        assert_eq!(name, name.to_lowercase());
    }
}

// =============================================================================
// Signing
// =============================================================================

mod signing_tests {
    use super::*;

    #[test]
    fn test_http_date() {
        let date = signing::http_date(datetime!(2019-03-04 09:05:07 UTC)).unwrap();
        assert_eq!(date, "Mon, 04 Mar 2019 09:05:07 GMT");
    }

    #[test]
    fn test_container_sas_string_to_sign() {
        let sas = ContainerSas {
            account: "storeacct",
            container: "uploads",
            start: datetime!(2019-03-04 09:00:00 UTC),
            expiry: datetime!(2019-03-04 09:05:00 UTC),
        };
        assert_eq!(
            sas.string_to_sign().unwrap(),
            "racwdl\n2019-03-04T09:00:00Z\n2019-03-04T09:05:00Z\n/blob/storeacct/uploads\n\n\
             0.0.0.0-255.255.255.255\nhttps,http\n2016-05-31\n\n\n\n\n"
        );

        let query = sas.query(ACCOUNT_KEY).unwrap();
        assert!(query.starts_with("sv=2016-05-31&spr=https%2Chttp&st=2019-03-04T09%3A00%3A00Z"));
        assert!(query.contains("&sr=c&sp=racwdl&sig="));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let first = signing::sign(ACCOUNT_KEY, "payload").unwrap();
        assert_eq!(first, signing::sign(ACCOUNT_KEY, "payload").unwrap());
        assert_ne!(first, signing::sign(ACCOUNT_KEY, "other").unwrap());
        assert!(signing::sign("not base64!", "payload").unwrap_err().is_configuration());
    }
}

// =============================================================================
// S3
// =============================================================================

mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_secret_fields() {
        let mut state = ConversationState::new();
        let err = UploadToAwsBucket
            .execute(&mut state, Invocation::new(json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "secret is not defined");

        let partial = Secret::new().with("access_key_id", "AKIDEXAMPLE");
        let err = UploadToAwsBucket
            .execute(&mut state, Invocation::new(json!({})).with_secret(partial))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "secret_access_key is not defined in selected secret"
        );
    }

    #[tokio::test]
    async fn test_presigned_urls() {
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({"bucket": "uploads", "key": "cv.pdf"}))
            .with_secret(aws_secret());
        UploadToAwsBucket.execute(&mut state, inv).await.unwrap();

        let plugin = &state.outputs().next().unwrap()["_plugin"];
        assert_eq!(plugin["type"], "file-upload");
        assert_eq!(plugin["service"], "amazon-s3");
        let upload = plugin["uploadUrl"].as_str().unwrap();
        let download = plugin["downloadUrl"].as_str().unwrap();
        for url in [upload, download] {
            assert!(url.contains("cv.pdf"));
            assert!(url.contains("X-Amz-Signature="));
            assert!(url.contains("eu-central-1"));
        }
        assert_ne!(upload, download);
    }
}

// =============================================================================
// Azure
// =============================================================================

mod azure_tests {
    use super::*;

    async fn mount_container(server: &MockServer, status: u16) {
        Mock::given(method("PUT"))
            .and(path("/storeacct/uploads"))
            .and(query_param("restype", "container"))
            .and(header("x-ms-version", "2016-05-31"))
            .and(header_exists("x-ms-date"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(server)
            .await;
    }

    fn args() -> serde_json::Value {
        json!({"accountStorageName": "storeacct", "containerName": "uploads", "Timeout": 10})
    }

    #[tokio::test]
    async fn test_creates_container_and_outputs_sas() {
        let server = MockServer::start().await;
        mount_container(&server, 201).await;

        let action = UploadToAzureContainer::new(&context_for(&server.uri()));
        let mut state = ConversationState::new();
        let inv = Invocation::new(args()).with_secret(azure_secret());
        action.execute(&mut state, inv).await.unwrap();

        let plugin = &state.outputs().next().unwrap()["_plugin"];
        assert_eq!(plugin["service"], "azure");
        assert_eq!(plugin["containerName"], "uploads");
        assert_eq!(plugin["baseURL"], format!("{}/storeacct/", server.uri()));
        let sas = plugin["sasSignature"].as_str().unwrap();
        assert!(sas.starts_with("?sv=2016-05-31&"));
        assert!(sas.contains("sp=racwdl"));
    }

    #[tokio::test]
    async fn test_existing_container_is_fine() {
        let server = MockServer::start().await;
        mount_container(&server, 409).await;

        let action = UploadToAzureContainer::new(&context_for(&server.uri()));
        let mut state = ConversationState::new();
        let inv = Invocation::new(args()).with_secret(azure_secret());
        action.execute(&mut state, inv).await.unwrap();

        assert_eq!(state.outputs().count(), 1);
        assert!(
            !state
                .emissions
                .iter()
                .any(|e| matches!(e, Emission::Log { .. }))
        );
    }

    #[tokio::test]
    async fn test_creation_failure_respects_stop_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("AuthenticationFailed"))
            .mount(&server)
            .await;
        let action = UploadToAzureContainer::new(&context_for(&server.uri()));

        let mut state = ConversationState::new();
        let inv = Invocation::new(args()).with_secret(azure_secret());
        action.execute(&mut state, inv).await.unwrap();
        assert!(
            state
                .emissions
                .iter()
                .any(|e| matches!(e, Emission::Log { .. }))
        );
        assert_eq!(state.outputs().count(), 1);

        let mut stop = args();
        stop["stopOnError"] = json!(true);
        let mut state = ConversationState::new();
        let err = action
            .execute(&mut state, Invocation::new(stop).with_secret(azure_secret()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
        assert!(state.emissions.is_empty());
    }

    #[tokio::test]
    async fn test_missing_account_name() {
        let action = UploadToAzureContainer::new(&context_for("http://127.0.0.1:9"));
        let mut state = ConversationState::new();
        let inv = Invocation::new(json!({"containerName": "uploads"})).with_secret(azure_secret());
        let err = action.execute(&mut state, inv).await.unwrap_err();
        assert_eq!(err.to_string(), "No storage account name defined.");
    }
}
