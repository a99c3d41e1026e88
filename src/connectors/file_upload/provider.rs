use std::time::Duration;

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use reqwest::Method;
use reqwest::header::CONTENT_LENGTH;
use serde_json::json;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::config::{AwsUploadSecret, AzureUploadArgs, AzureUploadSecret, S3UploadArgs};
use super::signing::{self, ContainerSas, STORAGE_VERSION};
use crate::connectors::ConnectorContext;
use crate::core::{Action, ConversationState, HttpTransport, Invocation, LogLevel};
use crate::errors::{ActionError, ActionResult};
use crate::registry::ActionMetadata;

/// Lifetime of presigned S3 URLs.
pub const S3_URL_LIFETIME: Duration = Duration::from_secs(900);

/// Output-only actions have nowhere to store an error, so a soft failure becomes an error log.
fn soft_fail(
    state: &mut ConversationState,
    invocation: &Invocation,
    err: ActionError,
) -> ActionResult<()> {
    if err.is_configuration() || invocation.policy()?.stop_on_error {
        return Err(err);
    }
    warn!(error = %err, "File upload preparation failed");
    state.log(LogLevel::Error, err.to_string());
    Ok(())
}

pub struct UploadToAwsBucket;

impl UploadToAwsBucket {
    async fn presign(
        secret: &AwsUploadSecret,
        args: &S3UploadArgs,
    ) -> ActionResult<(String, String)> {
        let store = AmazonS3Builder::new()
            .with_region(args.region())
            .with_bucket_name(args.bucket())
            .with_access_key_id(&secret.access_key_id)
            .with_secret_access_key(&secret.secret_access_key)
            .build()
            .map_err(|e| ActionError::config(format!("Invalid S3 configuration: {e}")))?;

        let path = ObjectPath::from(args.key());
        let presign_error =
            |e: object_store::Error| ActionError::Provider(format!("Failed to presign S3 URL: {e}"));
        let upload = store
            .signed_url(Method::PUT, &path, S3_URL_LIFETIME)
            .await
            .map_err(presign_error)?;
        let download = store
            .signed_url(Method::GET, &path, S3_URL_LIFETIME)
            .await
            .map_err(presign_error)?;
        Ok((upload.to_string(), download.to_string()))
    }
}

#[async_trait]
impl Action for UploadToAwsBucket {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("file_upload", "upload_to_aws_bucket")
            .with_display_name("Upload to AWS Bucket")
            .with_description("Asks the webchat user to upload a file to an S3 bucket")
            .with_aliases(&["uploadToAWSBucket"])
            .with_secret_fields(&["access_key_id", "secret_access_key"])
            .output_only()
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = AwsUploadSecret::from_invocation(&invocation)?;
        let args: S3UploadArgs = invocation.args()?;
        args.check_signature_version()?;

        match Self::presign(&secret, &args).await {
            Ok((upload_url, download_url)) => {
                debug!(bucket = %args.bucket(), key = %args.key(), "Presigned S3 upload");
                state.output(
                    Some(String::new()),
                    json!({
                        "_plugin": {
                            "type": "file-upload",
                            "service": "amazon-s3",
                            "uploadUrl": upload_url,
                            "downloadUrl": download_url,
                        }
                    }),
                );
                Ok(())
            }
            Err(err) => soft_fail(state, &invocation, err),
        }
    }
}

pub struct UploadToAzureContainer {
    transport: HttpTransport,
    blob_url_template: String,
}

impl UploadToAzureContainer {
    pub fn new(ctx: &ConnectorContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            blob_url_template: ctx.endpoints.azure_blob_url.clone(),
        }
    }

    fn blob_base(&self, account: &str) -> String {
        self.blob_url_template
            .replace("{account}", account)
            .trim_end_matches('/')
            .to_string()
    }

    /// Creates the container. An existing container is fine.
    async fn create_container(
        &self,
        secret: &AzureUploadSecret,
        account: &str,
        container: &str,
    ) -> ActionResult<()> {
        let date = signing::http_date(OffsetDateTime::now_utc())?;
        let signature = signing::sign(
            &secret.account_key,
            &signing::create_container_string(account, container, &date),
        )?;
        let url = format!("{}/{container}", self.blob_base(account));
        let request = self
            .transport
            .request(Method::PUT, &url)
            .query(&[("restype", "container")])
            .header("x-ms-date", &date)
            .header("x-ms-version", STORAGE_VERSION)
            .header(CONTENT_LENGTH, 0)
            .header("Authorization", format!("SharedKey {account}:{signature}"));

        match self.transport.send(request).await {
            Ok(_) => {
                info!(account = %account, container = %container, "Created blob container");
                Ok(())
            }
            Err(ActionError::RemoteStatus { status: 409, .. }) => {
                debug!(container = %container, "Blob container already exists");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl Action for UploadToAzureContainer {
    fn metadata(&self) -> ActionMetadata {
        ActionMetadata::new("file_upload", "upload_to_azure_container")
            .with_display_name("Upload to Azure Container")
            .with_description("Asks the webchat user to upload a file to an Azure blob container")
            .with_aliases(&["uploadToAzureContainer"])
            .with_secret_fields(&["secret_access_key"])
            .output_only()
    }

    async fn execute(
        &self,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let secret = AzureUploadSecret::from_invocation(&invocation)?;
        let args: AzureUploadArgs = invocation.args()?;
        let account = args.account()?;
        let container = args.container();

        if let Err(err) = self.create_container(&secret, account, &container).await {
            soft_fail(state, &invocation, err)?;
        }

        let start = OffsetDateTime::now_utc();
        let sas = ContainerSas {
            account,
            container: &container,
            start,
            expiry: start + time::Duration::minutes(args.lifetime_minutes()),
        };
        let query = sas.query(&secret.account_key)?;

        state.output(
            Some(String::new()),
            json!({
                "_plugin": {
                    "type": "file-upload",
                    "service": "azure",
                    "baseURL": format!("{}/", self.blob_base(account)),
                    "sasSignature": format!("?{query}"),
                    "containerName": container,
                }
            }),
        );
        Ok(())
    }
}
