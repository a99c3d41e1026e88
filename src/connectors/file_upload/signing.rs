//! Azure Storage Shared Key and service SAS signatures.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::errors::{ActionError, ActionResult};

type HmacSha256 = Hmac<Sha256>;

/// Storage service version used for both the REST call and the SAS.
pub const STORAGE_VERSION: &str = "2016-05-31";
pub const CONTAINER_PERMISSIONS: &str = "racwdl";
pub const SAS_IP_RANGE: &str = "0.0.0.0-255.255.255.255";
pub const SAS_PROTOCOL: &str = "https,http";

const HTTP_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);
const SAS_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

fn format(moment: OffsetDateTime, layout: &[BorrowedFormatItem<'static>]) -> ActionResult<String> {
    moment
        .format(layout)
        .map_err(|e| ActionError::Provider(format!("Failed to format timestamp: {e}")))
}

/// `x-ms-date` value.
pub fn http_date(moment: OffsetDateTime) -> ActionResult<String> {
    format(moment, HTTP_DATE)
}

/// Base64 HMAC-SHA256 of `payload` under the base64 account key.
pub fn sign(account_key: &str, payload: &str) -> ActionResult<String> {
    let key = BASE64
        .decode(account_key)
        .map_err(|_| ActionError::config("secret_access_key is not a valid storage account key"))?;
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| ActionError::config(format!("Invalid storage account key: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// String to sign for `PUT {container}?restype=container` with an empty body.
pub fn create_container_string(account: &str, container: &str, date: &str) -> String {
    // Eleven empty standard headers; content length is blank when zero.
    format!(
        "PUT\n\n\n\n\n\n\n\n\n\n\n\nx-ms-date:{date}\nx-ms-version:{STORAGE_VERSION}\n/{account}/{container}\nrestype:container"
    )
}

/// Service SAS scoped to one container.
#[derive(Debug, Clone)]
pub struct ContainerSas<'a> {
    pub account: &'a str,
    pub container: &'a str,
    pub start: OffsetDateTime,
    pub expiry: OffsetDateTime,
}

impl ContainerSas<'_> {
    pub fn string_to_sign(&self) -> ActionResult<String> {
        let start = format(self.start, SAS_TIME)?;
        let expiry = format(self.expiry, SAS_TIME)?;
        let resource = format!("/blob/{}/{}", self.account, self.container);
        let fields: [&str; 13] = [
            CONTAINER_PERMISSIONS,
            &start,
            &expiry,
            &resource,
            "",
            SAS_IP_RANGE,
            SAS_PROTOCOL,
            STORAGE_VERSION,
            "",
            "",
            "",
            "",
            "",
        ];
        Ok(fields.join("\n"))
    }

    /// Encoded query string without the leading `?`.
    pub fn query(&self, account_key: &str) -> ActionResult<String> {
        let signature = sign(account_key, &self.string_to_sign()?)?;
        Ok(url::form_urlencoded::Serializer::new(String::new())
            .append_pair("sv", STORAGE_VERSION)
            .append_pair("spr", SAS_PROTOCOL)
            .append_pair("st", &format(self.start, SAS_TIME)?)
            .append_pair("se", &format(self.expiry, SAS_TIME)?)
            .append_pair("sip", SAS_IP_RANGE)
            .append_pair("sr", "c")
            .append_pair("sp", CONTAINER_PERMISSIONS)
            .append_pair("sig", &signature)
            .finish())
    }
}
