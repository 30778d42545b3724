use reqwest::{header, Client};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use url::form_urlencoded;
use url::Url;

use super::crypto::{sign_request, token_authorization};
use super::errors::CdnErrors;
use super::types::{ApiResponse, BodyMode, Credentials};

/// Signed POST client for the DogeCloud API.
#[derive(Debug, Clone)]
pub struct DogeCloudClient {
    client: Client,
    credentials: Credentials,
    api_base: Url,
}

impl DogeCloudClient {
    pub fn new(credentials: Credentials, api_base: Url, timeout: Duration) -> Result<Self, CdnErrors> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(DogeCloudClient {
            client,
            credentials,
            api_base,
        })
    }

    /// Posts `payload` as JSON to `api_path`.
    pub async fn post<T>(&self, api_path: &str, payload: &T) -> Result<ApiResponse, CdnErrors>
    where
        T: Serialize + ?Sized,
    {
        self.post_with_mode(api_path, payload, BodyMode::Json).await
    }

    /// Serializes `payload`, signs `api_path` plus the body and posts it.
    ///
    /// Whatever JSON comes back is returned as is, including non-200 codes.
    /// Only transport failures and non-JSON bodies are errors here.
    pub async fn post_with_mode<T>(
        &self,
        api_path: &str,
        payload: &T,
        mode: BodyMode,
    ) -> Result<ApiResponse, CdnErrors>
    where
        T: Serialize + ?Sized,
    {
        let body = serialize_body(payload, mode)?;
        let signature = sign_request(&self.credentials.secret_key, api_path, &body)?;
        let url = self.endpoint(api_path);
        tracing::debug!("POST {} ({} body)", url, mode);
        tracing::trace!("request body: {}", body);

        let response = self
            .client
            .post(url)
            .header(
                header::AUTHORIZATION,
                token_authorization(&self.credentials.access_key, &signature),
            )
            .header(header::CONTENT_TYPE, mode.content_type())
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let parsed: ApiResponse = response.json().await?;
        tracing::trace!("HTTP {} code {} msg {:?}", status, parsed.code, parsed.msg);
        Ok(parsed)
    }

    fn endpoint(&self, api_path: &str) -> String {
        format!("{}{}", self.api_base.as_str().trim_end_matches('/'), api_path)
    }
}

/// Renders `payload` in the body format of `mode`. The payload must serialize
/// to a JSON object.
pub(crate) fn serialize_body<T>(payload: &T, mode: BodyMode) -> Result<String, CdnErrors>
where
    T: Serialize + ?Sized,
{
    let fields: Map<String, Value> = match serde_json::to_value(payload)? {
        Value::Object(map) => map,
        other => return Err(CdnErrors::InvalidPayload(other.to_string())),
    };
    match mode {
        BodyMode::Json => Ok(serde_json::to_string(&fields)?),
        BodyMode::Form => {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in &fields {
                match value {
                    Value::String(s) => serializer.append_pair(key, s),
                    other => serializer.append_pair(key, &other.to_string()),
                };
            }
            Ok(serializer.finish())
        }
    }
}
