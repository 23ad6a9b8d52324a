//! Response helpers shared by the storage and entity clients.

use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Join `path` onto `base`, leaving absolute URLs untouched.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or a [`ClientError::Api`] containing the status and
/// body text on failure.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ClientError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

/// Assert the response has a success status code, discarding the body.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
    ensure_success(response).await?;
    Ok(())
}

/// Decode an entity body that may or may not be wrapped in `{ "data": ... }`.
pub(crate) fn decode_entity<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, ClientError> {
    let unwrapped = match body {
        serde_json::Value::Object(mut obj) if obj.len() == 1 && obj.contains_key("data") => {
            obj.remove("data").unwrap_or_default()
        }
        other => other,
    };
    serde_json::from_value(unwrapped).map_err(|e| ClientError::Decode(e.to_string()))
}
