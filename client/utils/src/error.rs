//! Errors encountered during API requests or reported by the remote server.
use anyhow::Result;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// The client sent an invalid API request.
#[derive(Debug, thiserror::Error)]
#[error("the client sent an invalid API request")]
pub struct ClientError;

/// The server returned an empty API response.
#[derive(Debug, thiserror::Error)]
#[error("the server returned an empty API response")]
pub struct EmptyResponse;

/// Invalid API response received.
#[derive(Debug, thiserror::Error)]
#[error("invalid API response received: {response}")]
pub struct InvalidResponse {
    pub response: String,
}

/// The resource is not available, or access to it is restricted.
#[derive(Debug, thiserror::Error)]
#[error("the resource is not available, or access to it is restricted")]
pub struct ResourceNotFound;

/// Error refers to resource with ID.
#[derive(Debug, thiserror::Error)]
#[error("error refers to {resource} '{id}'")]
pub struct ResourceIdentifier {
    /// Identifier of a resource the error refers to.
    pub id: String,

    /// Type of resource the error refers to.
    pub resource: String,
}

impl ResourceIdentifier {
    /// Resource identifier context for the given resource type and id.
    pub fn reference<S1, S2>(resource: S1, id: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        ResourceIdentifier {
            id: id.into(),
            resource: resource.into(),
        }
    }
}

/// The server failed to process the API request.
#[derive(Debug, thiserror::Error)]
#[error("the server failed to process the API request")]
pub struct ServerError;

/// Error reported by the Cloud Queues service in the response body.
#[derive(Debug, Deserialize, thiserror::Error)]
#[error("{title}: {description}")]
pub struct ServiceError {
    /// Detailed explanation of the error.
    #[serde(default)]
    pub description: String,

    /// Short summary of the error.
    #[serde(default)]
    pub title: String,
}

/// Decode the body of an HTTP response and correctly handle errors in the process.
pub async fn inspect<T>(response: Response) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let code = response.status();
    let text = response.text().await?;

    if matches!(code, reqwest::StatusCode::NOT_FOUND) {
        anyhow::bail!(ResourceNotFound);
    }

    // On error, attempt to decode the service error and convert into appropriate errors.
    if code.is_client_error() || code.is_server_error() {
        let error = serde_json::from_str::<ServiceError>(&text).map_err(|error| {
            let response = text.clone();
            let decode = InvalidResponse { response };
            anyhow::anyhow!(error).context(decode)
        })?;
        let error = anyhow::anyhow!(error);
        let error = match code.is_client_error() {
            true => error.context(ClientError),
            false => error.context(ServerError),
        };
        return Err(error);
    }

    // On success decode the payload, if any, into the requested type.
    if text.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<T>(&text)
        .map_err(|error| {
            let decode = InvalidResponse { response: text };
            anyhow::anyhow!(error).context(decode)
        })
        .map(Some)
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;
    use serde_json::Value as Json;

    use super::inspect;
    use super::ClientError;
    use super::InvalidResponse;
    use super::ResourceNotFound;
    use super::ServerError;
    use super::ServiceError;

    async fn fetch(server: &MockServer) -> reqwest::Response {
        reqwest::get(server.url("/test")).await.unwrap()
    }

    #[tokio::test]
    async fn decode_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/test");
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;
        let body: Option<Json> = inspect(fetch(&server).await).await.unwrap();
        assert_eq!(body, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn decode_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/test");
                then.status(204);
            })
            .await;
        let body: Option<Json> = inspect(fetch(&server).await).await.unwrap();
        assert_eq!(body, None);
    }

    #[tokio::test]
    async fn decode_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/test");
                then.status(200).body("not json");
            })
            .await;
        let error = inspect::<Json>(fetch(&server).await).await.unwrap_err();
        assert!(error.is::<InvalidResponse>());
    }

    #[tokio::test]
    async fn not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/test");
                then.status(404);
            })
            .await;
        let error = inspect::<Json>(fetch(&server).await).await.unwrap_err();
        assert!(error.is::<ResourceNotFound>());
    }

    #[tokio::test]
    async fn client_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/test");
                then.status(400).json_body(json!({
                    "title": "Invalid API call",
                    "description": "The queue name is not valid",
                }));
            })
            .await;
        let error = inspect::<Json>(fetch(&server).await).await.unwrap_err();
        assert!(error.is::<ClientError>());
        let service = error.downcast_ref::<ServiceError>().unwrap();
        assert_eq!(service.title, "Invalid API call");
        assert_eq!(service.description, "The queue name is not valid");
    }

    #[tokio::test]
    async fn server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/test");
                then.status(503).json_body(json!({"title": "Service unavailable"}));
            })
            .await;
        let error = inspect::<Json>(fetch(&server).await).await.unwrap_err();
        assert!(error.is::<ServerError>());
        assert!(error.is::<ServiceError>());
    }
}
