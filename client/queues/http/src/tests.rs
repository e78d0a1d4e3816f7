use httpmock::prelude::*;
use serde_json::json;

use cloudqueue_client::ClaimOptions;
use cloudqueue_client::QueueHandle;
use cloudqueue_client::QueuePayload;
use cloudqueue_client::QueueService;
use cloudqueue_client::QueueStats;
use cloudqueue_client_utils::ResourceIdentifier;
use cloudqueue_client_utils::ServerError;

use super::ClientOptions;
use super::Credentials;
use super::HttpClient;
use super::InvalidEndpoint;

fn client(server: &MockServer) -> QueueService {
    let options = ClientOptions::url(server.url("/v1")).client();
    let credentials = Credentials {
        client_id: Some("worker-1".into()),
        project_id: Some("project-1".into()),
        token: Some("secret".into()),
    };
    let client = HttpClient::with(options, credentials).unwrap();
    QueueService::from(client)
}

async fn queue(server: &MockServer, name: &str) -> QueueHandle {
    let path = format!("/v1/queues/{}", name);
    server
        .mock_async(|when, then| {
            when.method(PUT).path(path);
            then.status(204);
        })
        .await;
    client(server).create_queue(name).await.unwrap()
}

#[tokio::test]
async fn create_queue_sends_identity() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v1/queues/jobs")
                .header("client-id", "worker-1")
                .header("x-project-id", "project-1")
                .header("x-auth-token", "secret");
            then.status(201);
        })
        .await;
    let queue = client(&server).create_queue("jobs").await.unwrap();
    mock.assert_async().await;
    assert_eq!(queue.name(), "jobs");
}

#[tokio::test]
async fn create_queue_generates_client_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/queues/jobs").header_exists("client-id");
            then.status(201);
        })
        .await;
    let options = ClientOptions::url(server.url("/v1")).client();
    let client = HttpClient::with(options, Credentials::default()).unwrap();
    QueueService::from(client)
        .create_queue("jobs")
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn create_queue_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/queues/jobs");
            then.status(500).json_body(json!({
                "title": "Internal server error",
                "description": "Unable to create the queue",
            }));
        })
        .await;
    let error = client(&server).create_queue("jobs").await.err().unwrap();
    assert!(error.is::<ServerError>());
    let reference = error.downcast_ref::<ResourceIdentifier>().unwrap();
    assert_eq!(reference.id, "jobs");
}

#[tokio::test]
async fn claim_messages() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/queues/jobs/claims")
                .query_param("limit", "1")
                .json_body(json!({"grace": 300, "ttl": 300}));
            then.status(201).json_body(json!([{
                "age": 3,
                "body": "{\"job\":\"mail\",\"data\":{}}",
                "href": "/v1/queues/jobs/messages/m1?claim_id=c1",
                "ttl": 172800,
            }]));
        })
        .await;
    let options = ClaimOptions {
        grace: 300,
        limit: 1,
        ttl: 300,
    };
    let messages = queue.claim_messages(options).await.unwrap();
    mock.assert_async().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id(), "m1");
    assert_eq!(messages[0].claim_id(), Some("c1"));
    assert_eq!(messages[0].body(), r#"{"job":"mail","data":{}}"#);
}

#[tokio::test]
async fn claim_no_messages() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/queues/jobs/claims");
            then.status(204);
        })
        .await;
    let options = ClaimOptions {
        grace: 300,
        limit: 1,
        ttl: 300,
    };
    let messages = queue.claim_messages(options).await.unwrap();
    assert!(messages.is_empty());
}

#[tokio::test]
async fn create_message() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/queues/jobs/messages")
                .json_body(json!([{"body": "payload", "ttl": 3600}]));
            then.status(201).json_body(json!({
                "partial": false,
                "resources": ["/v1/queues/jobs/messages/m1"],
            }));
        })
        .await;
    let payload = QueuePayload {
        body: "payload".into(),
        ttl: 3600,
    };
    let created = queue.create_message(payload).await.unwrap();
    mock.assert_async().await;
    assert!(created);
}

#[tokio::test]
async fn create_message_partial() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/queues/jobs/messages");
            then.status(201)
                .json_body(json!({"partial": true, "resources": []}));
        })
        .await;
    let payload = QueuePayload {
        body: "payload".into(),
        ttl: 60,
    };
    let created = queue.create_message(payload).await.unwrap();
    assert!(!created);
}

#[tokio::test]
async fn delete_claimed_message() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/queues/jobs/messages/m1")
                .query_param("claim_id", "c1");
            then.status(204);
        })
        .await;
    queue.delete_claimed_message("m1", Some("c1")).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_messages() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/queues/jobs/messages")
                .query_param("ids", "m1,m2");
            then.status(204);
        })
        .await;
    let ids = vec!["m1".to_string(), "m2".to_string()];
    queue.delete_messages(&ids).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn stats() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/queues/jobs/stats");
            then.status(200).json_body(json!({
                "messages": {"claimed": 1, "free": 4, "total": 5},
            }));
        })
        .await;
    let stats = queue.stats().await.unwrap();
    let expected = QueueStats {
        claimed: 1,
        free: 4,
        total: 5,
    };
    assert_eq!(stats, Some(expected));
}

#[tokio::test]
async fn stats_missing() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/queues/jobs/stats");
            then.status(200);
        })
        .await;
    let stats = queue.stats().await.unwrap();
    assert_eq!(stats, None);
}

#[tokio::test]
async fn stats_without_messages() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/queues/jobs/stats");
            then.status(200).json_body(json!({}));
        })
        .await;
    let stats = queue.stats().await.unwrap();
    assert_eq!(stats, None);
}

#[tokio::test]
async fn queue_names_are_escaped() {
    let server = MockServer::start_async().await;
    let escaped = server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/queues/a%3Fb");
            then.status(201);
        })
        .await;
    let queue = client(&server).create_queue("a?b").await.unwrap();
    escaped.assert_async().await;
    assert_eq!(queue.name(), "a?b");
}

#[tokio::test]
async fn message_ids_are_escaped() {
    let server = MockServer::start_async().await;
    let queue = queue(&server, "jobs").await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/queues/jobs/messages/m%2F1")
                .query_param("claim_id", "c 1");
            then.status(204);
        })
        .await;
    queue.delete_claimed_message("m/1", Some("c 1")).await.unwrap();
    mock.assert_async().await;
}

#[test]
fn endpoint_must_be_a_base_url() {
    let options = ClientOptions::url("mailto:ops@example.com").client();
    let error = HttpClient::with(options, Credentials::default()).err().unwrap();
    assert!(error.is::<InvalidEndpoint>());
}
