// Tests for the document store and mail API clients against a mock HTTP
// server.

use uuid::Uuid;

use expander_match::core::ports::MatchNotifier;
use expander_match::services::{DocumentStoreClient, Mailer};

fn docstore_client(base_url: &str) -> DocumentStoreClient {
    DocumentStoreClient::new(
        base_url.to_string(),
        "test_key".to_string(),
        "research".to_string(),
        "project_documents".to_string(),
    )
}

#[tokio::test]
async fn test_count_documents_by_project_parses_groups() {
    let mut server = mockito::Server::new_async().await;

    let p1 = Uuid::new_v4();
    let p2 = Uuid::new_v4();

    let body = serde_json::json!({
        "groups": [
            { "projectId": p1.to_string(), "count": 4 },
            { "projectId": p2.to_string(), "count": 9 },
        ]
    });

    let mock = server
        .mock(
            "POST",
            "/databases/research/collections/project_documents/documents/aggregate",
        )
        .match_header("x-docstore-key", "test_key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = docstore_client(&server.url());
    let counts = client.count_documents_by_project(&[p1, p2]).await.unwrap();

    mock.assert_async().await;
    assert_eq!(counts.get(&p1), Some(&4));
    assert_eq!(counts.get(&p2), Some(&9));
}

#[tokio::test]
async fn test_count_documents_by_project_skips_call_for_empty_set() {
    // No server at all: an empty project set must not hit the network
    let client = docstore_client("http://127.0.0.1:1");
    let counts = client.count_documents_by_project(&[]).await.unwrap();
    assert!(counts.is_empty());
}

#[tokio::test]
async fn test_count_documents_by_project_surfaces_api_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock(
            "POST",
            "/databases/research/collections/project_documents/documents/aggregate",
        )
        .with_status(503)
        .create_async()
        .await;

    let client = docstore_client(&server.url());
    let result = client.count_documents_by_project(&[Uuid::new_v4()]).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_count_documents_total() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock(
            "GET",
            "/databases/research/collections/project_documents/documents/count",
        )
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{ "count": 17 }"#)
        .create_async()
        .await;

    let client = docstore_client(&server.url());
    let count = client.count_documents(&[Uuid::new_v4()]).await.unwrap();

    mock.assert_async().await;
    assert_eq!(count, 17);
}

#[tokio::test]
async fn test_mailer_reports_success() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/v3/mg.expanders.test/messages")
        .with_status(200)
        .with_body(r#"{ "id": "<msg@mg>", "message": "Queued" }"#)
        .create_async()
        .await;

    let mailer = Mailer::new(
        server.url(),
        "mg.expanders.test".to_string(),
        "key".to_string(),
        "noreply@expanders.test".to_string(),
        "Expanders".to_string(),
    );

    let sent = mailer
        .send_match_notification(
            "client@expanders.test",
            Uuid::new_v4(),
            "Acme Logistics",
            "Score: 3.26, Services Overlap: 2, Vendor Rating: 4",
        )
        .await;

    mock.assert_async().await;
    assert!(sent);
}

#[tokio::test]
async fn test_mailer_swallows_api_failure() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/v3/mg.expanders.test/messages")
        .with_status(500)
        .create_async()
        .await;

    let mailer = Mailer::new(
        server.url(),
        "mg.expanders.test".to_string(),
        "key".to_string(),
        "noreply@expanders.test".to_string(),
        "Expanders".to_string(),
    );

    let sent = mailer
        .send_match_notification(
            "client@expanders.test",
            Uuid::new_v4(),
            "Acme Logistics",
            "Score: 3.26",
        )
        .await;

    assert!(!sent);
}
