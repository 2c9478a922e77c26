use loglift::config::{DeliveryConfig, WorkspaceConfig};
use loglift::ingest::{DeliveryError, IngestionClient, LogSink, RequestSigner, SigningInput};
use mockito::{Matcher, Server};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
const BODY: &[u8] = br#"[{"iotHub":"hub","message":"hello"}]"#;

fn workspace(endpoint: &str) -> WorkspaceConfig {
    let mut workspace = WorkspaceConfig::new("ws-test", KEY, "IoTEdgeLogs");
    workspace.endpoint = Some(endpoint.to_string());
    workspace
}

fn delivery() -> DeliveryConfig {
    DeliveryConfig {
        timeout: Duration::from_secs(5),
        ..DeliveryConfig::default()
    }
}

#[tokio::test]
async fn test_post_sends_signed_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/logs")
        .match_query(Matcher::UrlEncoded(
            "api-version".into(),
            "2016-04-01".into(),
        ))
        .match_header("content-type", "application/json")
        .match_header("log-type", "IoTEdgeLogs")
        .match_header(
            "x-ms-date",
            Matcher::Regex(r"^[A-Z][a-z]{2}, \d{2} [A-Z][a-z]{2} \d{4} \d{2}:\d{2}:\d{2} GMT$".into()),
        )
        .match_header(
            "authorization",
            Matcher::Regex(r"^SharedKey ws-test:[A-Za-z0-9+/]{43}=$".into()),
        )
        .match_header("x-ms-azureresourceid", Matcher::Missing)
        .match_body(Matcher::Exact(String::from_utf8(BODY.to_vec()).unwrap()))
        .with_status(200)
        .create_async()
        .await;

    let client = IngestionClient::new(&workspace(&server.url()), &delivery()).unwrap();
    client.post(BODY.to_vec()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_accepted_status_is_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/logs")
        .match_query(Matcher::Any)
        .with_status(202)
        .create_async()
        .await;

    let client = IngestionClient::new(&workspace(&server.url()), &delivery()).unwrap();
    assert!(client.post(BODY.to_vec()).await.is_ok());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_statuses_capture_body() {
    for status in [400, 401, 404, 500] {
        let mut server = Server::new_async().await;
        let detail = format!("{{\"Error\":\"failure {}\",\"Message\":\"details\"}}", status);
        let mock = server
            .mock("POST", "/api/logs")
            .match_query(Matcher::Any)
            .with_status(status)
            .with_body(&detail)
            .create_async()
            .await;

        let client = IngestionClient::new(&workspace(&server.url()), &delivery()).unwrap();
        match client.post(BODY.to_vec()).await {
            Err(DeliveryError::Rejected { status: got, body }) => {
                assert_eq!(got as usize, status);
                assert_eq!(body, detail);
            }
            other => panic!("status {}: expected rejection, got {:?}", status, other),
        }

        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_resource_id_header_sent_when_configured() {
    let resource = "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.Devices/IotHubs/hub";
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/logs")
        .match_query(Matcher::Any)
        .match_header("x-ms-azureresourceid", resource)
        .with_status(200)
        .create_async()
        .await;

    let mut config = workspace(&server.url());
    config.resource_id = Some(resource.to_string());
    let client = IngestionClient::new(&config, &delivery()).unwrap();
    client.post(BODY.to_vec()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Reserve a port, then close it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = IngestionClient::new(&workspace(&format!("http://{}", addr)), &delivery()).unwrap();
    let result = client.post(BODY.to_vec()).await;

    assert!(
        matches!(result, Err(DeliveryError::Transport(_))),
        "{:?}",
        result
    );
}

/// Accepts one HTTP request, answers 200 and returns the raw request text
async fn capture_one_request(listener: TcpListener) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&raw).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = header_value(&text, "content-length")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    socket
        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
        .await
        .unwrap();
    String::from_utf8(raw).unwrap()
}

fn header_value(request: &str, name: &str) -> Option<String> {
    request.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

#[tokio::test]
async fn test_signature_matches_date_header() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(capture_one_request(listener));

    let client = IngestionClient::new(&workspace(&format!("http://{}", addr)), &delivery()).unwrap();
    client.post(BODY.to_vec()).await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/logs?api-version=2016-04-01 HTTP/1.1"));

    let date = header_value(&request, "x-ms-date").expect("x-ms-date header");
    let authorization = header_value(&request, "authorization").expect("authorization header");

    // Recompute with the transmitted date; must match byte for byte
    let signer = RequestSigner::new("ws-test", KEY).unwrap();
    let expected = signer
        .sign(&SigningInput {
            method: "POST",
            content_length: BODY.len(),
            content_type: "application/json",
            date: &date,
            resource: "/api/logs",
        })
        .unwrap();
    assert_eq!(authorization, expected);
}
