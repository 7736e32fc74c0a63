use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use csv_analysis_service::{
    app, config::Config, routes::analysis::DataAnalysisResponse,
    services::analysis_store::AnalysisStore, AppState,
};
use serde_json::Value;
use tower::ServiceExt;

fn test_app() -> Router {
    let store = AnalysisStore::open_in_memory().expect("in-memory store");
    app(Arc::new(AppState::new(Config::default(), Arc::new(store))))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, body.to_vec())
}

fn ingest_request(csv: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/analysis/ingestCsv")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(csv.to_string()))
        .unwrap()
}

fn upload_request(field: &str, contents: &[u8]) -> Request<Body> {
    let boundary = "csv-analysis-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"data.csv\"\r\nContent-Type: text/csv\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/analysis/uploadCsv")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = test_app();
    let (status, body) = send(&app, empty_request(Method::GET, "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn ingest_returns_statistics_in_camel_case() {
    let app = test_app();
    let (status, body) = send(&app, ingest_request("a,b,c\n1,2,3\n4,,6")).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["numberOfRows"], 2);
    assert_eq!(json["numberOfColumns"], 3);
    assert_eq!(json["totalCharacters"], 17);
    assert!(json["createdAt"].is_string());

    let stats = json["columnStatistics"].as_array().unwrap();
    assert_eq!(stats.len(), 3);
    assert_eq!(stats[1]["columnName"], "b");
    assert_eq!(stats[1]["nullCount"], 1);
    assert_eq!(stats[1]["uniqueCount"], 1);
}

#[tokio::test]
async fn invalid_inputs_return_bad_request() {
    let app = test_app();
    for csv in ["", "   \n", "no delimiter here", "name,who\n1,Sonny Hayes", "a,b\n1,2,3"] {
        let (status, body) = send(&app, ingest_request(csv)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "input {csv:?}");
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn rejected_input_is_not_persisted() {
    let app = test_app();
    let (status, _) = send(&app, ingest_request("a,b\n1,2,3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, empty_request(Method::GET, "/api/analysis/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stored_analysis_can_be_fetched_and_deleted() {
    let app = test_app();
    let (status, body) = send(&app, ingest_request("id,name\n1,ann\n2,\n3,ann\n")).await;
    assert_eq!(status, StatusCode::OK);
    let ingested: DataAnalysisResponse = serde_json::from_slice(&body).unwrap();

    let uri = format!("/api/analysis/{}", ingested.id);
    let (status, body) = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: DataAnalysisResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched.number_of_rows, 3);
    assert_eq!(fetched.column_statistics, ingested.column_statistics);
    assert_eq!(fetched.column_statistics[1].null_count, 1);
    assert_eq!(fetched.column_statistics[1].unique_count, 1);

    let (status, body) = send(&app, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = send(&app, empty_request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, empty_request(Method::GET, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_id_returns_not_found() {
    let app = test_app();
    let (status, _) = send(&app, empty_request(Method::GET, "/api/analysis/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, empty_request(Method::DELETE, "/api/analysis/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploaded_file_is_analyzed() {
    let app = test_app();
    let (status, body) = send(&app, upload_request("file", b"x,y\n1,2\n1,3\n")).await;
    assert_eq!(status, StatusCode::OK);
    let response: DataAnalysisResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.number_of_rows, 2);
    assert_eq!(response.total_characters, 12);
    assert_eq!(response.column_statistics[0].unique_count, 1);
    assert_eq!(response.column_statistics[1].unique_count, 2);
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let app = test_app();
    let (status, _) = send(&app, upload_request("attachment", b"x,y\n1,2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_with_invalid_utf8_is_rejected() {
    let app = test_app();
    let (status, _) = send(&app, upload_request("file", &[b'a', b',', 0xff, 0xfe])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
