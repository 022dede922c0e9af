//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

const BOUNDARY: &str = "ramal-test-boundary";

fn setup_test_app() -> Router {
    create_router(ForecastConfig::default(), ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Ledger with a six-month "Food" series and a single-month "Rent" entry
fn sample_csv() -> String {
    let mut csv = String::from("date,category,amount\n");
    for month in 1..=6 {
        csv.push_str(&format!(
            "2024-{:02}-10,Food,{}\n",
            month,
            1_000_000 + 50_000 * (month - 1)
        ));
    }
    csv.push_str("2024-06-01,Rent,2500000\n");
    csv
}

fn multipart_request(uri: &str, filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {c}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
        f = filename,
        c = content
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(filename: &str, content: &str) -> Request<Body> {
    use base64::Engine;

    let body = serde_json::json!({
        "filename": filename,
        "csv_data": base64::engine::general_purpose::STANDARD.encode(content),
    });
    Request::builder()
        .method("POST")
        .uri("/api/forecast/json")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ========== Helper Tests ==========

#[test]
fn test_allowed_file() {
    assert!(allowed_file("ledger.csv"));
    assert!(allowed_file("LEDGER.CSV"));
    assert!(allowed_file("export.2024.Csv"));
    assert!(!allowed_file("ledger.xlsx"));
    assert!(!allowed_file("csv"));
    assert!(!allowed_file("ledger.csv.txt"));
    assert!(!allowed_file(""));
}

// ========== Health API Tests ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
}

// ========== Multipart Upload Tests ==========

#[tokio::test]
async fn test_forecast_upload_success() {
    let app = setup_test_app();

    let response = app
        .oneshot(multipart_request("/api/forecast", "ledger.csv", &sample_csv()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let forecasts = json["forecasts"].as_object().unwrap();
    assert_eq!(forecasts.len(), 2);
    assert_eq!(forecasts["Food"], "Rp. 1.300.000");
    assert_eq!(forecasts["Rent"], "Rp. 2.500.000");
}

#[tokio::test]
async fn test_forecast_upload_uppercase_extension() {
    let app = setup_test_app();

    let response = app
        .oneshot(multipart_request("/api/forecast", "LEDGER.CSV", &sample_csv()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forecast_upload_rejects_wrong_extension() {
    let app = setup_test_app();

    let response = app
        .oneshot(multipart_request("/api/forecast", "ledger.xlsx", &sample_csv()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains(".csv"));
}

#[tokio::test]
async fn test_forecast_upload_empty_filename() {
    let app = setup_test_app();

    let response = app
        .oneshot(multipart_request("/api/forecast", "", &sample_csv()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No selected file");
}

#[tokio::test]
async fn test_forecast_upload_missing_file_field() {
    let app = setup_test_app();
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = BOUNDARY
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/forecast")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No file part");
}

#[tokio::test]
async fn test_forecast_upload_parse_error() {
    let app = setup_test_app();
    let csv = "date,category,amount\n2024-01-10,Food,100\nnot-a-date,Food,200\n";

    let response = app
        .oneshot(multipart_request("/api/forecast", "ledger.csv", csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("row 2"), "{}", message);
}

#[tokio::test]
async fn test_forecast_upload_category_errors_are_per_category() {
    let app = setup_test_app();
    let mut csv = sample_csv();
    for month in 1..=12 {
        csv.push_str(&format!("2023-{:02}-05,Gifts,{}\n", month, 10_000 * month));
    }
    // The March total overflows to infinity
    csv.push_str("2023-03-20,Gifts,1e308\n2023-03-21,Gifts,1e308\n");

    let response = app
        .oneshot(multipart_request("/api/forecast", "ledger.csv", &csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let forecasts = &json["forecasts"];
    assert!(forecasts["Gifts"].as_str().unwrap().starts_with("Error: "));
    assert_eq!(forecasts["Food"], "Rp. 1.300.000");
}

// ========== JSON Upload Tests ==========

#[tokio::test]
async fn test_forecast_json_success() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request("ledger.csv", &sample_csv()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["forecasts"]["Food"], "Rp. 1.300.000");
}

#[tokio::test]
async fn test_forecast_json_invalid_base64() {
    let app = setup_test_app();
    let body = serde_json::json!({
        "filename": "ledger.csv",
        "csv_data": "%%% not base64 %%%",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/forecast/json")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid base64 data"));
}

#[tokio::test]
async fn test_forecast_json_wrong_extension() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request("ledger.txt", &sample_csv()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forecast_json_missing_column() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request("ledger.csv", "date,amount\n2024-01-01,5\n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Missing required column: category");
}

// ========== CORS Tests ==========

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = create_router(
        ForecastConfig::default(),
        ServerConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:5173"
    );
}
