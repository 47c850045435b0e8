/// Router-level tests driven with tower's `oneshot`
/// Exercises the HTTP surface in mock-data, rule-based mode (no store, no
/// model artifact), the default deployment when neither collaborator exists
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use incluscore_api::config::Config;
use incluscore_api::handlers::{self, AppState};
use incluscore_api::scoring::ScoringEngine;

fn test_app() -> Router {
    let state = Arc::new(AppState {
        config: Config {
            port: 8000,
            database_url: None,
            model_path: "models/credit_model.json".into(),
        },
        store: None,
        engine: ScoringEngine::new(None),
    });
    handlers::router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, method: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_index_reports_absent_collaborators() {
    let response = test_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["store_connected"], false);
    assert_eq!(body["endpoints"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_get_user_serves_mock_data() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/users/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Raj Kumar");
    assert_eq!(body["city"], "Mumbai");
    assert_eq!(body["financial_profile"]["upi_transactions"], 45);
    assert_eq!(body["financial_profile"]["avg_transaction_amount"], 320.0);
}

#[tokio::test]
async fn test_get_unknown_user_is_404() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/users/999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn test_predict_scores_with_rule_based_fallback() {
    let payload = serde_json::json!({
        "upi_transactions": 45,
        "avg_transaction": 320.0,
        "bill_payments_on_time": 18,
        "mobile_recharge_regularity": 0.85,
        "savings_pattern": 0.40,
    });
    let response = test_app()
        .oneshot(json_request("/predict", "POST", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["credit_score"], 744);
    assert_eq!(body["confidence"], 0.82);
    assert_eq!(body["risk_band"], "Good");
    assert_eq!(body["lender_recommendation"], "APPROVE");

    let factors = body["factors"].as_object().unwrap();
    assert_eq!(factors.len(), 5);
    let total: f64 = factors.values().map(|v| v.as_f64().unwrap()).sum();
    assert!((total - 100.0).abs() <= 0.1);

    let recs = body["recommendations"].as_array().unwrap();
    assert!(!recs.is_empty() && recs.len() <= 3);
}

#[tokio::test]
async fn test_predict_enumerates_validation_failures() {
    let payload = serde_json::json!({
        "upi_transactions": 700,
        "avg_transaction": -5.0,
        "bill_payments_on_time": 18,
        "mobile_recharge_regularity": 0.85,
        "savings_pattern": 0.40,
    });
    let response = test_app()
        .oneshot(json_request("/predict", "POST", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["issues"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_predict_rejects_missing_fields() {
    let payload = serde_json::json!({ "upi_transactions": 45 });
    let response = test_app()
        .oneshot(json_request("/predict", "POST", payload))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_refresh_score_simulates_next_period() {
    let response = test_app()
        .oneshot(json_request(
            "/users/1/refresh-score",
            "POST",
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let new_score = body["new_score"].as_u64().unwrap();
    assert!((300..=900).contains(&new_score));

    // Narrative display value, not the actual score difference
    let delta = body["delta"].as_u64().unwrap();
    assert!((3..18).contains(&delta));
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains(&format!("+{} points", delta)));
    assert_eq!(body["confidence"], 0.82);
}

#[tokio::test]
async fn test_refresh_score_unknown_user_is_404() {
    let response = test_app()
        .oneshot(json_request(
            "/users/999/refresh-score",
            "POST",
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_predictions_are_independent() {
    let payload = serde_json::json!({
        "upi_transactions": 45,
        "avg_transaction": 320.0,
        "bill_payments_on_time": 18,
        "mobile_recharge_regularity": 0.85,
        "savings_pattern": 0.40,
    });

    let mut handles = vec![];
    for _ in 0..10 {
        let app = test_app();
        let body = payload.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(json_request("/predict", "POST", body))
                .await
                .unwrap()
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["credit_score"], 744);
    }
}
