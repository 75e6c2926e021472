//! Integration test: price API endpoints

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use getaround_insights::predict::features::{CATEGORICAL, FLAGS, NUMERIC, TARGET};
use getaround_insights::predict::{LinearPriceModel, PredictionGateway, PricingFeatures};
use getaround_insights::server::{create_router, AppState};
use getaround_insights::{AppConfig, DatasetCache, Row, Table};

fn pricing_row(features: &PricingFeatures) -> Row {
    let mut row = Row::new();
    for name in CATEGORICAL {
        row.set(name, features.category(name));
    }
    for name in NUMERIC {
        row.set(name, features.numeric(name));
    }
    for name in FLAGS {
        row.set(name, features.flag(name));
    }
    row
}

fn pricing_table(n: usize) -> Table {
    let rows = (0..n)
        .map(|i| {
            let features = PricingFeatures {
                mileage: 1000.0 * i as f64,
                ..PricingFeatures::default()
            };
            pricing_row(&features).with(TARGET, 100.0 + i as f64)
        })
        .collect();
    Table::from_rows(rows)
}

fn model() -> LinearPriceModel {
    serde_json::from_value(serde_json::json!({
        "intercept": 120.0,
        "numeric": {
            "mileage": { "mean": 100000.0, "scale": 50000.0, "coef": -10.0 },
            "engine_power": { "mean": 135.0, "scale": 40.0, "coef": 15.0 }
        },
        "flags": { "has_gps": 5.0 },
        "categorical": {
            "fuel": { "diesel": 0.0, "petrol": -2.0 },
            "model_key": { "Peugeot": 0.0, "Renault": -4.0 }
        }
    }))
    .unwrap()
}

fn app_with(gateway: PredictionGateway, table: Option<Table>) -> axum::Router {
    let datasets = DatasetCache::with_fetcher(move |_| match &table {
        Some(t) => Ok(t.clone()),
        None => anyhow::bail!("connection refused"),
    });
    let state = Arc::new(AppState::new(AppConfig::default(), gateway, datasets));
    create_router(state)
}

fn test_app() -> axum::Router {
    app_with(
        PredictionGateway::from_model(Arc::new(model())),
        Some(pricing_table(100)),
    )
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (status, body) = send(test_app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["endpoints"]["predict"], "/predict");
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send(test_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn test_health_hides_model_load_error() {
    let app = app_with(
        PredictionGateway::unavailable("/srv/models/price_model.json: No such file"),
        None,
    );
    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["model"], "unavailable");
    assert!(body.get("model_error").is_none());
    assert!(!body.to_string().contains("/srv/models"));
}

#[tokio::test]
async fn test_predict_known_combination() {
    let features = serde_json::to_value(PricingFeatures::default()).unwrap();
    let (status, body) = send(test_app(), post_json("/predict", &features)).await;
    assert_eq!(status, StatusCode::OK);

    let prediction = body["prediction"].as_f64().unwrap();
    assert!(prediction.is_finite());
    assert!(prediction >= 0.0);
    // 120 + 0 (mileage at mean) + 0 (135hp) + 5 (gps)
    assert_eq!(prediction, 125.0);
}

#[tokio::test]
async fn test_predict_without_model_is_unavailable_every_time() {
    let features = serde_json::to_value(PricingFeatures::default()).unwrap();
    for _ in 0..3 {
        let app = app_with(PredictionGateway::unavailable("missing artifact"), None);
        let (status, body) = send(app, post_json("/predict", &features)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], true);
        assert!(body["message"].as_str().unwrap().contains("Model unavailable"));
    }
}

#[tokio::test]
async fn test_predict_unknown_category_fails() {
    let features = serde_json::to_value(PricingFeatures {
        fuel: "hydrogen".into(),
        ..PricingFeatures::default()
    })
    .unwrap();
    let (status, body) = send(test_app(), post_json("/predict", &features)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("hydrogen"));
}

#[tokio::test]
async fn test_predict_rejects_wrong_types() {
    let mut features = serde_json::to_value(PricingFeatures::default()).unwrap();
    features["mileage"] = serde_json::json!("a lot");
    let response = test_app()
        .oneshot(post_json("/predict", &features))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_preview_returns_distinct_rows() {
    let (status, body) = send(test_app(), get("/preview?rows=10")).await;
    assert_eq!(status, StatusCode::OK);

    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 10);

    let mileages: BTreeSet<i64> = rows
        .iter()
        .map(|r| r["mileage"].as_f64().unwrap() as i64)
        .collect();
    assert_eq!(mileages.len(), 10);

    for row in rows {
        let record: PricingFeatures = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(record.model_key, "Peugeot");
        assert!(row[TARGET].is_number());
    }
}

#[tokio::test]
async fn test_preview_defaults_to_ten_rows() {
    let (status, body) = send(test_app(), get("/preview")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_preview_is_capped() {
    let (_, body) = send(test_app(), get("/preview?rows=5000")).await;
    assert_eq!(body.as_array().unwrap().len(), 100);

    let small = app_with(
        PredictionGateway::from_model(Arc::new(model())),
        Some(pricing_table(4)),
    );
    let (_, body) = send(small, get("/preview?rows=10")).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_preview_rejects_non_positive_rows() {
    let (status, body) = send(test_app(), get("/preview?rows=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn test_preview_without_dataset_is_unavailable() {
    let app = app_with(PredictionGateway::from_model(Arc::new(model())), None);
    let (status, body) = send(app, get("/preview?rows=3")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, body) = send(test_app(), get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
}
