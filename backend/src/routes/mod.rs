//! Route definitions for the Harvest Rescue Engine

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/crops", crop_routes())
        .nest("/assays", assay_routes())
        .nest("/rescue", rescue_routes())
        .nest("/milk-runs", milk_run_routes())
        .route("/carbon", post(handlers::carbon_footprint))
}

/// Crop catalog routes
fn crop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_crops))
        .route("/:key", get(handlers::get_crop))
}

/// Scan, price and listing routes
fn assay_routes() -> Router<AppState> {
    Router::new()
        .route("/scan", post(handlers::scan_harvest))
        .route("/price", post(handlers::price_assay))
        .route("/listings", post(handlers::split_listings))
}

/// Rescue radar routes
fn rescue_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_rescue))
        .route("/evaluate", post(handlers::evaluate))
        .route("/:id", get(handlers::get_rescue))
        .route("/:id/claim", post(handlers::claim_rescue))
}

/// Milk-run logistics routes
fn milk_run_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::latest_cycle))
        .route("/build", post(handlers::build_milk_run))
        .route("/pickups", post(handlers::enqueue_pickup))
        .route("/cycle", post(handlers::run_cycle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use shared::{CropCatalog, FixedSplit, HarvestParams, TierSplit};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::services::{AssayService, LogisticsService, RescueService};

    fn app() -> Router {
        let config = Config::default();
        let catalog = Arc::new(CropCatalog::builtin().unwrap());
        let params = Arc::new(HarvestParams::default());
        let strategy = Arc::new(FixedSplit(TierSplit::new(60, 25, 15)));
        let state = AppState {
            assays: AssayService::new(Arc::clone(&catalog), strategy, Arc::clone(&params)),
            rescue: Arc::new(RescueService::new(params.rescue.clone())),
            logistics: Arc::new(LogisticsService::new(
                catalog,
                params,
                config.milk_run.factories.clone(),
                config.milk_run.truck_capacity_kg,
            )),
            config: Arc::new(config),
        };
        Router::new().nest("/api/v1", api_routes()).with_state(state)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_unknown_crop_is_404() {
        let (status, body) = send(app(), "GET", "/api/v1/crops/dragonfruit", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_scan_registers_rescue_lot() {
        let app = app();
        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/v1/assays/scan",
            Some(json!({"crop_key": "Tomato", "total_quantity_kg": 1000})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assay"]["crop_key"], "tomato");
        assert_eq!(body["assay"]["tiers"][2]["quantity_kg"], 150);
        let id = body["rescue_item"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/rescue/{}/claim", id);
        let (status, _) = send(app.clone(), "POST", &uri, Some(json!({"buyer_id": "ngo-1"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(app, "POST", &uri, Some(json!({"buyer_id": "ngo-2"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "ALREADY_CLAIMED");
    }

    #[tokio::test]
    async fn test_scan_rejects_bad_split() {
        let (status, body) = send(
            app(),
            "POST",
            "/api/v1/assays/scan",
            Some(json!({
                "crop_key": "tomato",
                "total_quantity_kg": 1000,
                "tier_split": {"tier1_percent": 60, "tier2_percent": 30, "tier3_percent": 20}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_carbon_endpoint() {
        let (status, body) = send(
            app(),
            "POST",
            "/api/v1/carbon",
            Some(json!({"transport_method": "sack", "distance_km": 80.0, "truck_fill_percent": 100.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_local_loop"], false);
        assert_eq!(body["distance_penalty"], 4.0);
    }

    fn evaluate_body(quantity_kg: i64, price: &str) -> Value {
        json!({
            "crop_name": "Tomato",
            "crop_key": "tomato",
            "quantity_kg": quantity_kg,
            "hours_since_harvest": 30.0,
            "shelf_life_hours": 36,
            "original_price_per_qtl": price,
            "rescue_channels": ["NGO community kitchens"]
        })
    }

    #[tokio::test]
    async fn test_evaluate_rejects_non_positive_inputs() {
        let (status, body) =
            send(app(), "POST", "/api/v1/rescue/evaluate", Some(evaluate_body(300, "750"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pricing"], "flash_sale");

        for bad in [evaluate_body(0, "750"), evaluate_body(-5, "750"), evaluate_body(300, "-750")] {
            let (status, body) = send(app(), "POST", "/api/v1/rescue/evaluate", Some(bad)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_price_rejects_forged_assay() {
        let app = app();
        let (_, scanned) = send(
            app.clone(),
            "POST",
            "/api/v1/assays/scan",
            Some(json!({"crop_key": "tomato", "total_quantity_kg": 1000})),
        )
        .await;
        let mut assay = scanned["assay"].clone();
        assay["total_quantity_kg"] = json!("9223372036854775807");
        assay["retail_price_per_qtl"] = json!("9223372036854775807");
        for i in 0..3 {
            assay["tiers"][i]["quantity_kg"] = json!(i64::MAX);
        }

        for uri in ["/api/v1/assays/price", "/api/v1/assays/listings"] {
            let (status, body) = send(app.clone(), "POST", uri, Some(assay.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }
}
