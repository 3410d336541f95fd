mod common;

use axum::http::StatusCode;
use dealer_adapt_api::seed::{self, SAMPLE_CAR_COUNT};
use serde_json::{Value, json};

use common::TestApp;

async fn seeded_app() -> TestApp {
    let app = TestApp::spawn().await;
    let added = seed::seed_sample_cars(&app.state.orm).await.unwrap();
    assert_eq!(added, SAMPLE_CAR_COUNT as u64);
    app
}

fn facet_total(facets: &Value) -> u64 {
    facets
        .as_array()
        .unwrap()
        .iter()
        .map(|facet| facet["count"].as_u64().unwrap())
        .sum()
}

#[tokio::test]
async fn price_window_over_seed_matches_one_car() {
    let app = seeded_app().await;

    let (status, body) = app
        .post_json(
            "/api/carfilter/filter",
            json!({ "priceFrom": 20000, "priceTo": 30000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalCarCount"], 1);
    assert_eq!(data["cars"][0]["price"], 20000.0);
}

#[tokio::test]
async fn empty_filter_returns_everything_with_full_facets() {
    let app = seeded_app().await;

    let (status, body) = app.post_json("/api/carfilter/filter", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalCarCount"], SAMPLE_CAR_COUNT);
    assert_eq!(data["cars"].as_array().unwrap().len(), SAMPLE_CAR_COUNT as usize);

    let facets = &data["availableFilters"];
    assert_eq!(facet_total(&facets["makes"]), SAMPLE_CAR_COUNT as u64);
    assert_eq!(facet_total(&facets["models"]), SAMPLE_CAR_COUNT as u64);
    assert_eq!(facet_total(&facets["colors"]), SAMPLE_CAR_COUNT as u64);
    assert_eq!(facets["makes"].as_array().unwrap().len(), 10);
    assert_eq!(facets["priceRange"]["min"], 10100.0);
    assert_eq!(facets["priceRange"]["max"], 20000.0);
}

#[tokio::test]
async fn make_filter_narrows_model_facet_only() {
    let app = seeded_app().await;

    let (status, body) = app
        .post_json("/api/carfilter/filter", json!({ "makes": ["Make1"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalCarCount"], 10);
    assert!(
        data["cars"]
            .as_array()
            .unwrap()
            .iter()
            .all(|car| car["make"] == "Make1")
    );

    let facets = &data["availableFilters"];
    assert_eq!(facet_total(&facets["makes"]), SAMPLE_CAR_COUNT as u64);
    assert_eq!(facet_total(&facets["models"]), 10);
}

#[tokio::test]
async fn car_lookup_returns_picture_urls() {
    let app = TestApp::spawn().await;
    let car = app.create_car("Lexus", 2).await;

    let (status, body) = app
        .get(&format!("/api/carfilter/{}", car["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["make"], "Lexus");
    assert_eq!(body["data"]["pictureUrls"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .get(&format!("/api/carfilter/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mistyped_criteria_are_bad_requests() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post_json("/api/carfilter/filter", json!({ "priceFrom": "cheap" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("priceFrom"));
    assert_eq!(body["data"]["error"], body["message"]);
}
