mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use dealer_adapt_api::{
    entity::{Cars, Favorites, Pictures, Users},
    middleware::api_key::API_KEY_HEADER,
    services::car_service::{MAX_IMAGE_BYTES, MAX_IMAGES},
};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};

use common::{TEST_API_KEY, TestApp};

fn picture_ids(car: &Value) -> Vec<String> {
    car["pictures"]
        .as_array()
        .unwrap()
        .iter()
        .map(|picture| picture["id"].as_str().unwrap().to_string())
        .collect()
}

fn picture_urls(car: &Value) -> Vec<String> {
    car["pictures"]
        .as_array()
        .unwrap()
        .iter()
        .map(|picture| picture["url"].as_str().unwrap().to_string())
        .collect()
}

async fn row_counts(app: &TestApp) -> (u64, u64, u64) {
    let db = &app.state.orm;
    (
        Cars::find().count(db).await.unwrap(),
        Pictures::find().count(db).await.unwrap(),
        Favorites::find().count(db).await.unwrap(),
    )
}

#[tokio::test]
async fn create_car_stores_pictures_and_serves_files() {
    let app = TestApp::spawn().await;
    let car = app.create_car("Honda", 2).await;

    assert_eq!(car["make"], "Honda");
    assert_eq!(car["year"], 2020);
    assert_eq!(car["price"], 15000.0);
    let urls = picture_urls(&car);
    assert_eq!(urls.len(), 2);

    for url in &urls {
        let file_name = url.strip_prefix("/CarImages/").expect("served under /CarImages");
        assert!(app.state.images.dir().join(file_name).exists());

        let request = Request::builder()
            .uri(url.as_str())
            .header(API_KEY_HEADER, TEST_API_KEY)
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.send(request).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.get(&format!("/api/car/{}", car["id"].as_str().unwrap())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(picture_urls(&body["data"]).len(), 2);
}

#[tokio::test]
async fn create_car_validates_fields() {
    let app = TestApp::spawn().await;

    let (status, _) = app.upload_car(&[("make", ""), ("model", "Civic")], &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .upload_car(&[("make", "Honda"), ("model", "Civic"), ("year", "soon")], &[])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["fields"]["year"].is_array());

    assert_eq!(row_counts(&app).await, (0, 0, 0));
}

#[tokio::test]
async fn too_many_images_are_rejected_without_writing_rows() {
    let app = TestApp::spawn().await;
    let files: Vec<(String, Vec<u8>)> = (0..=MAX_IMAGES)
        .map(|i| (format!("img{i}.png"), vec![1, 2, 3]))
        .collect();

    let (status, body) = app.upload_car(&[("make", "Ford"), ("model", "Focus")], &files).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["fields"]["imageFiles"][0], "You can upload up to 25 images.");

    assert_eq!(row_counts(&app).await, (0, 0, 0));
    let written = std::fs::read_dir(app.state.images.dir())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(written, 0);
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    let app = TestApp::spawn().await;
    let files = vec![
        ("small.jpg".to_string(), vec![7; 16]),
        ("huge.jpg".to_string(), vec![0; MAX_IMAGE_BYTES + 1]),
    ];

    let (status, body) = app.upload_car(&[("make", "Ford"), ("model", "Focus")], &files).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["data"]["fields"]["imageFiles"][0],
        "Each image file must be up to 5MB in size."
    );
    assert_eq!(row_counts(&app).await, (0, 0, 0));
}

#[tokio::test]
async fn cover_image_must_belong_to_the_car() {
    let app = TestApp::spawn().await;
    let first = app.create_car("Toyota", 1).await;
    let second = app.create_car("Mazda", 1).await;
    let first_id = first["id"].as_str().unwrap();
    let foreign_picture = &picture_ids(&second)[0];
    let own_picture = &picture_ids(&first)[0];

    let uri = format!("/api/car/{first_id}/cover-image");
    let (status, _) = app
        .request(Method::PUT, &uri, Some(json!(foreign_picture)), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = app.get(&format!("/api/car/{first_id}")).await;
    assert!(body["data"]["coverImageId"].is_null());

    let (status, _) = app.request(Method::PUT, &uri, Some(json!(own_picture)), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = app.get(&format!("/api/car/{first_id}")).await;
    assert_eq!(body["data"]["coverImageId"], json!(own_picture));

    let (status, body) = app.get(&format!("/api/car/cover-image/{own_picture}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["url"], json!(picture_urls(&first)[0]));

    let missing = uuid::Uuid::new_v4();
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/car/{missing}/cover-image"),
            Some(json!(own_picture)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_car_cascades_pictures_favorites_and_files() {
    let app = TestApp::spawn().await;
    let user = app.registered_user("kim@example.com").await;
    let car = app.create_car("Subaru", 2).await;
    let car_id = car["id"].as_str().unwrap();
    let user_id = user["id"].as_str().unwrap();

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/car/{car_id}/cover-image"),
            Some(json!(picture_ids(&car)[0])),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/favorite?userId={user_id}&carId={car_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row_counts(&app).await, (1, 2, 1));

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/car/{car_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(row_counts(&app).await, (0, 0, 0));

    for url in picture_urls(&car) {
        let file_name = url.strip_prefix("/CarImages/").unwrap();
        assert!(!app.state.images.dir().join(file_name).exists());
    }

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/car/{car_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_user_cascades_favorites() {
    let app = TestApp::spawn().await;
    let user = app.registered_user("lee@example.com").await;
    let car = app.create_car("Kia", 0).await;
    let user_id = user["id"].as_str().unwrap();
    let car_id = car["id"].as_str().unwrap();

    for _ in 0..2 {
        let (status, _) = app
            .request(
                Method::POST,
                &format!("/api/favorite?userId={user_id}&carId={car_id}"),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(row_counts(&app).await, (1, 0, 2));

    let id = uuid::Uuid::parse_str(user_id).unwrap();
    Users::delete_by_id(id).exec(&app.state.orm).await.unwrap();
    assert_eq!(row_counts(&app).await, (1, 0, 0));
}

#[tokio::test]
async fn favorites_list_add_and_remove() {
    let app = TestApp::spawn().await;
    let user = app.registered_user("mia@example.com").await;
    let user_id = user["id"].as_str().unwrap();
    let car = app.create_car("Volvo", 1).await;
    let car_id = car["id"].as_str().unwrap();

    let (status, _) = app.get(&format!("/api/favorite/{user_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = uuid::Uuid::new_v4();
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/favorite?userId={user_id}&carId={missing}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Car not found.");

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/favorite?userId={user_id}&carId={car_id}"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let favorite_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.get(&format!("/api/favorite/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["car"]["make"], "Volvo");

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/favorite/{favorite_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .request(Method::DELETE, &format!("/api/favorite/{favorite_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_reconciles_pictures_and_protects_the_cover() {
    let app = TestApp::spawn().await;
    let car = app.create_car("Audi", 2).await;
    let car_id = car["id"].as_str().unwrap();
    let ids = picture_ids(&car);
    let urls = picture_urls(&car);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/car/{car_id}/cover-image"),
            Some(json!(ids[0])),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let update = |pictures: Vec<&str>| {
        json!({
            "id": car_id,
            "make": "Audi",
            "model": "A4",
            "year": 2021,
            "price": 30000.0,
            "listOfPictureUrls": pictures
        })
    };

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/car/{car_id}"),
            Some(update(vec![urls[0].as_str(), "/CarImages/extra.jpg"])),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get(&format!("/api/car/{car_id}")).await;
    let mut current = picture_urls(&body["data"]);
    current.sort();
    let mut expected = vec![urls[0].clone(), "/CarImages/extra.jpg".to_string()];
    expected.sort();
    assert_eq!(current, expected);
    assert_eq!(body["data"]["model"], "A4");
    assert!(!app.state.images.dir().join(urls[1].trim_start_matches("/CarImages/")).exists());

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/car/{car_id}"),
            Some(update(vec!["/CarImages/extra.jpg"])),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "cover image cannot be dropped");

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/car/{car_id}"),
            Some(update(vec!["not a url"])),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let other = uuid::Uuid::new_v4();
    let (status, _) = app
        .request(Method::PUT, &format!("/api/car/{other}"), Some(update(vec![])), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "path and body ids differ");
}

#[tokio::test]
async fn list_cars_pages_and_sorts() {
    let app = TestApp::spawn().await;
    for make in ["Alfa", "Bmw", "Citroen"] {
        app.create_car(make, 0).await;
    }

    let (status, body) = app.get("/api/car?page=1&per_page=2&sort_by=make&sort_order=asc").await;
    assert_eq!(status, StatusCode::OK);
    let makes: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|car| car["make"].as_str().unwrap())
        .collect();
    assert_eq!(makes, ["Alfa", "Bmw"]);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["perPage"], 2);

    let (status, _) = app.get(&format!("/api/car/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_car_requests_get_error_envelope() {
    let app = TestApp::spawn().await;
    let car = app.create_car("Honda", 0).await;
    let id = car["id"].as_str().unwrap();

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/car/{id}"),
            Some(json!({ "id": id, "model": "Civic" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].as_str().unwrap().contains("make"));

    let (status, body) = app
        .request(Method::PUT, &format!("/api/car/{id}/cover-image"), Some(json!(42)), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());

    let (status, body) = app.get("/api/car/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["meta"].is_object());

    let (status, body) = app.get("/api/car?page=first").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());
}
