#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::cast_precision_loss, clippy::items_after_statements, unreachable_pub, clippy::print_stdout, clippy::similar_names)]
use reqwest::StatusCode;
use serde_json::{Value, json};

mod common;

/// A point unlikely to collide with reports left behind by earlier runs.
fn random_center() -> (f64, f64) {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let lat = f64::from(u16::from_be_bytes([bytes[0], bytes[1]])) / f64::from(u16::MAX) * 120.0 - 60.0;
    let lon = f64::from(u16::from_be_bytes([bytes[2], bytes[3]])) / f64::from(u16::MAX) * 340.0 - 170.0;
    (lat, lon)
}

fn report_at(lat: f64, lon: f64) -> Value {
    json!({
        "incidentType": "robbery",
        "description": "Wallet taken at knifepoint",
        "latitude": lat,
        "longitude": lon,
        "address": "Roxas Ave",
        "media": [
            { "url": "https://cdn.example/evidence.jpg", "mediaType": "image" },
            { "url": "https://cdn.example/evidence.mp4", "mediaType": "video" }
        ]
    })
}

#[tokio::test]
async fn test_submit_and_fetch_report() {
    let app = common::TestApp::spawn().await;
    let reporter = app.register_user("reporter").await;
    let (lat, lon) = random_center();

    let resp = app.post(&reporter, "/reports", &report_at(lat, lon)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let report = &body["data"];
    assert_eq!(report["reporter_id"], reporter.user_id);
    assert_eq!(report["status"], "pending");
    assert_eq!(report["address"], "Roxas Ave");
    assert_eq!(report["media"].as_array().unwrap().len(), 2);
    assert_eq!(report["media"][1]["media_type"], "video");

    let id = report["id"].as_i64().unwrap();
    let resp = app.get(&reporter, &format!("/reports/{id}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], id);
    assert!((body["data"]["latitude"].as_f64().unwrap() - lat).abs() < 1e-9);
}

#[tokio::test]
async fn test_report_visibility() {
    let app = common::TestApp::spawn().await;
    let reporter = app.register_user("reporter").await;
    let stranger = app.register_user("stranger").await;
    let officer = app.register_user("officer").await;
    app.set_role(&officer, "police").await;
    let (lat, lon) = random_center();

    let resp = app.post(&reporter, "/reports", &report_at(lat, lon)).await;
    let body: Value = resp.json().await.unwrap();
    let id = body["data"]["id"].as_i64().unwrap();

    assert_eq!(app.get(&stranger, &format!("/reports/{id}")).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.get(&officer, &format!("/reports/{id}")).await.status(), StatusCode::OK);
    assert_eq!(app.get(&reporter, &format!("/reports/{}", i64::MAX)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_report_lists_field_errors() {
    let app = common::TestApp::spawn().await;
    let reporter = app.register_user("reporter").await;

    let resp = app
        .post(
            &reporter,
            "/reports",
            &json!({
                "incidentType": "",
                "description": "ok",
                "latitude": 95.0,
                "longitude": 10.0,
                "media": [{ "url": "https://cdn.example/a.wav", "mediaType": "audio" }]
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert!(body["errors"]["incidentType"].is_string());
    assert!(body["errors"]["location"].is_string());
    assert!(body["errors"]["media.0.mediaType"].is_string());
}

#[tokio::test]
async fn test_failed_media_insert_rolls_back_report_and_location() {
    let app = common::TestApp::spawn().await;
    let reporter = app.register_user("reporter").await;
    let (lat, lon) = random_center();
    let address = format!("rollback-{}", common::run_id());

    // Postgres refuses NUL bytes in text, so the media insert fails after the other two rows
    let resp = app
        .post(
            &reporter,
            "/reports",
            &json!({
                "incidentType": "vandalism",
                "description": "Broken streetlight",
                "latitude": lat,
                "longitude": lon,
                "address": address,
                "media": [{ "url": "bad\u{0000}url", "mediaType": "image" }]
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);

    let reports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE reporter_id = $1")
        .bind(reporter.user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let locations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations WHERE address = $1")
        .bind(&address)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(reports, 0);
    assert_eq!(locations, 0);
}

#[tokio::test]
async fn test_nearby_sorts_by_distance_and_classifies_risk() {
    let app = common::TestApp::spawn().await;
    let reporter = app.register_user("reporter").await;
    let (lat, lon) = random_center();

    // Roughly 0.1 km, 0.3 km and 0.5 km north of the center, plus one far outside the radius
    for offset in [0.0045, 0.0009, 0.0027, 0.5] {
        let resp = app.post(&reporter, "/reports", &report_at(lat + offset, lon)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app.get(&reporter, &format!("/reports/nearby?latitude={lat}&longitude={lon}&radiusKm=1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let area = &body["data"];

    assert_eq!(area["report_count"], 3);
    assert_eq!(area["risk_level"], "medium");
    let distances: Vec<f64> =
        area["reports"].as_array().unwrap().iter().map(|r| r["distance_km"].as_f64().unwrap()).collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert!(distances.iter().all(|d| *d <= 1.0));
    assert!((distances[0] - 0.1).abs() < 0.01);
}

#[tokio::test]
async fn test_nearby_empty_area_is_low_risk() {
    let app = common::TestApp::spawn().await;
    let viewer = app.register_user("viewer").await;
    let (lat, lon) = random_center();

    let resp = app.get(&viewer, &format!("/reports/nearby?latitude={lat}&longitude={lon}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["risk_level"], "low");
    assert_eq!(body["data"]["report_count"], 0);
    assert!((body["data"]["radius_km"].as_f64().unwrap() - app.config.reports.default_radius_km).abs() < 1e-9);
}

#[tokio::test]
async fn test_nearby_rejects_bad_radius() {
    let app = common::TestApp::spawn().await;
    let viewer = app.register_user("viewer").await;

    let resp = app.get(&viewer, "/reports/nearby?latitude=7.0&longitude=125.6&radiusKm=0").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert!(body["errors"]["radiusKm"].is_string());

    let resp = app.get(&viewer, "/reports/nearby?latitude=7.0").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_list_is_capped_but_risk_counts_everything() {
    let mut config = common::get_test_config();
    config.reports.max_nearby_results = 2;
    let app = common::TestApp::spawn_with_config(config).await;
    let reporter = app.register_user("reporter").await;
    let (lat, lon) = random_center();

    for offset in [0.0045, 0.0009, 0.0027] {
        let resp = app.post(&reporter, "/reports", &report_at(lat + offset, lon)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app.get(&reporter, &format!("/reports/nearby?latitude={lat}&longitude={lon}&radiusKm=1")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let area = &body["data"];

    assert_eq!(area["report_count"], 3);
    assert_eq!(area["risk_level"], "medium");
    let listed = area["reports"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!((listed[0]["distance_km"].as_f64().unwrap() - 0.1).abs() < 0.01);
}
