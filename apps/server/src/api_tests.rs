// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Router-level tests against a temporary data directory.

use crate::{app, config::Config, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use facade_lite_core::{FeatureCollection, PhotoMetadata, PixelRect};
use crate::services::photo::tests::southwest_jpeg;
use facade_lite_geometry::{project_rects, CameraModel, PhotoFrame};
use serde_json::{json, Value};
use std::io::Cursor;
use tempfile::TempDir;
use tower::ServiceExt;

fn setup() -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let router = app(AppState::new(Config::with_data_dir(dir.path())));
    (dir, router)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

async fn upload(app: &Router, building: &str, filename: &str, data: &[u8]) -> (StatusCode, Value) {
    let boundary = "facade-lite-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/upload/{building}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Two windows drawn in the upper half of a photo taken at null island
fn projected_windows() -> FeatureCollection {
    let meta = PhotoMetadata {
        width: 1000,
        height: 1000,
        latitude: Some(0.0),
        longitude: Some(0.0),
        altitude: Some(0.0),
        focal_length: Some(6.0),
    };
    let frame = PhotoFrame::from_metadata("IMG_1.jpg", &meta, &CameraModel::default()).unwrap();
    project_rects(
        &frame,
        &[
            PixelRect::new(200.0, 100.0, 100.0, 150.0),
            PixelRect::new(600.0, 100.0, 100.0, 150.0),
        ],
        "IMG_1.jpg",
        "B1",
    )
    .unwrap()
}

fn write_footprints(dir: &TempDir) {
    let footprints = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "uid": "B1" },
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[-0.0001, 0.0001, 0.0], [0.0001, 0.0001, 0.0], [0.0001, 0.0001, 8.0], [-0.0001, 0.0001, 8.0], [-0.0001, 0.0001, 0.0]]],
                    [[[-0.0001, -0.0001, 0.0], [0.0001, -0.0001, 0.0], [0.0001, -0.0001, 8.0], [-0.0001, -0.0001, 8.0], [-0.0001, -0.0001, 0.0]]]
                ]
            }
        }]
    });
    std::fs::write(
        dir.path().join("footprints.geojson"),
        serde_json::to_vec(&footprints).unwrap(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = setup();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/api/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accessToken"], Value::Null);
}

#[tokio::test]
async fn test_info_lists_every_route() {
    let (_dir, app) = setup();
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);

    let listed: Vec<String> = body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| format!("{} {}", e["method"].as_str().unwrap(), e["path"].as_str().unwrap()))
        .collect();
    assert_eq!(listed.len(), 21);
    for route in [
        "GET /api/config",
        "DELETE /api/images/:buildingId/:filename",
        "DELETE /api/annotations/:buildingId/:imageName",
        "PUT /api/placed_windows/:buildingId/:filename/classification",
        "DELETE /api/placed/:buildingId/:filename",
        "DELETE /api/scene/:buildingId",
    ] {
        assert!(listed.iter().any(|l| l == route), "{route} missing");
    }
}

#[tokio::test]
async fn test_annotation_save_list_delete() {
    let (dir, app) = setup();

    let (status, body) = send(&app, Method::GET, "/api/annotations/B1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let fc = serde_json::to_value(projected_windows()).unwrap();
    let (status, _) = send(&app, Method::POST, "/api/annotations/B1/IMG_1.jpg.geojson", Some(fc)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dir.path().join("annotations/B1/IMG_1.jpg.geojson").is_file());
    std::fs::write(dir.path().join("annotations/B1/notes.txt"), "x").unwrap();

    let (status, body) = send(&app, Method::GET, "/api/annotations/B1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["IMG_1.jpg.geojson"]));

    let (status, _) = send(&app, Method::DELETE, "/api/annotations/B1/IMG_1.jpg.geojson", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, "/api/annotations/B1/IMG_1.jpg.geojson", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_place_requires_image_and_building() {
    let (_dir, app) = setup();
    let body = json!({
        "type": "FeatureCollection",
        "features": [{ "type": "Feature", "properties": { "imageName": "IMG_1.jpg" }, "geometry": null }]
    });
    let (status, body) = send(&app, Method::POST, "/api/placeAnnotationOnBuilding", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_placed_window_lifecycle() {
    let (dir, app) = setup();
    let fc = serde_json::to_value(projected_windows()).unwrap();

    let (status, body) = send(&app, Method::POST, "/api/placeAnnotationOnBuilding", Some(fc)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filePath"], "placed/B1/IMG_1.geojson");
    assert!(dir.path().join("placed_windows/B1/IMG_1.geojson").is_file());

    let (_, body) = send(&app, Method::GET, "/api/placed_windows/B1", None).await;
    assert_eq!(body, json!(["IMG_1.geojson"]));

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/placed_windows/B1/IMG_1.geojson/classification",
        Some(json!({ "jenisJendela": "  casement " })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["features"][1]["properties"]["jenisJendela"], "casement");

    let (status, body) = send(&app, Method::GET, "/api/placed_windows/B1/IMG_1.geojson", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["features"][0]["properties"]["jenisJendela"], "casement");
    assert_eq!(body["features"][0]["properties"]["buildingId"], "B1");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/placed_windows/B1/missing.geojson",
        Some(json!({ "type": "FeatureCollection", "features": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/placed/B1/IMG_1.json", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::DELETE, "/api/placed/B1/IMG_1.geojson", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!dir.path().join("placed_windows/B1/IMG_1.geojson").exists());
}

#[tokio::test]
async fn test_photo_upload_and_metadata() {
    let (dir, app) = setup();

    let (status, body) = send(&app, Method::GET, "/api/images/B1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = upload(&app, "B1", "facade.png", &png(40, 30)).await;
    assert_eq!(status, StatusCode::OK);
    let name = body["files"][0]["name"].as_str().unwrap().to_string();
    assert!(name.ends_with("_facade.png"));
    assert!(dir.path().join("uploaded/B1").join(&name).is_file());

    let (_, body) = send(&app, Method::GET, "/api/images/B1", None).await;
    assert_eq!(body[0]["url"], format!("/uploaded/B1/{name}"));

    let (status, body) = send(&app, Method::GET, &format!("/api/images/B1/{name}/metadata"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["width"], 40);
    assert_eq!(body["height"], 30);
    assert_eq!(body["latitude"], Value::Null);

    // No GPS: projection must refuse rather than guess a position
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/project/B1/{name}"),
        Some(json!({ "rects": [{ "x": 1.0, "y": 1.0, "width": 10.0, "height": 10.0 }], "save": true })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "MISSING_GEOREFERENCE");
    assert!(!dir.path().join("annotations/B1").exists());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/images/B1/{name}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, Method::GET, "/api/images/B1", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_georeferenced_photo_project_and_reproject() {
    let (dir, app) = setup();

    let (status, body) = upload(&app, "B1", "south.jpg", &southwest_jpeg(400, 300)).await;
    assert_eq!(status, StatusCode::OK);
    let name = body["files"][0]["name"].as_str().unwrap().to_string();

    let (status, meta) = send(&app, Method::GET, &format!("/api/images/B1/{name}/metadata"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(meta["latitude"].as_f64().unwrap() < 0.0);
    assert!(meta["longitude"].as_f64().unwrap() < 0.0);
    assert_eq!(meta["altitude"], -12.5);
    assert_eq!(meta["focalLength"], 4.25);

    let (status, fc) = send(
        &app,
        Method::POST,
        &format!("/api/project/B1/{name}"),
        Some(json!({ "rects": [{ "x": 100.0, "y": 50.0, "width": 80.0, "height": 120.0 }], "save": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fc["features"].as_array().unwrap().len(), 1);
    assert_eq!(fc["features"][0]["properties"]["imageName"], name.as_str());
    assert_eq!(fc["features"][0]["properties"]["altitude"], -12.5);
    assert!(dir.path().join("annotations/B1").join(format!("{name}.geojson")).is_file());

    let (status, body) = send(&app, Method::GET, &format!("/api/reproject/B1/{name}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["width"], 400);
    let points = body["rings"][0]["points"].as_array().unwrap();
    assert_eq!(points.len(), 5);
    for (point, (x, y)) in points.iter().zip([(100.0, 50.0), (180.0, 50.0), (180.0, 170.0), (100.0, 170.0)]) {
        assert!((point[0].as_f64().unwrap() - x).abs() < 1e-3, "{point} vs {x}");
        assert!((point[1].as_f64().unwrap() - y).abs() < 1e-3, "{point} vs {y}");
    }
}

#[tokio::test]
async fn test_layout_survives_malformed_reference_line() {
    let (dir, app) = setup();
    write_footprints(&dir);
    std::fs::write(dir.path().join("reference.txt"), " , 1, 2, 3, 4, 5, 6\n").unwrap();

    let fc = serde_json::to_value(projected_windows()).unwrap();
    send(&app, Method::POST, "/api/placeAnnotationOnBuilding", Some(fc)).await;

    let (status, body) = send(&app, Method::POST, "/api/layout/B1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wallCount"], 2);
    assert_eq!(body["entries"][0]["file"], "IMG_1.geojson");
    assert_eq!(body["entries"][0]["placements"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_layout_records_scene_and_delete_clears_it() {
    let (dir, app) = setup();
    write_footprints(&dir);

    let (_, walls) = send(&app, Method::GET, "/api/walls/B1", None).await;
    assert_eq!(walls.as_array().unwrap().len(), 2);

    let fc = serde_json::to_value(projected_windows()).unwrap();
    send(&app, Method::POST, "/api/placeAnnotationOnBuilding", Some(fc)).await;

    let (status, body) = send(&app, Method::POST, "/api/layout/B1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wallCount"], 2);
    assert_eq!(body["entries"][0]["file"], "IMG_1.geojson");
    let placements = body["entries"][0]["placements"].as_array().unwrap();
    assert_eq!(placements.len(), 2);
    assert_eq!(placements[0]["source"], json!({ "kind": "wall", "side": 1 }));

    let (_, scene) = send(&app, Method::GET, "/api/scene/B1", None).await;
    assert_eq!(scene.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/placed/B1/IMG_1.geojson", None).await;
    assert_eq!(status, StatusCode::OK);

    send(&app, Method::DELETE, "/api/placed/B1/IMG_1.geojson", None).await;
    let (_, scene) = send(&app, Method::GET, "/api/scene/B1", None).await;
    assert_eq!(scene, json!([]));
}

#[tokio::test]
async fn test_destroyed_scene_is_empty_until_next_layout() {
    let (_dir, app) = setup();
    let fc = serde_json::to_value(projected_windows()).unwrap();
    send(&app, Method::POST, "/api/placeAnnotationOnBuilding", Some(fc)).await;

    // No footprints dataset: identity orientation
    let (_, body) = send(&app, Method::POST, "/api/layout/B1", None).await;
    assert_eq!(body["wallCount"], 0);
    assert_eq!(body["entries"][0]["placements"][0]["source"], json!({ "kind": "identity" }));

    let (status, _) = send(&app, Method::DELETE, "/api/scene/B1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, scene) = send(&app, Method::GET, "/api/scene/B1", None).await;
    assert_eq!(scene, json!([]));

    send(&app, Method::POST, "/api/layout/B1", None).await;
    let (_, scene) = send(&app, Method::GET, "/api/scene/B1", None).await;
    assert_eq!(scene.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_layout_of_unknown_building_is_empty() {
    let (_dir, app) = setup();
    let (status, body) = send(&app, Method::POST, "/api/layout/nowhere", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"], json!([]));
}
