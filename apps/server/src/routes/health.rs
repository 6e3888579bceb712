// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check, service info and viewer configuration.

use crate::types::ViewerConfigResponse;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

const fn endpoint(method: &'static str, path: &'static str, description: &'static str) -> EndpointInfo {
    EndpointInfo {
        method,
        path,
        description,
    }
}

/// GET /api/health - Health check endpoint.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "facade-lite-server",
    })
}

/// GET /api/config - Viewer configuration.
pub async fn viewer_config(State(state): State<AppState>) -> Json<ViewerConfigResponse> {
    Json(ViewerConfigResponse {
        access_token: state.config.viewer_access_token.clone(),
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "facade-lite-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Window annotation store and facade layout service",
        endpoints: vec![
            endpoint("GET", "/api/health", "Health check endpoint"),
            endpoint("GET", "/api/config", "Viewer configuration"),
            endpoint("POST", "/api/upload/:buildingId", "Upload photos (multipart field 'images')"),
            endpoint("GET", "/api/images/:buildingId", "List uploaded photos"),
            endpoint("DELETE", "/api/images/:buildingId/:filename", "Delete an uploaded photo"),
            endpoint("GET", "/api/images/:buildingId/:filename/metadata", "Photo GPS and camera metadata"),
            endpoint("POST", "/api/annotations/:buildingId/:imageName", "Save a window annotation"),
            endpoint("DELETE", "/api/annotations/:buildingId/:imageName", "Delete a window annotation"),
            endpoint("GET", "/api/annotations/:buildingId", "List window annotations"),
            endpoint("POST", "/api/placeAnnotationOnBuilding", "Commit an annotation to its building"),
            endpoint("GET", "/api/placed_windows/:buildingId", "List placed windows"),
            endpoint("GET", "/api/placed_windows/:buildingId/:filename", "Read a placed window"),
            endpoint("PUT", "/api/placed_windows/:buildingId/:filename", "Replace a placed window"),
            endpoint("PUT", "/api/placed_windows/:buildingId/:filename/classification", "Set the window classification"),
            endpoint("DELETE", "/api/placed/:buildingId/:filename", "Delete a placed window"),
            endpoint("POST", "/api/project/:buildingId/:imageName", "Project pixel rectangles to the world"),
            endpoint("GET", "/api/reproject/:buildingId/:imageName", "Re-project an annotation onto its photo"),
            endpoint("GET", "/api/walls/:buildingId", "Wall segments of a building"),
            endpoint("POST", "/api/layout/:buildingId", "Lay out placed windows on the facade"),
            endpoint("GET", "/api/scene/:buildingId", "Laid-out windows of a building"),
            endpoint("DELETE", "/api/scene/:buildingId", "Tear down a building's scene"),
        ],
    })
}
