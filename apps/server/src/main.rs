// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facade-Lite Server - window annotation store and facade layout service.
//!
//! Persists uploaded building photos, per-photo window annotations and
//! per-building placed windows on disk, and runs the projection and facade
//! layout pipeline server-side.
//!
//! # Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/upload/:buildingId` - Upload photos
//! - `GET /api/images/:buildingId` - List photos
//! - `POST /api/annotations/:buildingId/:imageName` - Save an annotation
//! - `POST /api/placeAnnotationOnBuilding` - Commit an annotation to its building
//! - `GET /api/placed_windows/:buildingId` - List placed windows
//! - `POST /api/layout/:buildingId` - Lay out placed windows on the facade
//! - `/uploaded`, `/annotations`, `/placed` - Static files

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    routing::{get, post, put},
    Router,
};
use facade_lite_geometry::{CameraModel, LayoutConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;
mod types;

#[cfg(test)]
mod api_tests;

use config::Config;
use services::{Collection, Datasets, FsStore, SceneRegistry};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<FsStore>,
    pub datasets: Arc<Datasets>,
    pub scene: Arc<SceneRegistry>,
    pub camera: CameraModel,
    pub layout: LayoutConfig,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: Arc::new(FsStore::new(&config.data_dir)),
            datasets: Arc::new(Datasets::new(
                &config.footprints_path,
                &config.reference_path,
            )),
            scene: Arc::new(SceneRegistry::new()),
            camera: CameraModel::default(),
            layout: LayoutConfig::default(),
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let api = Router::new()
        .route("/health", get(routes::health::check))
        .route("/config", get(routes::health::viewer_config))
        // Photos
        .route("/upload/:building_id", post(routes::images::upload))
        .route("/images/:building_id", get(routes::images::list))
        .route(
            "/images/:building_id/:filename",
            axum::routing::delete(routes::images::delete),
        )
        .route(
            "/images/:building_id/:filename/metadata",
            get(routes::images::metadata),
        )
        // Annotations
        .route("/annotations/:building_id", get(routes::annotations::list))
        .route(
            "/annotations/:building_id/:name",
            post(routes::annotations::save).delete(routes::annotations::delete),
        )
        // Placed windows
        .route("/placeAnnotationOnBuilding", post(routes::placed::place))
        .route("/placed_windows/:building_id", get(routes::placed::list))
        .route(
            "/placed_windows/:building_id/:filename",
            get(routes::placed::read).put(routes::placed::update),
        )
        .route(
            "/placed_windows/:building_id/:filename/classification",
            put(routes::placed::classify),
        )
        .route(
            "/placed/:building_id/:filename",
            axum::routing::delete(routes::placed::delete),
        )
        // Geometry
        .route("/project/:building_id/:image_name", post(routes::compute::project))
        .route("/reproject/:building_id/:image_name", get(routes::compute::reproject))
        .route("/walls/:building_id", get(routes::compute::walls))
        .route("/layout/:building_id", post(routes::compute::layout))
        .route(
            "/scene/:building_id",
            get(routes::compute::scene).delete(routes::compute::destroy_scene),
        );

    Router::new()
        .route("/", get(routes::health::info))
        .nest("/api", api)
        // Static files
        .nest_service(
            "/uploaded",
            ServeDir::new(state.store.collection_dir(Collection::Uploaded)),
        )
        .nest_service(
            "/annotations",
            ServeDir::new(state.store.collection_dir(Collection::Annotations)),
        )
        .nest_service(
            "/placed",
            ServeDir::new(state.store.collection_dir(Collection::PlacedWindows)),
        )
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_upload_mb * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,tower_http=debug,facade_lite_server=debug".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        footprints = %config.footprints_path.display(),
        reference = %config.reference_path.display(),
        max_upload_mb = config.max_upload_mb,
        "Starting Facade-Lite Server"
    );

    for collection in [
        Collection::Uploaded,
        Collection::Annotations,
        Collection::PlacedWindows,
    ] {
        let dir = config.data_dir.join(collection.dir_name());
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::warn!(error = %e, path = %dir.display(), "Failed to create data directory");
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = app(AppState::new(config));

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
