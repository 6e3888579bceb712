// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Root of the `uploaded/`, `annotations/` and `placed_windows/` folders.
    pub data_dir: PathBuf,
    /// Building footprints GeoJSON (MultiPolygon features with a `uid`).
    pub footprints_path: PathBuf,
    /// Camera reference table (`filename, lon, lat, alt, omega, phi, kappa`).
    pub reference_path: PathBuf,
    /// Maximum request body size in MB.
    pub max_upload_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
    /// Access token handed to the 3D viewer, if any.
    pub viewer_access_token: Option<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::current_dir()
                    .map(|dir| dir.join("data"))
                    .unwrap_or_else(|_| PathBuf::from("./data"))
            });

        Self {
            port: env_or("PORT", 5000),
            footprints_path: std::env::var("FOOTPRINTS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("footprints.geojson")),
            reference_path: std::env::var("REFERENCE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("reference.txt")),
            data_dir,
            max_upload_mb: env_or("MAX_UPLOAD_MB", 50),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 60),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            viewer_access_token: std::env::var("VIEWER_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }

    /// Configuration rooted at `data_dir`, ignoring the environment.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            port: 5000,
            footprints_path: data_dir.join("footprints.geojson"),
            reference_path: data_dir.join("reference.txt"),
            data_dir,
            max_upload_mb: 50,
            request_timeout_secs: 60,
            cors_origins: vec!["*".into()],
            viewer_access_token: None,
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
