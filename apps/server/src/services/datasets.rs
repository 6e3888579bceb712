// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static datasets, loaded on first use and kept in memory.

use crate::error::ApiError;
use facade_lite_core::{FeatureCollection, ReferenceTable};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Building footprints and the camera reference table.
///
/// A missing file loads as an empty dataset so that layout degrades to the
/// reference or identity orientation rather than failing.
#[derive(Debug)]
pub struct Datasets {
    footprints_path: PathBuf,
    reference_path: PathBuf,
    footprints: OnceCell<Arc<FeatureCollection>>,
    reference: OnceCell<Arc<ReferenceTable>>,
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ApiError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Dataset not found, using empty dataset");
            Ok(None)
        }
        Err(e) => Err(ApiError::Storage(format!("{}: {}", path.display(), e))),
    }
}

impl Datasets {
    pub fn new(footprints_path: impl Into<PathBuf>, reference_path: impl Into<PathBuf>) -> Self {
        Self {
            footprints_path: footprints_path.into(),
            reference_path: reference_path.into(),
            footprints: OnceCell::new(),
            reference: OnceCell::new(),
        }
    }

    pub async fn footprints(&self) -> Result<Arc<FeatureCollection>, ApiError> {
        self.footprints
            .get_or_try_init(|| async {
                let fc = match read_optional(&self.footprints_path).await? {
                    Some(bytes) => FeatureCollection::from_slice(&bytes)
                        .map_err(|e| ApiError::Internal(format!("footprints: {e}")))?,
                    None => FeatureCollection::default(),
                };
                tracing::info!(
                    path = %self.footprints_path.display(),
                    buildings = fc.len(),
                    "Loaded building footprints"
                );
                Ok::<_, ApiError>(Arc::new(fc))
            })
            .await
            .cloned()
    }

    pub async fn reference(&self) -> Result<Arc<ReferenceTable>, ApiError> {
        self.reference
            .get_or_try_init(|| async {
                let table = match read_optional(&self.reference_path).await? {
                    Some(bytes) => ReferenceTable::parse(&String::from_utf8_lossy(&bytes)),
                    None => ReferenceTable::new(),
                };
                tracing::info!(
                    path = %self.reference_path.display(),
                    entries = table.len(),
                    "Loaded camera reference table"
                );
                Ok::<_, ApiError>(Arc::new(table))
            })
            .await
            .cloned()
    }
}
