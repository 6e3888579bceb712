// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filesystem-backed storage for photos, annotations and placed windows.
//!
//! Layout under the data directory:
//!
//! ```text
//! uploaded/{buildingId}/{millis}_{photo}
//! annotations/{buildingId}/{imageName}.geojson
//! placed_windows/{buildingId}/{imageBaseName}.geojson
//! ```

use facade_lite_core::{Error, FeatureCollection, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Top-level folder of the data directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Uploaded,
    Annotations,
    PlacedWindows,
}

impl Collection {
    pub fn dir_name(self) -> &'static str {
        match self {
            Collection::Uploaded => "uploaded",
            Collection::Annotations => "annotations",
            Collection::PlacedWindows => "placed_windows",
        }
    }
}

/// Reject anything that is not a single plain path component.
pub fn validate_component(value: &str) -> Result<&str> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::invalid(format!("invalid path component '{value}'")));
    }
    Ok(value)
}

/// Storage seam used by the HTTP routes.
///
/// Keys are file names within a building's folder of one collection.
pub trait AnnotationStore: Send + Sync {
    async fn save(&self, collection: Collection, building: &str, key: &str, data: &[u8]) -> Result<()>;

    /// Keys in directory discovery order; `NotFound` when the building has
    /// no folder in this collection.
    async fn list(&self, collection: Collection, building: &str) -> Result<Vec<String>>;

    async fn read(&self, collection: Collection, building: &str, key: &str) -> Result<Vec<u8>>;

    async fn delete(&self, collection: Collection, building: &str, key: &str) -> Result<()>;

    async fn exists(&self, collection: Collection, building: &str, key: &str) -> Result<bool>;
}

/// Store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.dir_name())
    }

    fn building_dir(&self, collection: Collection, building: &str) -> Result<PathBuf> {
        Ok(self
            .collection_dir(collection)
            .join(validate_component(building)?))
    }

    fn file_path(&self, collection: Collection, building: &str, key: &str) -> Result<PathBuf> {
        Ok(self
            .building_dir(collection, building)?
            .join(validate_component(key)?))
    }

    /// Read and parse a stored GeoJSON feature collection
    pub async fn read_collection(
        &self,
        collection: Collection,
        building: &str,
        key: &str,
    ) -> Result<FeatureCollection> {
        let bytes = self.read(collection, building, key).await?;
        FeatureCollection::from_slice(&bytes)
    }

    /// Pretty-print and store a GeoJSON feature collection
    pub async fn write_collection(
        &self,
        collection: Collection,
        building: &str,
        key: &str,
        fc: &FeatureCollection,
    ) -> Result<()> {
        let data = serde_json::to_vec_pretty(fc)?;
        self.save(collection, building, key, &data).await
    }
}

fn io_error(err: std::io::Error, path: &Path) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::NotFound(path.display().to_string())
    } else {
        Error::storage(format!("{}: {}", path.display(), err))
    }
}

impl AnnotationStore for FsStore {
    async fn save(&self, collection: Collection, building: &str, key: &str, data: &[u8]) -> Result<()> {
        let path = self.file_path(collection, building, key)?;
        let dir = self.building_dir(collection, building)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(e, &dir))?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| io_error(e, &path))?;
        tracing::debug!(path = %path.display(), size = data.len(), "Stored file");
        Ok(())
    }

    async fn list(&self, collection: Collection, building: &str) -> Result<Vec<String>> {
        let dir = self.building_dir(collection, building)?;
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_error(e, &dir))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(e, &dir))? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                keys.push(name.to_string());
            }
        }
        Ok(keys)
    }

    async fn read(&self, collection: Collection, building: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.file_path(collection, building, key)?;
        tokio::fs::read(&path).await.map_err(|e| io_error(e, &path))
    }

    async fn delete(&self, collection: Collection, building: &str, key: &str) -> Result<()> {
        let path = self.file_path(collection, building, key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| io_error(e, &path))?;
        tracing::debug!(path = %path.display(), "Deleted file");
        Ok(())
    }

    async fn exists(&self, collection: Collection, building: &str, key: &str) -> Result<bool> {
        let path = self.file_path(collection, building, key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error(e, &path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_component() {
        assert!(validate_component("IMG_1.jpg.geojson").is_ok());
        assert!(validate_component("B-17").is_ok());
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b"] {
            assert!(validate_component(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[tokio::test]
    async fn test_save_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        store
            .save(Collection::Annotations, "B1", "a.geojson", b"{}")
            .await
            .unwrap();
        assert!(dir.path().join("annotations/B1/a.geojson").is_file());
        assert_eq!(
            store.read(Collection::Annotations, "B1", "a.geojson").await.unwrap(),
            b"{}"
        );
        assert!(store.exists(Collection::Annotations, "B1", "a.geojson").await.unwrap());

        store
            .delete(Collection::Annotations, "B1", "a.geojson")
            .await
            .unwrap();
        let err = store
            .read(Collection::Annotations, "B1", "a.geojson")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let err = store
            .delete(Collection::Annotations, "B1", "a.geojson")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_missing_building_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let err = store.list(Collection::PlacedWindows, "nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        store.save(Collection::PlacedWindows, "B1", "x.geojson", b"{}").await.unwrap();
        store.save(Collection::PlacedWindows, "B1", "y.geojson", b"{}").await.unwrap();
        let mut keys = store.list(Collection::PlacedWindows, "B1").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["x.geojson", "y.geojson"]);
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let err = store
            .save(Collection::Uploaded, "..", "passwd", b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let err = store
            .read(Collection::Uploaded, "B1", "../../secret")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_collection_round_trip_keeps_unknown_properties() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let fc = FeatureCollection::from_value(serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "imageName": "IMG_1.jpg", "note": "north side" },
                "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]] }
            }]
        }))
        .unwrap();

        store
            .write_collection(Collection::PlacedWindows, "B1", "IMG_1.geojson", &fc)
            .await
            .unwrap();
        let back = store
            .read_collection(Collection::PlacedWindows, "B1", "IMG_1.geojson")
            .await
            .unwrap();
        assert_eq!(back.features[0].property_str("note"), Some("north side"));
    }
}
