// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory registry of laid-out window boxes per building.
//!
//! Layout tasks for a building run concurrently and write their results here
//! as they finish; a later write for the same placed-window file replaces
//! the earlier one. Once a building's scene is destroyed, writes are dropped
//! until the scene is opened again.
//!
//! Each building carries a generation that advances whenever a file is
//! removed. A layout task records the generation it started at, and its
//! write is refused if its file was removed after that point.

use facade_lite_geometry::Placement;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct BuildingScene {
    destroyed: bool,
    generation: u64,
    /// Placed-window file name → its boxes
    files: HashMap<String, Vec<Placement>>,
    /// File name → generation at which it was last removed
    removed: HashMap<String, u64>,
}

/// Rendered placements of one placed-window file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEntry {
    pub file: String,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Default)]
pub struct SceneRegistry {
    buildings: RwLock<HashMap<String, BuildingScene>>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a building's scene live again, keeping existing entries.
    ///
    /// Returns the current generation, to be passed back to [`Self::record`].
    pub fn open(&self, building: &str) -> u64 {
        let mut buildings = self.buildings.write();
        let scene = buildings.entry(building.to_string()).or_default();
        scene.destroyed = false;
        scene.generation
    }

    pub fn is_destroyed(&self, building: &str) -> bool {
        self.buildings
            .read()
            .get(building)
            .is_some_and(|scene| scene.destroyed)
    }

    /// Record the boxes of one file, computed by a task opened at `generation`.
    ///
    /// Returns `false` and drops the write if the scene was destroyed or the
    /// file was removed after `generation`.
    pub fn record(&self, building: &str, file: &str, generation: u64, placements: Vec<Placement>) -> bool {
        let mut buildings = self.buildings.write();
        let scene = buildings.entry(building.to_string()).or_default();
        if scene.destroyed {
            tracing::debug!(building = %building, file = %file, "Scene destroyed, dropping placements");
            return false;
        }
        if scene.removed.get(file).is_some_and(|&at| at > generation) {
            tracing::debug!(building = %building, file = %file, "File removed during layout, dropping placements");
            return false;
        }
        scene.files.insert(file.to_string(), placements);
        true
    }

    /// Drop the boxes of one file and refuse writes from layouts already in
    /// flight; returns whether any boxes were present.
    pub fn remove_file(&self, building: &str, file: &str) -> bool {
        let mut buildings = self.buildings.write();
        let scene = buildings.entry(building.to_string()).or_default();
        scene.generation += 1;
        scene.removed.insert(file.to_string(), scene.generation);
        scene.files.remove(file).is_some()
    }

    /// Clear a building's scene and refuse further writes.
    pub fn destroy(&self, building: &str) {
        let mut buildings = self.buildings.write();
        let scene = buildings.entry(building.to_string()).or_default();
        scene.destroyed = true;
        scene.files.clear();
        tracing::info!(building = %building, "Destroyed building scene");
    }

    /// Entries of a building, sorted by file name.
    pub fn entries(&self, building: &str) -> Vec<SceneEntry> {
        let buildings = self.buildings.read();
        let Some(scene) = buildings.get(building) else {
            return Vec::new();
        };

        let mut entries: Vec<SceneEntry> = scene
            .files
            .iter()
            .map(|(file, placements)| SceneEntry {
                file: file.clone(),
                placements: placements.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.file.cmp(&b.file));
        entries
    }
}
