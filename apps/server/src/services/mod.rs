// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service modules for storage, photo metadata, datasets and the scene.

pub mod datasets;
pub mod photo;
pub mod scene;
pub mod store;

pub use datasets::Datasets;
pub use photo::extract_metadata;
pub use scene::{SceneEntry, SceneRegistry};
pub use store::{validate_component, AnnotationStore, Collection, FsStore};
