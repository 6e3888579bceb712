//! Facade-Lite Geometry
//!
//! Georeferencing of window rectangles drawn on photos, building wall lookup
//! and facade layout, using nalgebra for frames and transformations.

pub mod error;
pub mod layout;
pub mod projection;
pub mod transform;
pub mod walls;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector3};

pub use error::{Error, Result};
pub use layout::{
    bucket_rows, feature_centroid, feature_z_range, layout_facade, row_gap, row_offsets,
    wall_heading, LayoutConfig, OrientationSource, Placement,
};
pub use projection::{
    project_rects, reproject_collection, reproject_ring, CameraModel, PhotoFrame, PixelRing,
    FALLBACK_METER_PER_PIXEL,
};
pub use transform::{geodetic_to_ecef, heading_pitch_roll_frame, HeadingPitchRoll};
pub use walls::{nearest_wall, walls_for_building, WallSegment};
