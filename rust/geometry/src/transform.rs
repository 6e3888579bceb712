// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Earth-fixed frames for placing boxes on a globe
//!
//! Geodetic positions are converted to Earth-centred Earth-fixed (ECEF)
//! coordinates on the WGS84 ellipsoid. A local east-north-up frame at the
//! anchor is rotated by heading/pitch/roll using the globe-viewer convention:
//! heading is a rotation about the negative up axis, pitch about the
//! negative north axis, roll about the east axis.

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use serde::Serialize;

/// WGS84 semi-major axis, metres
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 semi-minor axis, metres
pub const WGS84_B: f64 = 6_356_752.314_245_179;

/// Orientation of a placed box, radians
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeadingPitchRoll {
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl HeadingPitchRoll {
    pub fn new(heading: f64, pitch: f64, roll: f64) -> Self {
        Self {
            heading,
            pitch,
            roll,
        }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn is_identity(&self) -> bool {
        self.heading == 0.0 && self.pitch == 0.0 && self.roll == 0.0
    }

    /// `Rz(-heading) * Ry(-pitch) * Rx(roll)`
    pub fn to_quaternion(&self) -> UnitQuaternion<f64> {
        let roll = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.roll);
        let pitch = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -self.pitch);
        let heading = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -self.heading);
        heading * pitch * roll
    }
}

/// Geodetic degrees + ellipsoid height → ECEF metres
pub fn geodetic_to_ecef(lon_deg: f64, lat_deg: f64, height: f64) -> Point3<f64> {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    let e2 = 1.0 - (WGS84_B * WGS84_B) / (WGS84_A * WGS84_A);
    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Point3::new(
        (n + height) * lat.cos() * lon.cos(),
        (n + height) * lat.cos() * lon.sin(),
        (n * (1.0 - e2) + height) * sin_lat,
    )
}

/// East-north-up frame at an ECEF origin.
///
/// Columns are east, north, up and the origin. At the poles, where east is
/// undefined, east is taken as +Y (north pole) or -Y (south pole).
pub fn east_north_up_frame(origin: &Point3<f64>) -> Matrix4<f64> {
    let up = Vector3::new(
        origin.x / (WGS84_A * WGS84_A),
        origin.y / (WGS84_A * WGS84_A),
        origin.z / (WGS84_B * WGS84_B),
    )
    .normalize();

    let east_raw = Vector3::new(-origin.y, origin.x, 0.0);
    let east = if east_raw.norm() > 1e-9 {
        east_raw.normalize()
    } else if origin.z >= 0.0 {
        Vector3::new(0.0, 1.0, 0.0)
    } else {
        Vector3::new(0.0, -1.0, 0.0)
    };
    let north = up.cross(&east).normalize();

    Matrix4::new(
        east.x, north.x, up.x, origin.x,
        east.y, north.y, up.y, origin.y,
        east.z, north.z, up.z, origin.z,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Local frame at `origin` rotated by `hpr`, mapping box-local metres to ECEF
pub fn heading_pitch_roll_frame(origin: &Point3<f64>, hpr: &HeadingPitchRoll) -> Matrix4<f64> {
    east_north_up_frame(origin) * hpr.to_quaternion().to_homogeneous()
}

/// Translation matrix for a local offset
pub fn translation(x: f64, y: f64, z: f64) -> Matrix4<f64> {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// Column-major flattening for WebGL-style consumers
pub fn to_column_major(m: &Matrix4<f64>) -> [f64; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

/// Translation part of a transform
pub fn origin_of(m: &Matrix4<f64>) -> Point3<f64> {
    Point3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}
