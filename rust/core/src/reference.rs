// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera reference table
//!
//! Plain-text table of photogrammetric camera poses, one photo per line:
//!
//! ```text
//! # filename, lon, lat, alt, omega, phi, kappa
//! IMG_1959.JPG, 106.8271, -6.3612, 92.4, 1.25, -0.4, 178.9
//! ```
//!
//! Angles are in degrees. Columns beyond the seventh are ignored. Blank lines
//! and lines starting with `#` are skipped; unparseable numbers read as absent.
//! A line without a filename is logged and skipped.

use nom::{
    bytes::complete::take_while,
    character::complete::char,
    combinator::{all_consuming, map},
    multi::separated_list1,
    number::complete::double,
    IResult,
};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{Error, Result};

/// Pose of the camera that took one photo
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CameraPose {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub alt: Option<f64>,
    /// Rotation about X, degrees
    pub omega: Option<f64>,
    /// Rotation about Y, degrees
    pub phi: Option<f64>,
    /// Rotation about Z, degrees
    pub kappa: Option<f64>,
}

impl CameraPose {
    /// `(heading, pitch, roll)` in radians: kappa→heading, phi→pitch,
    /// omega→roll. Missing angles read as zero.
    pub fn heading_pitch_roll(&self) -> (f64, f64, f64) {
        (
            self.kappa.unwrap_or(0.0).to_radians(),
            self.phi.unwrap_or(0.0).to_radians(),
            self.omega.unwrap_or(0.0).to_radians(),
        )
    }
}

/// Lookup table filename → camera pose
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    poses: FxHashMap<String, CameraPose>,
}

/// One comma-separated field, surrounding whitespace trimmed
fn field(input: &str) -> IResult<&str, &str> {
    map(take_while(|c: char| c != ','), str::trim)(input)
}

fn fields(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char(','), field)(input)
}

fn number(input: &str) -> Option<f64> {
    let parsed: IResult<&str, f64> = all_consuming(double)(input);
    parsed.ok().map(|(_, v)| v).filter(|v| v.is_finite())
}

/// Parse one non-comment line into `(filename, pose)`
fn parse_line(line: &str, line_no: usize) -> Result<(String, CameraPose)> {
    let (_, cols) = all_consuming(fields)(line).map_err(|e| Error::Parse {
        line: line_no,
        message: e.to_string(),
    })?;

    let filename = cols.first().copied().unwrap_or_default();
    if filename.is_empty() {
        return Err(Error::Parse {
            line: line_no,
            message: "empty filename".to_string(),
        });
    }

    let col = |i: usize| cols.get(i).and_then(|s| number(s));
    let pose = CameraPose {
        lon: col(1),
        lat: col(2),
        alt: col(3),
        omega: col(4),
        phi: col(5),
        kappa: col(6),
    };

    Ok((filename.to_string(), pose))
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the whole table. Later lines for the same filename win.
    pub fn parse(text: &str) -> Self {
        let mut poses = FxHashMap::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line, idx + 1) {
                Ok((filename, pose)) => {
                    poses.insert(filename, pose);
                }
                Err(e) => tracing::warn!(line = idx + 1, error = %e, "Skipping reference line"),
            }
        }

        Self { poses }
    }

    pub fn insert(&mut self, filename: impl Into<String>, pose: CameraPose) {
        self.poses.insert(filename.into(), pose);
    }

    /// Look up a photo's pose.
    ///
    /// Uploaded photos are stored as `{millis}_{original}`, so when the exact
    /// name is absent the upload prefix is stripped and the lookup retried.
    pub fn get(&self, image_name: &str) -> Option<&CameraPose> {
        let name = image_name.trim();
        self.poses
            .get(name)
            .or_else(|| strip_upload_prefix(name).and_then(|base| self.poses.get(base)))
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

/// `"1717000000000_IMG_1.jpg"` → `Some("IMG_1.jpg")`
pub fn strip_upload_prefix(name: &str) -> Option<&str> {
    let (prefix, rest) = name.split_once('_')?;
    if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) && !rest.is_empty() {
        Some(rest)
    } else {
        None
    }
}
