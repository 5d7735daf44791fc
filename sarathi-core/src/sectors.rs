//! Sector-based obstacle classification from a depth map.
//!
//! Every pixel with a positive depth is backprojected through the pinhole
//! model, rotated by the view yaw about the vertical axis and binned by
//! azimuth into one of N equal sectors spanning `[0, π)`. A sector is
//! obstructed when the closest *unrotated* depth assigned to it is below the
//! threshold distance.
//!
//! ```text
//!   azimuth = atan2(x', z') mod π
//!   sector  = floor(azimuth / (π / N))
//! ```
//!
//! The yaw only changes which sector a point lands in, never how far away it
//! is judged to be.

use crate::config::SectorConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Sector positions used by the avoidance rules (five-sector layout).
pub mod position {
    /// Leftmost sector
    pub const LEFT: usize = 0;
    /// Left-front sector
    pub const LEFT_FRONT: usize = 1;
    /// Center sector
    pub const CENTER: usize = 2;
    /// Right-front sector
    pub const RIGHT_FRONT: usize = 3;
    /// Rightmost sector
    pub const RIGHT: usize = 4;
}

/// Pinhole intrinsics of the depth camera, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl CameraIntrinsics {
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Factory calibration of a 640x480 structured-light depth camera.
    pub fn structured_light_vga() -> Self {
        Self::new(525.0, 525.0, 319.5, 239.5)
    }

    /// Camera-frame X (meters, positive right) of a pixel column at depth `z`.
    #[inline]
    pub fn backproject_x(&self, col: usize, z: f32) -> f32 {
        (col as f32 - self.cx) * z / self.fx
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::structured_light_vga()
    }
}

/// Row-major grid of depth readings in meters. Zero means "no return".
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    width: usize,
    height: usize,
    depths: Vec<f32>,
}

impl DepthMap {
    /// Wrap a depth buffer, checking it matches `width * height`.
    pub fn new(width: usize, height: usize, depths: Vec<f32>) -> Result<Self> {
        let expected = width * height;
        if depths.len() != expected {
            return Err(Error::InvalidDepthMap {
                expected,
                actual: depths.len(),
            });
        }
        Ok(Self {
            width,
            height,
            depths,
        })
    }

    /// Depth map with every pixel set to `depth`.
    pub fn filled(width: usize, height: usize, depth: f32) -> Self {
        Self {
            width,
            height,
            depths: vec![depth; width * height],
        }
    }

    /// Convert a buffer of millimeter readings (as delivered by most depth
    /// sensors) into meters.
    pub fn from_millimeters(width: usize, height: usize, raw: &[u16]) -> Result<Self> {
        let depths = raw.iter().map(|&mm| mm as f32 / 1000.0).collect();
        Self::new(width, height, depths)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// Depth at a pixel, `None` when out of bounds.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.depths.get(row * self.width + col).copied()
    }

    /// Overwrite one pixel. Out-of-bounds writes are ignored.
    pub fn set(&mut self, col: usize, row: usize, depth: f32) {
        if col < self.width && row < self.height {
            self.depths[row * self.width + col] = depth;
        }
    }

    /// A reading is valid iff it is strictly positive (NaN is rejected).
    #[inline]
    pub fn is_valid_depth(depth: f32) -> bool {
        depth > 0.0
    }

    /// Number of pixels with a valid reading.
    pub fn valid_count(&self) -> usize {
        self.depths
            .iter()
            .filter(|&&d| Self::is_valid_depth(d))
            .count()
    }

    /// Iterate `(col, row, depth)` over valid pixels.
    pub fn valid_pixels(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let width = self.width.max(1);
        self.depths
            .iter()
            .enumerate()
            .filter(|&(_, &d)| Self::is_valid_depth(d))
            .map(move |(i, &d)| (i % width, i / width, d))
    }
}

/// Binary obstruction state of one sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Occupancy {
    #[default]
    Clear,
    Obstructed,
}

/// Obstruction state of every sector, indexed by sector position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorStatus {
    sectors: Vec<Occupancy>,
}

impl SectorStatus {
    /// Every sector clear.
    pub fn all_clear(sector_count: usize) -> Self {
        Self {
            sectors: vec![Occupancy::Clear; sector_count],
        }
    }

    pub fn from_occupancy(sectors: Vec<Occupancy>) -> Self {
        Self { sectors }
    }

    /// Status with the given positions obstructed; unknown positions are ignored.
    pub fn with_obstructed(sector_count: usize, obstructed: &[usize]) -> Self {
        let mut status = Self::all_clear(sector_count);
        for &index in obstructed {
            if let Some(slot) = status.sectors.get_mut(index) {
                *slot = Occupancy::Obstructed;
            }
        }
        status
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Occupancy at a sector position. Positions beyond the layout read as clear.
    pub fn get(&self, index: usize) -> Occupancy {
        self.sectors.get(index).copied().unwrap_or_default()
    }

    #[inline]
    pub fn is_obstructed(&self, index: usize) -> bool {
        self.get(index) == Occupancy::Obstructed
    }

    pub fn is_all_clear(&self) -> bool {
        self.sectors.iter().all(|&s| s == Occupancy::Clear)
    }

    pub fn obstructed_count(&self) -> usize {
        self.sectors
            .iter()
            .filter(|&&s| s == Occupancy::Obstructed)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Occupancy> + '_ {
        self.sectors.iter().copied()
    }
}

/// True iff every sector is clear.
pub fn is_all_clear(status: &SectorStatus) -> bool {
    status.is_all_clear()
}

/// Per-sector statistics of one depth map.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorScan {
    /// Number of valid points assigned to each sector
    pub counts: Vec<usize>,
    /// Minimum original depth per sector (`None` for empty sectors)
    pub min_depth: Vec<Option<f32>>,
}

impl SectorScan {
    fn empty(sector_count: usize) -> Self {
        Self {
            counts: vec![0; sector_count],
            min_depth: vec![None; sector_count],
        }
    }

    /// Total number of points binned.
    pub fn total_points(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Threshold the per-sector minimum depths.
    pub fn status(&self, threshold_distance: f32) -> SectorStatus {
        let sectors = self
            .min_depth
            .iter()
            .map(|min| match min {
                Some(d) if *d < threshold_distance => Occupancy::Obstructed,
                _ => Occupancy::Clear,
            })
            .collect();
        SectorStatus { sectors }
    }

    /// Polar histogram: closest depth per sector clamped to `max_range`.
    /// Empty sectors read as `max_range`.
    pub fn histogram(&self, max_range: f32) -> Vec<f32> {
        self.min_depth
            .iter()
            .map(|min| min.map_or(max_range, |d| d.min(max_range)))
            .collect()
    }
}

/// Bins depth maps into angular sectors.
#[derive(Debug, Clone)]
pub struct SectorClassifier {
    intrinsics: CameraIntrinsics,
    sector_count: usize,
    sector_width: f32,
    threshold_distance: f32,
    cos_yaw: f32,
    sin_yaw: f32,
}

impl SectorClassifier {
    /// Create a classifier. `sector_count` is clamped to at least one.
    pub fn new(
        intrinsics: CameraIntrinsics,
        view_yaw_deg: f32,
        threshold_distance: f32,
        sector_count: usize,
    ) -> Self {
        let sector_count = sector_count.max(1);
        let yaw = view_yaw_deg.to_radians();
        Self {
            intrinsics,
            sector_count,
            sector_width: PI / sector_count as f32,
            threshold_distance,
            cos_yaw: yaw.cos(),
            sin_yaw: yaw.sin(),
        }
    }

    /// Build from the sector configuration (count = number of labels).
    pub fn from_config(intrinsics: CameraIntrinsics, config: &SectorConfig) -> Self {
        Self::new(
            intrinsics,
            config.view_yaw_deg,
            config.threshold_distance,
            config.sector_count(),
        )
    }

    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    pub fn threshold_distance(&self) -> f32 {
        self.threshold_distance
    }

    /// Azimuth in `[0, π)` of the point at pixel column `col` and depth `z`,
    /// after the yaw rotation.
    pub fn azimuth(&self, col: usize, z: f32) -> f32 {
        let x = self.intrinsics.backproject_x(col, z);
        let x_rot = self.cos_yaw * x + self.sin_yaw * z;
        let z_rot = -self.sin_yaw * x + self.cos_yaw * z;
        x_rot.atan2(z_rot).rem_euclid(PI)
    }

    /// Sector index of the point at pixel column `col` and depth `z`.
    pub fn sector_of(&self, col: usize, z: f32) -> usize {
        let index = (self.azimuth(col, z) / self.sector_width) as usize;
        // rem_euclid can round up to exactly π
        index.min(self.sector_count - 1)
    }

    /// Bin every valid point. An absent or malformed map yields an empty scan.
    pub fn scan(&self, depth: Option<&DepthMap>) -> SectorScan {
        let mut scan = SectorScan::empty(self.sector_count);

        let Some(depth) = depth else {
            log::debug!("No depth map this cycle, all sectors clear");
            return scan;
        };

        if depth.depths.len() != depth.width * depth.height {
            log::warn!(
                "Depth map buffer mismatch ({} samples for {}x{}), all sectors clear",
                depth.depths.len(),
                depth.width,
                depth.height
            );
            return scan;
        }

        for (col, _row, z) in depth.valid_pixels() {
            let sector = self.sector_of(col, z);
            scan.counts[sector] += 1;
            let slot = &mut scan.min_depth[sector];
            *slot = Some(slot.map_or(z, |m| m.min(z)));
        }

        scan
    }

    /// Classify every sector as clear or obstructed.
    pub fn classify(&self, depth: Option<&DepthMap>) -> SectorStatus {
        self.scan(depth).status(self.threshold_distance)
    }
}

/// One-shot classification without keeping a classifier around.
pub fn classify(
    depth: Option<&DepthMap>,
    intrinsics: CameraIntrinsics,
    view_yaw_deg: f32,
    threshold_distance: f32,
    sector_count: usize,
) -> SectorStatus {
    SectorClassifier::new(intrinsics, view_yaw_deg, threshold_distance, sector_count)
        .classify(depth)
}
