//! Frame sources and marker detectors
//!
//! The depth camera driver and the fiducial detector live outside this
//! workspace. The control loop only needs the two traits below; this module
//! provides a synthetic depth scene and a scripted detector so the loop can
//! run without hardware.

use crate::config::{SimulatedMarker, SimulatedObstacle, SimulationConfig};
use crate::error::Result;
use sarathi_core::DepthMap;
use std::time::Instant;

/// One sensor frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub depth: DepthMap,
    pub captured_at: Instant,
}

/// Raw detector output before zone and distance are attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerDetection {
    pub id: u32,
    pub pixel_x: usize,
    pub pixel_y: usize,
}

/// Source of depth frames
pub trait FrameSource {
    /// Next frame, or `None` when the sensor produced nothing this cycle
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Finds at most one marker in a frame
pub trait MarkerDetector {
    fn detect(&mut self, frame: &Frame) -> Option<MarkerDetection>;
}

/// Synthetic depth scene: a flat wall plus an optional box obstacle that
/// drifts toward the camera at a constant speed.
pub struct SimulatedScene {
    width: usize,
    height: usize,
    wall_distance: f32,
    obstacle: Option<SimulatedObstacle>,
    started: Instant,
}

impl SimulatedScene {
    pub fn new(width: usize, height: usize, config: &SimulationConfig, started: Instant) -> Self {
        let obstacle = config
            .obstacle
            .enabled
            .then(|| config.obstacle.clone());
        tracing::info!(
            "Simulated scene {}x{}: wall at {:.2}m, obstacle {}",
            width,
            height,
            config.wall_distance,
            match &obstacle {
                Some(o) => format!(
                    "cols {}..{} from {:.2}m at {:.2}m/s",
                    o.col_start, o.col_end, o.start_distance, o.approach_speed
                ),
                None => "disabled".to_string(),
            }
        );
        Self {
            width,
            height,
            wall_distance: config.wall_distance,
            obstacle,
            started,
        }
    }

    /// Obstacle distance at `now`, `None` when there is no obstacle
    pub fn obstacle_distance(&self, now: Instant) -> Option<f32> {
        self.obstacle.as_ref().map(|o| {
            let elapsed = now.saturating_duration_since(self.started).as_secs_f32();
            (o.start_distance - o.approach_speed * elapsed).max(o.min_distance)
        })
    }

    /// Render the depth map seen at `now`
    pub fn render(&self, now: Instant) -> DepthMap {
        let mut depth = DepthMap::filled(self.width, self.height, self.wall_distance);
        if let (Some(obstacle), Some(distance)) = (&self.obstacle, self.obstacle_distance(now)) {
            let cols = obstacle.col_start.min(self.width)..obstacle.col_end.min(self.width);
            for row in 0..self.height {
                for col in cols.clone() {
                    depth.set(col, row, distance);
                }
            }
        }
        depth
    }
}

impl FrameSource for SimulatedScene {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let now = Instant::now();
        Ok(Some(Frame {
            depth: self.render(now),
            captured_at: now,
        }))
    }
}

/// Detector that reports a fixed marker whenever it lies inside the frame
pub struct ScriptedMarker {
    detection: Option<MarkerDetection>,
}

impl ScriptedMarker {
    pub fn new(config: &SimulatedMarker) -> Self {
        let detection = config.enabled.then_some(MarkerDetection {
            id: config.id,
            pixel_x: config.x,
            pixel_y: config.y,
        });
        Self { detection }
    }
}

impl MarkerDetector for ScriptedMarker {
    fn detect(&mut self, frame: &Frame) -> Option<MarkerDetection> {
        self.detection
            .filter(|d| d.pixel_x < frame.depth.width() && d.pixel_y < frame.depth.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn scene(t0: Instant) -> SimulatedScene {
        let config = SimulationConfig {
            wall_distance: 3.0,
            obstacle: SimulatedObstacle {
                enabled: true,
                col_start: 2,
                col_end: 4,
                start_distance: 2.0,
                approach_speed: 0.5,
                min_distance: 0.4,
            },
            marker: SimulatedMarker::default(),
        };
        SimulatedScene::new(8, 2, &config, t0)
    }

    #[test]
    fn test_obstacle_approaches_and_clamps() {
        let t0 = Instant::now();
        let scene = scene(t0);
        assert_relative_eq!(scene.obstacle_distance(t0).unwrap(), 2.0);
        assert_relative_eq!(
            scene.obstacle_distance(t0 + Duration::from_secs(2)).unwrap(),
            1.0
        );
        assert_relative_eq!(
            scene.obstacle_distance(t0 + Duration::from_secs(60)).unwrap(),
            0.4
        );
    }

    #[test]
    fn test_render_places_obstacle_columns() {
        let t0 = Instant::now();
        let depth = scene(t0).render(t0);
        assert_eq!(depth.width(), 8);
        for row in 0..2 {
            assert_eq!(depth.get(1, row), Some(3.0));
            assert_eq!(depth.get(2, row), Some(2.0));
            assert_eq!(depth.get(3, row), Some(2.0));
            assert_eq!(depth.get(4, row), Some(3.0));
        }
    }

    #[test]
    fn test_disabled_obstacle_renders_wall() {
        let t0 = Instant::now();
        let mut config = SimulationConfig::default();
        config.obstacle.enabled = false;
        let scene = SimulatedScene::new(4, 4, &config, t0);
        assert_eq!(scene.obstacle_distance(t0), None);
        assert!(scene.render(t0).depths().iter().all(|&d| d == 3.0));
    }

    #[test]
    fn test_scripted_marker_respects_frame_bounds() {
        let t0 = Instant::now();
        let frame = Frame {
            depth: DepthMap::filled(640, 480, 1.0),
            captured_at: t0,
        };

        let mut detector = ScriptedMarker::new(&SimulatedMarker::default());
        assert_eq!(
            detector.detect(&frame),
            Some(MarkerDetection {
                id: 0,
                pixel_x: 320,
                pixel_y: 240
            })
        );

        let mut outside = ScriptedMarker::new(&SimulatedMarker {
            x: 700,
            ..Default::default()
        });
        assert_eq!(outside.detect(&frame), None);

        let mut disabled = ScriptedMarker::new(&SimulatedMarker {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(disabled.detect(&frame), None);
    }
}
