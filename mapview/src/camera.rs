//! Camera controller: programmatic flights plus free orbit/pan/zoom.
//!
//! The camera pose has a single writer at a time. While [`CameraPhase::Idle`]
//! the user input subsystem may orbit, pan and zoom; while
//! [`CameraPhase::Flying`] only the flight's frame step moves the camera.
//!
//! World space is `+Z` up with the map in the `z = 0` plane.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flight tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightSettings {
    /// Fraction of the remaining distance covered per frame.
    pub blend: f32,
    /// Distance at or below which a flight counts as arrived.
    pub arrival_threshold: f32,
    /// Height of the plane flights end in.
    pub depth: f32,
    /// Downward tilt held for the whole flight.
    pub tilt_degrees: f32,
}

impl Default for FlightSettings {
    fn default() -> Self {
        Self {
            blend: 0.05,
            arrival_threshold: 0.1,
            depth: 10.0,
            tilt_degrees: 30.0,
        }
    }
}

/// Limits for free user orbit and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitLimits {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Largest angle between the view ray and the map normal.
    pub max_polar_degrees: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_distance: 2.0,
            max_distance: 60.0,
            max_polar_degrees: 80.0,
        }
    }
}

/// What the reset gesture does while a flight is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResetPolicy {
    /// Reset is ignored until the flight arrives.
    #[default]
    IgnoreWhileFlying,
    /// Reset cancels the flight and snaps home.
    CancelFlight,
}

/// Canonical home pose restored by reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomePose {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
}

impl Default for HomePose {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 20.0],
            look_at: [0.0, 0.0, 0.0],
        }
    }
}

/// Everything the controller is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub flight: FlightSettings,
    pub orbit: OrbitLimits,
    pub home: HomePose,
    pub reset_policy: ResetPolicy,
}

/// Camera pose. `tilt` is only written by flights and reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Downward pitch in radians overriding the look-at pitch.
    pub tilt: Option<f32>,
}

impl CameraPose {
    pub fn new(position: Vec3, look_at: Vec3) -> Self {
        Self {
            position,
            look_at,
            tilt: None,
        }
    }

    /// World-space rotation of the camera.
    pub fn orientation(&self) -> Quat {
        let aim = look_rotation(self.position, self.look_at);
        match self.tilt {
            Some(tilt) => {
                let (_, y, z) = aim.to_euler(EulerRot::XYZ);
                Quat::from_euler(EulerRot::XYZ, -tilt, y, z)
            }
            None => aim,
        }
    }

    /// Computes the view matrix (world to camera space).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation(), self.position).inverse()
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }
}

fn look_rotation(eye: Vec3, target: Vec3) -> Quat {
    let dir = target - eye;
    // Degenerate when the eye sits on the target or looks along the up vector.
    if dir.length_squared() < 1e-12 || dir.normalize().cross(Vec3::Y).length_squared() < 1e-12 {
        return Quat::IDENTITY;
    }
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    // Camera rotation is the inverse (transpose) of the view rotation.
    Quat::from_mat3(&Mat3::from_mat4(view).transpose())
}

/// Identifies one flight. Continuations holding an old token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlightToken(u64);

impl FlightToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraPhase {
    /// Free user control.
    Idle,
    /// Programmatic animation towards `target`.
    Flying { target: Vec3, token: FlightToken },
}

/// Result of running one flight continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Pose moved; schedule again next frame.
    Continue,
    /// Within the arrival threshold; the flight is over.
    Arrived,
    /// Superseded by a newer flight, a reset or teardown.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Applied,
    /// Suppressed by [`ResetPolicy::IgnoreWhileFlying`].
    Ignored,
}

/// Free input arrived while a flight owns the camera.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("camera is flying; free input ignored")]
pub struct CameraBusy;

/// Owns the camera pose and the flight state machine.
#[derive(Debug, Clone)]
pub struct CameraController {
    pose: CameraPose,
    phase: CameraPhase,
    generation: u64,
    settings: CameraSettings,
}

impl CameraController {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            pose: home_pose(&settings.home),
            phase: CameraPhase::Idle,
            generation: 0,
            settings,
        }
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn phase(&self) -> CameraPhase {
        self.phase
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.phase, CameraPhase::Flying { .. })
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Starts a flight towards `(target.x, target.y, depth)`.
    ///
    /// Supersedes any flight in progress. The tilt is applied immediately.
    /// The returned token must be handed to [`CameraController::step`] once per frame.
    pub fn fly_to(&mut self, target: Vec2) -> FlightToken {
        self.generation += 1;
        let token = FlightToken(self.generation);
        let target = target.extend(self.settings.flight.depth);
        if let CameraPhase::Flying { target: old, .. } = self.phase {
            log::debug!("Flight to {:?} superseded by {:?}", old, target);
        }
        self.phase = CameraPhase::Flying { target, token };
        self.pose.tilt = Some(self.settings.flight.tilt_degrees.to_radians());
        log::debug!("Flying from {:?} to {:?}", self.pose.position, target);
        token
    }

    /// Runs one frame of the flight owned by `token`.
    pub fn step(&mut self, token: FlightToken) -> StepOutcome {
        let target = match self.phase {
            CameraPhase::Flying { target, token: current } if current == token => target,
            _ => {
                log::trace!("Dropping stale flight continuation {:?}", token);
                return StepOutcome::Stale;
            }
        };

        let flight = self.settings.flight;
        let remaining = self.pose.position.distance(target);
        if remaining <= flight.arrival_threshold {
            self.phase = CameraPhase::Idle;
            log::debug!("Flight arrived at {:?} ({:.4} away)", target, remaining);
            return StepOutcome::Arrived;
        }

        self.pose.position += flight.blend * (target - self.pose.position);
        self.pose.look_at = Vec3::new(target.x, target.y, 0.0);
        self.pose.tilt = Some(flight.tilt_degrees.to_radians());
        log::trace!("Flight step: {:?}, {:.4} remaining", self.pose.position, remaining);
        StepOutcome::Continue
    }

    /// Snaps to the home pose, subject to the reset policy.
    pub fn reset(&mut self) -> ResetOutcome {
        if self.is_flying() && self.settings.reset_policy == ResetPolicy::IgnoreWhileFlying {
            log::debug!("Reset ignored while flying");
            return ResetOutcome::Ignored;
        }
        self.cancel();
        self.pose = home_pose(&self.settings.home);
        log::debug!("Camera reset to home pose");
        ResetOutcome::Applied
    }

    /// Invalidates any pending flight continuation without moving the camera.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.phase = CameraPhase::Idle;
    }

    /// Orbits around the pivot. Azimuth turns about the map normal; the polar
    /// angle is clamped so the camera stays above the map.
    pub fn orbit(&mut self, d_azimuth: f32, d_polar: f32) -> Result<(), CameraBusy> {
        self.ensure_idle()?;
        let offset = self.pose.position - self.pose.look_at;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return Ok(());
        }
        let azimuth = offset.y.atan2(offset.x) + d_azimuth;
        let max_polar = self.settings.orbit.max_polar_degrees.to_radians();
        let polar = ((offset.z / radius).clamp(-1.0, 1.0).acos() + d_polar).clamp(0.0, max_polar);
        let (sin_p, cos_p) = polar.sin_cos();
        let (sin_a, cos_a) = azimuth.sin_cos();
        self.pose.position =
            self.pose.look_at + radius * Vec3::new(sin_p * cos_a, sin_p * sin_a, cos_p);
        Ok(())
    }

    /// Pans camera and pivot together in the map plane.
    pub fn pan(&mut self, dx: f32, dy: f32) -> Result<(), CameraBusy> {
        self.ensure_idle()?;
        let offset = Vec3::new(dx, dy, 0.0);
        self.pose.position += offset;
        self.pose.look_at += offset;
        Ok(())
    }

    /// Zooms along the view ray. `factor` > 1.0 moves closer.
    pub fn zoom(&mut self, factor: f32) -> Result<(), CameraBusy> {
        self.ensure_idle()?;
        let offset = self.pose.position - self.pose.look_at;
        let distance = offset.length();
        if distance <= f32::EPSILON || factor <= 0.0 {
            return Ok(());
        }
        let limits = self.settings.orbit;
        let new_distance = (distance / factor).clamp(limits.min_distance, limits.max_distance);
        self.pose.position = self.pose.look_at + offset / distance * new_distance;
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), CameraBusy> {
        if self.is_flying() {
            log::trace!("Free input rejected during flight");
            return Err(CameraBusy);
        }
        Ok(())
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraSettings::default())
    }
}

fn home_pose(home: &HomePose) -> CameraPose {
    CameraPose::new(
        Vec3::from_array(home.position),
        Vec3::from_array(home.look_at),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn fly_until_idle(cam: &mut CameraController, token: FlightToken) -> usize {
        let mut frames = 0;
        while cam.step(token) == StepOutcome::Continue {
            frames += 1;
            assert!(frames < 10_000, "flight did not converge");
        }
        frames
    }

    #[test]
    fn test_new_camera_at_home() {
        let cam = CameraController::default();
        assert_eq!(cam.pose().position, Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(cam.pose().look_at, Vec3::ZERO);
        assert_eq!(cam.pose().tilt, None);
        assert_eq!(cam.phase(), CameraPhase::Idle);
    }

    #[test]
    fn test_fly_to_applies_tilt_immediately() {
        let mut cam = CameraController::default();
        let token = cam.fly_to(Vec2::new(3.0, 4.0));
        assert_eq!(cam.pose().tilt, Some(30f32.to_radians()));
        assert_eq!(cam.pose().position, Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(
            cam.phase(),
            CameraPhase::Flying {
                target: Vec3::new(3.0, 4.0, 10.0),
                token
            }
        );
    }

    #[test]
    fn test_step_is_exponential_approach() {
        let mut cam = CameraController::default();
        let token = cam.fly_to(Vec2::new(10.0, 0.0));
        assert_eq!(cam.step(token), StepOutcome::Continue);
        // (0,0,20) + 0.05 * ((10,0,10) - (0,0,20))
        let p = cam.pose().position;
        assert!((p - Vec3::new(0.5, 0.0, 19.5)).length() < EPS);
        assert_eq!(cam.pose().look_at, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_flight_converges_with_decreasing_distance() {
        let mut cam = CameraController::default();
        let target = Vec3::new(5.0, -7.0, 10.0);
        let token = cam.fly_to(target.truncate());
        let mut last = cam.pose().position.distance(target);
        loop {
            match cam.step(token) {
                StepOutcome::Continue => {
                    let d = cam.pose().position.distance(target);
                    assert!(d < last, "distance must strictly decrease");
                    last = d;
                }
                StepOutcome::Arrived => break,
                StepOutcome::Stale => panic!("own flight went stale"),
            }
        }
        assert!(last <= 0.1);
        assert!(!cam.is_flying());

        // No further mutation after arrival.
        let pose = *cam.pose();
        assert_eq!(cam.step(token), StepOutcome::Stale);
        assert_eq!(*cam.pose(), pose);
    }

    #[test]
    fn test_new_flight_supersedes_old() {
        let mut cam = CameraController::default();
        let first = cam.fly_to(Vec2::new(8.0, 8.0));
        cam.step(first);
        let second = cam.fly_to(Vec2::new(-8.0, 2.0));
        assert_ne!(first, second);
        assert_eq!(cam.step(first), StepOutcome::Stale);
        fly_until_idle(&mut cam, second);
        let end = cam.pose().position;
        assert!(end.distance(Vec3::new(-8.0, 2.0, 10.0)) <= 0.1);
        assert!(end.distance(Vec3::new(8.0, 8.0, 10.0)) > 1.0);
    }

    #[test]
    fn test_reset_from_idle_restores_home() {
        let mut cam = CameraController::default();
        let token = cam.fly_to(Vec2::new(2.0, 2.0));
        fly_until_idle(&mut cam, token);
        cam.pan(1.0, 1.0).unwrap();

        assert_eq!(cam.reset(), ResetOutcome::Applied);
        assert_eq!(cam.pose().position, Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(cam.pose().look_at, Vec3::ZERO);
        assert_eq!(cam.pose().tilt, None);
    }

    #[test]
    fn test_reset_ignored_while_flying_by_default() {
        let mut cam = CameraController::default();
        let token = cam.fly_to(Vec2::new(5.0, 5.0));
        cam.step(token);
        let pose = *cam.pose();
        assert_eq!(cam.reset(), ResetOutcome::Ignored);
        assert_eq!(*cam.pose(), pose);
        assert_eq!(cam.step(token), StepOutcome::Continue);
    }

    #[test]
    fn test_reset_cancels_flight_with_cancel_policy() {
        let mut cam = CameraController::new(CameraSettings {
            reset_policy: ResetPolicy::CancelFlight,
            ..Default::default()
        });
        let token = cam.fly_to(Vec2::new(5.0, 5.0));
        cam.step(token);
        assert_eq!(cam.reset(), ResetOutcome::Applied);
        assert_eq!(cam.step(token), StepOutcome::Stale);
        assert_eq!(cam.pose().position, Vec3::new(0.0, 0.0, 20.0));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut cam = CameraController::default();
        cam.reset();
        let pose = *cam.pose();
        cam.reset();
        assert_eq!(*cam.pose(), pose);
    }

    #[test]
    fn test_fly_to_reached_target_does_not_move() {
        let mut cam = CameraController::default();
        let token = cam.fly_to(Vec2::new(1.0, 1.0));
        fly_until_idle(&mut cam, token);
        let pose = *cam.pose();
        let again = cam.fly_to(Vec2::new(1.0, 1.0));
        assert_eq!(cam.step(again), StepOutcome::Arrived);
        assert_eq!(*cam.pose(), pose);
    }

    #[test]
    fn test_free_input_rejected_while_flying() {
        let mut cam = CameraController::default();
        cam.fly_to(Vec2::new(1.0, 1.0));
        assert_eq!(cam.orbit(0.3, 0.1), Err(CameraBusy));
        assert_eq!(cam.pan(1.0, 0.0), Err(CameraBusy));
        assert_eq!(cam.zoom(2.0), Err(CameraBusy));
    }

    #[test]
    fn test_orbit_keeps_radius_and_clamps_polar() {
        let mut cam = CameraController::default();
        cam.orbit(0.0, 0.5).unwrap();
        let offset = cam.pose().position - cam.pose().look_at;
        assert!((offset.length() - 20.0).abs() < EPS);
        assert!(offset.z < 20.0);

        cam.orbit(1.0, 10.0).unwrap();
        let offset = cam.pose().position - cam.pose().look_at;
        let polar = (offset.z / offset.length()).acos();
        assert!((polar - 80f32.to_radians()).abs() < EPS);
        assert!(offset.z > 0.0, "camera stays above the map");
        assert_eq!(cam.pose().tilt, None, "orbit never touches tilt");
    }

    #[test]
    fn test_zoom_limits() {
        let mut cam = CameraController::default();
        for _ in 0..50 {
            cam.zoom(2.0).unwrap();
        }
        let d = cam.pose().position.distance(cam.pose().look_at);
        assert!((d - 2.0).abs() < EPS);
        for _ in 0..50 {
            cam.zoom(0.5).unwrap();
        }
        let d = cam.pose().position.distance(cam.pose().look_at);
        assert!((d - 60.0).abs() < EPS);
    }

    #[test]
    fn test_pan_moves_camera_and_pivot() {
        let mut cam = CameraController::default();
        cam.pan(2.0, -1.0).unwrap();
        assert_eq!(cam.pose().position, Vec3::new(2.0, -1.0, 20.0));
        assert_eq!(cam.pose().look_at, Vec3::new(2.0, -1.0, 0.0));
    }

    #[test]
    fn test_home_view_matrix_looks_down() {
        let cam = CameraController::default();
        let view = cam.pose().view_matrix();
        let origin = view.transform_point3(Vec3::ZERO);
        assert!(origin.z < 0.0, "origin should be in front of the camera");
        assert!(view.transform_point3(cam.pose().position).length() < EPS);
        assert!((cam.pose().forward() - Vec3::NEG_Z).length() < EPS);
    }

    #[test]
    fn test_tilt_overrides_pitch() {
        let mut pose = CameraPose::new(Vec3::new(0.0, -5.0, 10.0), Vec3::ZERO);
        pose.tilt = Some(30f32.to_radians());
        let (x, _, _) = pose.orientation().to_euler(EulerRot::XYZ);
        assert!((x + 30f32.to_radians()).abs() < EPS);
    }

    #[test]
    fn test_degenerate_pose_is_finite() {
        let pose = CameraPose::new(Vec3::ONE, Vec3::ONE);
        assert!(pose.view_matrix().is_finite());
    }
}
