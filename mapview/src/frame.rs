//! Frame-driven scheduling of flight continuations.
//!
//! A flight is a self-rescheduling task: each frame its continuation runs
//! once against the camera and either asks to run again next frame or ends.
//! Continuations whose token no longer matches the camera drop out on their
//! own, so superseded flights never fight over the pose.

use crate::camera::{CameraController, FlightToken, StepOutcome};

/// What one frame did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub stepped: usize,
    pub arrived: usize,
    pub dropped: usize,
}

/// Pending continuations, run once per rendered frame.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: Vec<FlightToken>,
    frame: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `token`'s continuation for the next frame.
    pub fn schedule(&mut self, token: FlightToken) {
        if !self.pending.contains(&token) {
            self.pending.push(token);
        }
    }

    /// Runs every pending continuation once.
    pub fn tick(&mut self, camera: &mut CameraController) -> FrameReport {
        self.frame += 1;
        let mut report = FrameReport {
            frame: self.frame,
            ..Default::default()
        };
        let mut next = Vec::with_capacity(self.pending.len());
        for token in self.pending.drain(..) {
            match camera.step(token) {
                StepOutcome::Continue => {
                    report.stepped += 1;
                    next.push(token);
                }
                StepOutcome::Arrived => report.arrived += 1,
                StepOutcome::Stale => report.dropped += 1,
            }
        }
        self.pending = next;
        report
    }

    /// Drops every pending continuation, e.g. on viewport teardown.
    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cancelling {} pending flight continuations", self.pending.len());
        }
        self.pending.clear();
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
