//! Scripted interaction sessions for headless runs.
//!
//! One command per line; blank lines and `#` comments are skipped.
//!
//! ```text
//! click 3 4        # pick tile (3, 4)
//! next | prev      # move carousel focus
//! select           # card click on the focused entity
//! zoom-entity 2    # card click on entity 2
//! dblclick         # reset gesture
//! frames 30        # render 30 frames
//! settle           # render until no flight is pending
//! orbit 0.3 0.1    # free orbit (radians)
//! pan 1 -2         # free pan (world units)
//! wheel 1.5        # free zoom factor
//! pose | details | card
//! ```

use crate::camera::{CameraPhase, ResetOutcome};
use crate::details::{InfluencerCard, TileDetails};
use crate::gesture::{Gesture, GestureHub};
use crate::scene::RenderSurface;
use crate::viewport::ViewportOrchestrator;
use mapdata::GridPos;
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on frames run by `settle`.
pub const SETTLE_FRAME_LIMIT: usize = 10_000;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: {message}")]
    BadArgument { line: usize, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptCommand {
    Click(GridPos),
    Next,
    Prev,
    Select,
    ZoomEntity(usize),
    DoubleClick,
    Frames(usize),
    Settle,
    Orbit(f32, f32),
    Pan(f32, f32),
    Wheel(f32),
    Pose,
    Details,
    Card,
}

/// A parsed command with its 1-based source line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: ScriptCommand,
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut commands = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let mut words = content.split_whitespace();
        let Some(name) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();
        let command = parse_command(line, name, &args)?;
        commands.push(ScriptLine { line, command });
    }
    Ok(commands)
}

fn parse_command(line: usize, name: &str, args: &[&str]) -> Result<ScriptCommand, ScriptError> {
    let arity = |n: usize| -> Result<(), ScriptError> {
        if args.len() == n {
            Ok(())
        } else {
            Err(ScriptError::BadArgument {
                line,
                message: format!("`{}` takes {} argument(s), got {}", name, n, args.len()),
            })
        }
    };

    let command = match name {
        "click" => {
            arity(2)?;
            ScriptCommand::Click(GridPos::new(arg(line, args[0])?, arg(line, args[1])?))
        }
        "next" => {
            arity(0)?;
            ScriptCommand::Next
        }
        "prev" => {
            arity(0)?;
            ScriptCommand::Prev
        }
        "select" => {
            arity(0)?;
            ScriptCommand::Select
        }
        "zoom-entity" => {
            arity(1)?;
            ScriptCommand::ZoomEntity(arg(line, args[0])?)
        }
        "dblclick" => {
            arity(0)?;
            ScriptCommand::DoubleClick
        }
        "frames" => {
            arity(1)?;
            ScriptCommand::Frames(arg(line, args[0])?)
        }
        "settle" => {
            arity(0)?;
            ScriptCommand::Settle
        }
        "orbit" => {
            arity(2)?;
            ScriptCommand::Orbit(real(line, args[0])?, real(line, args[1])?)
        }
        "pan" => {
            arity(2)?;
            ScriptCommand::Pan(real(line, args[0])?, real(line, args[1])?)
        }
        "wheel" => {
            arity(1)?;
            ScriptCommand::Wheel(real(line, args[0])?)
        }
        "pose" => {
            arity(0)?;
            ScriptCommand::Pose
        }
        "details" => {
            arity(0)?;
            ScriptCommand::Details
        }
        "card" => {
            arity(0)?;
            ScriptCommand::Card
        }
        other => {
            return Err(ScriptError::UnknownCommand {
                line,
                command: other.to_string(),
            });
        }
    };
    Ok(command)
}

fn arg<T: FromStr>(line: usize, raw: &str) -> Result<T, ScriptError> {
    raw.parse().map_err(|_| ScriptError::BadArgument {
        line,
        message: format!("cannot parse `{}`", raw),
    })
}

/// A finite camera delta. `NaN` and infinities would poison the pose.
fn real(line: usize, raw: &str) -> Result<f32, ScriptError> {
    let value: f32 = arg(line, raw)?;
    if !value.is_finite() {
        return Err(ScriptError::BadArgument {
            line,
            message: format!("`{}` is not a finite number", raw),
        });
    }
    Ok(value)
}

/// Runs `commands` against `viewport`, reporting each step to `out`.
///
/// Double-clicks go through `hub`, the same path a window event takes.
pub fn run_script<S: RenderSurface, W: Write>(
    viewport: &mut ViewportOrchestrator<S>,
    hub: &GestureHub,
    commands: &[ScriptLine],
    out: &mut W,
) -> Result<(), ScriptError> {
    for ScriptLine { line, command } in commands {
        log::trace!("script line {}: {:?}", line, command);
        match *command {
            ScriptCommand::Click(pos) => {
                let selected = viewport.click_tile(pos).map(|m| m.pos);
                if selected == Some(pos) {
                    writeln!(out, "click {} -> selected", pos)?;
                } else {
                    writeln!(out, "click {} -> ignored", pos)?;
                }
            }
            ScriptCommand::Next => {
                let focus = viewport.focus_next();
                writeln!(out, "focus -> {}", focus_label(focus))?;
            }
            ScriptCommand::Prev => {
                let focus = viewport.focus_previous();
                writeln!(out, "focus -> {}", focus_label(focus))?;
            }
            ScriptCommand::Select => match viewport.selection().focus() {
                Some(index) => zoom(viewport, index, out)?,
                None => writeln!(out, "select -> no influencers")?,
            },
            ScriptCommand::ZoomEntity(index) => zoom(viewport, index, out)?,
            ScriptCommand::DoubleClick => {
                hub.dispatch(Gesture::DoubleClick);
                for outcome in viewport.process_gestures() {
                    match outcome {
                        ResetOutcome::Applied => writeln!(out, "reset -> home")?,
                        ResetOutcome::Ignored => writeln!(out, "reset -> ignored (flying)")?,
                    }
                }
            }
            ScriptCommand::Frames(n) => {
                let mut arrived_at = None;
                for _ in 0..n {
                    let report = viewport.frame();
                    if report.arrived > 0 {
                        arrived_at = Some(report.frame);
                    }
                }
                match arrived_at {
                    Some(frame) => writeln!(out, "frames {} -> arrived at frame {}", n, frame)?,
                    None => writeln!(out, "frames {} -> {}", n, phase_label(viewport))?,
                }
            }
            ScriptCommand::Settle => {
                let mut ran = 0;
                while viewport.pending_frames() > 0 && ran < SETTLE_FRAME_LIMIT {
                    viewport.frame();
                    ran += 1;
                }
                writeln!(out, "settle -> {} after {} frames", phase_label(viewport), ran)?;
            }
            ScriptCommand::Orbit(az, polar) => {
                let result = viewport.orbit(az, polar);
                writeln!(out, "orbit -> {}", input_label(result))?;
            }
            ScriptCommand::Pan(dx, dy) => {
                let result = viewport.pan(dx, dy);
                writeln!(out, "pan -> {}", input_label(result))?;
            }
            ScriptCommand::Wheel(factor) => {
                let result = viewport.zoom(factor);
                writeln!(out, "wheel -> {}", input_label(result))?;
            }
            ScriptCommand::Pose => writeln!(out, "{}", pose_line(viewport))?,
            ScriptCommand::Details => match viewport.selection().selected() {
                Some(meta) => writeln!(out, "{}", TileDetails(meta))?,
                None => writeln!(out, "No tile selected")?,
            },
            ScriptCommand::Card => match viewport.focused_entity() {
                Some(record) => writeln!(out, "{}", InfluencerCard(record))?,
                None => writeln!(out, "No influencers")?,
            },
        }
    }
    Ok(())
}

fn zoom<S: RenderSurface, W: Write>(
    viewport: &mut ViewportOrchestrator<S>,
    index: usize,
    out: &mut W,
) -> Result<(), ScriptError> {
    match viewport.zoom_to_entity(index) {
        Some(_) => {
            let target = match viewport.camera().phase() {
                CameraPhase::Flying { target, .. } => target,
                CameraPhase::Idle => viewport.camera().pose().position,
            };
            writeln!(
                out,
                "zoom entity {} -> flying to {}, {}",
                index, target.x, target.y
            )?;
        }
        None => writeln!(out, "zoom entity {} -> no placement", index)?,
    }
    Ok(())
}

fn focus_label(focus: Option<usize>) -> String {
    focus.map_or_else(|| "none".to_string(), |i| i.to_string())
}

fn phase_label<S: RenderSurface>(viewport: &ViewportOrchestrator<S>) -> &'static str {
    if viewport.camera().is_flying() {
        "flying"
    } else {
        "idle"
    }
}

fn input_label<E: std::fmt::Display>(result: Result<(), E>) -> String {
    match result {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("ignored ({})", e),
    }
}

/// One-line camera summary.
pub fn pose_line<S: RenderSurface>(viewport: &ViewportOrchestrator<S>) -> String {
    let pose = viewport.camera().pose();
    let tilt = pose
        .tilt
        .map_or_else(|| "none".to_string(), |t| format!("{:.1}", t.to_degrees()));
    format!(
        "pose position=({:.3}, {:.3}, {:.3}) look_at=({:.3}, {:.3}, {:.3}) tilt={} phase={}",
        pose.position.x,
        pose.position.y,
        pose.position.z,
        pose.look_at.x,
        pose.look_at.y,
        pose.look_at.z,
        tilt,
        phase_label(viewport)
    )
}
