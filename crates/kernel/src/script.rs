//! Scripted input replay.
//!
//! A script lists timestamped key and cursor actions. Replay drives a
//! [`SimulationContext`] on a [`ManualTimeSource`], so the same script always
//! produces the same frames.

use crate::clock::ManualTimeSource;
use crate::config::SimulationConfig;
use crate::context::{FrameReport, SimulationContext, SimulationError};
use blockytry_common::Scancode;
use blockytry_input::LedgerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound on frames in one replay; one hour at 1 ms frames.
pub const MAX_REPLAY_FRAMES: u64 = 3_600_000;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("frame interval must be at least 1 ms")]
    ZeroFrameInterval,
    #[error("script runs {frames} frames, more than the limit of {max}")]
    TooManyFrames { frames: u64, max: u64 },
    #[error("action at {at_ms} ms rejected: {source}")]
    Action {
        at_ms: u64,
        #[source]
        source: LedgerError,
    },
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// What a scripted action does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Press(Scancode),
    Release(Scancode),
    /// Absolute cursor position.
    Mouse { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedAction {
    /// Milliseconds after the start of the replay.
    pub at_ms: u64,
    #[serde(flatten)]
    pub kind: ActionKind,
}

/// A timed input sequence.
///
/// ```yaml
/// frame_ms: 50
/// duration_ms: 200
/// actions:
///   - { at_ms: 0, press: 17 }
///   - { at_ms: 155, release: 17 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputScript {
    /// Spacing between rendered frames.
    pub frame_ms: u64,
    /// Frames are run while their timestamp is within this.
    pub duration_ms: u64,
    pub actions: Vec<ScriptedAction>,
}

impl Default for InputScript {
    fn default() -> Self {
        Self {
            frame_ms: 16,
            duration_ms: 1_000,
            actions: Vec::new(),
        }
    }
}

impl InputScript {
    pub fn from_yaml_str(text: &str) -> Result<Self, ScriptError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Number of frames a replay of this script runs.
    pub fn frame_count(&self) -> u64 {
        if self.frame_ms == 0 {
            0
        } else {
            self.duration_ms / self.frame_ms
        }
    }
}

/// Result of a replay: one report per frame plus the final state.
#[derive(Debug)]
pub struct Replay {
    pub reports: Vec<FrameReport>,
    pub context: SimulationContext<ManualTimeSource>,
}

impl Replay {
    pub fn total_ticks(&self) -> u64 {
        self.context.stepper().ticks()
    }
}

/// Run `script` against a fresh context built from `config`.
///
/// Frames run at every multiple of `frame_ms` up to `duration_ms`. Before the
/// frame at `t`, every action with `at_ms < t` not yet applied is applied at
/// its own timestamp. Actions at or past the last frame are never applied.
pub fn replay(script: &InputScript, config: &SimulationConfig) -> Result<Replay, ScriptError> {
    if script.frame_ms == 0 {
        return Err(ScriptError::ZeroFrameInterval);
    }

    let frames = script.frame_count();
    if frames > MAX_REPLAY_FRAMES {
        return Err(ScriptError::TooManyFrames {
            frames,
            max: MAX_REPLAY_FRAMES,
        });
    }

    let source = ManualTimeSource::new();
    let mut context = SimulationContext::new(config, source.clone(), None);

    let mut actions = script.actions.clone();
    actions.sort_by_key(|a| a.at_ms);
    let mut pending = actions.iter().peekable();

    let mut reports = Vec::with_capacity(frames as usize);
    for frame in 1..=frames {
        let t = frame * script.frame_ms;
        while let Some(action) = pending.next_if(|a| a.at_ms < t) {
            source.set(Duration::from_millis(action.at_ms));
            apply(&mut context, action)?;
        }
        source.set(Duration::from_millis(t));
        reports.push(context.run_frame()?);
    }

    let skipped = pending.count();
    if skipped > 0 {
        tracing::warn!(skipped, "script actions past the last frame were not applied");
    }
    tracing::debug!(
        frames,
        ticks = context.stepper().ticks(),
        "replay finished"
    );
    Ok(Replay { reports, context })
}

fn apply(
    context: &mut SimulationContext<ManualTimeSource>,
    action: &ScriptedAction,
) -> Result<(), ScriptError> {
    let at_ms = action.at_ms;
    match action.kind {
        ActionKind::Press(scancode) => context
            .record_press(scancode)
            .map_err(|source| ScriptError::Action { at_ms, source }),
        ActionKind::Release(scancode) => context
            .record_release(scancode)
            .map_err(|source| ScriptError::Action { at_ms, source }),
        ActionKind::Mouse { x, y } => {
            context.update_mouse(x, y);
            Ok(())
        }
    }
}
