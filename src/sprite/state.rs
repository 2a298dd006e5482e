//! Locomotion controller: held keys + previous actor state -> next actor
//! state, once per tick.
//!
//! ELI5:
//! ┌──────────────── Precedence (first match wins) ──────────────────┐
//! │  Held        →  Facing     →  Position        →  Clip           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  crouch      →  unchanged  →  unchanged       →  Crouch{facing} │
//! │  left        →  Left       →  x - step (min)  →  MoveLeft       │
//! │  right       →  Right      →  x + step (max)  →  MoveRight      │
//! │  nothing     →  unchanged  →  unchanged       →  Idle{facing}   │
//! └─────────────────────────────────────────────────────────────────┘
//!
//! The decision is pure: [update] takes the state by value and hands back
//! a new one. Talking to the animation player happens on the boundary in
//! [LocomotionController::tick].

use crate::sprite::animation::AnimationPlayer;
use crate::sprite::clip::{ClipId, Facing, Mode};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// "is this key held right now", keyed by `KeyboardEvent.code`
pub trait InputService {
    fn is_held(&self, code: &str) -> bool;
}

/// The three flags the controller cares about, sampled together for one tick
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct InputSnapshot {
    pub crouch: bool,
    pub left: bool,
    pub right: bool,
}

impl InputSnapshot {
    pub fn sample(input: &impl InputService, bindings: &KeyBindings) -> Self {
        InputSnapshot {
            crouch: input.is_held(&bindings.crouch),
            left: input.is_held(&bindings.left),
            right: input.is_held(&bindings.right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyBindings {
    pub crouch: String,
    pub left: String,
    pub right: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            crouch: "KeyS".to_string(),
            left: "KeyA".to_string(),
            right: "KeyD".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: i16,
    pub max_x: i16,
}

impl Bounds {
    pub fn clamp(&self, x: i16) -> i16 {
        x.clamp(self.min_x, self.max_x)
    }
}

/// Step and playable range. The range depends on sprite and stage width,
/// so it is data, not a constant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocomotionConfig {
    /// pixels per tick
    pub step_size: i16,
    pub bounds: Bounds,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        LocomotionConfig {
            step_size: 3,
            bounds: Bounds {
                min_x: 3,
                max_x: 600,
            },
        }
    }
}

impl LocomotionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bounds.min_x > self.bounds.max_x {
            bail!(
                "locomotion bounds are inverted: min_x {} > max_x {}",
                self.bounds.min_x,
                self.bounds.max_x
            );
        }
        if self.step_size < 0 {
            bail!("locomotion step size must not be negative: {}", self.step_size);
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActorState {
    pub position_x: i16,
    pub facing: Facing,
    /// last clip the controller asked for, whether or not the player
    /// actually restarted anything
    pub current_clip: ClipId,
}

impl ActorState {
    /// Fresh actor: facing right, idling, spawn clamped into the playable range
    pub fn new(position_x: i16, config: &LocomotionConfig) -> Self {
        ActorState {
            position_x: config.bounds.clamp(position_x),
            facing: Facing::Right,
            current_clip: ClipId::IdleRight,
        }
    }
}

/// Result of one tick: the next state, plus a play request only when the
/// wanted clip differs from the one already current (edge triggered)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ActorState,
    pub play: Option<ClipId>,
}

/// Total over its inputs, out of range positions get clamped, never rejected
pub fn update(input: InputSnapshot, state: ActorState, config: &LocomotionConfig) -> Transition {
    let bounds = config.bounds;
    let (facing, position_x, mode) = if input.crouch {
        (state.facing, state.position_x, Mode::Crouch)
    } else if input.left {
        let x = bounds.clamp(state.position_x.saturating_sub(config.step_size));
        (Facing::Left, x, Mode::Move)
    } else if input.right {
        let x = bounds.clamp(state.position_x.saturating_add(config.step_size));
        (Facing::Right, x, Mode::Move)
    } else {
        (state.facing, state.position_x, Mode::Idle)
    };

    let desired = ClipId::for_pose(facing, mode);
    let play = (desired != state.current_clip).then_some(desired);

    Transition {
        state: ActorState {
            position_x,
            facing,
            current_clip: desired,
        },
        play,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocomotionController {
    config: LocomotionConfig,
    bindings: KeyBindings,
}

impl LocomotionController {
    pub fn new(config: LocomotionConfig, bindings: KeyBindings) -> Result<Self> {
        config.validate()?;
        Ok(LocomotionController { config, bindings })
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn decide(&self, input: InputSnapshot, state: ActorState) -> Transition {
        update(input, state, &self.config)
    }

    /// Samples the input, decides, and tells the player about a new clip
    pub fn tick(
        &self,
        input: &impl InputService,
        state: ActorState,
        player: &mut impl AnimationPlayer,
    ) -> ActorState {
        let snapshot = InputSnapshot::sample(input, &self.bindings);
        let transition = self.decide(snapshot, state);
        if let Some(clip) = transition.play {
            player.play(clip);
        }
        transition.state
    }
}
