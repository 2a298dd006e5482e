use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// What the actor is doing, independent of which way it faces
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Mode {
    Idle,
    Crouch,
    Move,
}

/// Closed set of clips a locomotion actor can play. Clip names are never
/// assembled from strings, so a misspelt clip can't exist.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ClipId {
    IdleLeft,
    IdleRight,
    CrouchLeft,
    CrouchRight,
    MoveLeft,
    MoveRight,
}

/// TABLE:
/// ┌──────────────┬──────────────┬──────────────┐
/// │  (facing,    │     Left     │    Right     │
/// │   mode)      │              │              │
/// ├──────────────┼──────────────┼──────────────┤
/// │  Idle        │  IdleLeft    │  IdleRight   │
/// │  Crouch      │  CrouchLeft  │  CrouchRight │
/// │  Move        │  MoveLeft    │  MoveRight   │
/// └──────────────┴──────────────┴──────────────┘
impl ClipId {
    pub const ALL: [ClipId; 6] = [
        ClipId::IdleLeft,
        ClipId::IdleRight,
        ClipId::CrouchLeft,
        ClipId::CrouchRight,
        ClipId::MoveLeft,
        ClipId::MoveRight,
    ];

    pub fn for_pose(facing: Facing, mode: Mode) -> Self {
        match (facing, mode) {
            (Facing::Left, Mode::Idle) => ClipId::IdleLeft,
            (Facing::Right, Mode::Idle) => ClipId::IdleRight,
            (Facing::Left, Mode::Crouch) => ClipId::CrouchLeft,
            (Facing::Right, Mode::Crouch) => ClipId::CrouchRight,
            (Facing::Left, Mode::Move) => ClipId::MoveLeft,
            (Facing::Right, Mode::Move) => ClipId::MoveRight,
        }
    }

    pub fn facing(self) -> Facing {
        match self {
            ClipId::IdleLeft | ClipId::CrouchLeft | ClipId::MoveLeft => Facing::Left,
            ClipId::IdleRight | ClipId::CrouchRight | ClipId::MoveRight => Facing::Right,
        }
    }

    pub fn mode(self) -> Mode {
        match self {
            ClipId::IdleLeft | ClipId::IdleRight => Mode::Idle,
            ClipId::CrouchLeft | ClipId::CrouchRight => Mode::Crouch,
            ClipId::MoveLeft | ClipId::MoveRight => Mode::Move,
        }
    }

    fn index(self) -> usize {
        match self {
            ClipId::IdleLeft => 0,
            ClipId::IdleRight => 1,
            ClipId::CrouchLeft => 2,
            ClipId::CrouchRight => 3,
            ClipId::MoveLeft => 4,
            ClipId::MoveRight => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipDefinition {
    pub id: ClipId,
    /// sheet frame indices, played in order
    pub frames: Vec<usize>,
    /// seconds each frame stays on screen
    pub frame_duration: f32,
    pub looping: bool,
}

impl ClipDefinition {
    pub fn new(id: ClipId, frames: Vec<usize>, frame_duration: f32, looping: bool) -> Self {
        ClipDefinition {
            id,
            frames,
            frame_duration,
            looping,
        }
    }
}

// Sheet layout of the tutorial character: right facing poses on the first
// row, left facing on the second
static DEFAULT_CLIPS: Lazy<Vec<ClipDefinition>> = Lazy::new(|| {
    vec![
        ClipDefinition::new(ClipId::IdleRight, vec![0], 0.1, false),
        ClipDefinition::new(ClipId::CrouchRight, vec![1], 0.1, false),
        ClipDefinition::new(ClipId::MoveRight, (2..=7).collect(), 0.1, true),
        ClipDefinition::new(ClipId::IdleLeft, vec![8], 0.1, false),
        ClipDefinition::new(ClipId::CrouchLeft, vec![9], 0.1, false),
        ClipDefinition::new(ClipId::MoveLeft, (10..=15).collect(), 0.1, true),
    ]
});

pub fn default_clips() -> Vec<ClipDefinition> {
    DEFAULT_CLIPS.clone()
}

/// Validated, immutable clip table for one actor.
/// Built once at creation, so a missing or broken clip stops the game
/// before the first tick instead of silently doing nothing mid play.
#[derive(Debug, Clone)]
pub struct ClipLibrary {
    clips: Vec<ClipDefinition>,
}

impl ClipLibrary {
    /// `frame_count` is the number of frames on the sprite sheet, every
    /// referenced frame must exist on it
    pub fn new(definitions: Vec<ClipDefinition>, frame_count: usize) -> Result<Self> {
        let mut slots: [Option<ClipDefinition>; 6] = Default::default();

        for definition in definitions {
            if definition.frames.is_empty() {
                bail!("clip {:?} has no frames", definition.id);
            }
            if !(definition.frame_duration.is_finite() && definition.frame_duration > 0.0) {
                bail!(
                    "clip {:?} has invalid frame duration {}",
                    definition.id,
                    definition.frame_duration
                );
            }
            if let Some(frame) = definition.frames.iter().find(|frame| **frame >= frame_count) {
                bail!(
                    "clip {:?} references frame {} but the sheet only has {} frames",
                    definition.id,
                    frame,
                    frame_count
                );
            }
            let slot = &mut slots[definition.id.index()];
            if slot.is_some() {
                bail!("clip {:?} is defined more than once", definition.id);
            }
            *slot = Some(definition);
        }

        let missing: Vec<ClipId> = ClipId::ALL
            .into_iter()
            .filter(|id| slots[id.index()].is_none())
            .collect();
        if !missing.is_empty() {
            bail!("missing clip definitions: {:?}", missing);
        }

        // all slots are filled, flattening keeps them in ClipId::index order
        let clips = slots.into_iter().flatten().collect();
        Ok(ClipLibrary { clips })
    }

    pub fn get(&self, id: ClipId) -> &ClipDefinition {
        &self.clips[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_lookup_round_trips_through_facing_and_mode() {
        for id in ClipId::ALL {
            assert_eq!(ClipId::for_pose(id.facing(), id.mode()), id);
        }
    }

    #[test]
    fn default_clips_build_a_library() {
        let library = ClipLibrary::new(default_clips(), 16).unwrap();
        let move_left = library.get(ClipId::MoveLeft);
        assert_eq!(move_left.frames, vec![10, 11, 12, 13, 14, 15]);
        assert!(move_left.looping);
        assert!(!library.get(ClipId::IdleRight).looping);
    }

    #[test]
    fn missing_clip_fails_at_creation() {
        let clips: Vec<_> = default_clips()
            .into_iter()
            .filter(|clip| clip.id != ClipId::CrouchLeft)
            .collect();
        let err = ClipLibrary::new(clips, 16).unwrap_err();
        assert!(err.to_string().contains("CrouchLeft"));
    }

    #[test]
    fn duplicate_clip_is_rejected() {
        let mut clips = default_clips();
        clips.push(ClipDefinition::new(ClipId::IdleRight, vec![0], 0.1, false));
        assert!(ClipLibrary::new(clips, 16).is_err());
    }

    #[test]
    fn frame_outside_sheet_is_rejected() {
        assert!(ClipLibrary::new(default_clips(), 12).is_err());
    }

    #[test]
    fn empty_or_zero_duration_clips_are_rejected() {
        let mut clips = default_clips();
        clips[0].frames.clear();
        assert!(ClipLibrary::new(clips, 16).is_err());

        let mut clips = default_clips();
        clips[0].frame_duration = 0.0;
        assert!(ClipLibrary::new(clips, 16).is_err());
    }
}
