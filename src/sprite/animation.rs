use crate::sprite::clip::{ClipDefinition, ClipId, ClipLibrary};

/// Playback side of a locomotion actor
pub trait AnimationPlayer {
    /// Start `clip` from its first frame. Asking for the clip that is
    /// already playing does nothing.
    fn play(&mut self, clip: ClipId);
    fn current_clip(&self) -> ClipId;
}

/// Frame cursor over a [ClipLibrary]
/// - advance(dt) -> walks frames every `frame_duration` seconds
/// - looping clips wrap, the rest hold their last frame
#[derive(Debug, Clone)]
pub struct Animator {
    library: ClipLibrary,
    current: ClipId,
    // position inside the clip's frame list, not a sheet frame index
    cursor: usize,
    elapsed: f32,
}

impl Animator {
    pub fn new(library: ClipLibrary, initial: ClipId) -> Self {
        Animator {
            library,
            current: initial,
            cursor: 0,
            elapsed: 0.0,
        }
    }

    fn clip(&self) -> &ClipDefinition {
        self.library.get(self.current)
    }

    pub fn advance(&mut self, dt: f32) {
        let (frame_count, frame_duration, looping) = {
            let clip = self.clip();
            (clip.frames.len(), clip.frame_duration, clip.looping)
        };
        self.elapsed += dt;
        while self.elapsed >= frame_duration {
            self.elapsed -= frame_duration;
            if self.cursor + 1 < frame_count {
                self.cursor += 1;
            } else if looping {
                self.cursor = 0;
            }
        }
    }

    /// Sheet frame index to draw this frame
    pub fn current_frame(&self) -> usize {
        self.clip().frames[self.cursor]
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl AnimationPlayer for Animator {
    fn play(&mut self, clip: ClipId) {
        if clip == self.current {
            return;
        }
        self.current = clip;
        // each clip has its own frame count, restart so the cursor is in range
        self.cursor = 0;
        self.elapsed = 0.0;
    }

    fn current_clip(&self) -> ClipId {
        self.current
    }
}
