#[cfg(debug_assertions)]
use crate::engine::DebugDraw;
use crate::engine::{Point, Rect, Renderer, FRAME_SECONDS};
use crate::sprite::animation::Animator;
use crate::sprite::clip::{default_clips, ClipDefinition, ClipLibrary};
use crate::sprite::state::{
    ActorState, InputService, KeyBindings, LocomotionConfig, LocomotionController,
};
use crate::sprite::SheetLayout;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use web_sys::HtmlImageElement;

/// Everything needed to build a character, as read from `character.json`.
/// Omitted fields fall back to the tutorial character.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterDefinition {
    pub frame_width: i16,
    pub frame_height: i16,
    pub spawn: Point,
    pub locomotion: LocomotionConfig,
    pub bindings: KeyBindings,
    pub clips: Vec<ClipDefinition>,
}

impl Default for CharacterDefinition {
    fn default() -> Self {
        CharacterDefinition {
            frame_width: 150,
            frame_height: 117,
            spawn: Point { x: 350, y: 330 },
            locomotion: LocomotionConfig::default(),
            bindings: KeyBindings::default(),
            clips: default_clips(),
        }
    }
}

/// Sheet image plus how it is sliced, shareable between actors
pub struct SpriteSheet {
    image: HtmlImageElement,
    layout: SheetLayout,
}

impl SpriteSheet {
    pub fn new(image: HtmlImageElement, frame_width: i16, frame_height: i16) -> Result<Self> {
        let layout = SheetLayout::new(
            image.natural_width(),
            image.natural_height(),
            frame_width,
            frame_height,
        )?;
        Ok(SpriteSheet { image, layout })
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }
}

/// Controller, state and playback built from one definition.
/// Kept apart from the sheet image so it can be exercised without a browser.
pub struct Rig {
    controller: LocomotionController,
    state: ActorState,
    animator: Animator,
}

impl Rig {
    /// Fails on a broken clip table or config, before any tick runs
    pub fn new(definition: &CharacterDefinition, layout: &SheetLayout) -> Result<Self> {
        let library = ClipLibrary::new(definition.clips.clone(), layout.frame_count())
            .context("Invalid character clip table")?;
        let controller =
            LocomotionController::new(definition.locomotion, definition.bindings.clone())
                .context("Invalid character locomotion config")?;
        let state = ActorState::new(definition.spawn.x, controller.config());
        let animator = Animator::new(library, state.current_clip);
        Ok(Rig {
            controller,
            state,
            animator,
        })
    }

    /// Engine bookkeeping first (frame advance), then the locomotion callback
    pub fn update(&mut self, input: &impl InputService) {
        self.animator.advance(FRAME_SECONDS);
        self.state = self.controller.tick(input, self.state, &mut self.animator);
    }

    pub fn state(&self) -> &ActorState {
        &self.state
    }

    pub fn current_frame(&self) -> usize {
        self.animator.current_frame()
    }
}

pub struct Character {
    rig: Rig,
    sheet: Rc<SpriteSheet>,
    y: i16,
}

impl Character {
    pub fn new(definition: &CharacterDefinition, sheet: Rc<SpriteSheet>) -> Result<Self> {
        let rig = Rig::new(definition, sheet.layout())?;
        log!(
            "character ready at x={} facing {:?}, {} sheet frames",
            rig.state().position_x,
            rig.state().facing,
            sheet.layout().frame_count()
        );
        Ok(Character {
            rig,
            sheet,
            y: definition.spawn.y,
        })
    }

    pub fn update(&mut self, input: &impl InputService) {
        self.rig.update(input);
    }

    pub fn position(&self) -> Point {
        Point {
            x: self.rig.state().position_x,
            y: self.y,
        }
    }

    pub fn draw(&self, renderer: &Renderer) {
        let frame = self.sheet.layout.frame_rect(self.rig.current_frame());
        let destination = Rect::new(self.position(), frame.size);
        renderer.draw_image(&self.sheet.image, &frame, &destination);

        #[cfg(debug_assertions)]
        {
            destination.draw_debug(renderer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::clip::{ClipId, Facing};
    use std::collections::HashSet;

    #[derive(Default)]
    struct Keys(HashSet<&'static str>);

    impl InputService for Keys {
        fn is_held(&self, code: &str) -> bool {
            self.0.contains(code)
        }
    }

    fn layout() -> SheetLayout {
        SheetLayout::new(1200, 234, 150, 117).unwrap()
    }

    #[test]
    fn definition_json_falls_back_to_defaults() {
        let definition: CharacterDefinition = serde_json::from_str(
            r#"{ "spawn": { "x": 100, "y": 200 }, "locomotion": { "stepSize": 5 } }"#,
        )
        .unwrap();
        assert_eq!(definition.spawn, Point { x: 100, y: 200 });
        assert_eq!(definition.locomotion.step_size, 5);
        assert_eq!(definition.locomotion.bounds.max_x, 600);
        assert_eq!(definition.bindings, KeyBindings::default());
        assert_eq!(definition.clips.len(), 6);
    }

    #[test]
    fn shipped_definition_matches_defaults() {
        let definition: CharacterDefinition =
            serde_json::from_str(include_str!("../../static/character.json")).unwrap();
        assert_eq!(definition, CharacterDefinition::default());
    }

    #[test]
    fn rig_starts_idle_right() {
        let rig = Rig::new(&CharacterDefinition::default(), &layout()).unwrap();
        assert_eq!(rig.state().position_x, 350);
        assert_eq!(rig.state().facing, Facing::Right);
        assert_eq!(rig.state().current_clip, ClipId::IdleRight);
        assert_eq!(rig.current_frame(), 0);
    }

    #[test]
    fn rig_rejects_clips_missing_from_sheet() {
        let small = SheetLayout::new(1200, 117, 150, 117).unwrap();
        assert!(Rig::new(&CharacterDefinition::default(), &small).is_err());
    }

    #[test]
    fn rig_walks_left_and_animates() {
        let mut rig = Rig::new(&CharacterDefinition::default(), &layout()).unwrap();
        let mut keys = Keys::default();
        keys.0.insert("KeyA");

        rig.update(&keys);
        assert_eq!(rig.state().position_x, 347);
        assert_eq!(rig.state().current_clip, ClipId::MoveLeft);
        assert_eq!(rig.current_frame(), 10);

        // 0.1 s per frame, 60 ticks per second
        for _ in 0..12 {
            rig.update(&keys);
        }
        assert_eq!(rig.state().position_x, 347 - 36);
        assert!(rig.current_frame() > 10);

        keys.0.clear();
        rig.update(&keys);
        assert_eq!(rig.state().current_clip, ClipId::IdleLeft);
        assert_eq!(rig.current_frame(), 8);
    }
}
