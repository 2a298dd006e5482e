//! Runs the locomotion pieces inside a real browser:
//! `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use sprite_locomotion::sprite::animation::{AnimationPlayer, Animator};
use sprite_locomotion::sprite::clip::{default_clips, ClipId, ClipLibrary, Facing};
use sprite_locomotion::sprite::state::{
    ActorState, InputService, KeyBindings, LocomotionConfig, LocomotionController,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

struct Held(&'static [&'static str]);

impl InputService for Held {
    fn is_held(&self, code: &str) -> bool {
        self.0.contains(&code)
    }
}

fn controller() -> LocomotionController {
    LocomotionController::new(LocomotionConfig::default(), KeyBindings::default()).unwrap()
}

#[wasm_bindgen_test]
fn walk_right_then_crouch() {
    let controller = controller();
    let library = ClipLibrary::new(default_clips(), 16).unwrap();
    let mut animator = Animator::new(library, ClipId::IdleRight);
    let mut actor = ActorState::new(350, controller.config());

    for _ in 0..10 {
        actor = controller.tick(&Held(&["KeyD"]), actor, &mut animator);
    }
    assert_eq!(actor.position_x, 380);
    assert_eq!(animator.current_clip(), ClipId::MoveRight);

    actor = controller.tick(&Held(&["KeyS", "KeyA"]), actor, &mut animator);
    assert_eq!(actor.facing, Facing::Right);
    assert_eq!(animator.current_clip(), ClipId::CrouchRight);
    assert_eq!(animator.current_frame(), 1);
}

#[wasm_bindgen_test]
fn walking_into_the_right_edge_stops_at_max() {
    let controller = controller();
    let library = ClipLibrary::new(default_clips(), 16).unwrap();
    let mut animator = Animator::new(library, ClipId::IdleRight);
    let mut actor = ActorState::new(590, controller.config());

    for _ in 0..100 {
        actor = controller.tick(&Held(&["KeyD"]), actor, &mut animator);
    }
    assert_eq!(actor.position_x, 600);
}
