use crate::browser;
use anyhow::{anyhow, Error, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - we control the closure creation and specify the expected type
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use self::input::KeyState;

/// TABLE
/// ┌──────────────────────── One Browser Frame ───────────────────────────┐
/// │  requestAnimationFrame(perf)                                         │
/// │   ├─► process_input()      drain key events -> KeyState              │
/// │   ├─► while accumulated > FRAME_SIZE                                 │
/// │   │     └─► game.update(&KeyState)    fixed 1/60 s step              │
/// │   └─► game.draw(&Renderer)            once per rendered frame        │
/// └──────────────────────────────────────────────────────────────────────┘
#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self, keystate: &KeyState);
    fn draw(&self, renderer: &Renderer);
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;
/// length of a fixed update step in seconds, what animation timing runs on
pub const FRAME_SECONDS: f32 = FRAME_SIZE / 1000.0;
// most time a single browser frame may owe, a tab returning from the
// background must not replay every missed step against one stale KeyState
const MAX_CATCH_UP: f32 = 5.0 * FRAME_SIZE;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut keyevent_receiver = input::prepare_input()?;
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop::new(browser::now()?);
        let renderer = Renderer {
            context: browser::context()?,
        };
        let mut keystate = KeyState::new();

        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            input::process_input(&mut keystate, &mut keyevent_receiver);

            for _ in 0..game_loop.fixed_steps(perf) {
                game.update(&keystate);
            }
            game.draw(&renderer);

            if let Some(next) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(next) {
                    error!("GameLoop: stopping, {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }

    fn new(now: f64) -> Self {
        GameLoop {
            last_frame: now,
            accumulated_delta: 0.0,
        }
    }

    /// Number of fixed updates owed for a browser frame stamped `perf` (ms)
    fn fixed_steps(&mut self, perf: f64) -> u32 {
        let delta = ((perf - self.last_frame) as f32).max(0.0);
        self.last_frame = perf;
        self.accumulated_delta = (self.accumulated_delta + delta).min(MAX_CATCH_UP);

        let mut steps = 0;
        while self.accumulated_delta > FRAME_SIZE {
            steps += 1;
            self.accumulated_delta -= FRAME_SIZE;
        }
        steps
    }
}

// ==================== Geometry ====================
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Size {
    pub width: i16,
    pub height: i16,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }
}

// ==================== Rendering ====================
pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.position.x.into(),
            rect.position.y.into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn draw_image(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        if let Err(err) = self
            .context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.position.x.into(),
                frame.position.y.into(),
                frame.size.width.into(),
                frame.size.height.into(),
                destination.position.x.into(),
                destination.position.y.into(),
                destination.size.width.into(),
                destination.size.height.into(),
            )
        {
            error!("[engine.rs::draw_image] {:#?}", err);
        }
    }

    pub fn draw_entire_image(&self, image: &HtmlImageElement, position: &Point) {
        if let Err(err) =
            self.context
                .draw_image_with_html_image_element(image, position.x.into(), position.y.into())
        {
            error!("[engine.rs::draw_entire_image] {:#?}", err);
        }
    }

    #[cfg(debug_assertions)]
    fn stroke_rect(&self, rect: &Rect) {
        self.context.stroke_rect(
            rect.position.x.into(),
            rect.position.y.into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }
}

/// Debug builds outline sprite frames so clip/frame mistakes are visible
#[cfg(debug_assertions)]
pub trait DebugDraw {
    fn draw_debug(&self, renderer: &Renderer);
}

#[cfg(debug_assertions)]
impl DebugDraw for Rect {
    fn draw_debug(&self, renderer: &Renderer) {
        renderer.stroke_rect(self);
    }
}

/// Static drawable, e.g. the stage background
pub struct Image {
    element: HtmlImageElement,
    position: Point,
}

impl Image {
    pub fn new(element: HtmlImageElement, position: Point) -> Self {
        Image { element, position }
    }

    pub fn draw(&self, renderer: &Renderer) {
        renderer.draw_entire_image(&self.element, &self.position);
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let source_name = source.to_string();
    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image {}: {:#?}",
                source_name,
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields the channel result
    // - second ? yields the image load result
    rx.await??;

    Ok(image)
}

// ==================== Input ====================
pub mod input {
    use crate::browser;
    use crate::sprite::state::InputService;
    use anyhow::Result;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};
    use std::collections::HashSet;
    use wasm_bindgen::JsCast;
    use web_sys::{Event, KeyboardEvent};

    pub enum KeyPress {
        KeyUp(KeyboardEvent),
        KeyDown(KeyboardEvent),
        // focus left the canvas, no keyup will follow for held keys
        ReleaseAll,
    }

    /// Keys currently held, keyed by `KeyboardEvent.code` ("KeyA", "ArrowLeft" ...)
    #[derive(Debug, Default)]
    pub struct KeyState {
        pressed_keys: HashSet<String>,
    }

    impl KeyState {
        pub fn new() -> Self {
            KeyState::default()
        }

        pub fn is_pressed(&self, code: &str) -> bool {
            self.pressed_keys.contains(code)
        }

        pub fn set_pressed(&mut self, code: &str) {
            self.pressed_keys.insert(code.to_string());
        }

        pub fn set_released(&mut self, code: &str) {
            self.pressed_keys.remove(code);
        }

        pub fn release_all(&mut self) {
            self.pressed_keys.clear();
        }
    }

    impl InputService for KeyState {
        fn is_held(&self, code: &str) -> bool {
            self.is_pressed(code)
        }
    }

    /// Hooks key listeners onto the canvas and returns the receiving end.
    /// Events queue up between frames and are drained by [process_input].
    pub fn prepare_input() -> Result<UnboundedReceiver<KeyPress>> {
        let (keydown_sender, keyevent_receiver) = unbounded();
        let keyup_sender = keydown_sender.clone();
        let canvas_blur_sender = keydown_sender.clone();
        let window_blur_sender = keydown_sender.clone();

        let onkeydown = browser::closure_wrap(Box::new(move |keycode: KeyboardEvent| {
            let _ = keydown_sender.unbounded_send(KeyPress::KeyDown(keycode));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let onkeyup = browser::closure_wrap(Box::new(move |keycode: KeyboardEvent| {
            let _ = keyup_sender.unbounded_send(KeyPress::KeyUp(keycode));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let oncanvasblur = browser::closure_wrap(Box::new(move |_: Event| {
            let _ = canvas_blur_sender.unbounded_send(KeyPress::ReleaseAll);
        }) as Box<dyn FnMut(Event)>);

        let onwindowblur = browser::closure_wrap(Box::new(move |_: Event| {
            let _ = window_blur_sender.unbounded_send(KeyPress::ReleaseAll);
        }) as Box<dyn FnMut(Event)>);

        let canvas = browser::canvas()?;
        canvas.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
        canvas.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
        canvas.set_onblur(Some(oncanvasblur.as_ref().unchecked_ref()));
        browser::window()?.set_onblur(Some(onwindowblur.as_ref().unchecked_ref()));
        // listeners live for the whole page
        onkeydown.forget();
        onkeyup.forget();
        oncanvasblur.forget();
        onwindowblur.forget();

        Ok(keyevent_receiver)
    }

    /// Drains every queued key event so the state is sampled once per frame
    pub fn process_input(
        state: &mut KeyState,
        keyevent_receiver: &mut UnboundedReceiver<KeyPress>,
    ) {
        while let Ok(Some(evt)) = keyevent_receiver.try_next() {
            match evt {
                KeyPress::KeyUp(evt) => state.set_released(&evt.code()),
                KeyPress::KeyDown(evt) => state.set_pressed(&evt.code()),
                KeyPress::ReleaseAll => state.release_all(),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn key_state_tracks_press_and_release() {
            let mut keys = KeyState::new();
            assert!(!keys.is_pressed("KeyA"));

            keys.set_pressed("KeyA");
            keys.set_pressed("KeyS");
            assert!(keys.is_held("KeyA"));
            assert!(keys.is_held("KeyS"));

            keys.set_released("KeyA");
            assert!(!keys.is_held("KeyA"));
            assert!(keys.is_held("KeyS"));
        }

        #[test]
        fn release_all_drops_every_held_key() {
            let mut keys = KeyState::new();
            keys.set_pressed("KeyA");
            keys.set_pressed("KeyS");

            keys.release_all();
            assert!(!keys.is_held("KeyA"));
            assert!(!keys.is_held("KeyS"));
        }

        #[test]
        fn focus_loss_event_clears_keys_on_next_drain() {
            let (sender, mut receiver) = unbounded();
            let mut keys = KeyState::new();
            keys.set_pressed("KeyA");

            sender.unbounded_send(KeyPress::ReleaseAll).unwrap();
            process_input(&mut keys, &mut receiver);
            assert!(!keys.is_held("KeyA"));

            // later presses register again
            keys.set_pressed("KeyD");
            process_input(&mut keys, &mut receiver);
            assert!(keys.is_held("KeyD"));
        }

        #[test]
        fn repeated_keydown_is_still_one_held_key() {
            let mut keys = KeyState::new();
            keys.set_pressed("KeyD");
            keys.set_pressed("KeyD");
            keys.set_released("KeyD");
            assert!(!keys.is_pressed("KeyD"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn regular_frames_owe_one_step_each() {
        let mut game_loop = GameLoop::new(0.0);
        assert_eq!(game_loop.fixed_steps(20.0), 1);
        assert_eq!(game_loop.fixed_steps(40.0), 1);
        assert_eq!(game_loop.fixed_steps(45.0), 0);
        // leftover time carries into the next frame
        assert_eq!(game_loop.fixed_steps(60.0), 1);
    }

    #[test]
    fn long_pause_is_capped_to_a_few_steps() {
        let mut game_loop = GameLoop::new(1_000.0);
        let steps = game_loop.fixed_steps(61_000.0);
        assert!((4..=5).contains(&steps), "{steps} steps after a 60s pause");
        assert!(game_loop.accumulated_delta <= FRAME_SIZE);

        // back to normal pacing straight away
        assert!(game_loop.fixed_steps(61_020.0) <= 2);
    }

    #[test]
    fn clock_going_backwards_owes_nothing() {
        let mut game_loop = GameLoop::new(500.0);
        assert_eq!(game_loop.fixed_steps(100.0), 0);
        assert_eq!(game_loop.fixed_steps(120.0), 1);
    }

    #[test]
    fn fixed_step_is_sixty_hertz() {
        assert_relative_eq!(FRAME_SIZE, 16.666_666, epsilon = 1e-4);
        assert_relative_eq!(FRAME_SECONDS * 60.0, 1.0, epsilon = 1e-5);
    }
}
