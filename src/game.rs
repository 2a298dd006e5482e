use crate::browser;
use crate::engine;
use crate::engine::input::KeyState;
use crate::engine::{Game, Image, Point, Rect, Renderer, Size};
use crate::sprite::character::{Character, CharacterDefinition, SpriteSheet};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::join;
use std::rc::Rc;
use web_sys::HtmlImageElement;

/// TABLE
/// ┌──────────────────────── Update Flow ─────────────────────────────────┐
/// │                                                                      │
/// │   ┌─────────────┐  update   ┌──────────────┐  update  ┌───────────┐  │
/// │   │  engine.rs  ├──────────►│   game.rs    ├─────────►│ Character │  │
/// │   │  GameLoop   │ &KeyState │ GettingStart │          │  Rig      │  │
/// │   └─────────────┘           └──────────────┘          └─────┬─────┘  │
/// │                                                             │        │
/// │                          1. Animator.advance(FRAME_SECONDS) │        │
/// │                          2. LocomotionController.tick ◄─────┘        │
/// │                             └─► play(clip) on change only            │
/// └──────────────────────────────────────────────────────────────────────┘
pub enum GettingStarted {
    /// Assets are still in flight
    Loading,
    /// Stage composed, ticking
    Loaded(Stage),
}

impl GettingStarted {
    const DEFINITION_PATH: &'static str = "character.json";
    const SHEET_PATH: &'static str = "character.png";
    const BACKGROUND_PATH: &'static str = "jungle.png";

    const STAGE_SIZE: Size = Size {
        width: 768,
        height: 512,
    };

    pub fn new() -> Self {
        GettingStarted::Loading
    }

    async fn load_definition() -> Result<CharacterDefinition> {
        browser::fetch_json::<CharacterDefinition>(Self::DEFINITION_PATH)
            .await
            .with_context(|| {
                format!(
                    "Failed to load character definition from : {}",
                    Self::DEFINITION_PATH
                )
            })
    }

    async fn load_sheet_image() -> Result<HtmlImageElement> {
        engine::load_image(Self::SHEET_PATH)
            .await
            .with_context(|| format!("Failed to load sprite sheet from : {}", Self::SHEET_PATH))
    }

    async fn load_background() -> Result<HtmlImageElement> {
        engine::load_image(Self::BACKGROUND_PATH).await.with_context(|| {
            format!(
                "Failed to load background image from : {}",
                Self::BACKGROUND_PATH
            )
        })
    }
}

impl Default for GettingStarted {
    fn default() -> Self {
        GettingStarted::new()
    }
}

#[async_trait(?Send)]
impl Game for GettingStarted {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            GettingStarted::Loading => {
                // independent assets, total time is the slowest one
                let (definition, sheet_image, background) = join!(
                    Self::load_definition(),
                    Self::load_sheet_image(),
                    Self::load_background(),
                );
                let definition = definition?;
                let sheet = SpriteSheet::new(
                    sheet_image?,
                    definition.frame_width,
                    definition.frame_height,
                )
                .context("Failed to slice character sheet")?;
                let character = Character::new(&definition, Rc::new(sheet))?;

                let stage = Stage {
                    background: Image::new(background?, Point { x: 0, y: 0 }),
                    character,
                };
                log!("stage loaded");
                Ok(Box::new(GettingStarted::Loaded(stage)))
            }
            GettingStarted::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState) {
        if let GettingStarted::Loaded(stage) = self {
            stage.character.update(keystate);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let GettingStarted::Loaded(stage) = self {
            renderer.clear(&Rect::new(Point { x: 0, y: 0 }, Self::STAGE_SIZE));
            // attachment order is draw order : background -> character
            stage.background.draw(renderer);
            stage.character.draw(renderer);
        }
    }
}

pub struct Stage {
    background: Image,
    character: Character,
}
