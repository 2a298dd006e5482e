// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      Directory Structure                                 │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ Code Directory    │          Role                                        │
// ├───────────────────┼──────────────────────────────────────────────────────┤
// │ src/              │ Project Root                                         │
// │ ├── lib.rs        │ wasm entry point                                     │
// │ ├── game.rs       │ Stage composition, asset loading                     │
// │ └── sprite/       │ Character library                                    │
// │     ├── mod.rs    │ Sprite sheet grid layout                             │
// │     ├── clip.rs   │ Clip ids + clip table                                │
// │     ├── animation │ Frame playback (AnimationPlayer)                     │
// │     ├── state.rs  │ Locomotion decision per tick                         │
// │     └── character │ Actor wiring: state + animator + sheet               │
// └───────────────────┴──────────────────────────────────────────────────────┘
pub mod animation;
pub mod character;
pub mod clip;
pub mod state;

use crate::engine::{Point, Rect, Size};
use anyhow::{bail, Result};

/// Uniform grid sprite sheet, frames numbered left to right, top to bottom
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    frame_width: i16,
    frame_height: i16,
    columns: usize,
    rows: usize,
}

impl SheetLayout {
    /// Slices an image of `image_width` x `image_height` pixels into frames.
    /// Partial frames at the right/bottom edge are ignored.
    pub fn new(
        image_width: u32,
        image_height: u32,
        frame_width: i16,
        frame_height: i16,
    ) -> Result<Self> {
        if frame_width <= 0 || frame_height <= 0 {
            bail!("frame size must be positive, got {}x{}", frame_width, frame_height);
        }
        let columns = (image_width / frame_width as u32) as usize;
        let rows = (image_height / frame_height as u32) as usize;
        if columns == 0 || rows == 0 {
            bail!(
                "sheet {}x{} is smaller than one {}x{} frame",
                image_width,
                image_height,
                frame_width,
                frame_height
            );
        }
        // frame_rect works in i16 canvas pixels, every frame origin must fit
        let max = i16::MAX as usize;
        if columns * frame_width as usize > max || rows * frame_height as usize > max {
            bail!(
                "sheet {}x{} is too large, frames must lie within {} pixels",
                image_width,
                image_height,
                i16::MAX
            );
        }
        Ok(SheetLayout {
            frame_width,
            frame_height,
            columns,
            rows,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.columns * self.rows
    }

    pub fn frame_size(&self) -> Size {
        Size {
            width: self.frame_width,
            height: self.frame_height,
        }
    }

    /// Source rectangle of `frame` on the sheet image
    pub fn frame_rect(&self, frame: usize) -> Rect {
        let column = (frame % self.columns) as i16;
        let row = (frame / self.columns) as i16;
        Rect::new(
            Point {
                x: column * self.frame_width,
                y: row * self.frame_height,
            },
            self.frame_size(),
        )
    }
}
