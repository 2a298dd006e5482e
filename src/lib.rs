use engine::GameLoop;
use game::GettingStarted;
use wasm_bindgen::prelude::*;

#[macro_use]
mod browser;
mod engine;
mod game;
pub mod sprite;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - installs the panic hook
/// - loads assets and starts the game loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        if let Err(err) = GameLoop::start(GettingStarted::new()).await {
            error!("Could not start game loop : {:#}", err);
        }
    });

    Ok(())
}
