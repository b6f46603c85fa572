pub mod app;
pub mod application;
pub mod asset;
pub mod audio;
pub mod grove;
pub mod io;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod time;

pub use app::{App, AppBuilder, Plugin, Runtime, StartupContext, UpdateContext};
pub use application::{install_application, run_application, SceneApplication};
pub use grove::Grove;
pub use settings::GroveSettings;

use winit::event_loop::EventLoop;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

static LOGGING: std::sync::Once = std::sync::Once::new();

#[cfg(target_arch = "wasm32")]
fn init_logging() {
    LOGGING.call_once(|| {
        // Set panic hook to get better error messages
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        let _ = console_log::init_with_level(log::Level::Info);
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn init_logging() {
    LOGGING.call_once(|| {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .try_init();
    });
}

#[cfg(not(target_arch = "wasm32"))]
pub fn run_with_app(mut app: App) -> Result<(), winit::error::EventLoopError> {
    init_logging();

    let event_loop = EventLoop::new()?;
    let result = event_loop.run_app(&mut app);

    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }

    log::info!("Application shutdown complete");

    result
}

#[cfg(target_arch = "wasm32")]
pub fn run_with_app(app: App) -> Result<(), JsValue> {
    use winit::platform::web::EventLoopExtWebSys;

    init_logging();

    let event_loop = EventLoop::new().map_err(|err| JsValue::from_str(&err.to_string()))?;
    event_loop.spawn_app(app);

    Ok(())
}

/// Loads the settings and runs the grove until the window closes.
#[cfg(not(target_arch = "wasm32"))]
pub fn run() -> Result<(), winit::error::EventLoopError> {
    init_logging();
    run_application(Grove::new(), GroveSettings::load())
}

#[cfg(target_arch = "wasm32")]
pub fn run() -> Result<(), JsValue> {
    init_logging();
    run_application(Grove::new(), GroveSettings::load())
}
