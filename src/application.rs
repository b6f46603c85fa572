// src/application.rs
// Stateful applications on top of the system-based AppBuilder

use std::cell::RefCell;
use std::rc::Rc;

use crate::app::{AppBuilder, StartupContext, UpdateContext};
use crate::settings::GroveSettings;

/// Core trait for scene applications. Implement this to define your application's behavior.
pub trait SceneApplication: Sized + 'static {
    /// Name of your application
    fn name(&self) -> &str {
        "Scene Application"
    }

    /// Called once during startup to populate the scene
    fn setup(&mut self, ctx: &mut StartupContext);

    /// Called every frame to update application logic
    fn update(&mut self, ctx: &mut UpdateContext) {
        let _ = ctx;
    }

    /// Configure the AppBuilder before systems are added
    fn configure(&self, builder: &mut AppBuilder) {
        let _ = builder;
    }
}

/// Registers `application` as one startup and one update system. The
/// returned handle shares the application with those systems.
pub fn install_application<T>(application: T, builder: &mut AppBuilder) -> Rc<RefCell<T>>
where
    T: SceneApplication,
{
    let app_rc = Rc::new(RefCell::new(application));

    app_rc.borrow().configure(builder);

    {
        let app = app_rc.clone();
        builder.add_startup_system(move |ctx| {
            app.borrow_mut().setup(ctx);
        });
    }

    {
        let app = app_rc.clone();
        builder.add_system(move |ctx| {
            app.borrow_mut().update(ctx);
        });
    }

    app_rc
}

/// Run an application that implements SceneApplication
#[cfg(not(target_arch = "wasm32"))]
pub fn run_application<T>(
    application: T,
    settings: GroveSettings,
) -> Result<(), winit::error::EventLoopError>
where
    T: SceneApplication,
{
    log::info!("Starting {}", application.name());
    let mut builder = AppBuilder::with_settings(settings);
    install_application(application, &mut builder);
    crate::run_with_app(builder.build())
}

/// Run an application (WebAssembly version)
#[cfg(target_arch = "wasm32")]
pub fn run_application<T>(
    application: T,
    settings: GroveSettings,
) -> Result<(), wasm_bindgen::JsValue>
where
    T: SceneApplication,
{
    log::info!("Starting {}", application.name());
    let mut builder = AppBuilder::with_settings(settings);
    install_application(application, &mut builder);
    crate::run_with_app(builder.build())
}
