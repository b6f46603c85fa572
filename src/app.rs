// app.rs
use std::sync::Arc;
use std::time::Duration;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::asset::{AssetServer, AssetSource, FileSource};
use crate::audio::{AudioPlayer, AudioSink};
use crate::renderer::{FrameRenderer, LogRenderer};
use crate::scene::Scene;
use crate::settings::GroveSettings;
use crate::time::{Instant, Timers};

/// Everything a startup system may touch. Runs once, before the first frame.
pub struct StartupContext<'a> {
    pub scene: &'a mut Scene,
    pub assets: &'a mut AssetServer,
    pub audio: &'a mut AudioPlayer,
    pub timers: &'a mut Timers,
    pub settings: &'a GroveSettings,
}

/// Per-frame view of the runtime handed to update systems.
pub struct UpdateContext<'a> {
    pub scene: &'a mut Scene,
    pub assets: &'a mut AssetServer,
    pub audio: &'a mut AudioPlayer,
    pub timers: &'a mut Timers,
    pub settings: &'a GroveSettings,
    /// Seconds since the previous frame.
    pub dt: f64,
}

pub type StartupSystem = Box<dyn for<'a> FnMut(&mut StartupContext<'a>) + 'static>;
pub type UpdateSystem = Box<dyn for<'a> FnMut(&mut UpdateContext<'a>) + 'static>;

pub trait Plugin {
    fn build(&self, app: &mut AppBuilder);
}

pub struct AppBuilder {
    settings: GroveSettings,
    source: Option<Arc<dyn AssetSource>>,
    audio_sink: Option<Box<dyn AudioSink>>,
    renderer: Option<Box<dyn FrameRenderer>>,
    startup_systems: Vec<StartupSystem>,
    systems: Vec<UpdateSystem>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::with_settings(GroveSettings::default())
    }

    pub fn with_settings(settings: GroveSettings) -> Self {
        Self {
            settings,
            source: None,
            audio_sink: None,
            renderer: None,
            startup_systems: Vec::new(),
            systems: Vec::new(),
        }
    }

    pub fn settings(&self) -> &GroveSettings {
        &self.settings
    }

    /// Replaces the file-backed default source rooted at `asset_root`.
    pub fn set_asset_source(&mut self, source: Arc<dyn AssetSource>) -> &mut Self {
        self.source = Some(source);
        self
    }

    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) -> &mut Self {
        self.audio_sink = Some(sink);
        self
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn FrameRenderer>) -> &mut Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn add_plugin(&mut self, plugin: impl Plugin) -> &mut Self {
        plugin.build(self);
        self
    }

    pub fn add_startup_system<F>(&mut self, system: F) -> &mut Self
    where
        F: for<'a> FnMut(&mut StartupContext<'a>) + 'static,
    {
        self.startup_systems.push(Box::new(system));
        self
    }

    pub fn add_system<F>(&mut self, system: F) -> &mut Self
    where
        F: for<'a> FnMut(&mut UpdateContext<'a>) + 'static,
    {
        self.systems.push(Box::new(system));
        self
    }

    /// Builds the windowless runtime, keeping the configured renderer aside.
    fn split(self) -> (Runtime, Box<dyn FrameRenderer>) {
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(FileSource::new(self.settings.asset_root.0.clone())));
        let sink = self.audio_sink.unwrap_or_else(|| default_audio_sink(&self.settings));
        let renderer = self
            .renderer
            .unwrap_or_else(|| Box::new(LogRenderer::default()));

        let runtime = Runtime {
            scene: Scene::new(),
            assets: AssetServer::new(source),
            audio: AudioPlayer::new(sink),
            timers: Timers::new(),
            settings: self.settings,
            startup_systems: self.startup_systems,
            systems: self.systems,
            started: false,
            frames: 0,
        };
        (runtime, renderer)
    }

    pub fn build_runtime(self) -> Runtime {
        self.split().0
    }

    pub fn build(self) -> App {
        let (runtime, renderer) = self.split();
        App {
            runtime,
            renderer,
            window: None,
            window_id: None,
            last_frame: None,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_audio_sink(_settings: &GroveSettings) -> Box<dyn AudioSink> {
    Box::new(crate::audio::LogAudioSink)
}

#[cfg(target_arch = "wasm32")]
fn default_audio_sink(settings: &GroveSettings) -> Box<dyn AudioSink> {
    Box::new(crate::audio::WebAudioSink::new(settings.asset_root.0.clone()))
}

/// Scene, assets, audio and timers, advanced one frame at a time.
///
/// Holds no window; [`App`] feeds it from the winit redraw loop and tests
/// drive it directly with [`Runtime::frame`].
pub struct Runtime {
    scene: Scene,
    assets: AssetServer,
    audio: AudioPlayer,
    timers: Timers,
    settings: GroveSettings,
    startup_systems: Vec<StartupSystem>,
    systems: Vec<UpdateSystem>,
    started: bool,
    frames: u64,
}

impl Runtime {
    /// Runs the startup systems once. Later calls do nothing.
    pub fn startup(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let mut systems = std::mem::take(&mut self.startup_systems);
        for system in &mut systems {
            let mut ctx = StartupContext {
                scene: &mut self.scene,
                assets: &mut self.assets,
                audio: &mut self.audio,
                timers: &mut self.timers,
                settings: &self.settings,
            };
            system(&mut ctx);
        }

        self.scene.update(0.0);
        log::info!(
            "Startup complete: {} entities, {} loads in flight",
            self.scene.world.len(),
            self.assets.in_flight()
        );
    }

    /// Advances everything by `dt` seconds.
    ///
    /// Order: loader results, timers, animations, update systems, transform
    /// propagation, audio cues. Anything a system attaches is drawn at its
    /// initial transform and only starts animating on the next frame.
    pub fn frame(&mut self, dt: f64) {
        self.startup();
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.assets.pump();
        self.timers.advance(dt);
        self.scene.animate(dt);

        for system in &mut self.systems {
            let mut ctx = UpdateContext {
                scene: &mut self.scene,
                assets: &mut self.assets,
                audio: &mut self.audio,
                timers: &mut self.timers,
                settings: &self.settings,
                dt,
            };
            system(&mut ctx);
        }

        self.scene.propagate();
        self.audio.pump(&mut self.assets);
        self.frames += 1;
    }

    /// Blocks until outstanding loads resolve or `timeout` passes. On wasm
    /// this only drains what already arrived.
    pub fn finish_loads(&mut self, timeout: Duration) -> bool {
        self.assets.finish_pending(timeout)
    }

    pub fn shutdown(&mut self) {
        self.timers.clear();
        log::info!("Runtime stopped after {} frames", self.frames);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn assets(&self) -> &AssetServer {
        &self.assets
    }

    pub fn audio(&self) -> &AudioPlayer {
        &self.audio
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn settings(&self) -> &GroveSettings {
        &self.settings
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// winit front end: owns the window and turns redraws into runtime frames.
pub struct App {
    runtime: Runtime,
    renderer: Box<dyn FrameRenderer>,
    window: Option<Window>,
    window_id: Option<WindowId>,
    last_frame: Option<Instant>,
}

impl App {
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    fn window_attributes(&self) -> winit::window::WindowAttributes {
        let window = &self.runtime.settings().window;
        let attributes = Window::default_attributes()
            .with_title(window.title.clone())
            .with_inner_size(LogicalSize::new(window.width, window.height));

        #[cfg(target_arch = "wasm32")]
        let attributes = {
            use winit::platform::web::WindowAttributesExtWebSys;
            attributes.with_append(true)
        };

        attributes
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(self.window_attributes()) {
            Ok(window) => window,
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.renderer.resize(size.width, size.height);
        self.runtime.startup();

        self.window_id = Some(window.id());
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.renderer.resize(size.width, size.height);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(w) = &self.window {
                    let size = w.inner_size();
                    self.renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = self
                    .last_frame
                    .map(|last| now.duration_since(last).as_secs_f64())
                    .unwrap_or(0.0);
                self.last_frame = Some(now);

                self.runtime.frame(dt);
                let scene = self.runtime.scene();
                self.renderer.render(scene, scene.camera());

                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.runtime.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemorySource;
    use std::cell::Cell;
    use std::rc::Rc;

    fn headless(builder: AppBuilder) -> Runtime {
        let mut builder = builder;
        builder.set_asset_source(Arc::new(MemorySource::new()));
        builder.build_runtime()
    }

    #[test]
    fn startup_systems_run_once() {
        let runs = Rc::new(Cell::new(0));
        let mut builder = AppBuilder::new();
        {
            let runs = runs.clone();
            builder.add_startup_system(move |_ctx: &mut StartupContext<'_>| {
                runs.set(runs.get() + 1);
            });
        }

        let mut runtime = headless(builder);
        runtime.frame(0.016);
        runtime.frame(0.016);
        runtime.startup();

        assert_eq!(runs.get(), 1);
        assert_eq!(runtime.frames(), 2);
    }

    #[test]
    fn update_systems_see_timer_fires() {
        let fired = Rc::new(Cell::new(0u32));
        let mut builder = AppBuilder::new();

        let timer = Rc::new(Cell::new(None));
        {
            let timer = timer.clone();
            builder.add_startup_system(move |ctx: &mut StartupContext<'_>| {
                timer.set(Some(ctx.timers.add_interval(Duration::from_millis(100))));
            });
        }
        {
            let fired = fired.clone();
            let timer = timer.clone();
            builder.add_system(move |ctx: &mut UpdateContext<'_>| {
                if let Some(id) = timer.get() {
                    fired.set(fired.get() + ctx.timers.fired(id));
                }
            });
        }

        let mut runtime = headless(builder);
        for _ in 0..10 {
            runtime.frame(0.05);
        }
        assert_eq!(fired.get(), 5);

        runtime.shutdown();
        assert!(runtime.timers().is_empty());
    }

    #[test]
    fn negative_and_nan_deltas_are_ignored() {
        let total = Rc::new(Cell::new(0.0f64));
        let mut builder = AppBuilder::new();
        {
            let total = total.clone();
            builder.add_system(move |ctx: &mut UpdateContext<'_>| {
                total.set(total.get() + ctx.dt);
            });
        }

        let mut runtime = headless(builder);
        runtime.frame(-1.0);
        runtime.frame(f64::NAN);
        runtime.frame(0.25);

        assert_eq!(total.get(), 0.25);
        assert!((runtime.scene().time() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn rises_attached_by_a_system_start_on_the_next_frame() {
        use crate::asset::{Model, ModelNode};
        use crate::scene::{RiseAnimation, Transform};
        use glam::Vec3;

        let ghost = Rc::new(Cell::new(None));
        let mut builder = AppBuilder::new();
        {
            let ghost = ghost.clone();
            builder.add_system(move |ctx: &mut UpdateContext<'_>| {
                if ghost.get().is_some() {
                    return;
                }
                let model = Model::new("duch.glb", vec![ModelNode::new("Ghost")]);
                let entity = ctx
                    .scene
                    .attach(&model, Transform::from_translation(Vec3::new(0.0, -5.0, 0.0)));
                ctx.scene
                    .world
                    .insert_one(entity, RiseAnimation::new(-5.0, 10.0, 5.0))
                    .unwrap();
                ghost.set(Some(entity));
            });
        }

        let mut runtime = headless(builder);
        runtime.frame(4.0);
        let entity = ghost.get().unwrap();
        assert_eq!(runtime.scene().translation(entity).unwrap().y, -5.0);
        assert_eq!(runtime.scene().world_transform(entity).unwrap().translation.y, -5.0);

        runtime.frame(1.0);
        assert!((runtime.scene().translation(entity).unwrap().y - -2.0).abs() < 1e-5);
    }

    struct FrameCounter(Rc<Cell<u32>>);

    impl Plugin for FrameCounter {
        fn build(&self, app: &mut AppBuilder) {
            let frames = self.0.clone();
            app.add_system(move |_ctx: &mut UpdateContext<'_>| frames.set(frames.get() + 1));
        }
    }

    #[test]
    fn plugins_register_their_systems() {
        let frames = Rc::new(Cell::new(0));
        let mut builder = AppBuilder::new();
        builder.add_plugin(FrameCounter(frames.clone()));

        let mut runtime = headless(builder);
        runtime.frame(0.016);
        runtime.frame(0.016);

        assert_eq!(frames.get(), 2);
    }
}
