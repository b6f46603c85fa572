// grove/mod.rs - the haunted grove scene: terrain, tree ring, ghost and hamsters

pub mod apparition;
pub mod backdrop;
pub mod placement;
pub mod wander;

pub use apparition::{Apparition, ApparitionState};
pub use backdrop::{setup_stage, spawn_lighting, Backdrop};
pub use placement::{circular_positions, TreeRing};
pub use wander::{step, WanderPool, Wanderer};

use glam::Vec3;

use crate::app::{StartupContext, UpdateContext};
use crate::application::SceneApplication;
use crate::scene::Camera;

/// The three behaviours plus the static backdrop. Everything is created in
/// `setup`; until then the parts are absent.
#[derive(Default)]
pub struct Grove {
    backdrop: Option<Backdrop>,
    trees: Option<TreeRing>,
    apparition: Option<Apparition>,
    hamsters: Option<WanderPool>,
}

impl Grove {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backdrop(&self) -> Option<&Backdrop> {
        self.backdrop.as_ref()
    }

    pub fn trees(&self) -> Option<&TreeRing> {
        self.trees.as_ref()
    }

    pub fn apparition(&self) -> Option<&Apparition> {
        self.apparition.as_ref()
    }

    pub fn hamsters(&self) -> Option<&WanderPool> {
        self.hamsters.as_ref()
    }
}

impl SceneApplication for Grove {
    fn name(&self) -> &str {
        "Haunted Grove"
    }

    fn setup(&mut self, ctx: &mut StartupContext) {
        let settings = ctx.settings;

        setup_stage(ctx.scene, &settings.stage);
        spawn_lighting(ctx.scene);
        ctx.scene.set_camera(
            Camera::perspective(75.0, 0.1, 1000.0)
                .at(Vec3::new(0.0, 0.0, 5.0))
                .looking_at(Vec3::ZERO),
        );

        self.backdrop = Some(Backdrop::spawn(ctx.assets, &settings.backdrop));
        self.apparition = Some(Apparition::new(settings.ghost.clone(), ctx.timers));
        self.trees = Some(TreeRing::spawn(ctx.assets, &settings.trees));
        self.hamsters = Some(WanderPool::spawn(
            settings.hamsters.clone(),
            settings.seed,
            ctx.assets,
        ));
    }

    fn update(&mut self, ctx: &mut UpdateContext) {
        if let Some(backdrop) = &mut self.backdrop {
            backdrop.update(ctx.scene, ctx.assets);
        }
        if let Some(trees) = &mut self.trees {
            trees.update(ctx.scene, ctx.assets);
        }
        if let Some(apparition) = &mut self.apparition {
            apparition.update(ctx.scene, ctx.assets, ctx.audio, ctx.timers);
        }
        if let Some(hamsters) = &mut self.hamsters {
            hamsters.update(ctx.scene, ctx.assets);
            hamsters.advance_all(ctx.scene);
        }
    }
}
