// grove/wander.rs - hamsters drifting around the clearing

use std::f32::consts::TAU;

use glam::Vec3;
use hecs::Entity;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::asset::{AssetServer, LoadStatus, LoadTicket, Model};
use crate::scene::{Scene, Transform};
use crate::settings::HamsterSettings;

/// One member of the pool. `position` is the logical position; the visual
/// sits `visual_drop` lower.
#[derive(Debug)]
pub struct Wanderer {
    pub position: Vec3,
    /// Radians about +y. Zero walks towards -z.
    pub heading: f32,
    pub entity: Option<Entity>,
    ticket: Option<LoadTicket<Model>>,
}

impl Wanderer {
    pub fn new(position: Vec3, heading: f32) -> Self {
        Self {
            position,
            heading,
            entity: None,
            ticket: None,
        }
    }

    fn random(rng: &mut SmallRng, settings: &HamsterSettings) -> Self {
        let position = Vec3::new(
            rng.gen_range(settings.x_range[0]..settings.x_range[1]),
            settings.height,
            rng.gen_range(settings.z_range[0]..settings.z_range[1]),
        );
        Self::new(position, rng.gen_range(0.0..TAU))
    }
}

/// Displacement for one frame along `heading`.
pub fn step(heading: f32, speed: f32) -> Vec3 {
    Vec3::new(-heading.sin() * speed, 0.0, -heading.cos() * speed)
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::seed_from_u64(entropy_seed()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn entropy_seed() -> u64 {
    rand::random()
}

#[cfg(target_arch = "wasm32")]
fn entropy_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

/// Fixed-size pool advanced once per frame. Members are never removed.
pub struct WanderPool {
    settings: HamsterSettings,
    rng: SmallRng,
    wanderers: Vec<Wanderer>,
    resampled: u64,
}

impl WanderPool {
    pub fn new(settings: HamsterSettings, seed: Option<u64>) -> Self {
        Self {
            settings,
            rng: seeded_rng(seed),
            wanderers: Vec::new(),
            resampled: 0,
        }
    }

    /// Creates `settings.count` wanderers at random and requests a visual for each.
    pub fn spawn(settings: HamsterSettings, seed: Option<u64>, assets: &mut AssetServer) -> Self {
        let mut pool = Self::new(settings, seed);
        for _ in 0..pool.settings.count {
            let mut wanderer = Wanderer::random(&mut pool.rng, &pool.settings);
            wanderer.ticket = Some(assets.load::<Model>(pool.settings.model.clone()));
            pool.wanderers.push(wanderer);
        }
        log::info!("Released {} x {}", pool.wanderers.len(), pool.settings.model);
        pool
    }

    pub fn push(&mut self, wanderer: Wanderer) {
        self.wanderers.push(wanderer);
    }

    pub fn wanderers(&self) -> &[Wanderer] {
        &self.wanderers
    }

    pub fn len(&self) -> usize {
        self.wanderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wanderers.is_empty()
    }

    /// Heading changes triggered by leaving the wander radius so far.
    pub fn resampled(&self) -> u64 {
        self.resampled
    }

    /// Attaches the visuals whose loads completed.
    pub fn update(&mut self, scene: &mut Scene, assets: &mut AssetServer) {
        for wanderer in &mut self.wanderers {
            let Some(ticket) = &wanderer.ticket else {
                continue;
            };

            match assets.poll(ticket) {
                LoadStatus::Pending { .. } => continue,
                LoadStatus::Ready(handle) => match assets.get(handle) {
                    Some(model) => {
                        let entity =
                            scene.attach(model, visual_transform(wanderer, &self.settings));
                        scene.override_opacity(entity, self.settings.opacity);
                        wanderer.entity = Some(entity);
                    }
                    None => log::warn!("Hamster handle {} has no model", handle.index()),
                },
                LoadStatus::Failed(err) => log::warn!("Hamster stays invisible: {}", err),
            }
            wanderer.ticket = None;
        }
    }

    /// Moves every wanderer with a visual one step and mirrors it into the scene.
    pub fn advance_all(&mut self, scene: &mut Scene) {
        let speed = self.settings.speed;
        let displacements: Vec<Option<Vec3>> = self
            .wanderers
            .par_iter()
            .map(|wanderer| wanderer.entity.map(|_| step(wanderer.heading, speed)))
            .collect();

        let limit = self.settings.wander_radius;
        for (wanderer, displacement) in self.wanderers.iter_mut().zip(displacements) {
            let (Some(entity), Some(displacement)) = (wanderer.entity, displacement) else {
                continue;
            };

            wanderer.position += displacement;
            let distance = wanderer.position.x.hypot(wanderer.position.z);
            if distance > limit {
                wanderer.heading = self.rng.gen_range(0.0..TAU);
                self.resampled += 1;
                log::trace!(
                    "{:?} at distance {:.2} turned to {:.2} rad",
                    entity,
                    distance,
                    wanderer.heading
                );
            }

            scene.set_transform(entity, visual_transform(wanderer, &self.settings));
        }
    }
}

fn visual_transform(wanderer: &Wanderer, settings: &HamsterSettings) -> Transform {
    Transform::from_translation(wanderer.position - Vec3::Y * settings.visual_drop)
        .with_uniform_scale(settings.scale)
        .with_yaw(wanderer.heading)
}
