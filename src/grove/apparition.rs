// grove/apparition.rs - the ghost that rises out of the ground every few seconds

use glam::Vec3;
use hecs::Entity;

use crate::asset::{AssetServer, LoadStatus, LoadTicket, Model};
use crate::audio::{AudioPlayer, PlaybackSettings};
use crate::scene::{RiseAnimation, Scene, Transform};
use crate::settings::GhostSettings;
use crate::time::{TimerId, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApparitionState {
    Idle,
    Loading,
    Rising,
}

/// Timed spawner: every interval the current ghost is dropped and a fresh
/// one is loaded, attached at the anchor and sent upwards.
///
/// Loads that overlap are all honoured, but whichever arrives detaches the
/// live ghost first, so the scene never holds more than one.
pub struct Apparition {
    settings: GhostSettings,
    timer: TimerId,
    in_flight: Vec<LoadTicket<Model>>,
    live: Option<Entity>,
    spawned: u64,
}

impl Apparition {
    pub fn new(settings: GhostSettings, timers: &mut Timers) -> Self {
        let timer = timers.add_interval(settings.spawn_interval());
        Self {
            settings,
            timer,
            in_flight: Vec::new(),
            live: None,
            spawned: 0,
        }
    }

    pub fn state(&self) -> ApparitionState {
        if self.live.is_some() {
            ApparitionState::Rising
        } else if !self.in_flight.is_empty() {
            ApparitionState::Loading
        } else {
            ApparitionState::Idle
        }
    }

    pub fn live(&self) -> Option<Entity> {
        self.live
    }

    /// Ghosts attached so far.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn timer(&self) -> TimerId {
        self.timer
    }

    pub fn update(
        &mut self,
        scene: &mut Scene,
        assets: &mut AssetServer,
        audio: &mut AudioPlayer,
        timers: &Timers,
    ) {
        for _ in 0..timers.fired(self.timer) {
            self.trigger(scene, assets);
        }
        self.poll_loads(scene, assets, audio);
        self.retire_finished(scene);
    }

    fn trigger(&mut self, scene: &mut Scene, assets: &mut AssetServer) {
        self.vanish(scene);
        self.in_flight
            .push(assets.load::<Model>(self.settings.model.clone()));
    }

    fn vanish(&mut self, scene: &mut Scene) {
        if let Some(ghost) = self.live.take() {
            scene.detach(ghost);
            log::debug!("Ghost {:?} vanished", ghost);
        }
    }

    fn poll_loads(&mut self, scene: &mut Scene, assets: &mut AssetServer, audio: &mut AudioPlayer) {
        let tickets = std::mem::take(&mut self.in_flight);

        for ticket in tickets {
            match assets.poll(&ticket) {
                LoadStatus::Pending { .. } => self.in_flight.push(ticket),
                LoadStatus::Ready(handle) => {
                    let Some(model) = assets.get(handle) else {
                        log::warn!("Ghost handle {} has no model", handle.index());
                        continue;
                    };
                    self.vanish(scene);
                    let ghost = self.appear(scene, model);
                    self.live = Some(ghost);
                    self.spawned += 1;
                    log::info!("Ghost #{} appeared as {:?}", self.spawned, ghost);

                    audio.play_once(
                        assets,
                        self.settings.sound.clone(),
                        PlaybackSettings::ONCE.with_volume(self.settings.sound_volume),
                    );
                }
                LoadStatus::Failed(err) => log::warn!("Ghost did not appear: {}", err),
            }
        }
    }

    fn appear(&self, scene: &mut Scene, model: &Model) -> Entity {
        let anchor = Vec3::from(self.settings.anchor);
        let transform = Transform::from_translation(anchor)
            .with_uniform_scale(self.settings.scale)
            .with_yaw(self.settings.yaw);

        let ghost = scene.attach(model, transform);
        scene.override_opacity(ghost, self.settings.opacity);
        let rise = RiseAnimation::new(
            anchor.y,
            self.settings.target_y,
            self.settings.rise_duration().as_secs_f32(),
        );
        if let Err(err) = scene.world.insert_one(ghost, rise) {
            log::warn!("Ghost {:?} cannot rise: {}", ghost, err);
        }
        ghost
    }

    fn retire_finished(&mut self, scene: &mut Scene) {
        let Some(ghost) = self.live else {
            return;
        };

        let finished = match scene.world.get::<&RiseAnimation>(ghost) {
            Ok(rise) => rise.is_complete(),
            Err(_) => true,
        };
        if finished {
            self.vanish(scene);
        }
    }

    /// Stops future spawns. The live ghost, if any, finishes its rise.
    pub fn stop(&self, timers: &mut Timers) -> bool {
        timers.cancel(self.timer)
    }
}
