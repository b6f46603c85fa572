// renderer/mod.rs - the renderer seam
//
// The crate does not own a GPU pipeline. A `FrameRenderer` receives the
// scene once per frame after all behaviours have run.

pub mod draw;
pub mod material;

pub use draw::{collect_draw_items, DrawItem, DrawList};
pub use material::{Material, MaterialFlags};

use crate::scene::{Camera, Scene};

pub trait FrameRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    fn render(&mut self, scene: &Scene, camera: &Camera);
}

/// Builds the draw list each frame and logs a summary at a fixed cadence.
pub struct LogRenderer {
    frame: u64,
    report_every: u64,
    last_draw_count: usize,
    size: (u32, u32),
}

impl LogRenderer {
    pub fn new(report_every: u64) -> Self {
        Self {
            frame: 0,
            report_every: report_every.max(1),
            last_draw_count: 0,
            size: (0, 0),
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    pub fn last_draw_count(&self) -> usize {
        self.last_draw_count
    }
}

impl Default for LogRenderer {
    fn default() -> Self {
        Self::new(600)
    }
}

impl FrameRenderer for LogRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        log::debug!("Viewport resized to {}x{}", width, height);
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) {
        let list = collect_draw_items(scene, camera);
        self.last_draw_count = list.len();

        if self.frame % self.report_every == 0 {
            log::info!(
                "Frame {} ({}x{}): {} opaque, {} transparent, {} ambient / {} spot lights",
                self.frame,
                self.size.0,
                self.size.1,
                list.opaque.len(),
                list.transparent.len(),
                list.ambient_lights,
                list.spot_lights
            );
        }
        self.frame += 1;
    }
}
