pub mod cache;
pub mod error;
pub mod handle;
pub mod model;
pub mod server;
pub mod sound;

pub use cache::AssetCache;
pub use error::AssetError;
pub use handle::Handle;
pub use model::{Model, ModelMesh, ModelNode};
pub use server::{AssetServer, AssetSource, FileSource, LoadStatus, LoadTicket, MemorySource};
pub use sound::SoundClip;

/// Decoded asset storage, one cache per asset kind.
pub struct Assets {
    pub models: AssetCache<Model>,
    pub sounds: AssetCache<SoundClip>,
}

impl Assets {
    pub fn new() -> Self {
        Self {
            models: AssetCache::new(),
            sounds: AssetCache::new(),
        }
    }
}

impl Default for Assets {
    fn default() -> Self {
        Self::new()
    }
}

/// An asset type the [`AssetServer`] can fetch, decode and cache.
pub trait AssetKind: Sized + Send + 'static {
    /// Decodes raw bytes. Runs on the rayon pool on native builds.
    fn decode(path: &str, bytes: Vec<u8>) -> Result<Self, AssetError>;

    fn cache(assets: &Assets) -> &AssetCache<Self>;

    fn cache_mut(assets: &mut Assets) -> &mut AssetCache<Self>;
}
