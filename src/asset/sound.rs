use super::{AssetCache, AssetError, AssetKind, Assets};

/// Encoded audio bytes. Decoding is left to the playback backend.
#[derive(Debug, Clone)]
pub struct SoundClip {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl AssetKind for SoundClip {
    fn decode(path: &str, bytes: Vec<u8>) -> Result<Self, AssetError> {
        Ok(Self {
            path: path.to_string(),
            bytes,
        })
    }

    fn cache(assets: &Assets) -> &AssetCache<Self> {
        &assets.sounds
    }

    fn cache_mut(assets: &mut Assets) -> &mut AssetCache<Self> {
        &mut assets.sounds
    }
}
