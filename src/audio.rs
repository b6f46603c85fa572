// audio.rs - fire-and-forget sound cues on top of polled asset loads

use crate::asset::{AssetServer, LoadStatus, LoadTicket, SoundClip};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    pub volume: f32,
    pub looping: bool,
}

impl PlaybackSettings {
    pub const ONCE: Self = Self {
        volume: 1.0,
        looping: false,
    };

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self::ONCE
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to start playback of {path}: {message}")]
    Playback { path: String, message: String },
}

/// Playback backend. Decoding and mixing happen behind this trait.
pub trait AudioSink {
    fn play(&mut self, clip: &SoundClip, settings: PlaybackSettings) -> Result<(), AudioError>;
}

/// Headless sink: records the cue in the log.
#[derive(Debug, Default)]
pub struct LogAudioSink;

impl AudioSink for LogAudioSink {
    fn play(&mut self, clip: &SoundClip, settings: PlaybackSettings) -> Result<(), AudioError> {
        log::info!(
            "Playing {} ({} bytes, volume {:.2}{})",
            clip.path,
            clip.bytes.len(),
            settings.volume,
            if settings.looping { ", looping" } else { "" }
        );
        Ok(())
    }
}

/// Plays clips through `<audio>` elements served from `root`.
#[cfg(target_arch = "wasm32")]
pub struct WebAudioSink {
    root: String,
}

#[cfg(target_arch = "wasm32")]
impl WebAudioSink {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(target_arch = "wasm32")]
impl AudioSink for WebAudioSink {
    fn play(&mut self, clip: &SoundClip, settings: PlaybackSettings) -> Result<(), AudioError> {
        let playback_error = |err: wasm_bindgen::JsValue| AudioError::Playback {
            path: clip.path.clone(),
            message: format!("{err:?}"),
        };

        let url = format!("{}/{}", self.root.trim_end_matches('/'), clip.path);
        let element = web_sys::HtmlAudioElement::new_with_src(&url).map_err(playback_error)?;
        element.set_volume(f64::from(settings.volume));
        element.set_loop(settings.looping);
        // The returned promise only reports autoplay rejection; nothing awaits it.
        let _ = element.play().map_err(playback_error)?;
        Ok(())
    }
}

/// Requests sound clips and plays each one as soon as its load resolves.
///
/// There is no handle back to the caller: a cue that fails to load or play
/// is logged and dropped.
pub struct AudioPlayer {
    sink: Box<dyn AudioSink>,
    pending: Vec<(LoadTicket<SoundClip>, PlaybackSettings)>,
    played: u64,
}

impl AudioPlayer {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            pending: Vec::new(),
            played: 0,
        }
    }

    pub fn play_once(
        &mut self,
        assets: &mut AssetServer,
        path: impl Into<String>,
        settings: PlaybackSettings,
    ) {
        let path = path.into();
        log::debug!("Queued sound cue {}", path);
        self.pending.push((assets.load::<SoundClip>(path), settings));
    }

    /// Starts every cue whose clip finished loading since the last call.
    pub fn pump(&mut self, assets: &mut AssetServer) {
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for (ticket, settings) in self.pending.drain(..) {
            match assets.poll(&ticket) {
                LoadStatus::Pending { .. } => still_pending.push((ticket, settings)),
                LoadStatus::Ready(handle) => match assets.get(handle) {
                    Some(clip) => match self.sink.play(clip, settings) {
                        Ok(()) => self.played += 1,
                        Err(err) => log::warn!("{}", err),
                    },
                    None => log::warn!("Sound handle {} has no clip", handle.index()),
                },
                LoadStatus::Failed(err) => log::warn!("Sound cue dropped: {}", err),
            }
        }

        self.pending = still_pending;
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn played(&self) -> u64 {
        self.played
    }
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new(Box::new(LogAudioSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemorySource;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<(String, PlaybackSettings)>>>);

    impl AudioSink for RecordingSink {
        fn play(&mut self, clip: &SoundClip, settings: PlaybackSettings) -> Result<(), AudioError> {
            self.0.lock().unwrap().push((clip.path.clone(), settings));
            Ok(())
        }
    }

    #[test]
    fn cue_plays_once_after_load() {
        let mut assets =
            AssetServer::new(Arc::new(MemorySource::new().with_file("smich.mp3", vec![7; 16])));
        let sink = RecordingSink::default();
        let mut player = AudioPlayer::new(Box::new(sink.clone()));

        player.play_once(&mut assets, "smich.mp3", PlaybackSettings::ONCE);
        assert!(assets.finish_pending(Duration::from_secs(5)));
        player.pump(&mut assets);
        player.pump(&mut assets);

        let played = sink.0.lock().unwrap();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0].0, "smich.mp3");
        assert_eq!(played[0].1, PlaybackSettings::ONCE);
        assert_eq!(player.pending(), 0);
        assert_eq!(player.played(), 1);
    }

    #[test]
    fn missing_clip_is_dropped() {
        let mut assets = AssetServer::new(Arc::new(MemorySource::new()));
        let sink = RecordingSink::default();
        let mut player = AudioPlayer::new(Box::new(sink.clone()));

        player.play_once(&mut assets, "missing.mp3", PlaybackSettings::default());
        assert!(assets.finish_pending(Duration::from_secs(5)));
        player.pump(&mut assets);

        assert!(sink.0.lock().unwrap().is_empty());
        assert_eq!(player.pending(), 0);
        assert_eq!(player.played(), 0);
    }
}
