use log::warn;

use crate::error::AudioError;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Generate,
    Correct,
    Click,
}

impl SoundCue {
    pub const ALL: [SoundCue; 3] = [SoundCue::Generate, SoundCue::Correct, SoundCue::Click];

    pub fn name(&self) -> &'static str {
        match self {
            SoundCue::Generate => "generate",
            SoundCue::Correct => "correct",
            SoundCue::Click => "click",
        }
    }
}

pub trait AudioBackend {
    fn play(&mut self, cue: SoundCue) -> Result<(), AudioError>;
}

/// Silent backend for machines without audio output.
#[derive(Debug, Default)]
pub struct NoopBackend;

impl AudioBackend for NoopBackend {
    fn play(&mut self, _cue: SoundCue) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Best-effort feedback sounds behind a persisted on/off flag.
pub struct SoundManager<S> {
    store: S,
    storage_key: String,
    enabled: bool,
    backend: Box<dyn AudioBackend>,
}

impl<S: KeyValueStore> SoundManager<S> {
    pub fn new(store: S, storage_key: impl Into<String>, backend: Box<dyn AudioBackend>) -> Self {
        let storage_key = storage_key.into();
        let enabled = match store.get(&storage_key) {
            Ok(Some(raw)) => serde_json::from_str::<bool>(&raw).unwrap_or_else(|e| {
                warn!("{storage_key}: unreadable sound preference: {e}");
                true
            }),
            Ok(None) => true,
            Err(e) => {
                warn!("{storage_key}: failed to load sound preference: {e}");
                true
            }
        };
        Self {
            store,
            storage_key,
            enabled,
            backend,
        }
    }

    /// Fire-and-forget. Failures are logged and swallowed.
    pub fn play_sound(&mut self, cue: SoundCue) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.backend.play(cue) {
            warn!("sound '{}' failed: {e}", cue.name());
        }
    }

    pub fn is_sound_enabled(&self) -> bool {
        self.enabled
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.set_sound_enabled(!self.enabled);
        self.enabled
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        let raw = if enabled { "true" } else { "false" };
        if let Err(e) = self.store.set(&self.storage_key, raw) {
            warn!("{}: failed to save sound preference: {e}", self.storage_key);
        }
    }
}
