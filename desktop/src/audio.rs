use std::path::PathBuf;

use drill_core::{AudioBackend, NoopBackend};
use log::info;

/// Owns the output device for the lifetime of the app and hands out one
/// backend per sound manager.
pub struct AudioOutput {
    #[cfg_attr(not(feature = "audio"), allow(dead_code))]
    sound_dir: Option<PathBuf>,
    #[cfg(feature = "audio")]
    device: Option<(rodio::OutputStream, rodio::OutputStreamHandle)>,
}

impl AudioOutput {
    pub fn open(sound_dir: Option<PathBuf>) -> Self {
        #[cfg(feature = "audio")]
        let device = match rodio::OutputStream::try_default() {
            Ok(pair) => Some(pair),
            Err(e) => {
                log::warn!("no audio output device, sounds disabled: {e}");
                None
            }
        };
        #[cfg(not(feature = "audio"))]
        info!("built without the audio feature, sounds are silent");

        Self {
            sound_dir,
            #[cfg(feature = "audio")]
            device,
        }
    }

    pub fn backend(&self) -> Box<dyn AudioBackend> {
        #[cfg(feature = "audio")]
        {
            if let (Some((_, handle)), Some(dir)) = (&self.device, &self.sound_dir) {
                info!("loading sounds from {}", dir.display());
                return Box::new(rodio_backend::RodioBackend::new(handle.clone(), dir.clone()));
            }
        }
        Box::new(NoopBackend)
    }
}

#[cfg(feature = "audio")]
mod rodio_backend {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::PathBuf;

    use drill_core::{AudioBackend, AudioError, SoundCue};
    use rodio::{Decoder, OutputStreamHandle, Source};

    const VOLUME: f32 = 0.5;
    const EXTENSIONS: [&str; 3] = ["wav", "mp3", "ogg"];

    pub struct RodioBackend {
        handle: OutputStreamHandle,
        sound_dir: PathBuf,
    }

    impl RodioBackend {
        pub fn new(handle: OutputStreamHandle, sound_dir: PathBuf) -> Self {
            Self { handle, sound_dir }
        }

        fn asset_path(&self, cue: SoundCue) -> Option<PathBuf> {
            EXTENSIONS
                .iter()
                .map(|ext| self.sound_dir.join(format!("{}.{ext}", cue.name())))
                .find(|path| path.exists())
        }
    }

    impl AudioBackend for RodioBackend {
        fn play(&mut self, cue: SoundCue) -> Result<(), AudioError> {
            let path = self
                .asset_path(cue)
                .ok_or(AudioError::MissingAsset(cue.name()))?;
            let file = File::open(path)?;
            let source = Decoder::new(BufReader::new(file))
                .map_err(|e| AudioError::Playback(e.to_string()))?;
            self.handle
                .play_raw(source.amplify(VOLUME).convert_samples::<f32>())
                .map_err(|e| AudioError::Playback(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::SoundCue;

    #[test]
    fn test_backend_without_sound_dir_is_silent() {
        let output = AudioOutput::open(None);
        let mut backend = output.backend();
        assert!(backend.play(SoundCue::Click).is_ok());
    }
}
