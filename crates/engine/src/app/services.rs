use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub u16);

/// Sound and music playback.
pub trait AudioService {
    fn play_sound(&mut self, id: SoundId);
    fn stop_sound(&mut self, id: SoundId);
    fn play_music(&mut self, name: &str);
    fn stop_music(&mut self);
}

/// Audio service that only logs requests.
#[derive(Debug, Default)]
pub struct LoggingAudio {
    current_music: Option<String>,
}

impl LoggingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_music(&self) -> Option<&str> {
        self.current_music.as_deref()
    }
}

impl AudioService for LoggingAudio {
    fn play_sound(&mut self, id: SoundId) {
        debug!(sound_id = id.0, "play_sound");
    }

    fn stop_sound(&mut self, id: SoundId) {
        debug!(sound_id = id.0, "stop_sound");
    }

    fn play_music(&mut self, name: &str) {
        if self.current_music.as_deref() == Some(name) {
            return;
        }
        debug!(music = name, "play_music");
        self.current_music = Some(name.to_string());
    }

    fn stop_music(&mut self) {
        if let Some(name) = self.current_music.take() {
            debug!(music = %name, "stop_music");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioRequest {
    PlaySound(SoundId),
    StopSound(SoundId),
    PlayMusic(String),
    StopMusic,
}

/// Shared view of the requests a [`RecordingAudio`] received.
#[derive(Debug, Clone, Default)]
pub struct AudioLog(Rc<RefCell<Vec<AudioRequest>>>);

impl AudioLog {
    pub fn requests(&self) -> Vec<AudioRequest> {
        self.0.borrow().clone()
    }

    pub fn played_sounds(&self) -> Vec<SoundId> {
        self.0
            .borrow()
            .iter()
            .filter_map(|request| match request {
                AudioRequest::PlaySound(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    fn push(&self, request: AudioRequest) {
        self.0.borrow_mut().push(request);
    }
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    log: AudioLog,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> AudioLog {
        self.log.clone()
    }
}

impl AudioService for RecordingAudio {
    fn play_sound(&mut self, id: SoundId) {
        self.log.push(AudioRequest::PlaySound(id));
    }

    fn stop_sound(&mut self, id: SoundId) {
        self.log.push(AudioRequest::StopSound(id));
    }

    fn play_music(&mut self, name: &str) {
        self.log.push(AudioRequest::PlayMusic(name.to_string()));
    }

    fn stop_music(&mut self) {
        self.log.push(AudioRequest::StopMusic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_audio_tracks_current_music() {
        let mut audio = LoggingAudio::new();
        audio.play_music("level_theme");
        audio.play_music("level_theme");
        assert_eq!(audio.current_music(), Some("level_theme"));
        audio.stop_music();
        assert_eq!(audio.current_music(), None);
    }

    #[test]
    fn recording_audio_keeps_request_order() {
        let mut audio = RecordingAudio::new();
        let log = audio.log();
        audio.play_sound(SoundId(3));
        audio.play_music("boss");
        audio.stop_sound(SoundId(3));

        assert_eq!(
            log.requests(),
            vec![
                AudioRequest::PlaySound(SoundId(3)),
                AudioRequest::PlayMusic("boss".to_string()),
                AudioRequest::StopSound(SoundId(3)),
            ]
        );
        assert_eq!(log.played_sounds(), vec![SoundId(3)]);
    }
}
