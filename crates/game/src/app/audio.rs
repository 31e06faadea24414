use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, PlayError, Sink, Source, StreamError};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::gameplay::{GameEvent, ItemKind};

const SOUND_EXTENSIONS: [&str; 3] = ["wav", "ogg", "mp3"];
pub(crate) const MENU_MUSIC_VOLUME: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SoundCue {
    Coin,
    Potion,
    Attack,
    PlayerDeath,
    EnemyDeath,
    StageComplete,
    DungeonMusic,
}

impl SoundCue {
    pub(crate) fn key(self) -> &'static str {
        match self {
            Self::Coin => "coin",
            Self::Potion => "potion",
            Self::Attack => "attack",
            Self::PlayerDeath => "player_death",
            Self::EnemyDeath => "enemy_death",
            Self::StageComplete => "stage_complete",
            Self::DungeonMusic => "music_dungeon",
        }
    }

    /// File stem under `assets/sounds`.
    pub(crate) fn file_stem(self) -> &'static str {
        match self {
            Self::Coin => "coin_sound_effect",
            Self::Potion => "potion_sound_effect",
            Self::Attack => "player_attack_sound_effect",
            Self::PlayerDeath => "player_dead_sound_effect",
            Self::EnemyDeath => "skeleton_dead_sound_effect",
            Self::StageComplete => "stage_completed_sound_effect",
            Self::DungeonMusic => "dungeon_theme_sound_effect",
        }
    }
}

/// One sound request: cue, optional volume and optional per-cue cooldown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CuePlayback {
    pub(crate) cue: SoundCue,
    pub(crate) volume: Option<f32>,
    pub(crate) cooldown_seconds: Option<f32>,
}

impl CuePlayback {
    const fn new(cue: SoundCue, volume: Option<f32>, cooldown_seconds: Option<f32>) -> Self {
        Self {
            cue,
            volume,
            cooldown_seconds,
        }
    }
}

/// Sound to play for a gameplay event, if any.
pub(crate) fn cue_for_event(event: &GameEvent) -> Option<CuePlayback> {
    let playback = match event {
        GameEvent::ItemCollected {
            kind: ItemKind::Coin,
        } => CuePlayback::new(SoundCue::Coin, Some(0.4), Some(0.05)),
        GameEvent::ItemCollected {
            kind: ItemKind::Potion,
        } => CuePlayback::new(SoundCue::Potion, Some(0.5), Some(0.1)),
        GameEvent::ItemCollected { kind: ItemKind::Key } => {
            CuePlayback::new(SoundCue::Potion, Some(0.3), Some(0.1))
        }
        GameEvent::DoorOpened { .. } => CuePlayback::new(SoundCue::Potion, Some(0.3), Some(0.05)),
        GameEvent::AttackStarted => CuePlayback::new(SoundCue::Attack, Some(0.5), None),
        GameEvent::EnemyDied { .. } => {
            CuePlayback::new(SoundCue::EnemyDeath, Some(0.5), Some(0.05))
        }
        GameEvent::PlayerDied => CuePlayback::new(SoundCue::PlayerDeath, None, None),
        GameEvent::StageComplete => CuePlayback::new(SoundCue::StageComplete, None, None),
        GameEvent::PlayerHit { .. } | GameEvent::LevelChanged { .. } | GameEvent::Victory => {
            return None
        }
    };
    Some(playback)
}

/// Sound output used by the shell. Gameplay never talks to it directly.
pub(crate) trait AudioService {
    fn init(&mut self);
    fn shutdown(&mut self);
    /// Returns whether the cue was played.
    fn play(&mut self, cue: SoundCue, volume: Option<f32>, cooldown_seconds: Option<f32>) -> bool;
    fn play_music(&mut self, cue: SoundCue, volume: f32);
    fn stop_music(&mut self);
    fn set_muted(&mut self, muted: bool);
    fn is_muted(&self) -> bool;

    fn toggle_mute(&mut self) -> bool {
        let muted = !self.is_muted();
        self.set_muted(muted);
        muted
    }

    fn play_event(&mut self, event: &GameEvent) {
        if let Some(playback) = cue_for_event(event) {
            self.play(playback.cue, playback.volume, playback.cooldown_seconds);
        }
    }
}

/// Silent service for tests and headless runs.
#[derive(Debug, Default)]
pub(crate) struct NoopAudio {
    muted: bool,
}

impl AudioService for NoopAudio {
    fn init(&mut self) {}

    fn shutdown(&mut self) {}

    fn play(&mut self, _cue: SoundCue, _volume: Option<f32>, _cooldown: Option<f32>) -> bool {
        false
    }

    fn play_music(&mut self, _cue: SoundCue, _volume: f32) {}

    fn stop_music(&mut self) {}

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

#[derive(Debug, Error)]
pub(crate) enum AudioError {
    #[error("failed to open audio output: {0}")]
    Stream(#[from] StreamError),
    #[error("failed to start playback: {0}")]
    Play(#[from] PlayError),
    #[error("failed to open sound '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode sound '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecoderError,
    },
}

/// Sound files under one directory keyed by file stem, plus the mute flag
/// and per-cue cooldown bookkeeping.
#[derive(Debug)]
struct SoundLibrary {
    sounds_dir: PathBuf,
    sounds: HashMap<String, PathBuf>,
    last_played: HashMap<SoundCue, Instant>,
    muted: bool,
}

impl SoundLibrary {
    fn new(sounds_dir: PathBuf, muted: bool) -> Self {
        Self {
            sounds_dir,
            sounds: HashMap::new(),
            last_played: HashMap::new(),
            muted,
        }
    }

    fn index(&mut self) {
        self.sounds.clear();
        let entries = match fs::read_dir(&self.sounds_dir) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(path = %self.sounds_dir.display(), error = %error, "sound_dir_unreadable");
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !is_supported_sound(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                self.sounds.insert(stem.to_string(), path.clone());
            }
        }
    }

    fn resolve(&self, cue: SoundCue) -> Option<&Path> {
        self.sounds
            .get(cue.file_stem())
            .or_else(|| self.sounds.get(cue.key()))
            .map(PathBuf::as_path)
    }

    /// Path to play for `cue` at `now`, or `None` when muted, missing or
    /// still cooling down. A returned path starts the cooldown.
    fn admit(
        &mut self,
        cue: SoundCue,
        cooldown_seconds: Option<f32>,
        now: Instant,
    ) -> Option<PathBuf> {
        if self.muted {
            return None;
        }
        let Some(path) = self.resolve(cue).map(Path::to_path_buf) else {
            debug!(cue = cue.key(), "sound_missing");
            return None;
        };
        if let Some(cooldown) = cooldown_seconds {
            let throttle = Duration::from_secs_f32(cooldown.max(0.0));
            if let Some(last) = self.last_played.get(&cue) {
                if now.saturating_duration_since(*last) < throttle {
                    return None;
                }
            }
            self.last_played.insert(cue, now);
        }
        Some(path)
    }
}

fn is_supported_sound(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SOUND_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, AudioError> {
    let file = File::open(path).map_err(|source| AudioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|source| AudioError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Open output device. The stream must outlive every sink built on it.
struct AudioOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    music: Option<Sink>,
}

impl AudioOutput {
    fn open() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            music: None,
        })
    }

    fn play_effect(&self, path: &Path, volume: f32) -> Result<(), AudioError> {
        let source = decode(path)?.convert_samples::<f32>().amplify(volume);
        self.handle.play_raw(source)?;
        Ok(())
    }

    fn start_music(&mut self, path: &Path, volume: f32) -> Result<(), AudioError> {
        let source = decode(path)?.repeat_infinite();
        let sink = Sink::try_new(&self.handle)?;
        sink.set_volume(volume);
        sink.append(source);
        self.music = Some(sink);
        Ok(())
    }

    fn set_music_volume(&self, volume: f32) {
        if let Some(sink) = &self.music {
            sink.set_volume(volume);
        }
    }

    fn stop_music(&mut self) {
        if let Some(sink) = self.music.take() {
            sink.stop();
        }
    }
}

/// Plays cues from `assets/sounds` on the default output device through
/// `rodio`. Without a device it keeps the same bookkeeping and stays silent.
pub(crate) struct DeviceAudio {
    library: SoundLibrary,
    output: Option<AudioOutput>,
    open_device: bool,
    current_music: Option<SoundCue>,
    music_volume: f32,
}

impl DeviceAudio {
    pub(crate) fn new(sounds_dir: PathBuf, muted: bool) -> Self {
        Self {
            library: SoundLibrary::new(sounds_dir, muted),
            output: None,
            open_device: true,
            current_music: None,
            music_volume: MENU_MUSIC_VOLUME,
        }
    }

    #[cfg(test)]
    fn headless(sounds_dir: PathBuf, muted: bool) -> Self {
        Self {
            open_device: false,
            ..Self::new(sounds_dir, muted)
        }
    }

    #[cfg(test)]
    pub(crate) fn sound_count(&self) -> usize {
        self.library.sounds.len()
    }

    #[cfg(test)]
    pub(crate) fn current_music(&self) -> Option<SoundCue> {
        self.current_music
    }

    fn play_at(
        &mut self,
        cue: SoundCue,
        volume: Option<f32>,
        cooldown_seconds: Option<f32>,
        now: Instant,
    ) -> bool {
        let Some(path) = self.library.admit(cue, cooldown_seconds, now) else {
            return false;
        };
        let volume = volume.map_or(1.0, |volume| volume.clamp(0.0, 1.0));
        if let Some(output) = &self.output {
            if let Err(error) = output.play_effect(&path, volume) {
                warn!(cue = cue.key(), error = %error, "sound_play_failed");
                return false;
            }
        }
        debug!(cue = cue.key(), path = %path.display(), volume, "sound_played");
        true
    }
}

impl AudioService for DeviceAudio {
    fn init(&mut self) {
        self.library.index();
        if self.open_device && self.output.is_none() {
            match AudioOutput::open() {
                Ok(output) => self.output = Some(output),
                Err(error) => warn!(error = %error, "audio_output_unavailable"),
            }
        }
        info!(
            path = %self.library.sounds_dir.display(),
            sounds = self.library.sounds.len(),
            device = self.output.is_some(),
            muted = self.library.muted,
            "audio_initialized"
        );
    }

    fn shutdown(&mut self) {
        self.stop_music();
        self.output = None;
        self.library.sounds.clear();
        self.library.last_played.clear();
        info!("audio_shutdown");
    }

    fn play(&mut self, cue: SoundCue, volume: Option<f32>, cooldown_seconds: Option<f32>) -> bool {
        self.play_at(cue, volume, cooldown_seconds, Instant::now())
    }

    fn play_music(&mut self, cue: SoundCue, volume: f32) {
        if self.current_music == Some(cue) {
            return;
        }
        let Some(path) = self.library.resolve(cue).map(Path::to_path_buf) else {
            debug!(cue = cue.key(), "music_missing");
            return;
        };
        self.stop_music();
        self.music_volume = volume.clamp(0.0, 1.0);
        let audible = if self.library.muted {
            0.0
        } else {
            self.music_volume
        };
        if let Some(output) = self.output.as_mut() {
            if let Err(error) = output.start_music(&path, audible) {
                warn!(cue = cue.key(), error = %error, "music_play_failed");
                return;
            }
        }
        self.current_music = Some(cue);
        info!(cue = cue.key(), volume, muted = self.library.muted, "music_started");
    }

    fn stop_music(&mut self) {
        if let Some(output) = self.output.as_mut() {
            output.stop_music();
        }
        if let Some(cue) = self.current_music.take() {
            info!(cue = cue.key(), "music_stopped");
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.library.muted = muted;
        if let Some(output) = &self.output {
            output.set_music_volume(if muted { 0.0 } else { self.music_volume });
        }
        info!(muted, "audio_mute_changed");
    }

    fn is_muted(&self) -> bool {
        self.library.muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_with_sounds(files: &[&str]) -> (tempfile::TempDir, DeviceAudio) {
        let dir = tempfile::tempdir().expect("tempdir");
        for file in files {
            fs::write(dir.path().join(file), b"RIFF").expect("write sound");
        }
        let mut audio = DeviceAudio::headless(dir.path().to_path_buf(), false);
        audio.init();
        (dir, audio)
    }

    #[test]
    fn init_indexes_supported_files_only() {
        let (_dir, audio) = audio_with_sounds(&[
            "coin_sound_effect.wav",
            "dungeon_theme_sound_effect.OGG",
            "notes.txt",
        ]);
        assert_eq!(audio.sound_count(), 2);
    }

    #[test]
    fn cooldown_throttles_repeats() {
        let (_dir, mut audio) = audio_with_sounds(&["coin_sound_effect.wav"]);
        let start = Instant::now();
        assert!(audio.play_at(SoundCue::Coin, Some(0.4), Some(0.05), start));
        assert!(!audio.play_at(
            SoundCue::Coin,
            Some(0.4),
            Some(0.05),
            start + Duration::from_millis(10)
        ));
        assert!(audio.play_at(
            SoundCue::Coin,
            Some(0.4),
            Some(0.05),
            start + Duration::from_millis(80)
        ));
        assert!(audio.play_at(SoundCue::Coin, None, None, start));
    }

    #[test]
    fn mute_and_missing_sounds_play_nothing() {
        let (_dir, mut audio) = audio_with_sounds(&["coin_sound_effect.wav"]);
        assert!(!audio.play(SoundCue::Attack, Some(0.5), None));
        assert!(audio.toggle_mute());
        assert!(!audio.play(SoundCue::Coin, None, None));
    }

    #[test]
    fn music_tracks_current_cue() {
        let (_dir, mut audio) = audio_with_sounds(&["dungeon_theme_sound_effect.mp3"]);
        audio.play_music(SoundCue::DungeonMusic, MENU_MUSIC_VOLUME);
        assert_eq!(audio.current_music(), Some(SoundCue::DungeonMusic));
        audio.stop_music();
        assert_eq!(audio.current_music(), None);
    }

    #[test]
    fn keys_and_doors_reuse_the_potion_sound() {
        let key = cue_for_event(&GameEvent::ItemCollected { kind: ItemKind::Key })
            .expect("key cue");
        assert_eq!(key.cue, SoundCue::Potion);
        assert_eq!(key.volume, Some(0.3));
        assert_eq!(cue_for_event(&GameEvent::PlayerHit { damage: 5 }), None);
        let death = cue_for_event(&GameEvent::PlayerDied).expect("death cue");
        assert_eq!(death.volume, None);
    }

    #[test]
    fn switching_music_replaces_the_track_and_survives_mute() {
        let (_dir, mut audio) = audio_with_sounds(&["dungeon_theme_sound_effect.wav"]);
        audio.set_muted(true);
        audio.play_music(SoundCue::DungeonMusic, 0.8);
        assert_eq!(audio.current_music(), Some(SoundCue::DungeonMusic));
        audio.set_muted(false);
        assert_eq!(audio.current_music(), Some(SoundCue::DungeonMusic));
        audio.shutdown();
        assert_eq!(audio.current_music(), None);
        assert_eq!(audio.sound_count(), 0);
    }

    #[test]
    fn sound_extensions_match_any_case() {
        assert!(is_supported_sound(Path::new("a/coin.WAV")));
        assert!(is_supported_sound(Path::new("theme.ogg")));
        assert!(!is_supported_sound(Path::new("readme")));
    }
}
