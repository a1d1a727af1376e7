//! Engine settings persisted as TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wess_engine::{Engine, Spu, VolumeKind, DEFAULT_MUTE_RELEASE_MS};
use wess_ir::{PanMode, INTS_PER_SEC, MAX_MASTER_VOL};

use crate::error::MasterError;

/// Host-side engine settings.
///
/// ```
/// use wess_master::EngineConfig;
///
/// let cfg = EngineConfig::from_toml_str("music_volume = 90\npan_mode = \"off\"").unwrap();
/// assert_eq!(cfg.music_volume, 90);
/// assert_eq!(cfg.sfx_volume, 127);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub sfx_volume: u8,
    pub music_volume: u8,
    pub pan_mode: PanMode,
    pub mute_release_ms: u32,
    /// Timer thread rate. Tempo math always assumes 120 Hz, so other rates
    /// change playback speed.
    pub tick_hz: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sfx_volume: MAX_MASTER_VOL,
            music_volume: MAX_MASTER_VOL,
            pan_mode: PanMode::On,
            mute_release_ms: DEFAULT_MUTE_RELEASE_MS,
            tick_hz: INTS_PER_SEC as u32,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MasterError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let cfg = Self::from_toml_str(&text)?;
        log::debug!(target: "wess::config", "loaded {}", path.display());
        Ok(cfg)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, MasterError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String, MasterError> {
        Ok(toml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MasterError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), MasterError> {
        for (field, value) in [
            ("sfx_volume", self.sfx_volume as u32),
            ("music_volume", self.music_volume as u32),
        ] {
            if value > MAX_MASTER_VOL as u32 {
                return Err(MasterError::OutOfRange { field, value });
            }
        }
        if self.tick_hz == 0 {
            return Err(MasterError::OutOfRange {
                field: "tick_hz",
                value: 0,
            });
        }
        Ok(())
    }

    /// Push the volume, pan and mute settings into `engine`.
    pub fn apply<S: Spu>(&self, engine: &mut Engine<S>) {
        engine.set_master_volume(VolumeKind::Sfx, self.sfx_volume);
        engine.set_master_volume(VolumeKind::Music, self.music_volume);
        engine.set_pan_mode(self.pan_mode);
        engine.set_mute_release(self.mute_release_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wess_engine::SoftSpu;
    use wess_ir::Module;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn pan_mode_uses_snake_case() {
        let cfg = EngineConfig::from_toml_str("pan_mode = \"on_reversed\"").unwrap();
        assert_eq!(cfg.pan_mode, PanMode::OnReversed);
        assert!(cfg.to_toml_string().unwrap().contains("pan_mode = \"on_reversed\""));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("music_volume = 200"),
            Err(MasterError::OutOfRange { field: "music_volume", value: 200 })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("tick_hz = 0"),
            Err(MasterError::OutOfRange { field: "tick_hz", .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("volume = 3"),
            Err(MasterError::Parse(_))
        ));
    }

    #[test]
    fn save_and_load() {
        let path = std::env::temp_dir().join(format!("wess-config-{}.toml", std::process::id()));
        let cfg = EngineConfig {
            sfx_volume: 64,
            mute_release_ms: 50,
            ..EngineConfig::default()
        };
        cfg.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            EngineConfig::load("/nonexistent/wess.toml"),
            Err(MasterError::Io(_))
        ));
    }

    #[test]
    fn apply_sets_engine_state() {
        let mut engine = Engine::new(Module::default(), SoftSpu::new()).unwrap();
        let cfg = EngineConfig {
            sfx_volume: 10,
            music_volume: 20,
            pan_mode: PanMode::Off,
            ..EngineConfig::default()
        };
        cfg.apply(&mut engine);
        assert_eq!(engine.master_volume(VolumeKind::Sfx), 10);
        assert_eq!(engine.master_volume(VolumeKind::Music), 20);
        assert_eq!(engine.pan_mode(), PanMode::Off);
    }
}
