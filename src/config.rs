use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

use crate::error::AppError;

/// Name of the optional settings file, looked up in the working directory
/// with any extension the `config` crate understands (`kiosk.toml`, ...).
pub const SETTINGS_FILE: &str = "kiosk";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stream: StreamSettings,
    pub content: ContentSettings,
    pub camera: CameraSettings,
    pub debug: DebugSettings,
    pub display: DisplaySettings,
}

impl Settings {
    /// Loads `kiosk.*` from the working directory, falling back to defaults
    /// for every key the file does not set.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(SETTINGS_FILE)
    }

    pub fn load_from(name: &str) -> Result<Self, AppError> {
        let settings = Config::builder()
            .add_source(File::with_name(name).required(false))
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub endpoint: String,
    pub reconnect_delay_ms: u64,
    pub patch_buffer: usize,
}

impl StreamSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8000/ws".to_string(),
            reconnect_delay_ms: 2000,
            patch_buffer: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentSettings {
    /// Directory path or `http(s)://` origin holding one folder per tag.
    pub base: String,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            base: "data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub enabled: bool,
    pub preferred_label: String,
    pub fallback_index: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            preferred_label: "usb".to_string(),
            fallback_index: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    pub enabled: bool,
    /// Tag assigned when the operator steps through states by hand.
    pub tag: Option<String>,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tag: Some("tag one".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub fullscreen: bool,
    pub width: f32,
    pub height: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            fullscreen: true,
            width: 1920.0,
            height: 1080.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::load_from("does-not-exist/kiosk").unwrap();
        assert_eq!(settings.stream.endpoint, "ws://localhost:8000/ws");
        assert_eq!(settings.stream.reconnect_delay(), Duration::from_secs(2));
        assert_eq!(settings.content.base, "data");
        assert_eq!(settings.debug.tag.as_deref(), Some("tag one"));
    }

    #[test]
    fn file_overrides_only_the_keys_it_sets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiosk.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[stream]\nendpoint = \"ws://10.0.0.5:8000/ws\"").unwrap();
        writeln!(file, "[camera]\nenabled = false").unwrap();

        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.stream.endpoint, "ws://10.0.0.5:8000/ws");
        assert_eq!(settings.stream.reconnect_delay_ms, 2000);
        assert!(!settings.camera.enabled);
        assert_eq!(settings.camera.preferred_label, "usb");
    }
}
