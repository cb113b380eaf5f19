use anyhow::Result;
use serde::Deserialize;

use crate::playback::SourceKind;
use crate::speech::ProviderKind;

/// Prefix for environment overrides, e.g. `DOT_PRACTICE__SYNTHESIS__API_KEY`
pub const ENV_PREFIX: &str = "DOT_PRACTICE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub synthesis: SynthesisConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "dot-practice".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3003,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory holding `officer/{id}.mp3` and `driver/{id}.mp3`
    pub clips_path: String,
    /// Origin the static clips are fetched from during playback
    pub base_url: String,
    /// Optional JSON catalog replacing the built-in question set
    pub catalog_path: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            clips_path: "public/audio".to_string(),
            base_url: "http://127.0.0.1:3003".to_string(),
            catalog_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub provider: ProviderKind,
    /// ElevenLabs API root
    pub base_url: String,
    pub api_key: Option<String>,
    pub voice_id: Option<String>,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
    /// Backend relay root (serves `/api/tts/generate`)
    pub relay_url: String,
    pub lang: String,
    pub slow: bool,
    pub request_timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::ElevenLabs,
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            api_key: None,
            voice_id: None,
            model_id: "eleven_monolingual_v1".to_string(),
            stability: 0.7,
            similarity_boost: 0.8,
            style: 0.2,
            use_speaker_boost: true,
            relay_url: "http://localhost:3003".to_string(),
            lang: "en".to_string(),
            slow: true,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub source: SourceKind,
    pub synthesis_timeout_secs: u64,
    pub static_timeout_secs: u64,
    pub inter_segment_delay_ms: u64,
    pub ready_fallback_ms: u64,
    pub load_timeout_ms: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Static,
            synthesis_timeout_secs: 20,
            static_timeout_secs: 15,
            inter_segment_delay_ms: 800,
            ready_fallback_ms: 500,
            load_timeout_ms: None,
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus environment overrides
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`Config::load`], reading overrides from `env` instead of the
    /// process environment when given
    fn load_with_env(path: &str, env: Option<config::Map<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_practice_service() {
        let cfg = Config::default();

        assert_eq!(cfg.synthesis.model_id, "eleven_monolingual_v1");
        assert_eq!(cfg.synthesis.stability, 0.7);
        assert_eq!(cfg.synthesis.similarity_boost, 0.8);
        assert_eq!(cfg.playback.synthesis_timeout_secs, 20);
        assert_eq!(cfg.playback.static_timeout_secs, 15);
        assert_eq!(cfg.playback.inter_segment_delay_ms, 800);
        assert_eq!(cfg.playback.source, SourceKind::Static);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let mut file = std::fs::File::create(dir.path().join("dot-practice.toml"))?;
        writeln!(
            file,
            r#"
[service.http]
port = 8088

[playback]
source = "synthesis"
inter_segment_delay_ms = 250
"#
        )?;

        let base = dir.path().join("dot-practice");
        let cfg = Config::load(base.to_str().unwrap())?;

        assert_eq!(cfg.service.http.port, 8088);
        assert_eq!(cfg.service.http.bind, "127.0.0.1");
        assert_eq!(cfg.playback.source, SourceKind::Synthesis);
        assert_eq!(cfg.playback.inter_segment_delay_ms, 250);
        assert_eq!(cfg.playback.static_timeout_secs, 15);

        Ok(())
    }

    #[test]
    fn test_environment_overrides_file() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        std::fs::write(
            dir.path().join("dot-practice.toml"),
            "[service.http]\nport = 8088\n",
        )?;

        let env: config::Map<String, String> = [
            ("DOT_PRACTICE__SYNTHESIS__API_KEY", "env-key"),
            ("DOT_PRACTICE__SERVICE__HTTP__PORT", "9099"),
            ("DOT_PRACTICE__PLAYBACK__SOURCE", "synthesis"),
            ("DOT_PRACTICE__PLAYBACK__LOAD_TIMEOUT_MS", "2500"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let base = dir.path().join("dot-practice");
        let cfg = Config::load_with_env(base.to_str().unwrap(), Some(env))?;

        assert_eq!(cfg.synthesis.api_key.as_deref(), Some("env-key"));
        assert_eq!(cfg.service.http.port, 9099);
        assert_eq!(cfg.playback.source, SourceKind::Synthesis);
        assert_eq!(cfg.playback.load_timeout_ms, Some(2500));
        assert_eq!(cfg.playback.static_timeout_secs, 15);

        Ok(())
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let cfg = Config::load("/nonexistent/dot-practice")?;
        assert_eq!(cfg.service.name, "dot-practice");
        Ok(())
    }
}
