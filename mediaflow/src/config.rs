//! Configuration for the pipeline, its placeholder executors and the server.

use crate::errors::MediaflowError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = MediaflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(MediaflowError::Config(format!("unknown log format '{other}'"))),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaflowConfig {
    /// Root directory of the artifact store.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Timeout applied around every executor call, in seconds.
    #[serde(default = "default_executor_timeout")]
    pub executor_timeout_seconds: f64,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Image generation settings.
    #[serde(default)]
    pub image: ImageConfig,
    /// Video generation settings.
    #[serde(default)]
    pub video: VideoConfig,
    /// Audio generation settings.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Output directories, relative to the project root.
    #[serde(default)]
    pub output_dirs: OutputDirs,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_executor_timeout() -> f64 {
    300.0
}

impl Default for MediaflowConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            bind_addr: default_bind_addr(),
            executor_timeout_seconds: default_executor_timeout(),
            log_format: LogFormat::default(),
            image: ImageConfig::default(),
            video: VideoConfig::default(),
            audio: AudioConfig::default(),
            output_dirs: OutputDirs::default(),
        }
    }
}

impl MediaflowConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project root.
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Sets the executor timeout.
    #[must_use]
    pub fn with_executor_timeout(mut self, seconds: f64) -> Self {
        self.executor_timeout_seconds = seconds;
        self
    }

    /// Gets the executor timeout as a Duration.
    #[must_use]
    pub fn executor_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.executor_timeout_seconds)
    }

    /// Loads configuration from an optional JSON file, then applies
    /// `MEDIAFLOW_*` environment overrides, then validates.
    pub fn load(path: Option<&Path>) -> Result<Self, MediaflowError> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|e| {
                    MediaflowError::Config(format!("cannot read {}: {e}", p.display()))
                })?;
                serde_json::from_str(&raw)
                    .map_err(|e| MediaflowError::Config(format!("invalid {}: {e}", p.display())))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a key lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), MediaflowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("MEDIAFLOW_PROJECT_ROOT") {
            self.project_root = PathBuf::from(root);
        }
        if let Some(addr) = lookup("MEDIAFLOW_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(timeout) = lookup("MEDIAFLOW_EXECUTOR_TIMEOUT") {
            self.executor_timeout_seconds = timeout.trim().parse().map_err(|_| {
                MediaflowError::Config(format!(
                    "MEDIAFLOW_EXECUTOR_TIMEOUT is not a number: '{timeout}'"
                ))
            })?;
        }
        if let Some(format) = lookup("MEDIAFLOW_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }
        Ok(())
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), MediaflowError> {
        if self.bind_addr.trim().is_empty() {
            return Err(MediaflowError::Config("bind_addr must not be empty".to_string()));
        }
        if !self.executor_timeout_seconds.is_finite() || self.executor_timeout_seconds <= 0.0 {
            return Err(MediaflowError::Config(
                "executor_timeout_seconds must be positive".to_string(),
            ));
        }
        if self.image.width == 0 || self.image.height == 0 {
            return Err(MediaflowError::Config("image dimensions must be non-zero".to_string()));
        }
        if self.video.fps == 0 {
            return Err(MediaflowError::Config("video fps must be non-zero".to_string()));
        }
        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(MediaflowError::Config(
                "audio sample_rate and channels must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for the image stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Output width in pixels.
    #[serde(default = "default_image_side")]
    pub width: u32,
    /// Output height in pixels.
    #[serde(default = "default_image_side")]
    pub height: u32,
    /// Number of denoising steps reported to callers.
    #[serde(default = "default_num_steps")]
    pub num_steps: u32,
    /// Prompt guidance scale reported to callers.
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f64,
    /// Fill color of the placeholder image.
    #[serde(default = "default_placeholder_color")]
    pub placeholder_color: [u8; 3],
}

fn default_image_side() -> u32 {
    512
}

fn default_num_steps() -> u32 {
    20
}

fn default_guidance_scale() -> f64 {
    7.5
}

fn default_placeholder_color() -> [u8; 3] {
    [0, 0, 255]
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: default_image_side(),
            height: default_image_side(),
            num_steps: default_num_steps(),
            guidance_scale: default_guidance_scale(),
            placeholder_color: default_placeholder_color(),
        }
    }
}

impl ImageConfig {
    /// Returns the resolution as `WIDTHxHEIGHT`.
    #[must_use]
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Settings for the video stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Frames generated by a real motion model.
    #[serde(default = "default_num_frames")]
    pub num_frames: u32,
    /// Output frames per second.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Container extension of video artifacts.
    #[serde(default = "default_video_extension")]
    pub extension: String,
}

fn default_num_frames() -> u32 {
    16
}

fn default_fps() -> u32 {
    8
}

fn default_video_extension() -> String {
    "mp4".to_string()
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            num_frames: default_num_frames(),
            fps: default_fps(),
            extension: default_video_extension(),
        }
    }
}

/// Settings for the speech, music and sfx stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate of generated WAV files.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Channel count of generated WAV files.
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Estimated speaking time per word, in seconds.
    #[serde(default = "default_seconds_per_word")]
    pub speech_seconds_per_word: f64,
    /// Music duration when the request gives none.
    #[serde(default = "default_music_duration")]
    pub default_music_seconds: f64,
    /// Sound effect duration when the request gives none.
    #[serde(default = "default_sfx_duration")]
    pub default_sfx_seconds: f64,
    /// Upper bound for any requested duration.
    #[serde(default = "default_max_duration")]
    pub max_duration_seconds: f64,
}

fn default_sample_rate() -> u32 {
    22_050
}

fn default_channels() -> u16 {
    1
}

fn default_seconds_per_word() -> f64 {
    0.4
}

fn default_music_duration() -> f64 {
    30.0
}

fn default_sfx_duration() -> f64 {
    2.0
}

fn default_max_duration() -> f64 {
    600.0
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            speech_seconds_per_word: default_seconds_per_word(),
            default_music_seconds: default_music_duration(),
            default_sfx_seconds: default_sfx_duration(),
            max_duration_seconds: default_max_duration(),
        }
    }
}

/// Where each stage writes its artifacts, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputDirs {
    /// Image artifacts.
    pub images: String,
    /// Video artifacts.
    pub videos: String,
    /// Speech tracks.
    pub speech: String,
    /// Music tracks.
    pub music: String,
    /// Sound effects.
    pub sfx: String,
    /// Lip-synced videos.
    pub lipsync: String,
    /// Final assembled videos.
    pub final_videos: String,
}

impl Default for OutputDirs {
    fn default() -> Self {
        Self {
            images: "data/generated_images".to_string(),
            videos: "data/generated_videos".to_string(),
            speech: "data/generated_audio/speech".to_string(),
            music: "data/generated_audio/music".to_string(),
            sfx: "data/generated_audio/sfx".to_string(),
            lipsync: "data/lipsync_videos".to_string(),
            final_videos: "data/final_videos".to_string(),
        }
    }
}
