use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ViewMode {
    #[default]
    Calendar,    // Weekly grid
    List,        // One card per scheduled course
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_year")]
    pub year: u16,
    #[serde(default = "default_term")]
    pub term: u8,
    #[serde(default = "default_campus")]
    pub campus: String,
    #[serde(default = "default_registration_url")]
    pub registration_url: String,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default = "default_preview_debounce_ms")]
    pub preview_debounce_ms: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_year() -> u16 {
    2025
}

fn default_term() -> u8 {
    1  // spring
}

fn default_campus() -> String {
    "NB".to_string()
}

fn default_registration_url() -> String {
    "https://sims.rutgers.edu/webreg/editSchedule.htm".to_string()
}

fn default_font_scale() -> f32 {
    1.0
}

fn default_preview_debounce_ms() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            year: default_year(),
            term: default_term(),
            campus: default_campus(),
            registration_url: default_registration_url(),
            font_scale: default_font_scale(),
            view_mode: ViewMode::Calendar,
            preview_debounce_ms: default_preview_debounce_ms(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            serde_json::from_str(&contents)
                .context("Failed to parse config file")
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("edu", "rutgers", "course-planner")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Term then year, the way the registration system spells a semester ("12025")
    pub fn semester_code(&self) -> String {
        format!("{}{}", self.term, self.year)
    }

    pub fn base_url(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    pub fn courses_url(&self) -> String {
        format!("{}/api/courses", self.base_url())
    }

    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }
}
