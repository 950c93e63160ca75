use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::proximity::DEFAULT_RADIUS_METERS;
use crate::model::Coordinate;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub data_file: String,
    pub user_id: String,
    pub initial_center: Coordinate,
    pub initial_zoom: f32,
    pub proximity_radius_m: f64,
    pub polygon_double_click_completes: bool,
    pub suggestion_limit: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_file: "tourmap.json".to_string(),
            user_id: "local".to_string(),
            // Mexico City.
            initial_center: Coordinate {
                latitude: 19.4326,
                longitude: -99.1332,
            },
            initial_zoom: 12.0,
            proximity_radius_m: DEFAULT_RADIUS_METERS,
            polygon_double_click_completes: false,
            suggestion_limit: 8,
        }
    }
}

/// `$HOME/.config/tourmap.toml`, else `./settings.toml`, if either exists.
pub fn config_path() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config").join("tourmap.toml");
        if path.exists() {
            return Some(path);
        }
    }
    let local = Path::new(DEFAULT_SETTINGS_FILE);
    local.exists().then(|| local.to_path_buf())
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

pub fn load_settings(path: &Path) -> Option<AppSettings> {
    let s = std::fs::read_to_string(path).ok()?;
    if is_toml(path) {
        toml::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| serde_json::from_str::<AppSettings>(&s).ok())
    } else {
        serde_json::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| toml::from_str::<AppSettings>(&s).ok())
    }
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<(), String> {
    let text = if is_toml(path) {
        toml::to_string_pretty(settings).map_err(|e| e.to_string())?
    } else {
        serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?
    };
    std::fs::write(path, text).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: AppSettings = toml::from_str("proximity_radius_m = 250.0").unwrap();
        assert_eq!(settings.proximity_radius_m, 250.0);
        assert_eq!(settings.suggestion_limit, AppSettings::default().suggestion_limit);
        assert!(!settings.polygon_double_click_completes);
    }

    #[test]
    fn toml_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let settings = AppSettings {
            user_id: "ana".to_string(),
            polygon_double_click_completes: true,
            ..AppSettings::default()
        };
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), Some(settings));
    }

    #[test]
    fn json_content_in_toml_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, r#"{"user_id":"beto"}"#).unwrap();
        assert_eq!(load_settings(&path).unwrap().user_id, "beto");
    }
}
