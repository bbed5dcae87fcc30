use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = "config.yaml";
const NOTES_FILENAME: &str = "notes.json";
const APP_NAME: &str = "glimmer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// `auto`, or a path to a base16 YAML scheme
    #[serde(default = "default_style")]
    pub style: String,

    /// Where notes are kept; unset means the default data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_file: Option<PathBuf>,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_style() -> String {
    "auto".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            style: default_style(),
            notes_file: None,
        }
    }
}

impl Settings {
    /// Notes file from the config, falling back to the data directory.
    pub fn notes_path(&self) -> Option<PathBuf> {
        self.notes_file.clone().or_else(default_notes_path)
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

fn default_notes_path() -> Option<PathBuf> {
    dirs::data_dir().map(|data| data.join(APP_NAME).join(NOTES_FILENAME))
}

/// Settings from the user's config directory. A missing file is created with
/// defaults; an unreadable one is logged and defaults are used.
pub fn load_settings() -> Settings {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default settings");
        return Settings::default();
    };

    if path.exists() {
        load_settings_from_path(&path)
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        let settings = Settings::default();
        save_settings_to_file(&settings, &path);
        settings
    }
}

pub fn load_settings_from_path(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            return Settings::default();
        }
    };

    match serde_yaml::from_str::<Settings>(&content) {
        Ok(mut settings) => {
            debug!("Loaded settings from {path:?}");
            if settings.version < CURRENT_VERSION {
                migrate_settings(&mut settings);
                save_settings_to_file(&settings, path);
            }
            settings
        }
        Err(e) => {
            error!("Failed to parse settings file {path:?}: {e}");
            Settings::default()
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // v1 spelled the auto style as an empty string
    if settings.version < 2 && settings.style.trim().is_empty() {
        settings.style = default_style();
    }

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    match fs::write(path, generate_settings_yaml(settings)) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str(STYLE_TEMPLATE);
    content.push_str(&format!("style: \"{}\"\n", settings.style));
    content.push('\n');
    content.push_str(NOTES_TEMPLATE);
    match &settings.notes_file {
        Some(path) => content.push_str(&format!("notes_file: \"{}\"\n", path.display())),
        None => content.push_str("# notes_file: \"/path/to/notes.json\"\n"),
    }

    content
}

const STYLE_TEMPLATE: &str = r#"
# Document style: "auto" picks a dark or light palette from the terminal
# background. Anything else is read as a path to a base16 YAML scheme, see
# https://github.com/tinted-theming/schemes
"#;

const NOTES_TEMPLATE: &str = r#"# Where document notes are stored. Defaults to the user data directory.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generated_yaml_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let settings = Settings {
            style: "/themes/ocean.yaml".to_string(),
            notes_file: Some(PathBuf::from("/tmp/notes.json")),
            ..Settings::default()
        };
        save_settings_to_file(&settings, &path);
        assert_eq!(load_settings_from_path(&path), settings);

        save_settings_to_file(&Settings::default(), &path);
        assert_eq!(load_settings_from_path(&path), Settings::default());
    }

    #[test]
    fn old_settings_are_migrated_and_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 1\nstyle: \"\"\n").unwrap();

        let settings = load_settings_from_path(&path);
        assert_eq!(settings.version, CURRENT_VERSION);
        assert_eq!(settings.style, "auto");

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.starts_with(&format!("version: {CURRENT_VERSION}")));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "notes_file: /srv/notes.json\n").unwrap();

        let settings = load_settings_from_path(&path);
        assert_eq!(settings.style, "auto");
        assert_eq!(settings.notes_file, Some(PathBuf::from("/srv/notes.json")));
        assert_eq!(settings.notes_path(), Some(PathBuf::from("/srv/notes.json")));
    }

    #[test]
    fn broken_yaml_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "style: [unterminated\n").unwrap();
        assert_eq!(load_settings_from_path(&path), Settings::default());
    }
}
