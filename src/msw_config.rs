// Difficulty presets and player preferences
// Validates custom board sizes and keeps the preferred difficulty in a TOML file

use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Largest accepted custom side length
pub const MAX_DIMENSION: usize = 64;

/// Difficulty presets and custom settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,   // 9x9, 10 mines
    Medium, // 16x16, 40 mines
    Hard,   // 16 rows x 30 cols, 99 mines
    Custom { rows: usize, cols: usize, mines: usize },
}

impl Serialize for Difficulty {
    /// Serialize difficulty by name; custom sizes live in their own fields
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> Result<Difficulty, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            // Rebuilt from custom_rows/cols/mines once the whole file is read
            "Custom" => Ok(Difficulty::Custom { rows: 0, cols: 0, mines: 0 }),
            other => Err(serde::de::Error::custom(format!("unknown difficulty {other:?}"))),
        }
    }
}

impl Difficulty {
    /// Presets in menu order
    pub const PRESETS: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Board parameters as (rows, cols, mines)
    pub fn params(&self) -> (usize, usize, usize) {
        match *self {
            Difficulty::Easy => (9, 9, 10),
            Difficulty::Medium => (16, 16, 40),
            Difficulty::Hard => (16, 30, 99),
            Difficulty::Custom { rows, cols, mines } => (rows, cols, mines),
        }
    }

    /// Stable identifier, also used in the preferences file
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Custom { .. } => "Custom",
        }
    }

    /// Check user-supplied values; presets are always valid
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Difficulty::Custom { rows, cols, mines } => validate_custom(rows, cols, mines),
            _ => Ok(()),
        }
    }
}

/// Input field of the custom difficulty form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomField {
    Rows,
    Cols,
    Mines,
}

impl CustomField {
    pub const ALL: [CustomField; 3] = [CustomField::Rows, CustomField::Cols, CustomField::Mines];

    pub fn label(self) -> &'static str {
        match self {
            CustomField::Rows => "Rows",
            CustomField::Cols => "Columns",
            CustomField::Mines => "Mines",
        }
    }
}

impl fmt::Display for CustomField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejected custom difficulty input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be a whole number (got {input:?})")]
    NotANumber { field: CustomField, input: String },
    #[error("{field} must be between 1 and {max} (got {value})")]
    OutOfRange { field: CustomField, value: usize, max: usize },
    #[error("Mines must be fewer than the {cells} cells on the board (got {mines})")]
    TooManyMines { mines: usize, cells: usize },
}

impl ConfigError {
    /// The field the player has to fix
    pub fn field(&self) -> CustomField {
        match self {
            ConfigError::NotANumber { field, .. } | ConfigError::OutOfRange { field, .. } => *field,
            ConfigError::TooManyMines { .. } => CustomField::Mines,
        }
    }
}

fn validate_custom(rows: usize, cols: usize, mines: usize) -> Result<(), ConfigError> {
    for (field, value) in [(CustomField::Rows, rows), (CustomField::Cols, cols)] {
        if value == 0 || value > MAX_DIMENSION {
            return Err(ConfigError::OutOfRange { field, value, max: MAX_DIMENSION });
        }
    }
    let cells = rows * cols;
    if mines == 0 {
        return Err(ConfigError::OutOfRange {
            field: CustomField::Mines,
            value: mines,
            max: cells - 1,
        });
    }
    if mines >= cells {
        return Err(ConfigError::TooManyMines { mines, cells });
    }
    Ok(())
}

/// Parse the raw text of the custom difficulty form
pub fn parse_custom(rows: &str, cols: &str, mines: &str) -> Result<Difficulty, ConfigError> {
    let parse = |field: CustomField, input: &str| {
        input.trim().parse::<usize>().map_err(|_| ConfigError::NotANumber {
            field,
            input: input.to_string(),
        })
    };
    let rows = parse(CustomField::Rows, rows)?;
    let cols = parse(CustomField::Cols, cols)?;
    let mines = parse(CustomField::Mines, mines)?;
    validate_custom(rows, cols, mines)?;
    Ok(Difficulty::Custom { rows, cols, mines })
}

/// Failure reading or writing the preferences file
#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("preferences I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("preferences file is not valid: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("preferences could not be encoded: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Player preferences, persisted as TOML
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    // Difficulty used for new games
    pub difficulty: Difficulty,

    // Last accepted custom parameters, used to prefill the custom form
    pub custom_rows: usize,
    pub custom_cols: usize,
    pub custom_mines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: Difficulty::Easy,
            custom_rows: 20,
            custom_cols: 30,
            custom_mines: 120,
        }
    }
}

impl Config {
    /// Switch difficulty, remembering custom parameters
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        if let Difficulty::Custom { rows, cols, mines } = difficulty {
            self.custom_rows = rows;
            self.custom_cols = cols;
            self.custom_mines = mines;
        }
        self.difficulty = difficulty;
    }

    /// Parse a preferences file.
    /// A saved custom difficulty that no longer validates falls back to Easy.
    pub fn from_toml(s: &str) -> Result<Config, PrefsError> {
        let mut cfg: Config = toml::from_str(s)?;
        if matches!(cfg.difficulty, Difficulty::Custom { .. }) {
            let custom = Difficulty::Custom {
                rows: cfg.custom_rows,
                cols: cfg.custom_cols,
                mines: cfg.custom_mines,
            };
            match custom.validate() {
                Ok(()) => cfg.difficulty = custom,
                Err(e) => {
                    warn!(error = %e, "saved custom difficulty is invalid, using Easy");
                    cfg.difficulty = Difficulty::Easy;
                }
            }
        }
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String, PrefsError> {
        Ok(toml::to_string(self)?)
    }
}

/// Get the preferences file path
/// Uses the platform config directory (e.g. ~/.config/mswpr/mswpr.toml on Linux),
/// falling back to the current directory
pub fn config_path() -> Option<PathBuf> {
    if let Some(proj) = ProjectDirs::from("com", "xhbl", "mswpr") {
        return Some(proj.config_dir().join("mswpr.toml"));
    }
    std::env::current_dir().ok().map(|dir| dir.join("mswpr.toml"))
}

/// Load preferences from `path`, writing defaults if the file does not exist.
/// Problems are logged and never fatal.
pub fn load_or_create_config_at(path: &Path) -> Config {
    if path.exists() {
        match fs::read_to_string(path).map_err(PrefsError::from).and_then(|s| Config::from_toml(&s)) {
            Ok(cfg) => {
                info!(path = %path.display(), difficulty = cfg.difficulty.name(), "preferences loaded");
                return cfg;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring preferences file");
                return Config::default();
            }
        }
    }
    let cfg = Config::default();
    if let Err(e) = save_config_at(&cfg, path) {
        warn!(path = %path.display(), error = %e, "could not write default preferences");
    }
    cfg
}

/// Write preferences to `path`, creating parent directories
pub fn save_config_at(cfg: &Config, path: &Path) -> Result<(), PrefsError> {
    let s = cfg.to_toml()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, s)?;
    Ok(())
}

/// Load preferences from the default location
pub fn load_or_create_config() -> Config {
    match config_path() {
        Some(path) => load_or_create_config_at(&path),
        None => Config::default(),
    }
}

/// Save preferences to the default location
pub fn save_config(cfg: &Config) {
    if let Some(path) = config_path() {
        if let Err(e) = save_config_at(cfg, &path) {
            warn!(path = %path.display(), error = %e, "could not save preferences");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_parameters() {
        assert_eq!(Difficulty::Easy.params(), (9, 9, 10));
        assert_eq!(Difficulty::Medium.params(), (16, 16, 40));
        assert_eq!(Difficulty::Hard.params(), (16, 30, 99));
        for d in Difficulty::PRESETS {
            assert!(d.validate().is_ok());
        }
    }

    #[test]
    fn parse_custom_accepts_valid_input() {
        assert_eq!(
            parse_custom(" 12", "20 ", "30").unwrap(),
            Difficulty::Custom { rows: 12, cols: 20, mines: 30 }
        );
        assert!(parse_custom("1", "2", "1").is_ok());
    }

    #[test]
    fn parse_custom_rejects_non_numeric() {
        let err = parse_custom("9", "abc", "10").unwrap_err();
        assert_eq!(err.field(), CustomField::Cols);
        assert!(matches!(err, ConfigError::NotANumber { .. }));

        let err = parse_custom("-4", "9", "10").unwrap_err();
        assert_eq!(err.field(), CustomField::Rows);
        assert!(parse_custom("9", "9", "").is_err());
    }

    #[test]
    fn parse_custom_rejects_bad_ranges() {
        assert_eq!(
            parse_custom("0", "9", "1").unwrap_err(),
            ConfigError::OutOfRange { field: CustomField::Rows, value: 0, max: MAX_DIMENSION }
        );
        assert_eq!(parse_custom("9", "65", "1").unwrap_err().field(), CustomField::Cols);
        assert_eq!(
            parse_custom("3", "3", "0").unwrap_err(),
            ConfigError::OutOfRange { field: CustomField::Mines, value: 0, max: 8 }
        );
        assert_eq!(
            parse_custom("3", "3", "9").unwrap_err(),
            ConfigError::TooManyMines { mines: 9, cells: 9 }
        );
    }

    #[test]
    fn set_difficulty_remembers_custom_values() {
        let mut cfg = Config::default();
        cfg.set_difficulty(Difficulty::Custom { rows: 10, cols: 12, mines: 14 });
        assert_eq!((cfg.custom_rows, cfg.custom_cols, cfg.custom_mines), (10, 12, 14));

        cfg.set_difficulty(Difficulty::Hard);
        assert_eq!(cfg.difficulty, Difficulty::Hard);
        assert_eq!(cfg.custom_rows, 10);
    }

    #[test]
    fn preferences_round_trip_through_toml() {
        let mut cfg = Config::default();
        cfg.set_difficulty(Difficulty::Custom { rows: 10, cols: 12, mines: 14 });
        let text = cfg.to_toml().unwrap();
        assert!(text.contains("difficulty = \"Custom\""));
        assert_eq!(Config::from_toml(&text).unwrap(), cfg);
    }

    #[test]
    fn invalid_saved_custom_falls_back_to_easy() {
        let text = "difficulty = \"Custom\"\ncustom_rows = 3\ncustom_cols = 3\ncustom_mines = 50\n";
        let cfg = Config::from_toml(text).unwrap();
        assert_eq!(cfg.difficulty, Difficulty::Easy);
    }

    #[test]
    fn missing_fields_use_defaults_and_unknown_names_fail() {
        let cfg = Config::from_toml("difficulty = \"Medium\"\n").unwrap();
        assert_eq!(cfg.difficulty, Difficulty::Medium);
        assert_eq!(cfg.custom_rows, Config::default().custom_rows);

        assert!(matches!(Config::from_toml("difficulty = \"Insane\"\n"), Err(PrefsError::Parse(_))));
    }

    #[test]
    fn load_creates_defaults_then_reads_saved_file() {
        let dir = std::env::temp_dir().join(format!("mswpr-prefs-{}", std::process::id()));
        let path = dir.join("mswpr.toml");
        let _ = fs::remove_dir_all(&dir);

        let cfg = load_or_create_config_at(&path);
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set_difficulty(Difficulty::Hard);
        save_config_at(&changed, &path).unwrap();
        assert_eq!(load_or_create_config_at(&path), changed);

        fs::write(&path, "not = [valid").unwrap();
        assert_eq!(load_or_create_config_at(&path), Config::default());

        let _ = fs::remove_dir_all(&dir);
    }
}
