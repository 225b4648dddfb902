use std::path::{Path, PathBuf};

use image::Rgba;

use crate::components::colors::{parse_csv, to_csv};
use crate::editor::DEFAULT_COLOR;

/// Settings that persist across sessions.
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Grid size used for new documents.
    pub default_rows: u32,
    pub default_columns: u32,
    /// Edge of the square canvas in pixels.
    pub canvas_size: u32,
    /// Pencil color at startup.
    pub default_color: Rgba<u8>,
    /// Draw the cell overlay on top of the canvas.
    pub show_grid: bool,
    /// Ask before Trash wipes the drawing.
    pub confirm_on_clear: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_rows: 16,
            default_columns: 16,
            canvas_size: 512,
            default_color: DEFAULT_COLOR,
            show_grid: true,
            confirm_on_clear: true,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/pixelgrid/pixelgrid_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\PixelGrid\pixelgrid_settings.cfg
    /// On macOS:   ~/Library/Application Support/PixelGrid/pixelgrid_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("pixelgrid");
            return Some(config_dir.join("pixelgrid_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(
                PathBuf::from(appdata)
                    .join("PixelGrid")
                    .join("pixelgrid_settings.cfg"),
            );
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("PixelGrid")
                    .join("pixelgrid_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("pixelgrid_settings.cfg")))
        }
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "default_rows={}\n\
             default_columns={}\n\
             canvas_size={}\n\
             default_color={}\n\
             show_grid={}\n\
             confirm_on_clear={}\n",
            self.default_rows,
            self.default_columns,
            self.canvas_size,
            to_csv(self.default_color),
            self.show_grid,
            self.confirm_on_clear,
        )
    }

    /// Parse `key=value` lines. Unknown keys are ignored and bad values keep
    /// the default for that key.
    pub fn from_config_string(content: &str) -> Self {
        let mut s = Self::default();
        let defaults = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "default_rows" => {
                    s.default_rows = parse_dim(val).unwrap_or(defaults.default_rows);
                }
                "default_columns" => {
                    s.default_columns = parse_dim(val).unwrap_or(defaults.default_columns);
                }
                "canvas_size" => {
                    s.canvas_size = val
                        .parse()
                        .ok()
                        .filter(|v| (1..=crate::canvas::MAX_CANVAS_DIM).contains(v))
                        .unwrap_or(defaults.canvas_size);
                }
                "default_color" => {
                    s.default_color = parse_csv(val).unwrap_or(defaults.default_color);
                }
                "show_grid" => {
                    s.show_grid = val == "true";
                }
                "confirm_on_clear" => {
                    s.confirm_on_clear = val == "true";
                }
                _ => {}
            }
        }
        s
    }

    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }

    /// Load settings from disk (defaults if the file is missing or corrupt).
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_config_string(&content),
            Err(_) => Self::default(),
        }
    }
}

fn parse_dim(val: &str) -> Option<u32> {
    val.parse()
        .ok()
        .filter(|v| (1..=crate::canvas::MAX_GRID_DIM).contains(v))
}
