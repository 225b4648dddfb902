use std::path::PathBuf;
use uuid::Uuid;

use crate::editor::{Editor, EditorError};
use crate::io::{self, ProjectError};
use crate::settings::AppSettings;

/// Single open document.
pub struct Project {
    pub id: Uuid,
    pub editor: Editor,
    /// `None` for unsaved/untitled files.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,
}

impl Project {
    pub fn new_untitled(
        untitled_counter: usize,
        settings: &AppSettings,
    ) -> Result<Self, EditorError> {
        let mut editor = Editor::new(
            settings.default_rows,
            settings.default_columns,
            settings.canvas_size,
            settings.canvas_size,
        )?;
        editor.set_current_color(settings.default_color);

        Ok(Self {
            id: Uuid::new_v4(),
            editor,
            path: None,
            is_dirty: false,
            name: format!("Untitled-{}", untitled_counter),
        })
    }

    pub fn from_file(path: PathBuf) -> Result<Self, ProjectError> {
        let editor = io::load_project(&path)?;
        let mut project = Self {
            id: Uuid::new_v4(),
            editor,
            path: Some(path),
            is_dirty: false,
            name: String::new(),
        };
        project.update_name_from_path();
        Ok(project)
    }

    /// Write to `path` and adopt it as the document's location.
    pub fn save_as(&mut self, path: PathBuf) -> Result<(), ProjectError> {
        io::save_project(&self.editor, &path)?;
        self.path = Some(path);
        self.update_name_from_path();
        self.mark_clean();
        Ok(())
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}
