use std::borrow::Cow;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::{ImageError, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::canvas::{CellIndex, CellStroke, Grid, MAX_CANVAS_DIM, MAX_GRID_DIM};
use crate::components::history::PixelPath;
use crate::editor::Editor;

// ============================================================================
// IMAGE EXPORT
// ============================================================================

#[derive(Debug)]
pub enum ExportError {
    Image(ImageError),
    Clipboard(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Image(e) => write!(f, "Image export error: {}", e),
            ExportError::Clipboard(e) => write!(f, "Clipboard error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<ImageError> for ExportError {
    fn from(e: ImageError) -> Self {
        ExportError::Image(e)
    }
}

impl From<arboard::Error> for ExportError {
    fn from(e: arboard::Error) -> Self {
        ExportError::Clipboard(e.to_string())
    }
}

/// Write a rendered snapshot as PNG. Takes an owned image rather than the
/// editor, so it is safe to run on a background thread.
pub fn export_png(image: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    image.save_with_format(path, ImageFormat::Png)?;
    log_info!(
        "Exported {}×{} PNG to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

/// Put a snapshot on the system clipboard.
pub fn copy_to_clipboard(image: &RgbaImage) -> Result<(), ExportError> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_image(arboard::ImageData {
        width: image.width() as usize,
        height: image.height() as usize,
        bytes: Cow::Borrowed(image.as_raw()),
    })?;
    Ok(())
}

// ============================================================================
// PXG PROJECT FILE FORMAT
// ============================================================================

/// Magic header for the cell-history format (v1)
const PXG_MAGIC_V1: &str = "PXG1";

/// Serializable project: grid layout, every cell's color history and the
/// undo log, so a reopened project can keep undoing.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProjectFile {
    magic: String,
    width: u32,
    height: u32,
    rows: u32,
    columns: u32,
    current_color: [u8; 4],
    cells: Vec<CellData>,
    history: Vec<(u32, u32)>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct CellData {
    strokes: Vec<StrokeData>,
    removed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
struct StrokeData {
    color: [u8; 4],
    revived: bool,
}

#[derive(Debug)]
pub enum ProjectError {
    Io(std::io::Error),
    Serialize(String),
    InvalidFormat(String),
}

impl std::fmt::Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectError::Io(e) => write!(f, "I/O error: {}", e),
            ProjectError::Serialize(e) => write!(f, "Serialization error: {}", e),
            ProjectError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for ProjectError {}

impl From<std::io::Error> for ProjectError {
    fn from(e: std::io::Error) -> Self {
        ProjectError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for ProjectError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        ProjectError::Serialize(e.to_string())
    }
}

/// Capture the editor state. Cheap enough for the UI thread; the result can
/// be moved elsewhere for writing.
pub fn build_project_file(editor: &Editor) -> ProjectFile {
    let grid = editor.grid();
    let (width, height) = grid.canvas_size();
    let cells = grid
        .cells()
        .iter()
        .map(|cell| CellData {
            strokes: cell
                .strokes()
                .iter()
                .map(|s| StrokeData {
                    color: s.color.0,
                    revived: s.revived,
                })
                .collect(),
            removed: cell.is_removed(),
        })
        .collect();

    ProjectFile {
        magic: PXG_MAGIC_V1.to_string(),
        width,
        height,
        rows: grid.rows(),
        columns: grid.columns(),
        current_color: editor.current_color().0,
        cells,
        history: editor
            .history()
            .entries()
            .iter()
            .map(|i| (i.row, i.column))
            .collect(),
    }
}

pub fn write_project_file(project: &ProjectFile, path: &Path) -> Result<(), ProjectError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, project)?;
    Ok(())
}

/// Save the editor as a .pxg project file.
pub fn save_project(editor: &Editor, path: &Path) -> Result<(), ProjectError> {
    let project = build_project_file(editor);
    write_project_file(&project, path)?;
    log_info!(
        "Saved project {} ({} history entries)",
        path.display(),
        project.history.len()
    );
    Ok(())
}

pub fn load_project(path: &Path) -> Result<Editor, ProjectError> {
    let raw = std::fs::read(path)?;
    let editor = decode_project(&raw)?;
    log_info!("Loaded project {}", path.display());
    Ok(editor)
}

/// Decode and validate raw .pxg bytes.
pub fn decode_project(raw: &[u8]) -> Result<Editor, ProjectError> {
    if raw.len() < 12 {
        return Err(ProjectError::InvalidFormat("File too small".into()));
    }
    // bincode writes the magic String as an 8-byte length prefix + UTF-8.
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    if magic != PXG_MAGIC_V1 {
        return Err(ProjectError::InvalidFormat(format!(
            "Unknown magic '{}'",
            magic
        )));
    }
    let project: ProjectFile = bincode::deserialize(raw)?;
    restore_editor(project)
}

fn restore_editor(project: ProjectFile) -> Result<Editor, ProjectError> {
    let invalid = |msg: String| -> Result<Editor, ProjectError> {
        Err(ProjectError::InvalidFormat(msg))
    };

    let grid_range = 1..=MAX_GRID_DIM;
    if !grid_range.contains(&project.rows) || !grid_range.contains(&project.columns) {
        return invalid(format!("grid {}×{} out of range", project.rows, project.columns));
    }
    let canvas_range = 1..=MAX_CANVAS_DIM;
    if !canvas_range.contains(&project.width) || !canvas_range.contains(&project.height) {
        return invalid(format!("canvas {}×{} out of range", project.width, project.height));
    }
    let expected = (project.rows * project.columns) as usize;
    if project.cells.len() != expected {
        return invalid(format!("expected {} cells, found {}", expected, project.cells.len()));
    }

    // Every stroke, every revived stroke's erase and a pending erase each
    // own exactly one history entry.
    let mut touches = vec![0usize; expected];
    for &(row, column) in &project.history {
        if row >= project.rows || column >= project.columns {
            return invalid(format!("history entry ({}, {}) outside grid", row, column));
        }
        touches[(row * project.columns + column) as usize] += 1;
    }

    let mut grid = Grid::build(project.rows, project.columns, project.width, project.height)
        .map_err(|e| ProjectError::InvalidFormat(e.to_string()))?;

    for (i, data) in project.cells.iter().enumerate() {
        let revived = data.strokes.iter().filter(|s| s.revived).count();
        let owned = data.strokes.len() + revived + data.removed as usize;
        if touches[i] != owned
            || (data.removed && data.strokes.is_empty())
            || data.strokes.first().is_some_and(|s| s.revived)
        {
            return invalid(format!("cell {} history does not match its undo log", i));
        }

        let strokes: Vec<CellStroke> = data
            .strokes
            .iter()
            .map(|s| CellStroke {
                color: Rgba(s.color),
                revived: s.revived,
            })
            .collect();
        let index = CellIndex::new(i as u32 / project.columns, i as u32 % project.columns);
        if let Some(cell) = grid.cell_mut(index) {
            cell.restore(&strokes, data.removed);
        }
    }

    let history = PixelPath::from_entries(
        project
            .history
            .iter()
            .map(|&(row, column)| CellIndex::new(row, column))
            .collect(),
    );
    Ok(Editor::from_parts(grid, history, Rgba(project.current_color)))
}
