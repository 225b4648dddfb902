use eframe::egui::Pos2;
use image::{Rgba, RgbaImage};

use crate::canvas::{CellIndex, Grid};
use crate::components::history::PixelPath;
use crate::components::tools::Tool;
use crate::compositor;

/// Opaque white, the starting pencil color.
pub const DEFAULT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Rows or columns outside `1..=MAX_GRID_DIM`.
    InvalidGridDimension { rows: u32, columns: u32 },
    /// Canvas edge of zero or above `MAX_CANVAS_DIM`.
    InvalidCanvasSize { width: u32, height: u32 },
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::InvalidGridDimension { rows, columns } => write!(
                f,
                "Invalid grid size {}×{}: rows and columns must be between 1 and {}",
                rows,
                columns,
                crate::canvas::MAX_GRID_DIM
            ),
            EditorError::InvalidCanvasSize { width, height } => write!(
                f,
                "Invalid canvas size {}×{}: edges must be between 1 and {} pixels",
                width,
                height,
                crate::canvas::MAX_CANVAS_DIM
            ),
        }
    }
}

impl std::error::Error for EditorError {}

// ============================================================================
// EDITOR
// ============================================================================

/// Result of feeding one input sample to the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Painted,
    Erased,
    Picked(Rgba<u8>),
    /// The cell was resolved but the action had no effect.
    Unchanged,
    /// The point fell outside every cell.
    OutOfBounds,
}

impl ActionOutcome {
    /// Whether the image changed and needs presenting again.
    pub fn redraws(&self) -> bool {
        matches!(self, ActionOutcome::Painted | ActionOutcome::Erased)
    }
}

/// Owns the grid, the history log and the rendered image.
///
/// The image is derived state: after every mutation it is either patched
/// (pencil) or rebuilt from the grid (erase, undo, reset), and
/// `generation` is bumped so display surfaces know to re-upload.
pub struct Editor {
    grid: Grid,
    history: PixelPath,
    current_color: Rgba<u8>,
    tool: Tool,
    image: RgbaImage,
    overlay: RgbaImage,
    generation: u64,
    layout_generation: u64,
    /// Last cell touched by the active stroke, `None` outside a stroke.
    stroke_cell: Option<Option<CellIndex>>,
}

impl Editor {
    pub fn new(rows: u32, columns: u32, width: u32, height: u32) -> Result<Self, EditorError> {
        let grid = Grid::build(rows, columns, width, height)?;
        Ok(Self::from_parts(grid, PixelPath::new(), DEFAULT_COLOR))
    }

    /// Assemble an editor from restored state (project files).
    pub(crate) fn from_parts(grid: Grid, history: PixelPath, current_color: Rgba<u8>) -> Self {
        let image = compositor::render(&grid);
        let overlay = grid.render_overlay();
        Self {
            grid,
            history,
            current_color,
            tool: Tool::default(),
            image,
            overlay,
            generation: 0,
            layout_generation: 0,
            stroke_cell: None,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn history(&self) -> &PixelPath {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn current_color(&self) -> Rgba<u8> {
        self.current_color
    }

    pub fn set_current_color(&mut self, color: Rgba<u8>) {
        self.current_color = color;
    }

    // ---- input dispatch -----------------------------------------------------

    /// Resolve a canvas point and apply the active tool to its cell.
    pub fn apply_at(&mut self, p: Pos2) -> ActionOutcome {
        match self.grid.cell_at(p) {
            Some(index) => self.apply_cell(index),
            None => ActionOutcome::OutOfBounds,
        }
    }

    pub fn apply_cell(&mut self, index: CellIndex) -> ActionOutcome {
        match self.tool {
            Tool::Pencil => self.pencil(index),
            Tool::Eraser => self.eraser(index),
            Tool::ColorPicker => self.pick(index),
        }
    }

    /// Start a drag. Samples inside one stroke that land on the cell the
    /// previous sample already handled are dropped.
    pub fn begin_stroke(&mut self) {
        self.stroke_cell = Some(None);
    }

    pub fn stroke_to(&mut self, p: Pos2) -> ActionOutcome {
        let Some(index) = self.grid.cell_at(p) else {
            return ActionOutcome::OutOfBounds;
        };
        if let Some(last) = self.stroke_cell.as_mut() {
            if *last == Some(index) {
                return ActionOutcome::Unchanged;
            }
            *last = Some(index);
        }
        self.apply_cell(index)
    }

    pub fn end_stroke(&mut self) {
        self.stroke_cell = None;
    }

    pub fn in_stroke(&self) -> bool {
        self.stroke_cell.is_some()
    }

    // ---- tools --------------------------------------------------------------

    fn pencil(&mut self, index: CellIndex) -> ActionOutcome {
        let color = self.current_color;
        let Some(cell) = self.grid.cell_mut(index) else {
            return ActionOutcome::OutOfBounds;
        };
        if cell.is_used() && cell.top_color() == color {
            return ActionOutcome::Unchanged;
        }
        cell.paint(color);
        self.history.record(index);

        // Paint only ever covers its own rect, so patching the previous
        // image is equivalent to a full recomposite.
        compositor::draw_cell(&mut self.image, cell);
        self.generation += 1;
        ActionOutcome::Painted
    }

    fn eraser(&mut self, index: CellIndex) -> ActionOutcome {
        let Some(cell) = self.grid.cell_mut(index) else {
            return ActionOutcome::OutOfBounds;
        };
        if !cell.is_used() {
            return ActionOutcome::Unchanged;
        }
        cell.erase();
        self.history.record(index);
        self.rerender();
        ActionOutcome::Erased
    }

    fn pick(&mut self, index: CellIndex) -> ActionOutcome {
        let Some(cell) = self.grid.cell(index) else {
            return ActionOutcome::OutOfBounds;
        };
        self.current_color = cell.visible_color();
        ActionOutcome::Picked(self.current_color)
    }

    // ---- history / lifecycle ------------------------------------------------

    /// Reverse the most recent paint or erase. `false` when nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.grid) {
            return false;
        }
        self.rerender();
        true
    }

    /// Rebuild the grid at new dimensions. Destructive and not undoable.
    /// Invalid dimensions are rejected and leave the editor untouched.
    pub fn reset(&mut self, rows: u32, columns: u32) -> Result<(), EditorError> {
        let (width, height) = self.grid.canvas_size();
        self.rebuild(rows, columns, width, height)
    }

    /// Reset at the current dimensions.
    pub fn clear(&mut self) {
        self.grid.reset_cells();
        self.history.clear();
        self.rerender();
        log_info!(
            "Cleared {}×{} grid",
            self.grid.rows(),
            self.grid.columns()
        );
    }

    /// Rebuild the grid for a new canvas size, keeping rows and columns.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        let (rows, columns) = (self.grid.rows(), self.grid.columns());
        self.rebuild(rows, columns, width, height)
    }

    fn rebuild(
        &mut self,
        rows: u32,
        columns: u32,
        width: u32,
        height: u32,
    ) -> Result<(), EditorError> {
        let grid = match Grid::build(rows, columns, width, height) {
            Ok(g) => g,
            Err(e) => {
                log_warn!("Grid rebuild rejected: {}", e);
                return Err(e);
            }
        };
        self.grid = grid;
        self.history.clear();
        self.stroke_cell = None;
        self.overlay = self.grid.render_overlay();
        self.layout_generation += 1;
        self.rerender();
        log_info!(
            "Grid rebuilt: {}×{} cells on {}×{} canvas (cell {:.2}px)",
            rows,
            columns,
            width,
            height,
            self.grid.cell_size()
        );
        Ok(())
    }

    fn rerender(&mut self) {
        self.image = compositor::render(&self.grid);
        self.generation += 1;
    }

    // ---- output -------------------------------------------------------------

    /// Current composite. Live view; clone via [`Editor::snapshot`] before
    /// handing it to anything that outlives this borrow.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Immutable copy for export and other off-thread consumers.
    pub fn snapshot(&self) -> RgbaImage {
        self.image.clone()
    }

    pub fn overlay(&self) -> &RgbaImage {
        &self.overlay
    }

    /// Bumped on every re-render.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bumped whenever the grid is rebuilt (overlay changes).
    pub fn layout_generation(&self) -> u64 {
        self.layout_generation
    }
}
