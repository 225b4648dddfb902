use eframe::egui;
use egui::{Pos2, Rect, pos2};
use image::{Rgba, RgbaImage};

use crate::editor::EditorError;

/// Fully transparent base entry at the bottom of every cell's color stack.
pub const SENTINEL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Largest accepted row / column count.
pub const MAX_GRID_DIM: u32 = 512;

/// Largest accepted canvas edge in pixels.
pub const MAX_CANVAS_DIM: u32 = 16_384;

const GRID_LINE_COLOR: Rgba<u8> = Rgba([128, 128, 128, 255]);
const GRID_LINE_WIDTH: i64 = 2;

// ============================================================================
// CELL
// ============================================================================

/// Grid coordinate of a cell. `row` runs along y, `column` along x.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellIndex {
    pub row: u32,
    pub column: u32,
}

impl CellIndex {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// One entry of a cell's color history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellStroke {
    pub color: Rgba<u8>,
    /// Set when this paint cleared an active erase; undoing it erases again.
    pub revived: bool,
}

impl CellStroke {
    const BASE: CellStroke = CellStroke {
        color: SENTINEL,
        revived: false,
    };
}

/// A single paintable grid unit.
///
/// `colors` always starts with the sentinel entry and never drops below it.
/// `removed` hides the top color from rendering without discarding it, so an
/// erase can be undone by clearing the flag.
#[derive(Clone, Debug)]
pub struct Cell {
    rect: Rect,
    colors: Vec<CellStroke>,
    removed: bool,
}

impl Cell {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            colors: vec![CellStroke::BASE],
            removed: false,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Clear the erased flag without touching the color stack.
    pub fn mark_used(&mut self) {
        self.removed = false;
    }

    /// True iff something was painted and it is not currently erased.
    pub fn is_used(&self) -> bool {
        self.colors.len() > 1 && !self.removed
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Number of painted entries above the sentinel.
    pub fn depth(&self) -> usize {
        self.colors.len() - 1
    }

    /// Painted entries above the sentinel, oldest first.
    pub fn strokes(&self) -> &[CellStroke] {
        &self.colors[1..]
    }

    /// Push `color` on the stack. Painting an erased cell un-erases it and
    /// remembers that, so the matching undo restores the erased state.
    pub fn paint(&mut self, color: Rgba<u8>) {
        self.colors.push(CellStroke {
            color,
            revived: self.removed,
        });
        self.mark_used();
    }

    /// Reverse the most recent action applied to this cell.
    ///
    /// An active erase is undone first; otherwise the top color is popped.
    /// Returns `false` when there was nothing to undo (stack at the sentinel
    /// and not erased), which callers treat as an invariant violation.
    pub fn undo_last(&mut self) -> bool {
        if self.removed {
            self.mark_used();
            return true;
        }
        if !self.is_used() {
            return false;
        }
        if let Some(stroke) = self.colors.pop()
            && stroke.revived
        {
            self.removed = true;
        }
        true
    }

    pub fn erase(&mut self) {
        self.removed = true;
    }

    pub fn reset(&mut self) {
        self.colors.truncate(1);
        self.removed = false;
    }

    /// Last pushed color, ignoring the erased flag.
    pub fn top_color(&self) -> Rgba<u8> {
        self.colors.last().map_or(SENTINEL, |s| s.color)
    }

    /// What the cell shows on screen: the sentinel while erased.
    pub fn visible_color(&self) -> Rgba<u8> {
        if self.removed { SENTINEL } else { self.top_color() }
    }

    /// Replace the history with previously saved strokes.
    pub(crate) fn restore(&mut self, strokes: &[CellStroke], removed: bool) {
        self.colors.truncate(1);
        self.colors.extend_from_slice(strokes);
        self.removed = removed && !strokes.is_empty();
    }

    /// Half-open containment against the pixel-snapped edges used by
    /// [`Cell::pixel_bounds`], so a hit lands on the cell that paints the
    /// pixel under it. The far edges belong to the next cell.
    pub fn contains(&self, p: Pos2) -> bool {
        let r = self.rect;
        p.x >= r.min.x.round()
            && p.x < r.max.x.round()
            && p.y >= r.min.y.round()
            && p.y < r.max.y.round()
    }

    /// Pixel span `(x0, y0, x1, y1)` covered by this cell, end-exclusive and
    /// clipped to the canvas. Edges are rounded so neighbours tile exactly.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let clip = |v: f32, max: u32| (v.round().max(0.0) as u32).min(max);
        (
            clip(self.rect.min.x, width),
            clip(self.rect.min.y, height),
            clip(self.rect.max.x, width),
            clip(self.rect.max.y, height),
        )
    }
}

// ============================================================================
// GRID
// ============================================================================

/// Fixed R×C arrangement of square cells over a canvas.
#[derive(Clone, Debug)]
pub struct Grid {
    rows: u32,
    columns: u32,
    width: u32,
    height: u32,
    cell_size: f32,
    cells: Vec<Cell>,
}

/// Edge length of a cell: the axis with more cells is fitted to its canvas
/// edge (ties fit the height). The other axis may leave an uncovered margin.
pub fn cell_size(rows: u32, columns: u32, width: u32, height: u32) -> f32 {
    if columns > rows {
        width as f32 / columns as f32
    } else {
        height as f32 / rows as f32
    }
}

impl Grid {
    pub fn build(rows: u32, columns: u32, width: u32, height: u32) -> Result<Self, EditorError> {
        if rows == 0 || columns == 0 || rows > MAX_GRID_DIM || columns > MAX_GRID_DIM {
            return Err(EditorError::InvalidGridDimension { rows, columns });
        }
        if width == 0 || height == 0 || width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
            return Err(EditorError::InvalidCanvasSize { width, height });
        }

        let s = cell_size(rows, columns, width, height);
        let mut cells = Vec::with_capacity((rows * columns) as usize);
        for y in 0..rows {
            for x in 0..columns {
                let min = pos2(x as f32 * s, y as f32 * s);
                let max = pos2((x + 1) as f32 * s, (y + 1) as f32 * s);
                let rect = Rect::from_min_max(min, max);
                cells.push(Cell::new(rect));
            }
        }

        Ok(Self {
            rows,
            columns,
            width,
            height,
            cell_size: s,
            cells,
        })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Canvas size in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn flat(&self, index: CellIndex) -> Option<usize> {
        (index.row < self.rows && index.column < self.columns)
            .then(|| (index.row * self.columns + index.column) as usize)
    }

    pub fn cell(&self, index: CellIndex) -> Option<&Cell> {
        self.flat(index).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, index: CellIndex) -> Option<&mut Cell> {
        self.flat(index).map(move |i| &mut self.cells[i])
    }

    /// Cell whose bounds contain `p`, or `None` in the uncovered margin and
    /// outside the canvas. Non-finite points resolve to `None`.
    ///
    /// Rows and columns are located independently; spans along each axis
    /// are contiguous, so this agrees with a first-match scan over every cell.
    pub fn cell_at(&self, p: Pos2) -> Option<CellIndex> {
        let column = locate(p.x, self.cell_size, self.columns, |c| {
            let r = self.cells[c as usize].rect();
            (r.min.x, r.max.x)
        })?;
        let row = locate(p.y, self.cell_size, self.rows, |r| {
            let rect = self.cells[(r * self.columns) as usize].rect();
            (rect.min.y, rect.max.y)
        })?;
        let index = CellIndex::new(row, column);
        self.cell(index).filter(|cell| cell.contains(p)).map(|_| index)
    }

    /// Return every cell to the sentinel state.
    pub fn reset_cells(&mut self) {
        for cell in &mut self.cells {
            cell.reset();
        }
    }

    /// Transparent image with a gray stroke on every cell edge and the
    /// canvas frame. Built once per grid.
    pub fn render_overlay(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.width, self.height);
        let s = self.cell_size;
        let grid_w = ((self.columns as f32 * s).round() as u32).min(self.width);
        let grid_h = ((self.rows as f32 * s).round() as u32).min(self.height);

        for c in 0..=self.columns {
            let x = (c as f32 * s).round() as i64;
            draw_vline(&mut img, x, 0, grid_h);
        }
        for r in 0..=self.rows {
            let y = (r as f32 * s).round() as i64;
            draw_hline(&mut img, y, 0, grid_w);
        }

        // Canvas frame
        draw_vline(&mut img, 0, 0, self.height);
        draw_vline(&mut img, self.width as i64, 0, self.height);
        draw_hline(&mut img, 0, 0, self.width);
        draw_hline(&mut img, self.height as i64, 0, self.width);

        img
    }
}

/// Index of the span along one axis that owns `v`, with spans snapped to
/// whole pixels. The arithmetic guess can be off by that rounding (by
/// several cells when `s` is below a pixel), so it is walked to the owner.
fn locate(v: f32, s: f32, count: u32, span: impl Fn(u32) -> (f32, f32)) -> Option<u32> {
    if !v.is_finite() || v < 0.0 {
        return None;
    }
    let mut i = (v / s).floor().min((count - 1) as f32) as u32;
    loop {
        let (lo, hi) = span(i);
        if v < lo.round() {
            i = i.checked_sub(1)?;
        } else if v >= hi.round() {
            i += 1;
            if i >= count {
                return None;
            }
        } else {
            return Some(i);
        }
    }
}

/// Stroke centred on `x`, spanning `y0..y1`.
fn draw_vline(img: &mut RgbaImage, x: i64, y0: u32, y1: u32) {
    let half = GRID_LINE_WIDTH / 2;
    for px in (x - half)..(x - half + GRID_LINE_WIDTH) {
        if px < 0 || px >= img.width() as i64 {
            continue;
        }
        for y in y0..y1.min(img.height()) {
            img.put_pixel(px as u32, y, GRID_LINE_COLOR);
        }
    }
}

/// Stroke centred on `y`, spanning `x0..x1`.
fn draw_hline(img: &mut RgbaImage, y: i64, x0: u32, x1: u32) {
    let half = GRID_LINE_WIDTH / 2;
    for py in (y - half)..(y - half + GRID_LINE_WIDTH) {
        if py < 0 || py >= img.height() as i64 {
            continue;
        }
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, py as u32, GRID_LINE_COLOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn cell() -> Cell {
        Cell::new(Rect::from_min_size(pos2(0.0, 0.0), vec2(8.0, 8.0)))
    }

    #[test]
    fn fresh_cell_is_sentinel_and_unused() {
        let c = cell();
        assert!(!c.is_used());
        assert!(!c.is_removed());
        assert_eq!(c.top_color(), SENTINEL);
        assert_eq!(c.depth(), 0);
    }

    #[test]
    fn undoing_every_paint_returns_to_sentinel() {
        let mut c = cell();
        let colors = [RED, BLUE, Rgba([1, 2, 3, 4]), RED];
        for color in colors {
            c.paint(color);
        }
        assert_eq!(c.top_color(), RED);
        for _ in 0..colors.len() {
            assert!(c.undo_last());
        }
        assert!(!c.is_used());
        assert_eq!(c.top_color(), SENTINEL);
        assert!(!c.undo_last());
    }

    #[test]
    fn erase_keeps_color_for_undo() {
        let mut c = cell();
        c.paint(RED);
        c.erase();
        assert!(!c.is_used());
        assert_eq!(c.top_color(), RED);
        assert_eq!(c.visible_color(), SENTINEL);

        assert!(c.undo_last());
        assert!(c.is_used());
        assert_eq!(c.visible_color(), RED);

        assert!(c.undo_last());
        assert_eq!(c.top_color(), SENTINEL);
        assert!(!c.is_used());
    }

    #[test]
    fn paint_over_erase_undoes_back_to_erased() {
        let mut c = cell();
        c.paint(RED);
        c.erase();
        c.paint(BLUE);
        assert!(c.is_used());
        assert_eq!(c.visible_color(), BLUE);

        assert!(c.undo_last());
        assert!(c.is_removed());
        assert_eq!(c.top_color(), RED);

        assert!(c.undo_last());
        assert_eq!(c.visible_color(), RED);
        assert!(c.undo_last());
        assert_eq!(c.depth(), 0);
        assert!(!c.is_removed());
    }

    #[test]
    fn mark_used_only_clears_flag() {
        let mut c = cell();
        c.paint(RED);
        c.erase();
        c.mark_used();
        assert!(c.is_used());
        assert_eq!(c.depth(), 1);
    }

    #[test]
    fn reset_drops_history() {
        let mut c = cell();
        c.paint(RED);
        c.paint(BLUE);
        c.erase();
        c.reset();
        assert_eq!(c.depth(), 0);
        assert!(!c.is_removed());
    }

    #[test]
    fn sixteen_square_grid_uses_32px_cells() {
        let grid = Grid::build(16, 16, 512, 512).unwrap();
        assert_eq!(grid.cell_size(), 32.0);
        assert_eq!(grid.cells().len(), 256);
        assert_eq!(grid.cell_at(pos2(16.0, 16.0)), Some(CellIndex::new(0, 0)));
        assert_eq!(grid.cell_at(pos2(32.0, 0.0)), Some(CellIndex::new(0, 1)));
        assert_eq!(grid.cell_at(pos2(511.9, 511.9)), Some(CellIndex::new(15, 15)));
        assert_eq!(grid.cell_at(pos2(512.0, 512.0)), None);
        assert_eq!(grid.cell_at(pos2(-0.1, 3.0)), None);
    }

    #[test]
    fn dominant_axis_sets_cell_size() {
        // More columns than rows: fit the width.
        assert_eq!(cell_size(4, 8, 400, 300), 50.0);
        // Otherwise fit the height.
        assert_eq!(cell_size(8, 4, 400, 300), 37.5);
        assert_eq!(cell_size(10, 10, 400, 300), 30.0);
    }

    #[test]
    fn margin_points_map_to_no_cell() {
        // 4 rows × 8 columns on 400×400: cells are 50px, rows stop at y=200.
        let grid = Grid::build(4, 8, 400, 400).unwrap();
        assert_eq!(grid.cell_at(pos2(10.0, 199.0)), Some(CellIndex::new(3, 0)));
        assert_eq!(grid.cell_at(pos2(10.0, 250.0)), None);
    }

    #[test]
    fn index_lookup_matches_linear_scan() {
        let grid = Grid::build(7, 3, 100, 100).unwrap();
        let scan = |p: Pos2| {
            let i = grid.cells().iter().position(|c| c.contains(p))? as u32;
            Some(CellIndex::new(i / grid.columns(), i % grid.columns()))
        };
        let mut y = 0.0;
        while y < 101.0 {
            let mut x = 0.0;
            while x < 101.0 {
                let p = pos2(x, y);
                assert_eq!(grid.cell_at(p), scan(p), "mismatch at {:?}", p);
                x += 0.7;
            }
            y += 0.7;
        }
    }

    #[test]
    fn far_and_non_finite_points_map_to_no_cell() {
        let grid = Grid::build(16, 16, 512, 512).unwrap();
        assert_eq!(grid.cell_at(pos2(1e30, 5.0)), None);
        assert_eq!(grid.cell_at(pos2(5.0, 1e30)), None);
        assert_eq!(grid.cell_at(pos2(f32::INFINITY, 5.0)), None);
        assert_eq!(grid.cell_at(pos2(5.0, f32::NEG_INFINITY)), None);
        assert_eq!(grid.cell_at(pos2(f32::NAN, 5.0)), None);
        assert_eq!(grid.cell_at(pos2(f32::MAX, f32::MAX)), None);
    }

    #[test]
    fn hits_follow_painted_pixels_on_fractional_cells() {
        // 8 rows × 4 columns on 400×300: s = 37.5, so edges fall mid-pixel.
        let grid = Grid::build(8, 4, 400, 300).unwrap();
        assert_eq!(grid.cell_at(pos2(37.6, 1.0)), Some(CellIndex::new(0, 0)));
        assert_eq!(grid.cell_at(pos2(38.0, 1.0)), Some(CellIndex::new(0, 1)));

        let (w, h) = grid.canvas_size();
        for y in 0..h {
            for x in 0..w {
                let painted_by = grid.cells().iter().position(|c| {
                    let (x0, y0, x1, y1) = c.pixel_bounds(w, h);
                    (x0..x1).contains(&x) && (y0..y1).contains(&y)
                });
                let hit = grid
                    .cell_at(pos2(x as f32 + 0.3, y as f32 + 0.7))
                    .map(|i| (i.row * grid.columns() + i.column) as usize);
                assert_eq!(hit, painted_by, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn sub_pixel_cells_still_resolve() {
        // 512×512 cells over 100px: most cells cover no pixel at all.
        let grid = Grid::build(512, 512, 100, 100).unwrap();
        let hit = grid.cell_at(pos2(50.5, 20.5)).unwrap();
        let (x0, y0, x1, y1) = grid.cell(hit).unwrap().pixel_bounds(100, 100);
        assert!(x0 <= 50 && 50 < x1);
        assert!(y0 <= 20 && 20 < y1);
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert!(matches!(
            Grid::build(0, 4, 100, 100),
            Err(EditorError::InvalidGridDimension { rows: 0, columns: 4 })
        ));
        assert!(Grid::build(4, MAX_GRID_DIM + 1, 100, 100).is_err());
        assert!(matches!(
            Grid::build(4, 4, 0, 100),
            Err(EditorError::InvalidCanvasSize { .. })
        ));
    }

    #[test]
    fn overlay_strokes_cell_edges_only() {
        let grid = Grid::build(2, 2, 64, 64).unwrap();
        let overlay = grid.render_overlay();
        assert_eq!(*overlay.get_pixel(32, 10), GRID_LINE_COLOR);
        assert_eq!(*overlay.get_pixel(31, 10), GRID_LINE_COLOR);
        assert_eq!(*overlay.get_pixel(0, 10), GRID_LINE_COLOR);
        assert_eq!(*overlay.get_pixel(63, 10), GRID_LINE_COLOR);
        assert_eq!(*overlay.get_pixel(16, 16), SENTINEL);
    }

    #[test]
    fn pixel_bounds_tile_without_gaps() {
        let grid = Grid::build(3, 3, 100, 100).unwrap();
        let (w, h) = grid.canvas_size();
        let mut covered = vec![0u8; (w * h) as usize];
        for cell in grid.cells() {
            let (x0, y0, x1, y1) = cell.pixel_bounds(w, h);
            for y in y0..y1 {
                for x in x0..x1 {
                    covered[(y * w + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&n| n == 1));
    }
}
