//! End-to-end editing scenarios through the public editor API:
//! - paint / erase / undo sequences across several cells
//! - reset semantics
//! - render determinism across different histories

use eframe::egui::pos2;
use image::Rgba;
use pixelgrid::{ActionOutcome, CellIndex, Editor, SENTINEL, Tool};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const HALF_GREEN: Rgba<u8> = Rgba([0, 200, 0, 100]);

/// 16×16 grid on 512×512: every cell is 32px.
fn editor() -> Editor {
    Editor::new(16, 16, 512, 512).unwrap()
}

fn paint(ed: &mut Editor, x: f32, y: f32, color: Rgba<u8>) -> ActionOutcome {
    ed.set_tool(Tool::Pencil);
    ed.set_current_color(color);
    ed.apply_at(pos2(x, y))
}

fn erase(ed: &mut Editor, x: f32, y: f32) -> ActionOutcome {
    ed.set_tool(Tool::Eraser);
    ed.apply_at(pos2(x, y))
}

fn cell(ed: &Editor, row: u32, column: u32) -> &pixelgrid::Cell {
    ed.grid().cell(CellIndex::new(row, column)).unwrap()
}

#[test]
fn paint_paint_erase_then_three_undos_restores_blank() {
    let mut ed = editor();
    assert_eq!(paint(&mut ed, 10.0, 10.0, RED), ActionOutcome::Painted);
    assert_eq!(paint(&mut ed, 50.0, 10.0, BLUE), ActionOutcome::Painted);
    assert_eq!(erase(&mut ed, 10.0, 10.0), ActionOutcome::Erased);
    assert_eq!(ed.history_len(), 3);

    assert!(ed.undo());
    assert_eq!(cell(&ed, 0, 0).visible_color(), RED);
    assert!(ed.undo());
    assert!(!cell(&ed, 0, 1).is_used());
    assert!(ed.undo());

    assert!(!ed.undo());
    assert_eq!(ed.history_len(), 0);
    for c in ed.grid().cells() {
        assert!(!c.is_used());
        assert_eq!(c.top_color(), SENTINEL);
    }
    assert!(ed.image().pixels().all(|p| *p == SENTINEL));
}

#[test]
fn undo_walks_back_a_color_stack() {
    let mut ed = editor();
    let colors = [RED, BLUE, HALF_GREEN, RED];
    for color in colors {
        paint(&mut ed, 100.0, 100.0, color);
    }
    assert_eq!(cell(&ed, 3, 3).depth(), colors.len());

    for expected in [HALF_GREEN, BLUE, RED, SENTINEL] {
        ed.undo();
        assert_eq!(cell(&ed, 3, 3).top_color(), expected);
    }
    assert!(!cell(&ed, 3, 3).is_used());
}

#[test]
fn erase_undo_undo_equals_never_painted_modulo_earlier_colors() {
    let mut ed = editor();
    paint(&mut ed, 5.0, 5.0, RED);
    paint(&mut ed, 5.0, 5.0, BLUE);
    erase(&mut ed, 5.0, 5.0);

    ed.undo();
    assert_eq!(cell(&ed, 0, 0).visible_color(), BLUE);
    assert!(!cell(&ed, 0, 0).is_removed());

    ed.undo();
    assert_eq!(cell(&ed, 0, 0).visible_color(), RED);
    assert_eq!(*ed.image().get_pixel(5, 5), RED);
}

#[test]
fn painting_over_an_erase_undoes_cleanly() {
    let mut ed = editor();
    paint(&mut ed, 5.0, 5.0, RED);
    erase(&mut ed, 5.0, 5.0);
    paint(&mut ed, 5.0, 5.0, RED);
    assert_eq!(ed.history_len(), 3);

    ed.undo();
    assert!(cell(&ed, 0, 0).is_removed());
    assert_eq!(*ed.image().get_pixel(5, 5), SENTINEL);
    ed.undo();
    assert_eq!(*ed.image().get_pixel(5, 5), RED);
    ed.undo();
    assert_eq!(cell(&ed, 0, 0).depth(), 0);
    assert!(!ed.can_undo());
}

#[test]
fn same_color_on_used_cell_is_not_recorded() {
    let mut ed = editor();
    paint(&mut ed, 5.0, 5.0, RED);
    assert_eq!(paint(&mut ed, 20.0, 20.0, RED), ActionOutcome::Unchanged);
    assert_eq!(ed.history_len(), 1);
}

#[test]
fn identical_end_states_render_identically() {
    let mut a = editor();
    paint(&mut a, 5.0, 5.0, BLUE);
    paint(&mut a, 5.0, 5.0, RED);
    paint(&mut a, 200.0, 40.0, HALF_GREEN);
    paint(&mut a, 300.0, 300.0, BLUE);
    erase(&mut a, 300.0, 300.0);

    let mut b = editor();
    paint(&mut b, 200.0, 40.0, HALF_GREEN);
    paint(&mut b, 5.0, 5.0, RED);

    assert_ne!(a.history_len(), b.history_len());
    assert_eq!(a.image().as_raw(), b.image().as_raw());
    assert_eq!(
        pixelgrid::compositor::render(a.grid()).as_raw(),
        b.image().as_raw()
    );
}

#[test]
fn reset_clears_everything() {
    let mut ed = editor();
    paint(&mut ed, 5.0, 5.0, RED);
    paint(&mut ed, 70.0, 5.0, BLUE);
    erase(&mut ed, 70.0, 5.0);

    ed.reset(16, 16).unwrap();
    assert_eq!(ed.history_len(), 0);
    assert!(ed.grid().cells().iter().all(|c| c.depth() == 0 && !c.is_removed()));
    assert!(ed.image().pixels().all(|p| *p == SENTINEL));
}

#[test]
fn clear_keeps_dimensions() {
    let mut ed = Editor::new(4, 8, 400, 400).unwrap();
    paint(&mut ed, 5.0, 5.0, RED);
    ed.clear();
    assert_eq!((ed.grid().rows(), ed.grid().columns()), (4, 8));
    assert_eq!(ed.history_len(), 0);
}

#[test]
fn margin_clicks_are_silent_noops() {
    // 4 rows × 8 columns on a square canvas leaves the bottom half uncovered.
    let mut ed = Editor::new(4, 8, 400, 400).unwrap();
    assert_eq!(paint(&mut ed, 10.0, 300.0, RED), ActionOutcome::OutOfBounds);
    assert_eq!(erase(&mut ed, 10.0, 300.0), ActionOutcome::OutOfBounds);
    assert_eq!(ed.history_len(), 0);
}

#[test]
fn snapshot_is_detached_from_later_edits() {
    let mut ed = editor();
    paint(&mut ed, 5.0, 5.0, RED);
    let snap = ed.snapshot();
    erase(&mut ed, 5.0, 5.0);
    assert_eq!(*snap.get_pixel(5, 5), RED);
    assert_eq!(*ed.image().get_pixel(5, 5), SENTINEL);
}
