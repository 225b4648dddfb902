// ============================================================================
// COMPOSITOR — rebuild the raster purely from per-cell state
// ============================================================================
//
// The output depends only on each cell's visible color, never on the order of
// the history log. Cells never overlap, so every fill is a plain overwrite and
// drawing one cell on top of a previous render is byte-identical to a full
// recomposite of the same state.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::{Cell, Grid, SENTINEL};

/// Horizontal run of one visible cell inside a grid row.
struct Span {
    x0: usize,
    x1: usize,
    color: Rgba<u8>,
}

/// All visible spans of one grid row plus the pixel rows it covers.
struct Band {
    y0: u32,
    y1: u32,
    spans: Vec<Span>,
}

/// Full render of every cell onto a transparent canvas.
///
/// Erased cells are skipped; untouched cells would only write the
/// sentinel, so they are skipped too. Pixel rows are filled in parallel.
pub fn render(grid: &Grid) -> RgbaImage {
    let (width, height) = grid.canvas_size();
    let mut image = RgbaImage::new(width, height);

    let bands = collect_bands(grid);
    if bands.is_empty() {
        return image;
    }

    // Map each pixel row to the band that covers it.
    let mut band_of_row: Vec<Option<usize>> = vec![None; height as usize];
    for (i, band) in bands.iter().enumerate() {
        for y in band.y0..band.y1 {
            band_of_row[y as usize] = Some(i);
        }
    }

    let stride = width as usize * 4;
    let raw: &mut [u8] = &mut image;
    raw.par_chunks_mut(stride)
        .zip(band_of_row.par_iter())
        .for_each(|(row, band)| {
            if let Some(band) = band {
                for span in &bands[*band].spans {
                    fill_row(row, span.x0, span.x1, span.color);
                }
            }
        });

    image
}

/// Overwrite the pixels of a single cell with its visible color.
pub fn draw_cell(image: &mut RgbaImage, cell: &Cell) {
    let (x0, y0, x1, y1) = cell.pixel_bounds(image.width(), image.height());
    let color = cell.visible_color();
    let stride = image.width() as usize * 4;
    let raw: &mut [u8] = image;
    for y in y0..y1 {
        let row = &mut raw[y as usize * stride..(y as usize + 1) * stride];
        fill_row(row, x0 as usize, x1 as usize, color);
    }
}

/// Alpha-blend the grid overlay on top of a rendered image.
pub fn with_overlay(image: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    image::imageops::overlay(&mut out, overlay, 0, 0);
    out
}

fn collect_bands(grid: &Grid) -> Vec<Band> {
    let (width, height) = grid.canvas_size();
    let columns = grid.columns() as usize;

    grid.cells()
        .chunks(columns)
        .filter_map(|row| {
            let (_, y0, _, y1) = row.first()?.pixel_bounds(width, height);
            let spans: Vec<Span> = row
                .iter()
                .filter(|cell| cell.visible_color() != SENTINEL)
                .map(|cell| {
                    let (x0, _, x1, _) = cell.pixel_bounds(width, height);
                    Span {
                        x0: x0 as usize,
                        x1: x1 as usize,
                        color: cell.visible_color(),
                    }
                })
                .collect();
            (!spans.is_empty() && y1 > y0).then_some(Band { y0, y1, spans })
        })
        .collect()
}

fn fill_row(row: &mut [u8], x0: usize, x1: usize, color: Rgba<u8>) {
    for px in row[x0 * 4..x1 * 4].chunks_exact_mut(4) {
        px.copy_from_slice(&color.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::CellIndex;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 128]);

    fn grid() -> Grid {
        Grid::build(4, 4, 40, 40).unwrap()
    }

    #[test]
    fn empty_grid_renders_transparent() {
        let img = render(&grid());
        assert_eq!(img.dimensions(), (40, 40));
        assert!(img.pixels().all(|p| *p == SENTINEL));
    }

    #[test]
    fn painted_cell_fills_its_bounds() {
        let mut g = grid();
        g.cell_mut(CellIndex::new(1, 2)).unwrap().paint(GREEN);
        let img = render(&g);
        assert_eq!(*img.get_pixel(20, 10), GREEN);
        assert_eq!(*img.get_pixel(29, 19), GREEN);
        assert_eq!(*img.get_pixel(30, 10), SENTINEL);
        assert_eq!(*img.get_pixel(19, 10), SENTINEL);
    }

    #[test]
    fn erased_cell_is_not_drawn() {
        let mut g = grid();
        let cell = g.cell_mut(CellIndex::new(0, 0)).unwrap();
        cell.paint(RED);
        cell.erase();
        assert!(render(&g).pixels().all(|p| *p == SENTINEL));
    }

    #[test]
    fn output_depends_only_on_end_state() {
        let mut a = grid();
        let c = a.cell_mut(CellIndex::new(2, 2)).unwrap();
        c.paint(GREEN);
        c.paint(RED);
        let c = a.cell_mut(CellIndex::new(3, 0)).unwrap();
        c.paint(GREEN);
        c.erase();

        let mut b = grid();
        b.cell_mut(CellIndex::new(2, 2)).unwrap().paint(RED);

        assert_eq!(render(&a).as_raw(), render(&b).as_raw());
    }

    #[test]
    fn incremental_draw_matches_full_render() {
        let mut g = grid();
        g.cell_mut(CellIndex::new(0, 1)).unwrap().paint(RED);
        let mut img = render(&g);

        let idx = CellIndex::new(0, 1);
        g.cell_mut(idx).unwrap().paint(GREEN);
        draw_cell(&mut img, g.cell(idx).unwrap());

        assert_eq!(img.as_raw(), render(&g).as_raw());
    }

    #[test]
    fn margin_stays_transparent() {
        // 2 rows × 4 columns on 40×40 leaves the lower half uncovered.
        let mut g = Grid::build(2, 4, 40, 40).unwrap();
        for row in 0..2 {
            for column in 0..4 {
                g.cell_mut(CellIndex::new(row, column)).unwrap().paint(RED);
            }
        }
        let img = render(&g);
        assert_eq!(*img.get_pixel(5, 19), RED);
        assert_eq!(*img.get_pixel(5, 20), SENTINEL);
    }

    #[test]
    fn overlay_blends_on_top() {
        let g = grid();
        let out = with_overlay(&render(&g), &g.render_overlay());
        assert_eq!(out.get_pixel(10, 5)[3], 255);
        assert_eq!(*out.get_pixel(5, 5), SENTINEL);
    }
}
