//! PixelGrid — grid-based pixel raster editor.
//!
//! The core is a fixed grid of cells, each holding its own color history,
//! an action log that drives undo, and a compositor that rebuilds the final
//! raster purely from per-cell state. The egui front-end and the headless
//! CLI sit on top of [`editor::Editor`].

#[macro_use]
pub mod logger;
pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod compositor;
pub mod editor;
pub mod io;
pub mod project;
pub mod settings;

pub use canvas::{Cell, CellIndex, Grid, SENTINEL};
pub use editor::{ActionOutcome, Editor, EditorError};
pub use components::history::PixelPath;
pub use components::tools::Tool;
