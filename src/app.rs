use std::path::PathBuf;
use std::sync::mpsc::{Receiver, channel};

use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, Sense, TextureHandle, TextureOptions, pos2, vec2};
use image::{Rgba, RgbaImage};
use uuid::Uuid;

use crate::components::colors::{Palette, parse_hex, to_color32, to_hex};
use crate::components::dialogs::{ConfirmAction, parse_grid_size};
use crate::components::tools::Tool;
use crate::editor::ActionOutcome;
use crate::io;
use crate::project::Project;
use crate::settings::AppSettings;

const SWATCH_SIZE: f32 = 22.0;
const PREVIEW_SIZE: f32 = 128.0;

/// Thin egui shell around one [`Project`]. All editing goes through the
/// project's editor; this type only maps input and presents images.
pub struct PixelGridApp {
    project: Project,
    settings: AppSettings,
    untitled_counter: usize,
    palette: Palette,
    resize_text: String,
    hex_text: String,
    pending_confirm: Option<ConfirmAction>,
    status: String,
    last_title: String,

    canvas_texture: Option<TextureHandle>,
    /// (project, generation) currently uploaded to `canvas_texture`.
    canvas_key: Option<(Uuid, u64)>,
    overlay_texture: Option<TextureHandle>,
    overlay_key: Option<(Uuid, u64)>,

    /// Results of background PNG exports.
    export_rx: Option<Receiver<Result<PathBuf, String>>>,
}

impl PixelGridApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self::with_settings(AppSettings::load())
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        let project = match Project::new_untitled(1, &settings) {
            Ok(p) => p,
            Err(e) => {
                log_err!("Settings describe an invalid grid ({}), using defaults", e);
                Project::new_untitled(1, &AppSettings::default())
                    .expect("default settings always build a valid grid")
            }
        };
        let resize_text = format!(
            "{}, {}",
            project.editor.grid().rows(),
            project.editor.grid().columns()
        );
        let hex_text = to_hex(project.editor.current_color());

        Self {
            project,
            settings,
            untitled_counter: 1,
            palette: Palette::default(),
            resize_text,
            hex_text,
            pending_confirm: None,
            status: String::new(),
            last_title: String::new(),
            canvas_texture: None,
            canvas_key: None,
            overlay_texture: None,
            overlay_key: None,
            export_rx: None,
        }
    }

    // ---- actions ------------------------------------------------------------

    fn undo(&mut self) {
        if self.project.editor.undo() {
            self.project.mark_dirty();
        }
    }

    fn request_clear(&mut self) {
        if self.settings.confirm_on_clear && self.project.editor.can_undo() {
            self.pending_confirm = Some(ConfirmAction::Clear);
        } else {
            self.apply_confirmed(ConfirmAction::Clear);
        }
    }

    fn submit_resize(&mut self) {
        match parse_grid_size(&self.resize_text) {
            Ok((rows, columns)) => {
                let action = ConfirmAction::Resize { rows, columns };
                if self.project.editor.can_undo() {
                    self.pending_confirm = Some(action);
                } else {
                    self.apply_confirmed(action);
                }
            }
            Err(e) => self.status = format!("Grid size: {}", e),
        }
    }

    fn apply_confirmed(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::Clear => {
                self.project.editor.clear();
                self.project.mark_dirty();
                self.status = "Cleared".to_string();
            }
            ConfirmAction::Resize { rows, columns } => {
                match self.project.editor.reset(rows, columns) {
                    Ok(()) => {
                        self.project.mark_dirty();
                        self.status = format!("Grid is now {}×{}", rows, columns);
                    }
                    Err(e) => self.status = e.to_string(),
                }
            }
        }
    }

    fn submit_hex(&mut self) {
        match parse_hex(&self.hex_text) {
            Some(color) => {
                self.project.editor.set_current_color(color);
                self.hex_text = to_hex(color);
            }
            None => self.status = format!("Not a hex color: '{}'", self.hex_text.trim()),
        }
    }

    fn new_document(&mut self) {
        self.untitled_counter += 1;
        match Project::new_untitled(self.untitled_counter, &self.settings) {
            Ok(p) => self.replace_project(p),
            Err(e) => self.status = e.to_string(),
        }
    }

    fn replace_project(&mut self, project: Project) {
        self.resize_text = format!(
            "{}, {}",
            project.editor.grid().rows(),
            project.editor.grid().columns()
        );
        self.project = project;
        self.pending_confirm = None;
    }

    fn open_project(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PixelGrid project", &["pxg"])
            .pick_file()
        else {
            return;
        };
        match Project::from_file(path) {
            Ok(p) => {
                self.status = format!("Opened {}", p.name);
                self.replace_project(p);
            }
            Err(e) => {
                log_err!("Open failed: {}", e);
                self.status = format!("Open failed: {}", e);
            }
        }
    }

    fn save_project(&mut self) {
        let path = match &self.project.path {
            Some(p) => p.clone(),
            None => {
                let Some(p) = rfd::FileDialog::new()
                    .add_filter("PixelGrid project", &["pxg"])
                    .set_file_name(format!("{}.pxg", self.project.name))
                    .save_file()
                else {
                    return;
                };
                p
            }
        };
        match self.project.save_as(path) {
            Ok(()) => self.status = format!("Saved {}", self.project.name),
            Err(e) => {
                log_err!("Project save failed: {}", e);
                self.status = format!("Save failed: {}", e);
            }
        }
    }

    /// Render-then-hand-off: the export thread only ever sees a snapshot.
    fn export_png(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name("pixel-art.png")
            .save_file()
        else {
            return;
        };
        let snapshot: RgbaImage = self.project.editor.snapshot();
        let (tx, rx) = channel();
        rayon::spawn(move || {
            let result = io::export_png(&snapshot, &path)
                .map(|_| path)
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
        });
        self.export_rx = Some(rx);
        self.status = "Saving image…".to_string();
    }

    fn copy_image(&mut self) {
        match io::copy_to_clipboard(&self.project.editor.snapshot()) {
            Ok(()) => self.status = "Copied to clipboard".to_string(),
            Err(e) => {
                log_warn!("{}", e);
                self.status = e.to_string();
            }
        }
    }

    fn poll_export(&mut self) {
        let Some(rx) = &self.export_rx else { return };
        if let Ok(result) = rx.try_recv() {
            self.status = match result {
                Ok(path) => format!("Saved {}", path.display()),
                Err(e) => {
                    log_err!("PNG export failed: {}", e);
                    format!("Export failed: {}", e)
                }
            };
            self.export_rx = None;
        }
    }

    fn after_action(&mut self, outcome: ActionOutcome) {
        if outcome.redraws() {
            self.project.mark_dirty();
        }
        match outcome {
            ActionOutcome::Painted => self.palette.touch(self.project.editor.current_color()),
            ActionOutcome::Picked(color) => {
                self.palette.touch(color);
                self.status = format!("Picked {}", to_hex(color));
            }
            _ => {}
        }
    }

    // ---- presentation -------------------------------------------------------

    fn sync_textures(&mut self, ctx: &egui::Context) {
        let editor = &self.project.editor;

        let key = (self.project.id, editor.generation());
        if self.canvas_key != Some(key) {
            let img = to_color_image(editor.image());
            if let Some(tex) = self.canvas_texture.as_mut() {
                tex.set(img, TextureOptions::NEAREST);
            } else {
                self.canvas_texture =
                    Some(ctx.load_texture("canvas", img, TextureOptions::NEAREST));
            }
            self.canvas_key = Some(key);
        }

        let key = (self.project.id, editor.layout_generation());
        if self.overlay_key != Some(key) {
            let img = to_color_image(editor.overlay());
            if let Some(tex) = self.overlay_texture.as_mut() {
                tex.set(img, TextureOptions::LINEAR);
            } else {
                self.overlay_texture = Some(ctx.load_texture("grid", img, TextureOptions::LINEAR));
            }
            self.overlay_key = Some(key);
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (undo, tool) = ctx.input(|i| {
            let undo = i.modifiers.command && i.key_pressed(egui::Key::Z);
            let tool = Tool::all()
                .iter()
                .copied()
                .find(|t| !i.modifiers.command && i.key_pressed(t.shortcut()));
            (undo, tool)
        });
        if undo {
            self.undo();
        }
        if let Some(tool) = tool {
            self.project.editor.set_tool(tool);
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("New").clicked() {
                self.new_document();
            }
            if ui.button("Open…").clicked() {
                self.open_project();
            }
            if ui.button("Save Project").clicked() {
                self.save_project();
            }
            ui.separator();

            for &tool in Tool::all() {
                let selected = self.project.editor.tool() == tool;
                if ui
                    .selectable_label(selected, tool.label())
                    .on_hover_text(format!("Shortcut: {:?}", tool.shortcut()))
                    .clicked()
                {
                    self.project.editor.set_tool(tool);
                }
            }
            ui.separator();

            if ui
                .add_enabled(self.project.editor.can_undo(), egui::Button::new("Undo"))
                .clicked()
            {
                self.undo();
            }
            if ui.button("Trash").clicked() {
                self.request_clear();
            }
            ui.separator();

            ui.label("Grid:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.resize_text).desired_width(72.0),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                self.submit_resize();
            }
            if ui.checkbox(&mut self.settings.show_grid, "Show grid").changed() {
                self.settings.save();
            }
            ui.separator();

            if ui.button("Save PNG…").clicked() {
                self.export_png();
            }
            if ui.button("Copy").clicked() {
                self.copy_image();
            }
        });
    }

    fn colors_panel(&mut self, ui: &mut egui::Ui) {
        let mut color = self.project.editor.current_color();
        let mut changed = false;

        ui.heading("Color");
        let (rect, _) = ui.allocate_exact_size(vec2(PREVIEW_SIZE, 28.0), Sense::hover());
        ui.painter().rect_filled(rect, 4.0, to_color32(color));
        ui.horizontal(|ui| {
            ui.label("Hex");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.hex_text)
                    .font(egui::TextStyle::Monospace)
                    .desired_width(90.0),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                self.submit_hex();
                color = self.project.editor.current_color();
            } else if !response.has_focus() {
                self.hex_text = to_hex(color);
            }
        });

        for (i, name) in ["R", "G", "B", "A"].iter().enumerate() {
            changed |= ui
                .add(egui::Slider::new(&mut color.0[i], 0..=255).text(*name))
                .changed();
        }

        ui.separator();
        egui::Grid::new("palette")
            .spacing(vec2(4.0, 4.0))
            .show(ui, |ui| {
                for (i, swatch) in self.palette.swatches().iter().enumerate() {
                    if swatch_button(ui, *swatch).clicked() {
                        color = *swatch;
                        changed = true;
                    }
                    if i % 4 == 3 {
                        ui.end_row();
                    }
                }
            });

        if !self.palette.recent().is_empty() {
            ui.label("Recent");
            ui.horizontal_wrapped(|ui| {
                for recent in self.palette.recent() {
                    if swatch_button(ui, *recent).clicked() {
                        color = *recent;
                        changed = true;
                    }
                }
            });
        }

        if changed {
            self.project.editor.set_current_color(color);
        }

        ui.separator();
        ui.label("Preview");
        let (rect, _) = ui.allocate_exact_size(vec2(PREVIEW_SIZE, PREVIEW_SIZE), Sense::hover());
        ui.painter().rect_filled(rect, 0.0, Color32::from_gray(30));
        if let Some(tex) = &self.canvas_texture {
            let target = fit_rect(rect, self.canvas_aspect());
            ui.painter().image(tex.id(), target, full_uv(), Color32::WHITE);
        }
    }

    fn canvas_aspect(&self) -> f32 {
        let (w, h) = self.project.editor.grid().canvas_size();
        w as f32 / h as f32
    }

    fn canvas_view(&mut self, ui: &mut egui::Ui) {
        let (cw, ch) = self.project.editor.grid().canvas_size();
        let avail = ui.available_size();
        let scale = (avail.x / cw as f32).min(avail.y / ch as f32).max(0.05);
        let size = vec2(cw as f32 * scale, ch as f32 * scale);

        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, Color32::from_gray(24));
        if let Some(tex) = &self.canvas_texture {
            painter.image(tex.id(), rect, full_uv(), Color32::WHITE);
        }
        if self.settings.show_grid
            && let Some(tex) = &self.overlay_texture
        {
            painter.image(tex.id(), rect, full_uv(), Color32::WHITE);
        }

        if response.hovered() {
            let icon = if self.project.editor.tool().mutates() {
                egui::CursorIcon::Crosshair
            } else {
                egui::CursorIcon::Cell
            };
            ui.ctx().set_cursor_icon(icon);
        }

        // Screen → canvas is a plain scale + offset.
        let to_canvas = |p: Pos2| pos2((p.x - rect.min.x) / scale, (p.y - rect.min.y) / scale);

        let (pressed, released) =
            ui.input(|i| (i.pointer.primary_pressed(), i.pointer.primary_released()));
        if pressed && response.hovered() {
            self.project.editor.begin_stroke();
        }
        if self.project.editor.in_stroke()
            && response.is_pointer_button_down_on()
            && let Some(p) = response.interact_pointer_pos()
        {
            let outcome = self.project.editor.stroke_to(to_canvas(p));
            self.after_action(outcome);
        }
        if released {
            self.project.editor.end_stroke();
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        let grid = self.project.editor.grid();
        ui.horizontal(|ui| {
            ui.label(format!(
                "{}×{} cells · {:.1}px · {} undo steps",
                grid.rows(),
                grid.columns(),
                grid.cell_size(),
                self.project.editor.history_len()
            ));
            if !self.status.is_empty() {
                ui.separator();
                ui.label(&self.status);
            }
        });
    }

    fn confirm_window(&mut self, ctx: &egui::Context) {
        let Some(action) = self.pending_confirm else { return };
        let mut decision = None;
        egui::Window::new(action.title())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(action.message());
                ui.horizontal(|ui| {
                    if ui.button("Yes").clicked() {
                        decision = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                });
            });
        if let Some(yes) = decision {
            self.pending_confirm = None;
            if yes {
                self.apply_confirmed(action);
            }
        }
    }
}

impl eframe::App for PixelGridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_export();
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));

        // Texture deltas apply at end of frame, so uploading after input
        // still shows this frame's edits.
        egui::SidePanel::right("colors")
            .resizable(false)
            .show(ctx, |ui| self.colors_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.canvas_view(ui));
        self.sync_textures(ctx);

        self.confirm_window(ctx);

        let title = format!("{} — PixelGrid", self.project.display_title());
        if title != self.last_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.last_title = title;
        }
        if self.export_rx.is_some() {
            ctx.request_repaint();
        }
    }
}

fn swatch_button(ui: &mut egui::Ui, color: Rgba<u8>) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(vec2(SWATCH_SIZE, SWATCH_SIZE), Sense::click());
    ui.painter().rect_filled(rect, 3.0, to_color32(color));
    ui.painter()
        .rect_stroke(rect, 3.0, egui::Stroke::new(1.0, Color32::GRAY));
    response.on_hover_text(to_hex(color))
}

fn to_color_image(img: &RgbaImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied([img.width() as usize, img.height() as usize], img.as_raw())
}

fn full_uv() -> Rect {
    Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0))
}

/// Largest rect with `aspect` (w / h) centred inside `outer`.
fn fit_rect(outer: Rect, aspect: f32) -> Rect {
    let (w, h) = if outer.width() / outer.height() > aspect {
        (outer.height() * aspect, outer.height())
    } else {
        (outer.width(), outer.width() / aspect)
    };
    Rect::from_center_size(outer.center(), vec2(w, h))
}
