use eframe::egui;

/// Active tool; decides what a resolved cell does with an input sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Pencil,
    Eraser,
    ColorPicker,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[Tool::Pencil, Tool::Eraser, Tool::ColorPicker]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Eraser => "Eraser",
            Tool::ColorPicker => "Color Picker",
        }
    }

    /// Single-key shortcut shown in tooltips.
    pub fn shortcut(&self) -> egui::Key {
        match self {
            Tool::Pencil => egui::Key::P,
            Tool::Eraser => egui::Key::E,
            Tool::ColorPicker => egui::Key::I,
        }
    }

    /// Paint and erase change cells; the picker only reads them.
    pub fn mutates(&self) -> bool {
        !matches!(self, Tool::ColorPicker)
    }
}
