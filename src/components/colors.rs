use eframe::egui::Color32;
use image::Rgba;

// ============================================================================
// PALETTE
// ============================================================================

/// Preset swatches shown beside the RGBA sliders.
pub const DEFAULT_SWATCHES: [Rgba<u8>; 16] = [
    Rgba([0, 0, 0, 255]),
    Rgba([255, 255, 255, 255]),
    Rgba([128, 128, 128, 255]),
    Rgba([192, 192, 192, 255]),
    Rgba([255, 0, 0, 255]),
    Rgba([255, 128, 0, 255]),
    Rgba([255, 255, 0, 255]),
    Rgba([128, 255, 0, 255]),
    Rgba([0, 192, 0, 255]),
    Rgba([0, 255, 255, 255]),
    Rgba([0, 128, 255, 255]),
    Rgba([0, 0, 255, 255]),
    Rgba([128, 0, 255, 255]),
    Rgba([255, 0, 255, 255]),
    Rgba([128, 64, 0, 255]),
    Rgba([255, 192, 203, 255]),
];

/// Swatch grid plus a short list of recently used colors.
#[derive(Clone, Debug)]
pub struct Palette {
    swatches: Vec<Rgba<u8>>,
    recent: Vec<Rgba<u8>>,
}

const MAX_RECENT: usize = 8;

impl Default for Palette {
    fn default() -> Self {
        Self {
            swatches: DEFAULT_SWATCHES.to_vec(),
            recent: Vec::new(),
        }
    }
}

impl Palette {
    pub fn swatches(&self) -> &[Rgba<u8>] {
        &self.swatches
    }

    /// Most recent first.
    pub fn recent(&self) -> &[Rgba<u8>] {
        &self.recent
    }

    /// Move `color` to the front of the recent list.
    pub fn touch(&mut self, color: Rgba<u8>) {
        self.recent.retain(|c| *c != color);
        self.recent.insert(0, color);
        self.recent.truncate(MAX_RECENT);
    }
}

pub fn to_color32(c: Rgba<u8>) -> Color32 {
    Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3])
}

/// `#RRGGBBAA`
pub fn to_hex(c: Rgba<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}{:02X}", c[0], c[1], c[2], c[3])
}

/// Accepts `#RRGGBB` or `#RRGGBBAA`, with or without the leading `#`.
pub fn parse_hex(s: &str) -> Option<Rgba<u8>> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    match s.len() {
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

/// `r,g,b,a` as used by the settings file.
pub fn to_csv(c: Rgba<u8>) -> String {
    format!("{},{},{},{}", c[0], c[1], c[2], c[3])
}

pub fn parse_csv(s: &str) -> Option<Rgba<u8>> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return None;
    }
    let mut out = [0u8; 4];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part.trim().parse().ok()?;
    }
    Some(Rgba(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_accepts_both_lengths() {
        assert_eq!(parse_hex("#ff8000"), Some(Rgba([255, 128, 0, 255])));
        assert_eq!(parse_hex("00000080"), Some(Rgba([0, 0, 0, 128])));
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gg0000"), None);
        assert_eq!(to_hex(Rgba([1, 2, 3, 4])), "#01020304");
    }

    #[test]
    fn csv_needs_four_bytes() {
        assert_eq!(parse_csv("10, 20,30,40"), Some(Rgba([10, 20, 30, 40])));
        assert_eq!(parse_csv("10,20,30"), None);
        assert_eq!(parse_csv("10,20,30,400"), None);
        assert_eq!(parse_csv(&to_csv(Rgba([9, 8, 7, 6]))), Some(Rgba([9, 8, 7, 6])));
    }

    #[test]
    fn recent_colors_dedupe_and_cap() {
        let mut p = Palette::default();
        for i in 0..10u8 {
            p.touch(Rgba([i, 0, 0, 255]));
        }
        p.touch(Rgba([5, 0, 0, 255]));
        assert_eq!(p.recent().len(), MAX_RECENT);
        assert_eq!(p.recent()[0], Rgba([5, 0, 0, 255]));
        assert_eq!(p.recent().iter().filter(|c| c[0] == 5).count(), 1);
    }
}
