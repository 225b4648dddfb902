// ============================================================================
// DIALOG HELPERS — resize text input and destructive-action confirmation
// ============================================================================

/// Parse the grid-size field. Accepts `"rows, columns"`, `"rows x columns"`
/// or `"rows×columns"`; a single number means a square grid.
pub fn parse_grid_size(text: &str) -> Result<(u32, u32), String> {
    let normalized = text.trim().to_lowercase().replace('×', "x");
    let parts: Vec<&str> = normalized
        .split([',', 'x'])
        .map(str::trim)
        .collect();

    let number = |s: &str| {
        s.parse::<u32>()
            .map_err(|_| format!("'{}' is not a whole number", s))
    };

    match parts.as_slice() {
        [n] if !n.is_empty() => {
            let n = number(n)?;
            Ok((n, n))
        }
        [rows, columns] => Ok((number(rows)?, number(columns)?)),
        _ => Err(format!("expected \"rows, columns\", got '{}'", text.trim())),
    }
}

/// Actions that wipe state and need an explicit yes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Trash: clear every cell at the current size.
    Clear,
    /// Rebuild the grid at a new size.
    Resize { rows: u32, columns: u32 },
}

impl ConfirmAction {
    pub fn title(&self) -> &'static str {
        match self {
            ConfirmAction::Clear => "Trash",
            ConfirmAction::Resize { .. } => "Resize Grid",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ConfirmAction::Clear => {
                "Are you sure you want to clear the pixel editor? Image will not be saved."
                    .to_string()
            }
            ConfirmAction::Resize { rows, columns } => format!(
                "Rebuild the grid as {}×{}? The current drawing and its undo history will be lost.",
                rows, columns
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_separators() {
        assert_eq!(parse_grid_size("16, 16"), Ok((16, 16)));
        assert_eq!(parse_grid_size("8x32"), Ok((8, 32)));
        assert_eq!(parse_grid_size(" 4 × 6 "), Ok((4, 6)));
        assert_eq!(parse_grid_size("12"), Ok((12, 12)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_grid_size("").is_err());
        assert!(parse_grid_size("a, 4").is_err());
        assert!(parse_grid_size("1,2,3").is_err());
        assert!(parse_grid_size("-1, 4").is_err());
    }

    #[test]
    fn resize_message_names_dimensions() {
        let msg = ConfirmAction::Resize { rows: 3, columns: 5 }.message();
        assert!(msg.contains("3×5"));
    }
}
