//! Positional color assignment for multi-series charts.

use crate::domain::Color;

/// Fixed, high-contrast series palette. Colors cycle when there are more
/// series than entries.
pub const PALETTE: [Color; 10] = [
    Color::rgb(59, 130, 246),  // blue
    Color::rgb(239, 68, 68),   // red
    Color::rgb(16, 185, 129),  // emerald
    Color::rgb(245, 158, 11),  // amber
    Color::rgb(139, 92, 246),  // violet
    Color::rgb(236, 72, 153),  // pink
    Color::rgb(20, 184, 166),  // teal
    Color::rgb(249, 115, 22),  // orange
    Color::rgb(99, 102, 241),  // indigo
    Color::rgb(132, 204, 22),  // lime
];

/// Color for the series at `position`.
pub fn color_at(position: usize) -> Color {
    PALETTE[position % PALETTE.len()]
}

/// Colors for an ordered list of entities (identity is positional).
pub fn assign_colors(entities: &[String]) -> Vec<Color> {
    (0..entities.len()).map(color_at).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_cycle_by_position() {
        let entities: Vec<String> = (0..12).map(|i| format!("E{i}")).collect();
        let colors = assign_colors(&entities);
        assert_eq!(colors.len(), 12);
        assert_eq!(colors[0], PALETTE[0]);
        assert_eq!(colors[10], PALETTE[0]);
        assert_eq!(colors[11], PALETTE[1]);
    }

    #[test]
    fn palette_entries_are_distinct() {
        for (i, a) in PALETTE.iter().enumerate() {
            for b in &PALETTE[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
