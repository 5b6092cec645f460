//! Visual constants for the report layout.

use genpdf::style::Color;

/// Colors, sizes and spacing used by the renderer.
///
/// All lengths are millimetres unless the field name says otherwise. The
/// theme is built once per run and never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    /// Dark blue used for inverted cells, table boxes and section headings.
    pub primary: Color,
    /// Light tint behind shaded label columns.
    pub label_tint: Color,
    /// Text color on inverted cells.
    pub inverted_text: Color,
    /// Grid line color.
    pub grid: Color,

    pub title_size: u8,
    pub subtitle_size: u8,
    pub section_heading_size: u8,
    pub header_cell_size: u8,
    pub cell_size: u8,
    pub body_size: u8,
    pub line_spacing: f64,

    pub page_margin_mm: f64,
    pub cell_padding_horizontal_mm: f64,
    pub cell_padding_vertical_mm: f64,

    /// Vertical gap after each section, in lines.
    pub section_gap_lines: f64,
    /// Gap between a section heading and its content, in lines.
    pub heading_gap_lines: f64,
    /// Rendered width of the optional logo.
    pub logo_width_mm: f64,
    /// Number of underscores in the footer rule.
    pub footer_rule_len: usize,

    /// Photo box and column width when both photos are printed side by side.
    pub photo_pair_mm: (f64, f64),
    pub photo_pair_column_mm: f64,
    /// Photo box and column width when only one photo is printed.
    pub photo_single_mm: (f64, f64),
    pub photo_single_column_mm: f64,
    pub photo_label_size: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Rgb(0x1F, 0x4E, 0x79),
            label_tint: Color::Rgb(0xE8, 0xF4, 0xFD),
            inverted_text: Color::Rgb(0xFF, 0xFF, 0xFF),
            grid: Color::Rgb(0x80, 0x80, 0x80),

            title_size: 16,
            subtitle_size: 12,
            section_heading_size: 11,
            header_cell_size: 11,
            cell_size: 10,
            body_size: 10,
            line_spacing: 1.2,

            page_margin_mm: 15.0,
            // 8pt and 6pt
            cell_padding_horizontal_mm: 2.82,
            cell_padding_vertical_mm: 2.12,

            section_gap_lines: 1.0,
            heading_gap_lines: 0.3,
            logo_width_mm: 30.0,
            footer_rule_len: 80,

            photo_pair_mm: (75.0, 50.0),
            photo_pair_column_mm: 80.0,
            photo_single_mm: (100.0, 60.0),
            photo_single_column_mm: 160.0,
            photo_label_size: 10,
        }
    }
}
