//! Generates the "Laporan Kejadian dan Gangguan" incident report as a PDF.
//!
//! The pipeline is record → [`assembler::assemble`] → [`render::Renderer`]:
//! an [`record::IncidentRecord`] is mapped onto a fixed [`model::Report`]
//! layout and laid out with `genpdf`.

pub mod assembler;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod model;
pub mod record;
pub mod render;
pub mod richtext;
pub mod style;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

use std::path::PathBuf;

use chrono::NaiveDateTime;

pub use crate::config::ReportConfig;
pub use crate::error::ReportError;
pub use crate::record::IncidentRecord;

/// Assembles, renders and writes the report for `record`.
///
/// Returns the absolute path of the written file.
pub fn generate(
    record: &IncidentRecord,
    config: &ReportConfig,
    generated_at: NaiveDateTime,
) -> Result<PathBuf, ReportError> {
    let fonts = fonts::load_report_fonts(config.fonts_dir()).map_err(ReportError::Fonts)?;
    let report = assembler::assemble(record, generated_at);
    let renderer = render::Renderer::new(config.theme.clone(), fonts)
        .with_logo(config.logo_path.clone())
        .with_photos_dir(config.photos_dir());
    renderer.write_report(&report, &config.output_path)
}
