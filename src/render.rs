//! Turns an assembled [`Report`] into PDF bytes and files.

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use genpdf::elements::{Break, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{Font, FontFamily};
use genpdf::style::Style;
use genpdf::{Alignment, Element, Margins, PageDecorator, PaperSize, Size};
use log::{debug, warn};

use crate::config::DEFAULT_PHOTOS_DIR;
use crate::elements::{
    logo_image, mm_from_f64, mm_to_f64, to_alignment, CaptionedPhoto, JustifiedText, PhotoRow,
    ReportTable, TableCell,
};
use crate::error::ReportError;
use crate::fonts::ReportFonts;
use crate::model::{
    HorizontalAlignment, PhotoBlock, PhotoSlot, Report, ReportSection, RichParagraph,
    SectionContent, TableBlock, TableBorder, TableShading,
};
use crate::richtext::{plain_text, Span};
use crate::style::Theme;

/// Title stored in the PDF metadata.
pub const DOCUMENT_TITLE: &str = "Laporan Kejadian";
/// Printed when the record names no photo that exists on disk.
pub const NO_PHOTOS_TEXT: &str = "Tidak ada foto dokumentasi";
/// Printed when both photos exist but one of them cannot be decoded.
pub const PHOTOS_UNAVAILABLE_TEXT: &str = "Foto tidak dapat ditampilkan";

/// Output of a render call.
pub struct RenderedPdf {
    /// Serialized PDF document.
    pub bytes: Vec<u8>,
    /// Heading and first page (1-based) of each headed section, when known.
    pub section_pages: Vec<(String, Option<usize>)>,
}

/// Text styles derived from the theme and the registered font families.
#[derive(Clone, Copy)]
struct TextStyles {
    title: Style,
    subtitle: Style,
    section_heading: Style,
    inverted_cell: Style,
    cell: Style,
    label_cell: Style,
    body: Style,
    photo_label: Style,
}

impl TextStyles {
    fn new(theme: &Theme, heading: FontFamily<Font>) -> Self {
        let heading_style = Style::new().with_font_family(heading);
        let cell = Style::new().with_font_size(theme.cell_size);
        Self {
            title: heading_style.with_font_size(theme.title_size).bold(),
            subtitle: heading_style.with_font_size(theme.subtitle_size),
            section_heading: heading_style
                .with_font_size(theme.section_heading_size)
                .with_color(theme.primary)
                .bold(),
            inverted_cell: heading_style
                .with_font_size(theme.header_cell_size)
                .with_color(theme.inverted_text)
                .bold(),
            cell,
            label_cell: cell.bold(),
            body: Style::new().with_font_size(theme.body_size),
            photo_label: heading_style.with_font_size(theme.photo_label_size).bold(),
        }
    }
}

/// Renders reports with a fixed theme, font set and optional images.
pub struct Renderer {
    theme: Theme,
    fonts: ReportFonts,
    logo: Option<PathBuf>,
    photos_dir: PathBuf,
}

impl Renderer {
    /// Creates a renderer.
    pub fn new(theme: Theme, fonts: ReportFonts) -> Self {
        Self {
            theme,
            fonts,
            logo: None,
            photos_dir: PathBuf::from(DEFAULT_PHOTOS_DIR),
        }
    }

    /// Sets the logo printed above the title and returns the updated renderer.
    pub fn with_logo(mut self, logo: impl Into<Option<PathBuf>>) -> Self {
        self.logo = logo.into();
        self
    }

    /// Sets the directory upload URLs are resolved against.
    pub fn with_photos_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.photos_dir = dir.into();
        self
    }

    fn content_width_mm(&self, paper: Size) -> f64 {
        mm_to_f64(paper.width) - 2.0 * self.theme.page_margin_mm
    }

    /// Lays out `report` and serializes it to PDF bytes.
    pub fn render(&self, report: &Report) -> Result<RenderedPdf, ReportError> {
        let mut document = genpdf::Document::new(self.fonts.body.clone());
        let heading = document.add_font_family(self.fonts.heading.clone());
        let styles = TextStyles::new(&self.theme, heading);

        let paper = Size::from(PaperSize::A4);
        document.set_title(DOCUMENT_TITLE);
        document.set_paper_size(paper);
        document.set_font_size(self.theme.body_size);
        document.set_line_spacing(self.theme.line_spacing);

        let current_page = Rc::new(Cell::new(0));
        document.set_page_decorator(ConfiguredPageDecorator::new(
            Margins::from(mm_from_f64(self.theme.page_margin_mm)),
            Rc::clone(&current_page),
        ));

        self.push_title(&mut document, report, styles)?;

        let content_width = self.content_width_mm(paper);
        let mut anchors = Vec::new();
        for section in report.sections() {
            if let Some(heading) = section.heading() {
                let element = Paragraph::new(heading).styled(styles.section_heading);
                let recorded = Rc::new(Cell::new(None));
                #[cfg(feature = "bookmarks")]
                document.push(crate::elements::PageAnchor::new(
                    element,
                    Rc::clone(&current_page),
                    Rc::clone(&recorded),
                ));
                #[cfg(not(feature = "bookmarks"))]
                document.push(element);
                document.push(Break::new(self.theme.heading_gap_lines));
                anchors.push((heading.to_owned(), recorded));
            }
            self.push_section(&mut document, section, styles, content_width);
        }

        self.push_footer(&mut document, report, styles);

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ReportError::Render)?;
        debug!(
            "rendered {} bytes across {} pages",
            bytes.len(),
            current_page.get()
        );

        let section_pages = anchors
            .into_iter()
            .map(|(heading, recorded)| (heading, recorded.get()))
            .collect();
        Ok(RenderedPdf {
            bytes,
            section_pages,
        })
    }

    /// Renders `report` and writes it to `path`, returning the absolute path.
    ///
    /// The file appears only once the whole document has been written.
    pub fn write_report(&self, report: &Report, path: &Path) -> Result<PathBuf, ReportError> {
        let rendered = self.render(report)?;

        #[cfg(feature = "bookmarks")]
        let bytes = crate::bookmarks::apply_section_bookmarks(
            &rendered.bytes,
            &rendered.section_pages,
        )?;
        #[cfg(not(feature = "bookmarks"))]
        let bytes = rendered.bytes;

        write_atomically(path, &bytes)?;
        fs::canonicalize(path).map_err(|err| ReportError::io(path, err))
    }

    fn push_title(
        &self,
        document: &mut genpdf::Document,
        report: &Report,
        styles: TextStyles,
    ) -> Result<(), ReportError> {
        if let Some(path) = &self.logo {
            let logo = logo_image(path, self.theme.logo_width_mm).map_err(|source| {
                ReportError::Logo {
                    path: path.clone(),
                    source,
                }
            })?;
            document.push(logo);
            document.push(Break::new(0.5));
        }

        let title = report.title();
        document.push(
            Paragraph::new(title.title())
                .aligned(Alignment::Center)
                .styled(styles.title),
        );
        document.push(Break::new(0.5));
        document.push(
            Paragraph::new(title.subtitle())
                .aligned(Alignment::Center)
                .styled(styles.subtitle),
        );
        document.push(Break::new(self.theme.section_gap_lines));
        Ok(())
    }

    fn push_section(
        &self,
        document: &mut genpdf::Document,
        section: &ReportSection,
        styles: TextStyles,
        content_width_mm: f64,
    ) {
        match section.content() {
            SectionContent::Text(paragraph) => push_paragraph(document, paragraph, styles.body),
            SectionContent::Table(table) => {
                let total: f64 = table.column_widths_mm().iter().sum();
                if total > content_width_mm {
                    warn!(
                        "table of {:.1} mm exceeds content width of {:.1} mm",
                        total, content_width_mm
                    );
                }
                document.push(self.report_table(table, styles));
            }
            SectionContent::Photos(photos) => self.push_photos(document, photos, styles),
        }

        document.push(Break::new(self.theme.section_gap_lines));
    }

    fn report_table(&self, table: &TableBlock, styles: TextStyles) -> ReportTable {
        let border_color = match table.border() {
            TableBorder::Grid => self.theme.grid,
            TableBorder::Box => self.theme.primary,
        };
        let fill = match table.shading() {
            TableShading::InvertedHeaderRow | TableShading::InvertedLabelColumn => {
                self.theme.primary
            }
            TableShading::ShadedLabelColumn => self.theme.label_tint,
        };
        let mut layout = ReportTable::new(table.column_widths_mm(), table.border(), border_color)
            .with_padding(
                self.theme.cell_padding_horizontal_mm,
                self.theme.cell_padding_vertical_mm,
            );

        let cell = |text: &str, role: CellRole, alignment: HorizontalAlignment| match role {
            CellRole::Inverted => TableCell::new(text, styles.inverted_cell)
                .with_alignment(role.alignment(alignment))
                .with_fill(fill),
            CellRole::Label => TableCell::new(text, styles.label_cell)
                .with_alignment(role.alignment(alignment))
                .with_fill(fill),
            CellRole::Plain => {
                TableCell::new(text, styles.cell).with_alignment(role.alignment(alignment))
            }
        };

        if let Some(header) = table.header() {
            let row = header
                .iter()
                .map(|text| {
                    cell(
                        text.as_str(),
                        CellRole::Inverted,
                        HorizontalAlignment::Center,
                    )
                })
                .collect();
            layout.push_row(row);
        }

        for cells in table.rows() {
            let row = cells
                .iter()
                .enumerate()
                .map(|(column, text)| {
                    let alignment = table
                        .column_alignments()
                        .get(column)
                        .copied()
                        .unwrap_or_default();
                    let role = CellRole::of_body_cell(table.shading(), column);
                    cell(text.as_str(), role, alignment)
                })
                .collect();
            layout.push_row(row);
        }

        layout
    }

    fn push_photos(&self, document: &mut genpdf::Document, block: &PhotoBlock, styles: TextStyles) {
        let existing: Vec<(&PhotoSlot, PathBuf)> = block
            .provided()
            .filter_map(|slot| {
                let path = resolve_photo_path(&self.photos_dir, slot.source()?);
                if path.is_file() {
                    Some((slot, path))
                } else {
                    debug!("photo {} not found at {}", slot.label(), path.display());
                    None
                }
            })
            .collect();

        match existing.as_slice() {
            [] => push_paragraph(
                document,
                &RichParagraph::new(vec![Span::new(NO_PHOTOS_TEXT)]),
                styles.body,
            ),
            [(slot, path)] => match CaptionedPhoto::from_path(
                path,
                self.theme.photo_single_mm,
                slot.label(),
                styles.photo_label,
            ) {
                Ok(photo) => {
                    document.push(PhotoRow::new(vec![photo], self.theme.photo_single_column_mm))
                }
                Err(err) => {
                    warn!("skipping photo {}: {}", path.display(), err);
                    let source = slot.source().unwrap_or_default();
                    let fallback = RichParagraph::new(vec![
                        Span::new(slot.label()).bold(),
                        Span::new(format!(": {source}")),
                    ]);
                    push_paragraph(document, &fallback, styles.body);
                }
            },
            pair => {
                let photos: Result<Vec<_>, Error> = pair
                    .iter()
                    .map(|(slot, path)| {
                        CaptionedPhoto::from_path(
                            path,
                            self.theme.photo_pair_mm,
                            slot.label(),
                            styles.photo_label,
                        )
                    })
                    .collect();
                match photos {
                    Ok(photos) => {
                        document.push(PhotoRow::new(photos, self.theme.photo_pair_column_mm))
                    }
                    Err(err) => {
                        warn!("skipping documentation photos: {}", err);
                        push_paragraph(
                            document,
                            &RichParagraph::new(vec![Span::new(PHOTOS_UNAVAILABLE_TEXT)]),
                            styles.body,
                        );
                    }
                }
            }
        }
    }

    fn push_footer(&self, document: &mut genpdf::Document, report: &Report, styles: TextStyles) {
        document.push(Paragraph::new("_".repeat(self.theme.footer_rule_len)).styled(styles.body));
        document.push(Break::new(0.5));
        for line in report.footer().lines() {
            document.push(Paragraph::new(line.as_str()).styled(styles.body));
        }
    }
}

/// How a table cell is styled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellRole {
    /// Light text on the primary color, centered.
    Inverted,
    /// Bold text on the label tint.
    Label,
    Plain,
}

impl CellRole {
    fn of_body_cell(shading: TableShading, column: usize) -> Self {
        match (shading, column) {
            (TableShading::InvertedLabelColumn, 0) => CellRole::Inverted,
            (TableShading::ShadedLabelColumn, 0) => CellRole::Label,
            _ => CellRole::Plain,
        }
    }

    fn alignment(self, column: HorizontalAlignment) -> HorizontalAlignment {
        match self {
            CellRole::Inverted => HorizontalAlignment::Center,
            CellRole::Label | CellRole::Plain => column,
        }
    }
}

fn push_paragraph(document: &mut genpdf::Document, paragraph: &RichParagraph, style: Style) {
    match paragraph.alignment() {
        HorizontalAlignment::Justified => {
            document.push(JustifiedText::new(plain_text(paragraph.spans())).with_style(style));
        }
        alignment => {
            let mut element = Paragraph::default();
            for span in paragraph.spans() {
                element.push(span.to_styled_string(style));
            }
            element.set_alignment(to_alignment(alignment));
            document.push(element);
        }
    }
}

/// Upload URLs (`/uploads/...`, `/reports/...`) live under `photos_dir`;
/// any other value is taken as a file path.
pub fn resolve_photo_path(photos_dir: &Path, source: &str) -> PathBuf {
    let is_upload = source.starts_with("/uploads/") || source.starts_with("/reports/");
    match source.strip_prefix('/') {
        Some(relative) if is_upload => photos_dir.join(relative),
        _ => PathBuf::from(source),
    }
}

fn partial_path(path: &Path) -> Result<PathBuf, ReportError> {
    let name = path.file_name().ok_or_else(|| {
        ReportError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"),
        )
    })?;
    let mut partial = name.to_os_string();
    partial.push(".partial");
    Ok(path.with_file_name(partial))
}

/// Writes `bytes` to a sibling temporary file and renames it over `path`.
///
/// On failure the temporary file is removed and `path` is left untouched.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let partial = partial_path(path)?;

    if let Err(err) = fs::write(&partial, bytes) {
        let _ = fs::remove_file(&partial);
        return Err(ReportError::io(&partial, err));
    }

    if let Err(err) = fs::rename(&partial, path) {
        let _ = fs::remove_file(&partial);
        return Err(ReportError::io(path, err));
    }

    Ok(())
}

/// Applies page margins and counts pages as the engine lays them out.
struct ConfiguredPageDecorator {
    margins: Margins,
    page: Rc<Cell<usize>>,
}

impl ConfiguredPageDecorator {
    fn new(margins: Margins, page: Rc<Cell<usize>>) -> Self {
        Self { margins, page }
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        _context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        _style: Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page.set(self.page.get() + 1);
        area.add_margins(self.margins);

        let size = area.size();
        if mm_to_f64(size.width) <= 0.0 || mm_to_f64(size.height) <= 0.0 {
            return Err(Error::new(
                "Page margins leave no room for content",
                ErrorKind::InvalidData,
            ));
        }

        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_path_is_a_sibling() {
        let partial = partial_path(Path::new("/tmp/reports/Laporan.pdf")).unwrap();
        assert_eq!(partial, Path::new("/tmp/reports/Laporan.pdf.partial"));
    }

    #[test]
    fn partial_path_requires_file_name() {
        assert!(matches!(
            partial_path(Path::new("/")),
            Err(ReportError::Io { .. })
        ));
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let target = Path::new("/__incident_report_missing_dir__/Laporan.pdf");
        let err = write_atomically(target, b"%PDF-1.3").unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
        assert!(!target.exists());
        assert!(!partial_path(target).unwrap().exists());
    }

    #[test]
    fn write_replaces_target_in_one_step() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("Laporan.pdf");

        write_atomically(&target, b"first").unwrap();
        write_atomically(&target, b"second").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"second");
        assert!(!partial_path(&target).unwrap().exists());
    }

    #[test]
    fn inverted_label_cells_are_centered() {
        let role = CellRole::of_body_cell(TableShading::InvertedLabelColumn, 0);
        assert_eq!(role, CellRole::Inverted);
        assert_eq!(
            role.alignment(HorizontalAlignment::Left),
            HorizontalAlignment::Center
        );

        let value = CellRole::of_body_cell(TableShading::InvertedLabelColumn, 1);
        assert_eq!(value, CellRole::Plain);
        assert_eq!(
            value.alignment(HorizontalAlignment::Left),
            HorizontalAlignment::Left
        );
    }

    #[test]
    fn shaded_labels_keep_column_alignment() {
        let role = CellRole::of_body_cell(TableShading::ShadedLabelColumn, 0);
        assert_eq!(role, CellRole::Label);
        assert_eq!(
            role.alignment(HorizontalAlignment::Left),
            HorizontalAlignment::Left
        );
        assert_eq!(
            CellRole::of_body_cell(TableShading::InvertedHeaderRow, 0),
            CellRole::Plain
        );
    }

    #[test]
    fn upload_urls_resolve_under_photos_dir() {
        let root = Path::new("/srv/app/public");
        assert_eq!(
            resolve_photo_path(root, "/uploads/before.jpg"),
            Path::new("/srv/app/public/uploads/before.jpg")
        );
        assert_eq!(
            resolve_photo_path(root, "/reports/after.png"),
            Path::new("/srv/app/public/reports/after.png")
        );
    }

    #[test]
    fn other_photo_values_are_plain_paths() {
        let root = Path::new("public");
        assert_eq!(
            resolve_photo_path(root, "/var/photos/a.jpg"),
            Path::new("/var/photos/a.jpg")
        );
        assert_eq!(resolve_photo_path(root, "foto.jpg"), Path::new("foto.jpg"));
    }
}
