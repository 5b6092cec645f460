//! Data structures describing the logical content of an incident report.
//!
//! The assembler produces these values and the renderer consumes them. They
//! do not reference the layout engine, so the full report content can be
//! inspected and compared in tests without fonts or a PDF writer.

use crate::record::PLACEHOLDER;
use crate::richtext::Span;

/// Horizontal alignment of text blocks and table columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Fully justified paragraphs.
    Justified,
}

/// Paragraph carrying inline styling and alignment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichParagraph {
    spans: Vec<Span>,
    alignment: HorizontalAlignment,
}

impl RichParagraph {
    /// Creates a paragraph from the provided spans using left alignment.
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    /// Returns the spans that make up the paragraph.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Returns the configured alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Sets the alignment and returns the updated paragraph.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// Which cells of a table are painted with a background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableShading {
    /// First row uses inverted colors (light text on the primary color).
    InvertedHeaderRow,
    /// First column uses inverted colors.
    InvertedLabelColumn,
    /// First column is tinted and its text is bold.
    ShadedLabelColumn,
}

/// Which cell edges are stroked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableBorder {
    /// Every cell edge.
    Grid,
    /// Only the outer frame.
    Box,
}

/// A fixed-column table of display strings.
#[derive(Clone, Debug, PartialEq)]
pub struct TableBlock {
    column_widths_mm: Vec<f64>,
    column_alignments: Vec<HorizontalAlignment>,
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    shading: TableShading,
    border: TableBorder,
}

impl TableBlock {
    /// Creates an empty table with the given column widths (millimetres).
    pub fn new(column_widths_mm: impl Into<Vec<f64>>, shading: TableShading) -> Self {
        let column_widths_mm = column_widths_mm.into();
        let column_alignments = vec![HorizontalAlignment::Left; column_widths_mm.len()];
        Self {
            column_widths_mm,
            column_alignments,
            header: None,
            rows: Vec::new(),
            shading,
            border: TableBorder::Grid,
        }
    }

    /// Sets the header row and returns the updated table.
    pub fn with_header<I, S>(mut self, header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = Some(header.into_iter().map(Into::into).collect());
        self
    }

    /// Appends a data row and returns the updated table.
    pub fn with_row<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the alignment of one column and returns the updated table.
    pub fn with_column_alignment(mut self, column: usize, alignment: HorizontalAlignment) -> Self {
        if let Some(slot) = self.column_alignments.get_mut(column) {
            *slot = alignment;
        }
        self
    }

    /// Sets the border mode and returns the updated table.
    pub fn with_border(mut self, border: TableBorder) -> Self {
        self.border = border;
        self
    }

    /// Column widths in millimetres.
    pub fn column_widths_mm(&self) -> &[f64] {
        &self.column_widths_mm
    }

    /// Alignment of each column.
    pub fn column_alignments(&self) -> &[HorizontalAlignment] {
        &self.column_alignments
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.column_widths_mm.len()
    }

    /// The header row, if the table has one.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Data rows, excluding the header.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The data-dependent cell of each row, which is always the last column.
    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .filter_map(|row| row.last().map(String::as_str))
    }

    /// Number of value cells showing the placeholder.
    pub fn placeholder_count(&self) -> usize {
        self.values().filter(|value| *value == PLACEHOLDER).count()
    }

    /// Shading mode.
    pub fn shading(&self) -> TableShading {
        self.shading
    }

    /// Border mode.
    pub fn border(&self) -> TableBorder {
        self.border
    }
}

/// Identifies each content section of the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Report number and report date.
    Header,
    /// Date, time, shift, gate and location of the incident.
    IncidentInformation,
    /// Free-text chronology.
    Chronology,
    /// Barrier, reader, system and electrical disturbance flags.
    DisturbanceTypes,
    /// Remedial action per role.
    Actions,
    /// Assigned officer per role.
    Personnel,
    /// Status label and alarm/reset counters.
    Status,
    /// Notification and handling times, queue, complaints.
    AdditionalInformation,
    /// Before and after photos.
    PhotoDocumentation,
}

/// Body of a content section.
#[derive(Clone, Debug, PartialEq)]
pub enum SectionContent {
    /// A single paragraph of text.
    Text(RichParagraph),
    /// A fixed-column table.
    Table(TableBlock),
    /// Documentation photos.
    Photos(PhotoBlock),
}

/// One photo position in the documentation section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoSlot {
    label: String,
    source: Option<String>,
}

impl PhotoSlot {
    /// Creates a slot; `source` is `None` when the record has no photo.
    pub fn new(label: impl Into<String>, source: Option<String>) -> Self {
        Self {
            label: label.into(),
            source,
        }
    }

    /// Caption printed under the photo.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stored photo reference, a path or an upload URL.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Photos in print order, with or without a stored source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhotoBlock {
    slots: Vec<PhotoSlot>,
}

impl PhotoBlock {
    /// Creates a block from the given slots.
    pub fn new(slots: impl Into<Vec<PhotoSlot>>) -> Self {
        Self {
            slots: slots.into(),
        }
    }

    pub fn slots(&self) -> &[PhotoSlot] {
        &self.slots
    }

    /// Slots whose record value names a photo.
    pub fn provided(&self) -> impl Iterator<Item = &PhotoSlot> + '_ {
        self.slots.iter().filter(|slot| slot.source.is_some())
    }
}

/// A titled group of rows or text in the report body.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportSection {
    kind: SectionKind,
    heading: Option<String>,
    content: SectionContent,
}

impl ReportSection {
    /// Creates a section without a heading.
    pub fn new(kind: SectionKind, content: SectionContent) -> Self {
        Self {
            kind,
            heading: None,
            content,
        }
    }

    /// Sets the heading and returns the updated section.
    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    /// Section kind.
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Heading printed above the content, if any.
    pub fn heading(&self) -> Option<&str> {
        self.heading.as_deref()
    }

    /// Section body.
    pub fn content(&self) -> &SectionContent {
        &self.content
    }

    /// Returns the table body, if this section is a table.
    pub fn table(&self) -> Option<&TableBlock> {
        match &self.content {
            SectionContent::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Returns the paragraph body, if this section is text.
    pub fn text(&self) -> Option<&RichParagraph> {
        match &self.content {
            SectionContent::Text(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    /// Returns the photo block, if this is the documentation section.
    pub fn photos(&self) -> Option<&PhotoBlock> {
        match &self.content {
            SectionContent::Photos(photos) => Some(photos),
            _ => None,
        }
    }
}

/// Static title lines printed at the top of the first page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleBlock {
    title: String,
    subtitle: String,
}

impl TitleBlock {
    /// Creates a title block.
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }

    /// Main title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Subtitle.
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }
}

/// Closing disclaimer and generation timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FooterBlock {
    lines: Vec<String>,
}

impl FooterBlock {
    /// Creates a footer from the given lines.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Footer lines in print order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// A fully assembled report ready for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    title: TitleBlock,
    sections: Vec<ReportSection>,
    footer: FooterBlock,
}

impl Report {
    /// Creates a report from its parts.
    pub fn new(title: TitleBlock, sections: Vec<ReportSection>, footer: FooterBlock) -> Self {
        Self {
            title,
            sections,
            footer,
        }
    }

    /// Title block.
    pub fn title(&self) -> &TitleBlock {
        &self.title
    }

    /// Content sections in print order.
    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    /// Footer block.
    pub fn footer(&self) -> &FooterBlock {
        &self.footer
    }

    /// Looks up the first section of the given kind.
    pub fn section(&self, kind: SectionKind) -> Option<&ReportSection> {
        self.sections.iter().find(|section| section.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_values_read_last_column() {
        let table = TableBlock::new(vec![15.0, 50.0, 95.0], TableShading::InvertedHeaderRow)
            .with_header(["No", "Jenis", "Keterangan"])
            .with_row(["1", "Palang", "Tidak ada"])
            .with_row(["2", "Reader", PLACEHOLDER]);

        let values: Vec<_> = table.values().collect();
        assert_eq!(values, vec!["Tidak ada", PLACEHOLDER]);
        assert_eq!(table.placeholder_count(), 1);
        assert_eq!(table.header().map(<[String]>::len), Some(3));
    }

    #[test]
    fn column_alignment_ignores_out_of_range() {
        let table = TableBlock::new(vec![50.0, 110.0], TableShading::ShadedLabelColumn)
            .with_column_alignment(0, HorizontalAlignment::Center)
            .with_column_alignment(7, HorizontalAlignment::Justified);
        assert_eq!(
            table.column_alignments(),
            &[HorizontalAlignment::Center, HorizontalAlignment::Left]
        );
    }

    #[test]
    fn photo_block_lists_provided_slots() {
        let block = PhotoBlock::new(vec![
            PhotoSlot::new("Foto Sebelum", None),
            PhotoSlot::new("Foto Sesudah", Some("/uploads/after.jpg".to_owned())),
        ]);
        let labels: Vec<_> = block.provided().map(PhotoSlot::label).collect();
        assert_eq!(labels, vec!["Foto Sesudah"]);
        assert_eq!(block.slots().len(), 2);
    }
}
