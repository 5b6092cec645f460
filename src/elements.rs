//! Report-specific element implementations built on top of `genpdf` primitives.
//!
//! `genpdf` has no justified alignment and no cell backgrounds, and its
//! paragraph wrapper drops any word wider than the line. This module adds a
//! justified paragraph, a table that wraps and paints its own cells, the
//! documentation photo elements and the logo loader.

use std::ops::Range;
use std::path::Path;

use genpdf::elements::{Image, Paragraph};
use genpdf::error::{Context as _, Error};
use genpdf::render;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{Alignment, Element, Mm, Position, RenderResult, Scale, Size};
use image::{DynamicImage, GenericImageView};

use crate::model::{HorizontalAlignment, TableBorder};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
// Strokes are drawn at 1pt (0.35 mm), so this step leaves no gaps.
const FILL_STROKE_STEP_MM: f64 = 0.3;
const LAYOUT_EPSILON: f64 = 1e-6;
// 5pt, the padding around each photo column.
const PHOTO_PADDING_MM: f64 = 1.76;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn position(x: f64, y: f64) -> Position {
    Position::new(mm_from_f64(x), mm_from_f64(y))
}

/// Maps the model alignment onto the engine's alignment.
///
/// Justified text is handled by [`JustifiedText`]; anywhere else it falls
/// back to left alignment.
pub fn to_alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left | HorizontalAlignment::Justified => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
    }
}

/// Splits `word` into pieces no wider than `max_width`.
///
/// Words without spaces, such as long CJK runs, would otherwise overflow the
/// text column. A piece always holds at least one character.
pub fn split_overlong<'a, F>(word: &'a str, max_width: f64, measure: F) -> Vec<&'a str>
where
    F: Fn(&str) -> f64,
{
    if measure(word) <= max_width {
        return vec![word];
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, ch) in word.char_indices() {
        let end = index + ch.len_utf8();
        if index > start && measure(&word[start..end]) > max_width {
            pieces.push(&word[start..index]);
            start = index;
        }
    }
    pieces.push(&word[start..]);
    pieces
}

/// Greedy line breaking over pre-measured words.
///
/// Returns the word index range of each line. A word wider than `max_width`
/// gets a line of its own.
pub fn break_lines(widths: &[f64], space: f64, max_width: f64) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut line_width = 0.0;

    for (index, width) in widths.iter().enumerate() {
        if index == start {
            line_width = *width;
        } else if line_width + space + width > max_width {
            lines.push(start..index);
            start = index;
            line_width = *width;
        } else {
            line_width += space + width;
        }
    }

    if start < widths.len() {
        lines.push(start..widths.len());
    }
    lines
}

/// Wraps `text` into lines no wider than `max_width`.
///
/// Any whitespace run, including line breaks and tabs, separates words.
/// Over-wide words are split, so every other character ends up on a line.
pub fn wrap_text<F>(text: &str, max_width: f64, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let words: Vec<&str> = text
        .split_whitespace()
        .flat_map(|word| split_overlong(word, max_width, &measure))
        .collect();
    let widths: Vec<f64> = words.iter().map(|word| measure(word)).collect();
    break_lines(&widths, measure(" "), max_width)
        .into_iter()
        .map(|range| words[range].join(" "))
        .collect()
}

/// Lines of a block, starting at `next`, that fit into `available` height.
pub fn page_lines(total: usize, next: usize, line_height: f64, available: f64) -> Range<usize> {
    let next = next.min(total);
    if line_height <= 0.0 {
        return next..total;
    }
    let fit = ((available + LAYOUT_EPSILON) / line_height).floor();
    let fit = if fit > 0.0 { fit as usize } else { 0 };
    next..total.min(next.saturating_add(fit))
}

/// Scales `widths` down to `available` when they are too wide and returns
/// them with the left offset that centers them.
pub fn fit_columns(widths: &[f64], available: f64) -> (Vec<f64>, f64) {
    let total: f64 = widths.iter().sum();
    if total <= available || total <= 0.0 {
        return (widths.to_vec(), ((available - total) / 2.0).max(0.0));
    }
    let factor = available / total;
    (widths.iter().map(|width| width * factor).collect(), 0.0)
}

/// Paragraph that stretches inter-word gaps to fill every line but the last.
///
/// Continues on the next page from the first line that did not fit.
pub struct JustifiedText {
    text: String,
    style: Style,
    next_line: usize,
}

impl JustifiedText {
    /// Creates a justified paragraph.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::new(),
            next_line: 0,
        }
    }

    /// Sets the style and returns the updated element.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl Element for JustifiedText {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let style = style.and(self.style);
        let font_cache = &context.font_cache;
        let max_width = mm_to_f64(area.size().width);
        let measure = |s: &str| mm_to_f64(style.str_width(font_cache, s));

        let words: Vec<&str> = self
            .text
            .split_whitespace()
            .flat_map(|word| split_overlong(word, max_width, &measure))
            .collect();
        let widths: Vec<f64> = words.iter().map(|word| measure(word)).collect();
        let space = measure(" ");
        let lines = break_lines(&widths, space, max_width);
        let line_height = mm_to_f64(style.line_height(font_cache));
        let visible = page_lines(
            lines.len(),
            self.next_line,
            line_height,
            mm_to_f64(area.size().height),
        );

        let mut result = RenderResult::default();
        let mut offset = 0.0;
        for line in visible {
            let range = lines[line].clone();
            let is_last = line + 1 == lines.len();
            let used: f64 = widths[range.clone()].iter().sum();
            let gaps = range.len().saturating_sub(1);
            let gap = if is_last || gaps == 0 {
                space
            } else {
                (max_width - used) / gaps as f64
            };

            let mut x = 0.0;
            for index in range {
                // Only the first word of a line can miss, since all share one baseline.
                if !area.print_str(font_cache, position(x, offset), style, words[index])? {
                    result.has_more = true;
                    result.size = Size::new(area.size().width, mm_from_f64(offset));
                    return Ok(result);
                }
                x += widths[index] + gap;
            }

            offset += line_height;
            self.next_line = line + 1;
        }

        result.has_more = self.next_line < lines.len();
        result.size = Size::new(area.size().width, mm_from_f64(offset));
        Ok(result)
    }
}

/// One cell of a [`ReportTable`].
pub struct TableCell {
    text: String,
    style: Style,
    alignment: HorizontalAlignment,
    fill: Option<Color>,
}

impl TableCell {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
            alignment: HorizontalAlignment::Left,
            fill: None,
        }
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Paints the cell background and returns the updated cell.
    pub fn with_fill(mut self, fill: impl Into<Option<Color>>) -> Self {
        self.fill = fill.into();
        self
    }
}

/// How much of a table row goes on the current page.
#[derive(Debug, PartialEq)]
pub(crate) enum RowFit {
    /// The rest of the row fits, with this height.
    Whole(f64),
    /// This many further lines of each cell fit, with this height.
    Partial(Vec<usize>, f64),
    /// Nothing of the row fits here.
    Defer,
}

/// Decides how a row with `lines_left` lines per cell fits into `room`.
///
/// Every cell is at least `min_lines` tall. Rows are only split when
/// `may_split` is set, which the table does at the top of a continued page.
pub(crate) fn fit_row(
    lines_left: &[usize],
    line_heights: &[f64],
    min_lines: usize,
    padding: f64,
    room: f64,
    may_split: bool,
) -> RowFit {
    let height_of = |counts: &[usize]| {
        counts
            .iter()
            .zip(line_heights)
            .map(|(count, height)| *count as f64 * height)
            .fold(0.0, f64::max)
            + 2.0 * padding
    };

    let whole: Vec<usize> = lines_left.iter().map(|left| (*left).max(min_lines)).collect();
    let whole_height = height_of(&whole);
    if whole_height <= room + LAYOUT_EPSILON {
        return RowFit::Whole(whole_height);
    }
    if !may_split {
        return RowFit::Defer;
    }

    let counts: Vec<usize> = lines_left
        .iter()
        .zip(line_heights)
        .map(|(left, height)| page_lines(*left, 0, *height, room - 2.0 * padding).len())
        .collect();
    if counts.iter().all(|count| *count == 0) {
        return RowFit::Defer;
    }
    let height = height_of(&counts);
    RowFit::Partial(counts, height)
}

struct LaidOutCell {
    lines: Vec<String>,
    style: Style,
    line_height: f64,
    alignment: HorizontalAlignment,
    fill: Option<Color>,
    skip: usize,
}

/// Table with exact column widths, painted cells and wrapped text.
///
/// The table is centered in its area and shrunk when wider than it. Rows that
/// do not fit move to the next page; a row taller than a whole page is split
/// between lines.
pub struct ReportTable {
    column_widths_mm: Vec<f64>,
    rows: Vec<Vec<TableCell>>,
    border: TableBorder,
    border_color: Color,
    padding_horizontal: f64,
    padding_vertical: f64,
    next_row: usize,
    next_lines: Vec<usize>,
    resumed: bool,
}

impl ReportTable {
    /// Creates an empty table.
    pub fn new(
        column_widths_mm: impl Into<Vec<f64>>,
        border: TableBorder,
        border_color: Color,
    ) -> Self {
        Self {
            column_widths_mm: column_widths_mm.into(),
            rows: Vec::new(),
            border,
            border_color,
            padding_horizontal: 0.0,
            padding_vertical: 0.0,
            next_row: 0,
            next_lines: Vec::new(),
            resumed: false,
        }
    }

    /// Sets the cell padding in millimetres and returns the updated table.
    pub fn with_padding(mut self, horizontal_mm: f64, vertical_mm: f64) -> Self {
        self.padding_horizontal = horizontal_mm;
        self.padding_vertical = vertical_mm;
        self
    }

    pub fn push_row(&mut self, cells: Vec<TableCell>) {
        self.rows.push(cells);
    }

    fn lay_out_row(
        &self,
        cells: &[TableCell],
        widths: &[f64],
        context: &genpdf::Context,
        style: Style,
    ) -> Vec<LaidOutCell> {
        let font_cache = &context.font_cache;
        cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(column, (cell, width))| {
                let cell_style = style.and(cell.style);
                let text_width = (width - 2.0 * self.padding_horizontal).max(LAYOUT_EPSILON);
                let lines = wrap_text(&cell.text, text_width, |s| {
                    mm_to_f64(cell_style.str_width(font_cache, s))
                });
                LaidOutCell {
                    lines,
                    style: cell_style,
                    line_height: mm_to_f64(cell_style.line_height(font_cache)),
                    alignment: cell.alignment,
                    fill: cell.fill,
                    skip: self.next_lines.get(column).copied().unwrap_or(0),
                }
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_cell(
        &self,
        area: &render::Area<'_>,
        context: &genpdf::Context,
        cell: &LaidOutCell,
        lines: Range<usize>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), Error> {
        if let Some(fill) = cell.fill {
            fill_rect(area, x, y, width, height, fill);
        }

        let text_width = width - 2.0 * self.padding_horizontal;
        for (index, line) in cell.lines[lines].iter().enumerate() {
            let indent = match cell.alignment {
                HorizontalAlignment::Center => {
                    let line_width = mm_to_f64(cell.style.str_width(&context.font_cache, line));
                    ((text_width - line_width) / 2.0).max(0.0)
                }
                HorizontalAlignment::Left | HorizontalAlignment::Justified => 0.0,
            };
            let origin = position(
                x + self.padding_horizontal + indent,
                y + self.padding_vertical + index as f64 * cell.line_height,
            );
            area.print_str(&context.font_cache, origin, cell.style, line)?;
        }

        if self.border == TableBorder::Grid {
            stroke_rect(area, x, y, width, height, self.border_color);
        }
        Ok(())
    }
}

impl Element for ReportTable {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let (widths, left) = fit_columns(&self.column_widths_mm, mm_to_f64(area.size().width));
        let available = mm_to_f64(area.size().height);
        let mut result = RenderResult::default();
        let mut y = 0.0;

        while let Some(cells) = self.rows.get(self.next_row) {
            let laid_out = self.lay_out_row(cells, &widths, context, style);
            let lines_left: Vec<usize> = laid_out
                .iter()
                .map(|cell| cell.lines.len().saturating_sub(cell.skip))
                .collect();
            let line_heights: Vec<f64> = laid_out.iter().map(|cell| cell.line_height).collect();
            let min_lines = if self.next_lines.is_empty() { 1 } else { 0 };
            let may_split = y == 0.0 && self.resumed;

            let (counts, height) = match fit_row(
                &lines_left,
                &line_heights,
                min_lines,
                self.padding_vertical,
                available - y,
                may_split,
            ) {
                RowFit::Whole(height) => (lines_left.clone(), height),
                RowFit::Partial(counts, height) => (counts, height),
                RowFit::Defer => {
                    result.has_more = true;
                    break;
                }
            };

            let mut x = left;
            for ((cell, count), width) in laid_out.iter().zip(&counts).zip(&widths) {
                let start = cell.skip.min(cell.lines.len());
                self.draw_cell(&area, context, cell, start..start + count, x, y, *width, height)?;
                x += width;
            }
            y += height;

            if counts == lines_left {
                self.next_row += 1;
                self.next_lines.clear();
            } else {
                self.next_lines = laid_out
                    .iter()
                    .zip(&counts)
                    .map(|(cell, count)| cell.skip + count)
                    .collect();
                result.has_more = true;
                break;
            }
        }

        if self.border == TableBorder::Box && y > 0.0 {
            let total: f64 = widths.iter().sum();
            stroke_rect(&area, left, 0.0, total, y, self.border_color);
        }

        self.resumed = result.has_more;
        result.size = Size::new(area.size().width, mm_from_f64(y));
        Ok(result)
    }
}

fn fill_rect(area: &render::Area<'_>, x: f64, y: f64, width: f64, height: f64, color: Color) {
    let style = Style::new().with_color(color);
    let mut offset = FILL_STROKE_STEP_MM / 2.0;
    while offset < height {
        area.draw_line(
            vec![position(x, y + offset), position(x + width, y + offset)],
            style,
        );
        offset += FILL_STROKE_STEP_MM;
    }
}

fn stroke_rect(area: &render::Area<'_>, x: f64, y: f64, width: f64, height: f64, color: Color) {
    area.draw_line(
        vec![
            position(x, y),
            position(x + width, y),
            position(x + width, y + height),
            position(x, y + height),
            position(x, y),
        ],
        Style::new().with_color(color),
    );
}

fn decode_image(path: &Path) -> Result<DynamicImage, Error> {
    let dynamic = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))?;
    // The PDF writer rejects images with an alpha channel.
    Ok(DynamicImage::ImageRgb8(dynamic.to_rgb8()))
}

fn natural_size_mm(px: u32) -> f64 {
    MM_PER_INCH * f64::from(px) / DEFAULT_IMAGE_DPI
}

fn scale_to(target_mm: f64, px: u32) -> f64 {
    let natural = natural_size_mm(px);
    if natural > f64::EPSILON {
        target_mm / natural
    } else {
        1.0
    }
}

/// Loads the logo at `path` and scales it to `width_mm`, centered.
pub fn logo_image(path: &Path, width_mm: f64) -> Result<Image, Error> {
    let dynamic = decode_image(path)?;
    let (px_width, _) = dynamic.dimensions();
    let scale = scale_to(width_mm, px_width);

    Ok(Image::from_dynamic_image(dynamic)?
        .with_alignment(Alignment::Center)
        .with_scale(Scale::new(scale, scale)))
}

/// A photo stretched to a fixed box with a centered caption below it.
pub struct CaptionedPhoto {
    image: Image,
    caption: Paragraph,
    caption_style: Style,
    box_height_mm: f64,
}

impl CaptionedPhoto {
    /// Loads the photo at `path` and fits it to `box_mm` (width, height).
    pub fn from_path(
        path: &Path,
        box_mm: (f64, f64),
        caption: impl Into<String>,
        caption_style: Style,
    ) -> Result<Self, Error> {
        let dynamic = decode_image(path)?;
        let (px_width, px_height) = dynamic.dimensions();
        let image = Image::from_dynamic_image(dynamic)?
            .with_alignment(Alignment::Center)
            .with_scale(Scale::new(
                scale_to(box_mm.0, px_width),
                scale_to(box_mm.1, px_height),
            ));

        Ok(Self {
            image,
            caption: Paragraph::new(StyledString::new(caption, caption_style))
                .aligned(Alignment::Center),
            caption_style,
            box_height_mm: box_mm.1,
        })
    }

    fn height(&self, context: &genpdf::Context, style: Style) -> f64 {
        let caption = style.and(self.caption_style).line_height(&context.font_cache);
        self.box_height_mm + PHOTO_PADDING_MM + mm_to_f64(caption)
    }
}

impl Element for CaptionedPhoto {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if self.height(context, style) > mm_to_f64(area.size().height) + LAYOUT_EPSILON {
            result.has_more = true;
            return Ok(result);
        }

        let image_result = self.image.render(context, area.clone(), style)?;
        result.size = result.size.stack_vertical(image_result.size);

        let spacing = Size::new(0, mm_from_f64(PHOTO_PADDING_MM));
        area.add_offset(Position::new(0, image_result.size.height + spacing.height));
        result.size = result.size.stack_vertical(spacing);

        let caption_result = self.caption.render(context, area, style)?;
        result.size = result.size.stack_vertical(caption_result.size);
        result.has_more = caption_result.has_more;
        Ok(result)
    }
}

/// Photos laid out side by side in equal columns, centered in the area.
///
/// The row is kept whole: if the tallest photo does not fit, the row moves to
/// the next page.
pub struct PhotoRow {
    photos: Vec<CaptionedPhoto>,
    column_width_mm: f64,
}

impl PhotoRow {
    pub fn new(photos: Vec<CaptionedPhoto>, column_width_mm: f64) -> Self {
        Self {
            photos,
            column_width_mm,
        }
    }
}

impl Element for PhotoRow {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let needed = self
            .photos
            .iter()
            .map(|photo| photo.height(context, style))
            .fold(0.0, f64::max)
            + PHOTO_PADDING_MM;
        if needed > mm_to_f64(area.size().height) + LAYOUT_EPSILON {
            result.has_more = true;
            return Ok(result);
        }

        let columns = vec![self.column_width_mm; self.photos.len()];
        let (widths, left) = fit_columns(&columns, mm_to_f64(area.size().width));
        let mut x = left;
        let mut height = Mm::default();
        for (photo, width) in self.photos.iter_mut().zip(widths) {
            let mut column = area.clone();
            column.add_offset(position(x, PHOTO_PADDING_MM));
            column.set_width(mm_from_f64(width));
            let photo_result = photo.render(context, column, style)?;
            height = height.max(photo_result.size.height);
            result.has_more |= photo_result.has_more;
            x += width;
        }

        result.size = Size::new(area.size().width, height + mm_from_f64(PHOTO_PADDING_MM));
        Ok(result)
    }
}

/// Wraps an element and records the page its first visible part lands on.
#[cfg(feature = "bookmarks")]
pub struct PageAnchor<E> {
    inner: E,
    current_page: std::rc::Rc<std::cell::Cell<usize>>,
    recorded: std::rc::Rc<std::cell::Cell<Option<usize>>>,
}

#[cfg(feature = "bookmarks")]
impl<E: Element> PageAnchor<E> {
    /// Creates an anchor around `inner` reading `current_page` and writing into `recorded`.
    pub fn new(
        inner: E,
        current_page: std::rc::Rc<std::cell::Cell<usize>>,
        recorded: std::rc::Rc<std::cell::Cell<Option<usize>>>,
    ) -> Self {
        Self {
            inner,
            current_page,
            recorded,
        }
    }

    /// Records the current page the first time the inner element takes up space.
    fn note_placement(&self, height: Mm) {
        if self.recorded.get().is_none() && mm_to_f64(height) > 0.0 {
            self.recorded.set(Some(self.current_page.get()));
        }
    }
}

#[cfg(feature = "bookmarks")]
impl<E: Element> Element for PageAnchor<E> {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let result = self.inner.render(context, area, style)?;
        self.note_placement(result.size.height);
        Ok(result)
    }
}
