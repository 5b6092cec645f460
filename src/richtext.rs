//! Styled text fragments used by report paragraphs.
//!
//! A [`Span`] is the renderer-agnostic form of a piece of text with inline
//! emphasis. The assembler and the photo fallbacks build spans; the renderer
//! turns them into [`genpdf`] styled strings once the theme and font families
//! are known.

use genpdf::style::{Style, StyledString};

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Converts the span into a [`StyledString`] layered on top of `base`.
    pub fn to_styled_string(&self, base: Style) -> StyledString {
        let mut style = base;
        if self.bold {
            style.set_bold();
        }
        StyledString::new(self.text.clone(), style)
    }
}

/// Joins the plain text of the spans, dropping all styling.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_style_layers_on_base() {
        let base = Style::new().with_font_size(10);
        let styled = Span::new("Foto Sebelum").bold().to_styled_string(base);
        assert_eq!(styled.s, "Foto Sebelum");
        assert!(styled.style.is_bold());
        assert_eq!(styled.style.font_size(), 10);

        let plain = Span::new(": /uploads/a.jpg").to_styled_string(base);
        assert!(!plain.style.is_bold());
    }

    #[test]
    fn plain_text_concatenates() {
        let spans = vec![Span::new("Foto Sesudah").bold(), Span::new(": b.jpg")];
        assert_eq!(plain_text(&spans), "Foto Sesudah: b.jpg");
    }
}
