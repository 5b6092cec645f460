//! Run configuration assembled by the command line front end.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::style::Theme;

/// Prefix of generated output file names.
pub const OUTPUT_FILE_PREFIX: &str = "Laporan_Kejadian_";

/// Directory that upload URLs such as `/uploads/a.jpg` are relative to.
pub const DEFAULT_PHOTOS_DIR: &str = "public";

/// Where the report goes and which optional assets it uses.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub output_path: PathBuf,
    pub fonts_dir: Option<PathBuf>,
    pub logo_path: Option<PathBuf>,
    pub photos_dir: Option<PathBuf>,
    pub theme: Theme,
}

impl ReportConfig {
    /// Configuration writing to `output_path` with default assets and theme.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            fonts_dir: None,
            logo_path: None,
            photos_dir: None,
            theme: Theme::default(),
        }
    }

    /// Configuration writing to [`default_output_file_name`] in the working directory.
    pub fn with_default_output(now: DateTime<Utc>) -> Self {
        Self::new(default_output_file_name(now))
    }

    pub fn with_fonts_dir(mut self, dir: impl Into<Option<PathBuf>>) -> Self {
        self.fonts_dir = dir.into();
        self
    }

    pub fn with_logo(mut self, path: impl Into<Option<PathBuf>>) -> Self {
        self.logo_path = path.into();
        self
    }

    pub fn with_photos_dir(mut self, dir: impl Into<Option<PathBuf>>) -> Self {
        self.photos_dir = dir.into();
        self
    }

    pub fn fonts_dir(&self) -> Option<&Path> {
        self.fonts_dir.as_deref()
    }

    /// Root for photo URLs, [`DEFAULT_PHOTOS_DIR`] unless overridden.
    pub fn photos_dir(&self) -> &Path {
        self.photos_dir
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PHOTOS_DIR))
    }
}

/// `Laporan_Kejadian_<UTC timestamp>.pdf`, with `:` and `.` in the
/// timestamp replaced by `-` so the name is valid on every filesystem.
pub fn default_output_file_name(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{OUTPUT_FILE_PREFIX}{stamp}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_name_replaces_separators() {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 13, 22, 15, 43)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(860))
            .unwrap();
        assert_eq!(
            default_output_file_name(now),
            "Laporan_Kejadian_2026-02-13T22-15-43-860Z.pdf"
        );
    }

    #[test]
    fn builders_keep_theme_default() {
        let config = ReportConfig::new("out.pdf")
            .with_fonts_dir(PathBuf::from("/opt/fonts"))
            .with_logo(None::<PathBuf>);
        assert_eq!(config.fonts_dir(), Some(Path::new("/opt/fonts")));
        assert!(config.logo_path.is_none());
        assert_eq!(config.theme, Theme::default());
        assert_eq!(config.photos_dir(), Path::new("public"));
    }

    #[test]
    fn photos_dir_can_be_overridden() {
        let config = ReportConfig::new("out.pdf").with_photos_dir(PathBuf::from("/srv/app/public"));
        assert_eq!(config.photos_dir(), Path::new("/srv/app/public"));
    }
}
