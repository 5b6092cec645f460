//! Font loading for the report renderer.
//!
//! The report uses two CJK-capable faces: a gothic face for headings and
//! inverted header cells, and a UI face for body text and table cells. Each
//! face ships as a single file, so the same data fills all four slots of the
//! `genpdf` font family.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use log::debug;

/// Environment variable that overrides the font directory.
pub const FONTS_DIR_ENV: &str = "INCIDENT_REPORT_FONTS_DIR";

/// Directory the faces are installed to on the report host.
pub const SYSTEM_FONTS_DIR: &str = "/usr/share/fonts/truetype/chinese";

/// Face used for titles, section headings and inverted header cells.
pub const HEADING_FONT_FILE: &str = "msyh.ttf";

/// Face used for paragraphs and table cells.
pub const BODY_FONT_FILE: &str = "SimHei.ttf";

const FONT_FILES: &[&str] = &[HEADING_FONT_FILE, BODY_FONT_FILE];

/// Loaded font data for both text roles.
pub struct ReportFonts {
    /// Family used as the document default.
    pub body: FontFamily<FontData>,
    /// Family registered for headings.
    pub heading: FontFamily<FontData>,
}

fn font_directory_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }

    if let Some(path) = env::var_os(FONTS_DIR_ENV) {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() && !candidates.contains(&path) {
            candidates.push(path);
        }
    }

    let system = PathBuf::from(SYSTEM_FONTS_DIR);
    if !candidates.contains(&system) {
        candidates.push(system);
    }

    candidates
}

fn missing_font_files(path: &Path) -> Vec<&'static str> {
    FONT_FILES
        .iter()
        .copied()
        .filter(|name| !path.join(name).is_file())
        .collect()
}

/// Finds the first candidate directory holding both faces.
///
/// `explicit` is searched first, then [`FONTS_DIR_ENV`], then
/// [`SYSTEM_FONTS_DIR`].
pub fn resolve_font_directory(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    first_complete_directory(font_directory_candidates(explicit))
}

fn first_complete_directory(candidates: Vec<PathBuf>) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in candidates {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_font_files(&candidate);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate report fonts. Checked: {}. Install {} and {} or set {}.",
            attempts.join(", "),
            HEADING_FONT_FILE,
            BODY_FONT_FILE,
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "report fonts not found"),
    ))
}

fn single_face_family(directory: &Path, file: &str) -> Result<FontFamily<FontData>, Error> {
    let path = directory.join(file);
    let data = FontData::load(&path, None).map_err(|err| {
        Error::new(
            format!("Failed to load font {}: {}", path.display(), err),
            io::Error::new(io::ErrorKind::InvalidData, err.to_string()),
        )
    })?;

    Ok(FontFamily {
        regular: data.clone(),
        bold: data.clone(),
        italic: data.clone(),
        bold_italic: data,
    })
}

/// Loads both report faces.
pub fn load_report_fonts(explicit: Option<&Path>) -> Result<ReportFonts, Error> {
    let directory = resolve_font_directory(explicit)?;
    debug!("loading report fonts from {}", directory.display());

    Ok(ReportFonts {
        body: single_face_family(&directory, BODY_FONT_FILE)?,
        heading: single_face_family(&directory, HEADING_FONT_FILE)?,
    })
}

/// Indicates whether both report faces can be found.
pub fn report_fonts_available(explicit: Option<&Path>) -> bool {
    resolve_font_directory(explicit).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_directory_is_searched_first() {
        let explicit = Path::new("/__incident_report_fonts__");
        let candidates = font_directory_candidates(Some(explicit));
        assert_eq!(candidates.first().map(PathBuf::as_path), Some(explicit));
        assert!(candidates.contains(&PathBuf::from(SYSTEM_FONTS_DIR)));
    }

    #[test]
    fn missing_directory_lists_every_face() {
        let missing = missing_font_files(Path::new("/__incident_report_fonts__"));
        assert_eq!(missing, vec![HEADING_FONT_FILE, BODY_FONT_FILE]);
    }

    #[test]
    fn error_names_checked_directory() {
        let missing = PathBuf::from("/__incident_report_fonts__");
        let err = first_complete_directory(vec![missing]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("/__incident_report_fonts__ (directory missing)"));
        assert!(message.contains(FONTS_DIR_ENV));
    }

    #[test]
    fn error_names_missing_face() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(HEADING_FONT_FILE), b"").unwrap();

        let err = first_complete_directory(vec![dir.path().to_path_buf()]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing files [SimHei.ttf]"));
        assert!(!message.contains("[msyh.ttf"));
    }

    #[test]
    fn first_directory_with_both_faces_wins() {
        let partial = TempDir::new().unwrap();
        fs::write(partial.path().join(BODY_FONT_FILE), b"").unwrap();
        let complete = TempDir::new().unwrap();
        for file in FONT_FILES {
            fs::write(complete.path().join(file), b"").unwrap();
        }

        let found = first_complete_directory(vec![
            PathBuf::from("/__incident_report_fonts__"),
            partial.path().to_path_buf(),
            complete.path().to_path_buf(),
        ])
        .unwrap();
        assert_eq!(found, complete.path());
    }
}
