use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use incident_report::assembler::assemble;
use incident_report::config::ReportConfig;
use incident_report::fonts;
use incident_report::record::{keys, IncidentRecord};
use incident_report::render::Renderer;
use incident_report::style::Theme;
use incident_report::ReportError;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

const SKIP_REASON: &str =
    "report fonts missing. Install msyh.ttf and SimHei.ttf or set INCIDENT_REPORT_FONTS_DIR.";

fn generated_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 14)
        .and_then(|date| date.and_hms_opt(8, 5, 0))
        .expect("valid timestamp")
}

fn renderer() -> Option<Renderer> {
    if !fonts::report_fonts_available(None) {
        return None;
    }
    let fonts = fonts::load_report_fonts(None).expect("load report fonts");
    Some(Renderer::new(Theme::default(), fonts))
}

fn render_sample_pdf() -> Option<Vec<u8>> {
    let renderer = renderer()?;
    let record = IncidentRecord::sample().expect("sample record");
    let report = assemble(&record, generated_at());
    let bytes = renderer.render(&report).expect("render sample pdf").bytes;
    Some(bytes)
}

fn render_record(renderer: &Renderer, record: &IncidentRecord) -> Vec<u8> {
    let report = assemble(record, generated_at());
    renderer.render(&report).expect("render record").bytes
}

fn write_photo(dir: &Path, name: &str) {
    let uploads = dir.join("uploads");
    fs::create_dir_all(&uploads).expect("create uploads dir");
    // RGBA on purpose: the PDF writer only takes opaque images.
    let photo = image::RgbaImage::from_pixel(64, 48, image::Rgba([200, 30, 30, 255]));
    photo.save(uploads.join(name)).expect("write photo");
}

fn record_with_photos(before: &str, after: &str) -> IncidentRecord {
    IncidentRecord::sample()
        .expect("sample")
        .with_text(keys::PHOTO_BEFORE, before)
        .with_text(keys::PHOTO_AFTER, after)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if !data[index..].starts_with(tag) {
                index += 1;
                continue;
            }
            let mut cursor = index + tag.len();
            while cursor < data.len() && data[cursor] != terminator {
                if terminator == b')' || !matches!(data[cursor], b'<' | b'>' | b' ' | b'\n') {
                    data[cursor] = b'0';
                }
                cursor += 1;
            }
            index = cursor;
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while let Some(found) = data[offset..]
            .windows(start.len())
            .position(|window| window == start)
        {
            let from = offset + found + start.len();
            let Some(length) = data[from..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            data[from..from + length].fill(b'0');
            offset = from + length + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    let tags: [&[u8]; 3] = [b"/CreationDate(", b"/ModDate(", b"/Producer("];
    for tag in tags {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    let elements: [(&[u8], &[u8]); 6] = [
        (b"<xmp:CreateDate>", b"</xmp:CreateDate>"),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ];
    for (start, end) in elements {
        scrub_xml(&mut normalized, start, end);
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

#[test]
fn renders_pdf_document() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping renders_pdf_document: {SKIP_REASON}");
        return;
    };
    assert!(bytes.starts_with(b"%PDF"), "output should be a PDF document");
}

#[test]
fn rendering_is_deterministic() {
    let (Some(bytes_a), Some(bytes_b)) = (render_sample_pdf(), render_sample_pdf()) else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_REASON}");
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "renders of the same record and time must match after metadata normalization"
    );
}

#[test]
fn empty_record_still_renders() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping empty_record_still_renders: {SKIP_REASON}");
        return;
    };
    let report = assemble(&IncidentRecord::new(), generated_at());
    let rendered = renderer.render(&report).expect("render empty record");
    assert!(rendered.bytes.starts_with(b"%PDF"));
    assert_eq!(rendered.section_pages.len(), 8);
}

#[test]
fn write_report_returns_absolute_path() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping write_report_returns_absolute_path: {SKIP_REASON}");
        return;
    };
    let dir = TempDir::new().expect("temp dir");
    let target = dir.path().join("Laporan_Kejadian_test.pdf");
    let report = assemble(&IncidentRecord::sample().expect("sample"), generated_at());

    let written = renderer.write_report(&report, &target).expect("write report");

    assert!(written.is_absolute());
    assert!(fs::read(&written).expect("read report").starts_with(b"%PDF"));
}

#[test]
fn failed_write_leaves_no_file() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping failed_write_leaves_no_file: {SKIP_REASON}");
        return;
    };
    let target = PathBuf::from("/__incident_report_missing_dir__/Laporan.pdf");
    let report = assemble(&IncidentRecord::sample().expect("sample"), generated_at());

    let err = renderer.write_report(&report, &target).unwrap_err();

    assert!(matches!(err, ReportError::Io { .. }));
    assert!(!target.exists());
}

#[test]
fn missing_fonts_fail_before_output() {
    let dir = TempDir::new().expect("temp dir");
    let config = ReportConfig::new(dir.path().join("Laporan.pdf"))
        .with_fonts_dir(PathBuf::from("/__incident_report_fonts__"));
    if fonts::report_fonts_available(config.fonts_dir()) {
        // A fallback directory has the faces installed.
        return;
    }

    let record = IncidentRecord::sample().expect("sample");
    let err = incident_report::generate(&record, &config, generated_at()).unwrap_err();

    assert!(matches!(err, ReportError::Fonts(_)));
    assert!(!config.output_path.exists());
}

#[test]
fn unreadable_logo_is_reported() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping unreadable_logo_is_reported: {SKIP_REASON}");
        return;
    };
    let renderer = renderer.with_logo(PathBuf::from("/__incident_report_missing_logo__.png"));
    let report = assemble(&IncidentRecord::new(), generated_at());

    assert!(matches!(
        renderer.render(&report),
        Err(ReportError::Logo { .. })
    ));
}

#[test]
fn overwide_cell_word_keeps_following_text() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping overwide_cell_word_keeps_following_text: {SKIP_REASON}");
        return;
    };
    let long_word = "x".repeat(120);
    let tail = vec!["ditangani"; 300].join(" ");
    let base = IncidentRecord::sample().expect("sample");

    let word_only = render_record(&renderer, &base.clone().with_text(keys::ACTION_KSPT, &long_word));
    let with_tail = render_record(
        &renderer,
        &base.with_text(keys::ACTION_KSPT, format!("{long_word} {tail}")),
    );

    assert!(
        with_tail.len() > word_only.len(),
        "text after a word wider than its column must be printed ({} vs {} bytes)",
        with_tail.len(),
        word_only.len()
    );
}

#[test]
fn long_chronology_continues_on_next_page() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping long_chronology_continues_on_next_page: {SKIP_REASON}");
        return;
    };
    let chronology = vec!["Palang gardu tidak terbuka setelah transaksi."; 400].join(" ");
    let record = IncidentRecord::sample()
        .expect("sample")
        .with_text(keys::CHRONOLOGY, chronology);
    let report = assemble(&record, generated_at());

    let rendered = renderer.render(&report).expect("render long chronology");

    assert!(rendered.bytes.starts_with(b"%PDF"));
    #[cfg(feature = "bookmarks")]
    {
        let page_of = |heading: &str| {
            rendered
                .section_pages
                .iter()
                .find(|(name, _)| name == heading)
                .and_then(|(_, page)| *page)
                .expect("section page")
        };
        assert_eq!(page_of("2. KRONOLOGI KEJADIAN"), 1);
        assert!(page_of("3. JENIS GANGGUAN") > 2);
    }
}

#[test]
fn photos_are_laid_out_side_by_side() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping photos_are_laid_out_side_by_side: {SKIP_REASON}");
        return;
    };
    let dir = TempDir::new().expect("temp dir");
    write_photo(dir.path(), "sebelum.png");
    write_photo(dir.path(), "sesudah.png");
    let renderer = renderer.with_photos_dir(dir.path());

    let without = render_record(&renderer, &record_with_photos("", ""));
    let single = render_record(&renderer, &record_with_photos("/uploads/sebelum.png", ""));
    let pair = render_record(
        &renderer,
        &record_with_photos("/uploads/sebelum.png", "/uploads/sesudah.png"),
    );

    assert!(single.len() > without.len());
    assert!(pair.len() > single.len());
}

#[test]
fn missing_photo_files_fall_back_to_text() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping missing_photo_files_fall_back_to_text: {SKIP_REASON}");
        return;
    };
    let dir = TempDir::new().expect("temp dir");
    let renderer = renderer.with_photos_dir(dir.path());

    let bytes = render_record(
        &renderer,
        &record_with_photos("/uploads/sebelum.png", "/uploads/sesudah.png"),
    );

    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn undecodable_photos_do_not_fail_the_report() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping undecodable_photos_do_not_fail_the_report: {SKIP_REASON}");
        return;
    };
    let dir = TempDir::new().expect("temp dir");
    let uploads = dir.path().join("uploads");
    fs::create_dir_all(&uploads).expect("create uploads dir");
    fs::write(uploads.join("sebelum.png"), b"not an image").expect("write photo");
    fs::write(uploads.join("sesudah.png"), b"not an image").expect("write photo");
    let renderer = renderer.with_photos_dir(dir.path());

    let pair = render_record(
        &renderer,
        &record_with_photos("/uploads/sebelum.png", "/uploads/sesudah.png"),
    );
    let single = render_record(&renderer, &record_with_photos("/uploads/sebelum.png", ""));

    assert!(pair.starts_with(b"%PDF"));
    assert!(single.starts_with(b"%PDF"));
}

#[cfg(feature = "bookmarks")]
#[test]
fn bookmarks_cover_numbered_sections() {
    let Some(renderer) = renderer() else {
        eprintln!("Skipping bookmarks_cover_numbered_sections: {SKIP_REASON}");
        return;
    };
    let report = assemble(&IncidentRecord::sample().expect("sample"), generated_at());
    let rendered = renderer.render(&report).expect("render");
    assert!(rendered.section_pages.iter().all(|(_, page)| page.is_some()));

    let bytes = incident_report::bookmarks::apply_section_bookmarks(
        &rendered.bytes,
        &rendered.section_pages,
    )
    .expect("apply bookmarks");
    let document = lopdf::Document::load_mem(&bytes).expect("parse bookmarked pdf");
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(lopdf::Object::as_reference)
        .expect("catalog reference");
    let catalog = document.get_dictionary(catalog_id).expect("catalog");
    assert!(catalog.get(b"Outlines").is_ok());
}
