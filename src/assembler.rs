//! Maps an [`IncidentRecord`] onto the fixed report layout.

use chrono::NaiveDateTime;
use log::debug;

use crate::model::{
    FooterBlock, HorizontalAlignment, PhotoBlock, PhotoSlot, Report, ReportSection,
    RichParagraph, SectionContent, SectionKind, TableBlock, TableBorder, TableShading, TitleBlock,
};
use crate::record::{keys, IncidentRecord, PLACEHOLDER};
use crate::richtext::Span;

pub const REPORT_TITLE: &str = "LAPORAN KEJADIAN DAN GANGGUAN";
pub const REPORT_SUBTITLE: &str = "SISTEM MONITORING TOL";
pub const FOOTER_DISCLAIMER: &str = "Dokumen ini dibuat secara otomatis oleh Sistem Monitoring TOL";

const REPORT_NUMBER_FORMAT: &str = "%Y%m%d%H%M";
const REPORT_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";
const FOOTER_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

const HEADER_WIDTHS_MM: [f64; 2] = [40.0, 120.0];
const LABEL_VALUE_WIDTHS_MM: [f64; 2] = [50.0, 110.0];
const DISTURBANCE_WIDTHS_MM: [f64; 3] = [15.0, 50.0, 95.0];
const ACTION_WIDTHS_MM: [f64; 3] = [15.0, 30.0, 115.0];

const INCIDENT_ROWS: &[(&str, &str)] = &[
    ("Tanggal Kejadian", keys::INCIDENT_DATE),
    ("Waktu Kejadian", keys::INCIDENT_TIME),
    ("Shift", keys::SHIFT),
    ("Gardu", keys::GATE),
    ("Lokasi", keys::LOCATION),
];

const DISTURBANCE_ROWS: &[(&str, &str)] = &[
    ("Gangguan Palang", keys::DISTURBANCE_BARRIER),
    ("Gangguan Reader/Periferal", keys::DISTURBANCE_READER),
    ("Gangguan Sistem", keys::DISTURBANCE_SYSTEM),
    ("Gangguan Kelistrikan", keys::DISTURBANCE_ELECTRICAL),
];

const ACTION_ROWS: &[(&str, &str)] = &[
    ("KSPT", keys::ACTION_KSPT),
    ("IT", keys::ACTION_IT),
    ("Teknisi", keys::ACTION_TECHNICIAN),
    ("PulTol", keys::ACTION_TOLL_COLLECTION),
    ("Security", keys::ACTION_SECURITY),
];

const PERSONNEL_ROWS: &[(&str, &str)] = &[
    ("Petugas KSPT", keys::OFFICER_KSPT),
    ("Petugas PulTol", keys::OFFICER_TOLL_COLLECTION),
    ("Petugas IT", keys::OFFICER_IT),
    ("Petugas Teknisi", keys::OFFICER_TECHNICIAN),
    ("Petugas Security", keys::OFFICER_SECURITY),
];

const STATUS_ROWS: &[(&str, &str)] = &[
    ("Status", keys::ACTION_STATUS),
    ("Jumlah Alarm", keys::ALARM_COUNT),
    ("Jumlah Reset", keys::RESET_COUNT),
];

const ADDITIONAL_ROWS: &[(&str, &str)] = &[
    ("Waktu Menginformasikan", keys::NOTIFIED_AT),
    ("Waktu Penanganan", keys::HANDLED_AT),
    ("Antrian Kendaraan", keys::VEHICLE_QUEUE),
    ("Keluhan Pengguna Jalan", keys::ROAD_USER_COMPLAINT),
];

const PHOTO_SLOTS: &[(&str, &str)] = &[
    ("Foto Sebelum", keys::PHOTO_BEFORE),
    ("Foto Sesudah", keys::PHOTO_AFTER),
];

/// Every record field printed in the report body.
pub const PRINTED_FIELDS: &[&str] = &[
    keys::INCIDENT_DATE,
    keys::INCIDENT_TIME,
    keys::SHIFT,
    keys::GATE,
    keys::LOCATION,
    keys::CHRONOLOGY,
    keys::DISTURBANCE_BARRIER,
    keys::DISTURBANCE_READER,
    keys::DISTURBANCE_SYSTEM,
    keys::DISTURBANCE_ELECTRICAL,
    keys::ACTION_KSPT,
    keys::ACTION_IT,
    keys::ACTION_TECHNICIAN,
    keys::ACTION_TOLL_COLLECTION,
    keys::ACTION_SECURITY,
    keys::OFFICER_KSPT,
    keys::OFFICER_TOLL_COLLECTION,
    keys::OFFICER_IT,
    keys::OFFICER_TECHNICIAN,
    keys::OFFICER_SECURITY,
    keys::ACTION_STATUS,
    keys::ALARM_COUNT,
    keys::RESET_COUNT,
    keys::NOTIFIED_AT,
    keys::HANDLED_AT,
    keys::VEHICLE_QUEUE,
    keys::ROAD_USER_COMPLAINT,
    keys::PHOTO_BEFORE,
    keys::PHOTO_AFTER,
];

/// Report number derived from the generation time, `YYYYMMDDHHmm`.
///
/// The number comes from the clock rather than the record, so two renders
/// of the same incident a minute apart get different numbers.
pub fn report_number(generated_at: NaiveDateTime) -> String {
    generated_at.format(REPORT_NUMBER_FORMAT).to_string()
}

/// Builds the complete report for `record` as generated at `generated_at`.
pub fn assemble(record: &IncidentRecord, generated_at: NaiveDateTime) -> Report {
    let title = TitleBlock::new(REPORT_TITLE, REPORT_SUBTITLE);

    let sections = vec![
        header_section(generated_at),
        label_value_section(
            SectionKind::IncidentInformation,
            "1. INFORMASI KEJADIAN",
            record,
            INCIDENT_ROWS,
        ),
        chronology_section(record),
        numbered_section(
            SectionKind::DisturbanceTypes,
            "3. JENIS GANGGUAN",
            ["No", "Jenis Gangguan", "Keterangan"],
            DISTURBANCE_WIDTHS_MM,
            record,
            DISTURBANCE_ROWS,
        ),
        numbered_section(
            SectionKind::Actions,
            "4. TINDAKAN",
            ["No", "Pelaksana", "Tindakan"],
            ACTION_WIDTHS_MM,
            record,
            ACTION_ROWS,
        ),
        personnel_section(record),
        label_value_section(
            SectionKind::Status,
            "6. STATUS TINDAKAN",
            record,
            STATUS_ROWS,
        ),
        label_value_section(
            SectionKind::AdditionalInformation,
            "7. INFORMASI TAMBAHAN",
            record,
            ADDITIONAL_ROWS,
        ),
        photo_section(record),
    ];

    let footer = FooterBlock::new([
        FOOTER_DISCLAIMER.to_owned(),
        format!("Tanggal: {}", generated_at.format(FOOTER_DATE_FORMAT)),
    ]);

    debug!(
        "assembled report {} with {} sections",
        report_number(generated_at),
        sections.len()
    );
    Report::new(title, sections, footer)
}

fn header_section(generated_at: NaiveDateTime) -> ReportSection {
    let table = TableBlock::new(HEADER_WIDTHS_MM, TableShading::InvertedLabelColumn)
        .with_border(TableBorder::Box)
        .with_row([
            "No. Laporan".to_owned(),
            format!(": {}", report_number(generated_at)),
        ])
        .with_row([
            "Tanggal Laporan".to_owned(),
            format!(": {}", generated_at.format(REPORT_DATE_FORMAT)),
        ]);
    ReportSection::new(SectionKind::Header, SectionContent::Table(table))
}

fn label_value_section(
    kind: SectionKind,
    heading: &str,
    record: &IncidentRecord,
    rows: &[(&str, &str)],
) -> ReportSection {
    let table = rows.iter().fold(
        TableBlock::new(LABEL_VALUE_WIDTHS_MM, TableShading::ShadedLabelColumn),
        |table, (label, key)| table.with_row([(*label).to_owned(), record.display(key)]),
    );
    ReportSection::new(kind, SectionContent::Table(table)).with_heading(heading)
}

fn numbered_section(
    kind: SectionKind,
    heading: &str,
    header: [&str; 3],
    widths: [f64; 3],
    record: &IncidentRecord,
    rows: &[(&str, &str)],
) -> ReportSection {
    let table = rows.iter().enumerate().fold(
        TableBlock::new(widths, TableShading::InvertedHeaderRow)
            .with_header(header)
            .with_column_alignment(0, HorizontalAlignment::Center),
        |table, (index, (label, key))| {
            table.with_row([
                (index + 1).to_string(),
                (*label).to_owned(),
                record.display(key),
            ])
        },
    );
    ReportSection::new(kind, SectionContent::Table(table)).with_heading(heading)
}

fn personnel_section(record: &IncidentRecord) -> ReportSection {
    let table = PERSONNEL_ROWS.iter().fold(
        TableBlock::new(LABEL_VALUE_WIDTHS_MM, TableShading::InvertedHeaderRow)
            .with_header(["Jabatan", "Nama"]),
        |table, (label, key)| table.with_row([(*label).to_owned(), record.display(key)]),
    );
    ReportSection::new(SectionKind::Personnel, SectionContent::Table(table))
        .with_heading("5. PETUGAS")
}

fn chronology_section(record: &IncidentRecord) -> ReportSection {
    let paragraph = RichParagraph::new(vec![Span::new(record.display(keys::CHRONOLOGY))])
        .with_alignment(HorizontalAlignment::Justified);
    ReportSection::new(SectionKind::Chronology, SectionContent::Text(paragraph))
        .with_heading("2. KRONOLOGI KEJADIAN")
}

fn photo_section(record: &IncidentRecord) -> ReportSection {
    let slots: Vec<PhotoSlot> = PHOTO_SLOTS
        .iter()
        .map(|(label, key)| {
            let value = record.display(key);
            let source = (value != PLACEHOLDER).then_some(value);
            PhotoSlot::new(*label, source)
        })
        .collect();
    ReportSection::new(
        SectionKind::PhotoDocumentation,
        SectionContent::Photos(PhotoBlock::new(slots)),
    )
    .with_heading("8. FOTO DOKUMENTASI")
}
