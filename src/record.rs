//! Loading and normalizing the flat incident record.
//!
//! Records arrive as a single JSON object whose keys are the column names of
//! the monitoring spreadsheet. Values are scalars; nested arrays or objects
//! are rejected at load time so that every later lookup can be answered with
//! a display string.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use crate::error::ReportError;

/// Text shown for absent, null, or empty fields.
pub const PLACEHOLDER: &str = "-";

/// Column names used by the monitoring spreadsheet.
pub mod keys {
    pub const ID: &str = "id";
    pub const HEADER_TIMESTAMP: &str = "Header Timestamp";

    pub const INCIDENT_DATE: &str = "Tanggal Kejadian";
    pub const INCIDENT_TIME: &str = "Waktu Kejadian";
    pub const SHIFT: &str = "Shift Kejadian";
    pub const GATE: &str = "Gardu Kejadian";
    pub const LOCATION: &str = "Lokasi Kejadian";

    // The misspelling matches the source column header.
    pub const NOTIFIED_AT: &str = "Waktu Mengirformasikan";
    pub const HANDLED_AT: &str = "Waktu Penanganan";

    pub const OFFICER_KSPT: &str = "PETUGAS KSPT";
    pub const OFFICER_TOLL_COLLECTION: &str = "PETUGAS PULTOL";
    pub const OFFICER_SECURITY: &str = "Petugas Security";
    pub const OFFICER_IT: &str = "PETUGAS IT";
    pub const OFFICER_TECHNICIAN: &str = "PETUGAS TEKNISI";

    pub const CHRONOLOGY: &str = "Kronologi Kejadian";
    pub const VEHICLE_QUEUE: &str = "Antrian Kendaraan";
    pub const ROAD_USER_COMPLAINT: &str = "Keluhan Pengguna Jalan";

    pub const ACTION_KSPT: &str = "Tindakan KSPT";
    pub const ACTION_IT: &str = "Tindakan IT";
    pub const ACTION_TECHNICIAN: &str = "Tindakan Teknisi";
    pub const ACTION_TOLL_COLLECTION: &str = "Tindakan PulTol";
    pub const ACTION_SECURITY: &str = "Tindakan Security";

    pub const DISTURBANCE_BARRIER: &str = "A.Jenis Gangguan - Palang";
    pub const DISTURBANCE_READER: &str = "B.Jenis Gangguan Reader / Periferal";
    pub const DISTURBANCE_SYSTEM: &str = "C. Jenis Gangguan - Sistim";
    pub const DISTURBANCE_ELECTRICAL: &str = "D. Jenis Gangguan - Kelistrikan";

    pub const ACTION_STATUS: &str = "Status Tindakan";
    pub const ALARM_COUNT: &str = "Jumlah Alarm";
    pub const RESET_COUNT: &str = "Jumlah Reset";

    pub const PHOTO_BEFORE: &str = "Foto Sebelum";
    pub const PHOTO_AFTER: &str = "Foto Sesudah";
}

/// Record rendered when no input file is supplied.
pub const SAMPLE_RECORD_JSON: &str = r#"{
  "id": 1,
  "Header Timestamp": "2026-02-13T22:13:29.423Z",
  "Tanggal Kejadian": "2026-02-14",
  "Waktu Kejadian": "7:30",
  "Shift Kejadian": "I ( satu )",
  "Gardu Kejadian": "GRD 02",
  "Waktu Mengirformasikan": "7:32",
  "Waktu Penanganan": "7:55",
  "PETUGAS KSPT": "Ade Saputra",
  "PETUGAS PULTOL": "M. Ibrahim",
  "Petugas Security": "Muhammad Ikmal",
  "PETUGAS IT": "Wahyu",
  "PETUGAS TEKNISI": "-",
  "Lokasi Kejadian": "Kaluku Bodoa",
  "Kronologi Kejadian": "tes\n",
  "Antrian Kendaraan": "0",
  "Keluhan Pengguna Jalan": "tes",
  "Tindakan KSPT": "tes",
  "Tindakan IT": "tes",
  "Tindakan Teknisi": "tidak ada",
  "Tindakan PulTol": "tes",
  "Tindakan Security": "tes",
  "A.Jenis Gangguan - Palang": "Tidak ada",
  "B.Jenis Gangguan Reader / Periferal": "Tidak ada",
  "C. Jenis Gangguan - Sistim": "Tidak ada",
  "D. Jenis Gangguan - Kelistrikan": "",
  "Status Tindakan": "Selesai",
  "Jumlah Alarm": "1",
  "Jumlah Reset": "1",
  "Foto Sebelum": "/uploads/photo_1771020807862_isiqsh.jpg",
  "Foto Sesudah": "/uploads/photo_1771020808854_wps9w.jpg"
}"#;

/// A single scalar value stored in the record.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Free text.
    Text(String),
    /// A JSON number, printed as written.
    Number(Number),
    /// A JSON boolean.
    Flag(bool),
    /// An explicit `null`.
    Null,
}

impl FieldValue {
    fn from_json(field: &str, value: Value) -> Result<Self, ReportError> {
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Number(number) => Ok(Self::Number(number)),
            Value::Bool(flag) => Ok(Self::Flag(flag)),
            Value::Null => Ok(Self::Null),
            Value::Array(_) => Err(ReportError::UnsupportedValue {
                field: field.to_owned(),
                kind: "array",
            }),
            Value::Object(_) => Err(ReportError::UnsupportedValue {
                field: field.to_owned(),
                kind: "object",
            }),
        }
    }

    /// Returns the display text, or `None` when the value counts as missing.
    pub fn as_display(&self) -> Option<String> {
        match self {
            Self::Text(text) if text.is_empty() => None,
            Self::Text(text) => Some(text.clone()),
            Self::Number(number) => Some(number.to_string()),
            Self::Flag(flag) => Some(flag.to_string()),
            Self::Null => None,
        }
    }
}

/// One monitoring-system event as a flat field map.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct IncidentRecord {
    fields: HashMap<String, FieldValue>,
}

impl TryFrom<Map<String, Value>> for IncidentRecord {
    type Error = ReportError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let fields = map
            .into_iter()
            .map(|(key, value)| {
                let value = FieldValue::from_json(&key, value)?;
                Ok((key, value))
            })
            .collect::<Result<HashMap<_, _>, ReportError>>()?;
        Ok(Self { fields })
    }
}

impl IncidentRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a record from a JSON document whose root must be an object.
    pub fn from_json_str(input: &str) -> Result<Self, ReportError> {
        let map: Map<String, Value> = serde_json::from_str(input)?;
        let record = Self::try_from(map)?;
        debug!("loaded incident record with {} fields", record.len());
        Ok(record)
    }

    /// Reads and parses a record from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let input = fs::read_to_string(path).map_err(|err| ReportError::io(path, err))?;
        Self::from_json_str(&input)
    }

    /// Returns the embedded sample record.
    pub fn sample() -> Result<Self, ReportError> {
        Self::from_json_str(SAMPLE_RECORD_JSON)
    }

    /// Sets a field and returns the updated record.
    pub fn with_field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Sets a text field and returns the updated record.
    pub fn with_text(self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_field(key, FieldValue::Text(text.into()))
    }

    /// Returns the raw value of a field.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Number of stored fields, including ones the report does not print.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolves a field to the text shown in the report.
    ///
    /// Missing keys, `null`, and empty strings all yield [`PLACEHOLDER`].
    /// Everything else, including `0` and whitespace, is shown as stored.
    pub fn display(&self, key: &str) -> String {
        self.get(key)
            .and_then(FieldValue::as_display)
            .unwrap_or_else(|| PLACEHOLDER.to_owned())
    }
}
