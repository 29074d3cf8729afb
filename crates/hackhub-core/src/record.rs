// ABOUTME: Defines RawRecord (producer output) and EventRecord (canonical persisted event).
// ABOUTME: Handles JSON coercion at the producer boundary, date parsing, and the field-merge rule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Date format producers use for `start_date` and `end_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Placeholder stored when a record arrives without a name or platform.
pub const UNKNOWN: &str = "Unknown";

/// Errors raised while coercing producer output into a RawRecord.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("raw record must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// An unvalidated event as emitted by a producer. Every field may be absent.
///
/// Empty strings are preserved as-is: the merge step treats them as "no value",
/// but identity hashing distinguishes an empty field from an absent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub prize: Option<String>,
    #[serde(default)]
    pub participants: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl RawRecord {
    /// Create a record carrying only a platform tag.
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: Some(platform.into()),
            ..Self::default()
        }
    }

    /// Coerce a loosely typed JSON object into a RawRecord.
    ///
    /// Strings are taken verbatim, numbers and booleans are stringified,
    /// `null` and nested values become absent. Unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Err(RecordError::NotAnObject("null")),
            Value::Bool(_) => return Err(RecordError::NotAnObject("bool")),
            Value::Number(_) => return Err(RecordError::NotAnObject("number")),
            Value::String(_) => return Err(RecordError::NotAnObject("string")),
            Value::Array(_) => return Err(RecordError::NotAnObject("array")),
        };

        let field = |key: &str| map.get(key).and_then(scalar_to_string);

        Ok(Self {
            name: field("name"),
            platform: field("platform"),
            link: field("link"),
            start_date: field("start_date"),
            end_date: field("end_date"),
            location: field("location"),
            prize: field("prize"),
            participants: field("participants"),
            image_url: field("image_url"),
        })
    }

    /// The link with surrounding whitespace removed, if any remains.
    pub fn trimmed_link(&self) -> Option<&str> {
        self.link.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse a `YYYY-MM-DD` date. Anything else (including empty input) is absent.
///
/// Only the exact ten-byte shape is accepted, so stored dates always compare
/// correctly as text.
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    value
        .filter(|v| is_iso_date_shape(v))
        .and_then(|v| NaiveDate::parse_from_str(v, DATE_FORMAT).ok())
}

fn is_iso_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// The fields a re-ingested record is allowed to overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutableField {
    Prize,
    Participants,
    Location,
    StartDate,
    EndDate,
    ImageUrl,
}

impl MutableField {
    /// Merge order, matching the column order of the events table.
    pub const ALL: [MutableField; 6] = [
        MutableField::Prize,
        MutableField::Participants,
        MutableField::Location,
        MutableField::StartDate,
        MutableField::EndDate,
        MutableField::ImageUrl,
    ];

    /// Column name for this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutableField::Prize => "prize",
            MutableField::Participants => "participants",
            MutableField::Location => "location",
            MutableField::StartDate => "start_date",
            MutableField::EndDate => "end_date",
            MutableField::ImageUrl => "image_url",
        }
    }
}

impl std::fmt::Display for MutableField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical, persisted representation of one logical event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub identity: String,
    pub name: String,
    pub platform: String,
    pub link: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub prize: Option<String>,
    pub participants: Option<String>,
    pub image_url: Option<String>,
}

impl EventRecord {
    /// Build a fresh canonical record from a raw record whose identity is unseen.
    /// Missing or empty name/platform become "Unknown"; unparseable dates become absent.
    pub fn from_raw(identity: String, raw: &RawRecord) -> Self {
        Self {
            identity,
            name: non_empty(raw.name.as_deref()).unwrap_or_else(|| UNKNOWN.to_string()),
            platform: non_empty(raw.platform.as_deref()).unwrap_or_else(|| UNKNOWN.to_string()),
            link: raw.trimmed_link().map(str::to_string),
            start_date: parse_date(raw.start_date.as_deref()),
            end_date: parse_date(raw.end_date.as_deref()),
            location: non_empty(raw.location.as_deref()),
            prize: non_empty(raw.prize.as_deref()),
            participants: non_empty(raw.participants.as_deref()),
            image_url: non_empty(raw.image_url.as_deref()),
        }
    }

    /// Overwrite mutable fields from `raw` where the incoming value is present,
    /// non-empty, and different from what is stored. Returns the changed fields
    /// in merge order; an empty result means the record is untouched.
    pub fn merge_from(&mut self, raw: &RawRecord) -> Vec<MutableField> {
        let mut changed = Vec::new();

        for field in MutableField::ALL {
            let did_change = match field {
                MutableField::Prize => merge_text(&mut self.prize, raw.prize.as_deref()),
                MutableField::Participants => {
                    merge_text(&mut self.participants, raw.participants.as_deref())
                }
                MutableField::Location => merge_text(&mut self.location, raw.location.as_deref()),
                MutableField::StartDate => {
                    merge_date(&mut self.start_date, raw.start_date.as_deref())
                }
                MutableField::EndDate => merge_date(&mut self.end_date, raw.end_date.as_deref()),
                MutableField::ImageUrl => {
                    merge_text(&mut self.image_url, raw.image_url.as_deref())
                }
            };
            if did_change {
                changed.push(field);
            }
        }

        changed
    }
}

fn merge_text(stored: &mut Option<String>, incoming: Option<&str>) -> bool {
    match incoming.filter(|v| !v.is_empty()) {
        Some(value) if stored.as_deref() != Some(value) => {
            *stored = Some(value.to_string());
            true
        }
        _ => false,
    }
}

fn merge_date(stored: &mut Option<NaiveDate>, incoming: Option<&str>) -> bool {
    match parse_date(incoming) {
        Some(date) if *stored != Some(date) => {
            *stored = Some(date);
            true
        }
        _ => false,
    }
}
