//! Alarm records and their derived lifecycle state.
//!
//! Nothing here is stored as a flag: whether an alarm is past, active or
//! pending is computed from the server's date/time fields and the caller's
//! `now` every time it is asked.
//!
//! ```text
//!   created ──(time passes)──> Past
//!      │
//!      ├── is_active ──> Active
//!      └── otherwise ──> Pending
//! ```

pub mod draft;
pub mod service;

pub use draft::{AlarmDraft, CreateAlarmRequest, TargetType};
pub use service::AlarmService;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::serde_util::{null_as_default, string_or_number};

/// How the target of an alarm gets woken up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeMethod {
    Voice,
    Video,
    Song,
    Puzzle,
}

impl WakeMethod {
    pub const ALL: [WakeMethod; 4] = [
        WakeMethod::Voice,
        WakeMethod::Video,
        WakeMethod::Song,
        WakeMethod::Puzzle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WakeMethod::Voice => "voice",
            WakeMethod::Video => "video",
            WakeMethod::Song => "song",
            WakeMethod::Puzzle => "puzzle",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WakeMethod::Voice => "Voice",
            WakeMethod::Video => "Video",
            WakeMethod::Song => "Song",
            WakeMethod::Puzzle => "Puzzle",
        }
    }

    /// MIME family a media file for this method is picked from.
    pub fn accepted_media(&self) -> &'static str {
        match self {
            WakeMethod::Voice | WakeMethod::Song => "audio/*",
            WakeMethod::Video => "video/*",
            WakeMethod::Puzzle => "image/*",
        }
    }
}

impl fmt::Display for WakeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WakeMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voice" => Ok(WakeMethod::Voice),
            "video" => Ok(WakeMethod::Video),
            "song" => Ok(WakeMethod::Song),
            "puzzle" => Ok(WakeMethod::Puzzle),
            other => Err(ValidationError::InvalidValue {
                field: "wake_method".into(),
                message: format!("unknown wake method '{other}'"),
            }),
        }
    }
}

/// A media file picked for one wake method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub name: String,
    pub uri: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl MediaRef {
    /// Describe a local file as a media reference.
    ///
    /// # Errors
    /// Returns an error if the file's metadata cannot be read.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let path = std::fs::canonicalize(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = path
            .extension()
            .and_then(|ext| guess_mime(&ext.to_string_lossy()))
            .map(str::to_string);

        Ok(Self {
            name,
            uri: format!("file://{}", path.display()),
            mime_type,
            size: Some(meta.len()),
        })
    }
}

fn guess_mime(ext: &str) -> Option<&'static str> {
    Some(match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => return None,
    })
}

/// An alarm as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// `YYYY-MM-DD`, occasionally a full `YYYY-MM-DDTHH:MM`.
    #[serde(default)]
    pub alarm_date: Option<String>,
    /// `HH:MM` or `HH:MM:SS`.
    #[serde(default)]
    pub alarm_time: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub target_user: String,
    #[serde(deserialize_with = "string_or_number")]
    pub created_by: String,
    #[serde(default, deserialize_with = "known_wake_methods")]
    pub wake_methods: BTreeSet<WakeMethod>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_at: Option<String>,
}

/// Unknown method names from the server are dropped rather than failing the
/// whole listing.
fn known_wake_methods<'de, D>(deserializer: D) -> Result<BTreeSet<WakeMethod>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(|name| match name.parse() {
            Ok(m) => Some(m),
            Err(_) => {
                tracing::debug!(method = %name, "ignoring unknown wake method");
                None
            }
        })
        .collect())
}

/// Display partition of an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Active,
    Pending,
    Past,
}

impl Bucket {
    pub fn title(&self) -> &'static str {
        match self {
            Bucket::Active => "Active Alarms",
            Bucket::Pending => "Pending Alarms",
            Bucket::Past => "Past Alarms",
        }
    }
}

/// What a viewer is allowed to see of an alarm before it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Reveal {
    Full(AlarmSummary),
    Sealed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmSummary {
    pub date: Option<String>,
    pub time: Option<String>,
    pub wake_methods: Vec<WakeMethod>,
}

impl Alarm {
    /// Combined date and time, or `None` when the date is missing or
    /// unreadable. A missing or unreadable time counts as midnight.
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        let raw = self.alarm_date.as_deref()?.trim();
        let (date, embedded_time) = match raw.split_once('T') {
            Some((d, t)) => (d, parse_time(t)),
            None => (raw, None),
        };
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        let time = self
            .alarm_time
            .as_deref()
            .and_then(parse_time)
            .or(embedded_time)
            .unwrap_or(NaiveTime::MIN);
        Some(date.and_time(time))
    }

    pub fn is_past(&self, now: NaiveDateTime) -> bool {
        self.scheduled_at().is_some_and(|at| at < now)
    }

    pub fn is_current(&self, now: NaiveDateTime) -> bool {
        !self.is_past(now)
    }

    pub fn bucket(&self, now: NaiveDateTime) -> Bucket {
        if self.is_past(now) {
            Bucket::Past
        } else if self.is_active {
            Bucket::Active
        } else {
            Bucket::Pending
        }
    }

    pub fn is_authored_by(&self, viewer_id: &str) -> bool {
        self.created_by == viewer_id
    }

    pub fn author_label(&self, viewer_id: &str) -> &'static str {
        if self.is_authored_by(viewer_id) {
            "Created by you"
        } else {
            "Created for you"
        }
    }

    /// Only the author sees the contents; the target must wait for the
    /// alarm to go off.
    pub fn reveal(&self, viewer_id: &str) -> Reveal {
        if !self.is_authored_by(viewer_id) {
            return Reveal::Sealed;
        }
        Reveal::Full(AlarmSummary {
            date: self.alarm_date.clone(),
            time: self.alarm_time.clone(),
            wake_methods: self.wake_methods.iter().copied().collect(),
        })
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}
