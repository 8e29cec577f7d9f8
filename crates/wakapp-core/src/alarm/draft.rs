//! Pre-submission alarm state and the checks that gate submission.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::{Alarm, MediaRef, WakeMethod};
use crate::error::{CoreError, SelectionError, ValidationError};
use crate::friends::{Friendship, FriendshipStatus};
use crate::session::Identity;
use crate::validation::validate;

/// Who the alarm is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    #[default]
    Myself,
    Friend,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetType::Myself => "myself",
            TargetType::Friend => "friend",
        })
    }
}

impl FromStr for TargetType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self" | "myself" | "me" => Ok(TargetType::Myself),
            "friend" => Ok(TargetType::Friend),
            other => Err(ValidationError::InvalidValue {
                field: "target_type".into(),
                message: format!("expected 'self' or 'friend', got '{other}'"),
            }),
        }
    }
}

/// Body of `POST /alarms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAlarmRequest {
    pub user_id: String,
    pub target_user: String,
    /// `YYYY-MM-DDTHH:MM`
    pub alarm_date: String,
    pub wake_methods: Vec<WakeMethod>,
    pub uploaded_files: BTreeMap<WakeMethod, MediaRef>,
}

/// The create-alarm form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmDraft {
    pub target_type: TargetType,
    pub friend: Option<Friendship>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub wake_methods: BTreeSet<WakeMethod>,
    pub media: BTreeMap<WakeMethod, MediaRef>,
}

/// Minute precision, like the picker.
fn to_minute(now: NaiveDateTime) -> (NaiveDate, NaiveTime) {
    let time = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(NaiveTime::MIN);
    (now.date(), time)
}

impl AlarmDraft {
    /// Empty draft scheduled at `now`.
    pub fn new(target_type: TargetType, now: NaiveDateTime) -> Self {
        let (date, time) = to_minute(now);
        Self {
            target_type,
            friend: None,
            date,
            time,
            wake_methods: BTreeSet::new(),
            media: BTreeMap::new(),
        }
    }

    /// Draft pre-targeted at `friend` ("wake up" from the friends list).
    pub fn for_friend(friend: Friendship, now: NaiveDateTime) -> Self {
        Self {
            friend: Some(friend),
            ..Self::new(TargetType::Friend, now)
        }
    }

    /// Pre-filled copy of `alarm` for the viewer to submit again.
    ///
    /// Only the wake methods carry over: media must be picked again and no
    /// friend is preselected. The target type is `Myself` when the viewer
    /// authored the original.
    pub fn cloned_from(alarm: &Alarm, viewer_id: &str, now: NaiveDateTime) -> Self {
        let target_type = if alarm.is_authored_by(viewer_id) {
            TargetType::Myself
        } else {
            TargetType::Friend
        };
        Self {
            wake_methods: alarm.wake_methods.clone(),
            ..Self::new(target_type, now)
        }
    }

    /// Select or deselect `method`. Returns whether it is now selected.
    pub fn toggle_method(&mut self, method: WakeMethod) -> bool {
        if self.wake_methods.remove(&method) {
            false
        } else {
            self.wake_methods.insert(method);
            true
        }
    }

    pub fn attach_media(&mut self, method: WakeMethod, media: MediaRef) {
        self.media.insert(method, media);
    }

    /// Switch back to an alarm for oneself, dropping any chosen friend.
    pub fn target_self(&mut self) {
        self.target_type = TargetType::Myself;
        self.friend = None;
    }

    pub fn select_friend(&mut self, friend: Friendship) {
        self.target_type = TargetType::Friend;
        self.friend = Some(friend);
    }

    /// Clear the form for another alarm, keeping the target type.
    pub fn reset(&mut self, now: NaiveDateTime) {
        *self = Self::new(self.target_type, now);
    }

    pub fn scheduled_for(&self) -> String {
        self.date.and_time(self.time).format("%Y-%m-%dT%H:%M").to_string()
    }

    /// Everything that can be checked without the network.
    ///
    /// Wake methods are checked first, then the friend selection.
    pub fn check(&self) -> Result<(), CoreError> {
        validate(&self.wake_methods, &self.media)?;

        if self.target_type == TargetType::Friend {
            let friend = self
                .friend
                .as_ref()
                .ok_or(SelectionError::NoFriendSelected)?;
            if friend.status != FriendshipStatus::Accepted {
                return Err(SelectionError::FriendNotAccepted {
                    name: friend.display_name().to_string(),
                    status: friend.status,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Build the request body on behalf of `author`.
    pub fn to_request(&self, author: &Identity) -> Result<CreateAlarmRequest, CoreError> {
        self.check()?;

        let target_user = match (&self.target_type, &self.friend) {
            (TargetType::Friend, Some(friend)) => friend.other_party(&author.id).to_string(),
            _ => author.id.clone(),
        };
        let uploaded_files = self
            .media
            .iter()
            .filter(|(method, _)| self.wake_methods.contains(method))
            .map(|(method, media)| (*method, media.clone()))
            .collect();

        Ok(CreateAlarmRequest {
            user_id: author.id.clone(),
            target_user,
            alarm_date: self.scheduled_for(),
            wake_methods: self.wake_methods.iter().copied().collect(),
            uploaded_files,
        })
    }
}
