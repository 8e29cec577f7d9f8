//! Request and response bodies that only exist on the wire.

use serde::{Deserialize, Serialize};

use crate::friends::FriendshipStatus;
use crate::serde_util::opt_string_or_number;

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone: String,
}

/// Body of `POST /friend-requests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendRequestPayload {
    pub user_id: String,
    pub phone: String,
    pub nickname: String,
}

/// Whatever the service echoes back after a friend request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FriendRequestReceipt {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub friend_id: Option<String>,
    #[serde(default)]
    pub status: Option<FriendshipStatus>,
}

/// Whatever the service echoes back after creating an alarm.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlarmReceipt {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub alarm_date: Option<String>,
    #[serde(default)]
    pub alarm_time: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_approved: Option<bool>,
}

/// Error body; `detail` is a string or a structured validation report.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(crate) fn message(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
