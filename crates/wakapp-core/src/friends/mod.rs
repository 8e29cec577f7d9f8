//! Friendship records and their status machine.
//!
//! ```text
//!   pending ──────────────> accepted
//!      │                       ^    \
//!      └──> sms_invited ───────┘     \
//!      \          \                   v
//!       +----------+-------------> removed   (terminal)
//! ```
//!
//! Acceptance happens on the server (the other party accepts); the client
//! only observes it on the next listing. Removal is the one transition the
//! client drives, and only after an explicit confirmation.

pub mod service;

pub use service::FriendService;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::serde_util::string_or_number;

/// Relationship status as reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    #[default]
    Pending,
    SmsInvited,
    Accepted,
    /// Local terminal state after a confirmed removal.
    Removed,
    /// Any status string this client does not know.
    #[serde(other)]
    Unknown,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::SmsInvited => "sms_invited",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Removed => "removed",
            FriendshipStatus::Unknown => "unknown",
        }
    }

    /// User-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            FriendshipStatus::Accepted => "Accepted",
            FriendshipStatus::Pending => "Pending",
            FriendshipStatus::SmsInvited => "Invited",
            FriendshipStatus::Removed | FriendshipStatus::Unknown => "Unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FriendshipStatus::Removed)
    }

    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &FriendshipStatus) -> bool {
        match self {
            FriendshipStatus::Pending => matches!(
                to,
                FriendshipStatus::Accepted | FriendshipStatus::SmsInvited | FriendshipStatus::Removed
            ),
            FriendshipStatus::SmsInvited => {
                matches!(to, FriendshipStatus::Accepted | FriendshipStatus::Removed)
            }
            FriendshipStatus::Accepted | FriendshipStatus::Unknown => {
                matches!(to, FriendshipStatus::Removed)
            }
            FriendshipStatus::Removed => false,
        }
    }

    /// Re-notifying is only meaningful while the other side hasn't answered.
    pub fn can_resend(&self) -> bool {
        matches!(self, FriendshipStatus::Pending | FriendshipStatus::SmsInvited)
    }

    /// Only accepted friends can be asked to wake someone up.
    pub fn can_wake_up(&self) -> bool {
        matches!(self, FriendshipStatus::Accepted)
    }
}

impl fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A friendship as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub requester_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub friend_id: String,
    #[serde(default)]
    pub status: FriendshipStatus,
    #[serde(default)]
    pub friend_name: String,
    #[serde(default)]
    pub friend_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Friendship {
    /// Name to show for this friend.
    pub fn display_name(&self) -> &str {
        if !self.friend_name.is_empty() {
            &self.friend_name
        } else {
            self.username.as_deref().unwrap_or("Selected Friend")
        }
    }

    /// The user on the other side of the relationship from `viewer_id`.
    pub fn other_party(&self, viewer_id: &str) -> &str {
        if self.requester_id == viewer_id {
            &self.friend_id
        } else {
            &self.requester_id
        }
    }

    /// A user cannot befriend themselves.
    pub fn is_consistent(&self) -> bool {
        self.requester_id != self.friend_id
    }

    pub fn can_wake_up(&self) -> bool {
        self.status.can_wake_up()
    }
}

/// Friends eligible for "wake-up" initiation.
pub fn wake_up_candidates(friends: &[Friendship]) -> Vec<&Friendship> {
    friends.iter().filter(|f| f.can_wake_up()).collect()
}

/// A validated add-friend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendRequest {
    name: String,
    phone: String,
}

impl FriendRequest {
    /// Both fields are required; surrounding whitespace is dropped.
    pub fn new(name: &str, phone: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        let phone = phone.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" });
        }
        if phone.is_empty() {
            return Err(ValidationError::EmptyField { field: "phone" });
        }
        Ok(Self {
            name: name.to_string(),
            phone: phone.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}
