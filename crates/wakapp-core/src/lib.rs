//! # Wakapp Core Library
//!
//! Client-side state model for Wakapp, a social wake-up alarm service: users
//! schedule alarms for themselves or for accepted friends, choosing how the
//! target is woken (voice, video, song or puzzle). The service owns the
//! records; this crate owns the rules around them and is shared by the CLI
//! and any other front end.
//!
//! ## Architecture
//!
//! - **Session**: the current identity, persisted in a SQLite key-value table
//! - **Friendships**: status machine, add/resend/remove flows
//! - **Alarms**: drafts, validation, create/delete/clone, reveal rules
//! - **Partition**: Active / Pending / Past buckets derived from `now`
//! - **API**: typed `reqwest` client for the remote service
//!
//! ## Key Components
//!
//! - [`Session`]: who is acting; passed into every operation that needs it
//! - [`AlarmService`], [`FriendService`], [`Auth`]: remote operations
//! - [`partition`]: pure bucketing of an alarm list
//! - [`Config`]: application configuration management

pub mod alarm;
pub mod api;
pub mod auth;
pub mod confirm;
pub mod display;
pub mod error;
pub mod friends;
pub mod partition;
pub mod refresh;
mod serde_util;
pub mod session;
pub mod storage;
pub mod validation;

pub use alarm::{
    Alarm, AlarmDraft, AlarmService, AlarmSummary, Bucket, CreateAlarmRequest, MediaRef, Reveal,
    TargetType, WakeMethod,
};
pub use api::ApiClient;
pub use auth::{Auth, LoginInput, Registration, RegistrationOutcome};
pub use confirm::Confirmation;
pub use error::{
    ConfigError, CoreError, PersistenceError, Result, SelectionError, TransportError,
    ValidationError,
};
pub use friends::{wake_up_candidates, FriendRequest, FriendService, Friendship, FriendshipStatus};
pub use partition::{partition, AlarmBuckets};
pub use refresh::{Exclusive, InFlight, RefreshSlot, Running, Ticket};
pub use session::{Identity, Session, SessionBackend};
pub use storage::{Config, Database};
pub use validation::validate;
