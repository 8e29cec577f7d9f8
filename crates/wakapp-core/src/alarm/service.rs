//! Alarm operations against the remote service.

use chrono::NaiveDateTime;

use super::{Alarm, AlarmDraft};
use crate::api::ApiClient;
use crate::confirm::Confirmation;
use crate::error::{CoreError, Result};
use crate::partition::{partition, AlarmBuckets};
use crate::refresh::Exclusive;
use crate::session::{Session, SessionBackend};

pub struct AlarmService<'a> {
    api: &'a ApiClient,
    deleting: Exclusive<String>,
}

impl<'a> AlarmService<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            deleting: Exclusive::new(),
        }
    }

    /// Every alarm the session user created or is targeted by.
    pub async fn list<B: SessionBackend>(&self, session: &Session<B>) -> Result<Vec<Alarm>> {
        let user = session.require()?;
        let alarms = self.api.list_alarms(&user.id).await?;
        tracing::debug!(count = alarms.len(), "alarms loaded");
        Ok(alarms)
    }

    /// Fetch and partition in one step.
    pub async fn buckets<B: SessionBackend>(
        &self,
        session: &Session<B>,
        now: NaiveDateTime,
    ) -> Result<AlarmBuckets> {
        let alarms = self.list(session).await?;
        Ok(partition(&alarms, now))
    }

    /// Submit `draft`. Nothing is sent unless the draft passes its checks.
    pub async fn create<B: SessionBackend>(
        &self,
        session: &Session<B>,
        draft: &AlarmDraft,
    ) -> Result<Alarm> {
        let author = session.require()?;
        let request = draft.to_request(author)?;
        let receipt = self.api.create_alarm(&request).await?;

        let date = draft.date.format("%Y-%m-%d").to_string();
        let time = draft.time.format("%H:%M").to_string();
        let alarm = Alarm {
            id: receipt.id.unwrap_or_default(),
            alarm_date: Some(receipt.alarm_date.unwrap_or(date)),
            alarm_time: Some(receipt.alarm_time.unwrap_or(time)),
            target_user: request.target_user,
            created_by: request.user_id,
            wake_methods: draft.wake_methods.clone(),
            is_active: receipt.is_active.unwrap_or(false),
            is_approved: receipt.is_approved.unwrap_or(false),
            media_files: None,
            triggered_at: None,
        };
        tracing::info!(alarm_id = %alarm.id, target = %alarm.target_user, "alarm created");
        Ok(alarm)
    }

    pub fn propose_delete(&self, alarm: &Alarm) -> Confirmation<Alarm> {
        Confirmation::new(
            alarm.clone(),
            "Delete Alarm",
            "Are you sure you want to delete this alarm?",
        )
    }

    /// Delete a confirmed alarm. The service refuses alarms the session
    /// user may not delete.
    pub async fn delete<B: SessionBackend>(
        &self,
        session: &Session<B>,
        confirmed: Confirmation<Alarm>,
    ) -> Result<Alarm> {
        let user = session.require()?;
        let alarm = confirmed.into_target();
        let _running = self
            .deleting
            .start(alarm.id.clone())
            .ok_or_else(|| CoreError::Busy {
                action: "delete",
                id: alarm.id.clone(),
            })?;
        self.api.delete_alarm(&alarm.id, &user.id).await?;
        tracing::info!(alarm_id = %alarm.id, "alarm deleted");
        Ok(alarm)
    }
}
