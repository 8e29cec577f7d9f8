//! Splits an alarm listing into Active / Pending / Past.
//!
//! Recomputed from scratch on every call; nothing is cached between calls.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::alarm::{Alarm, Bucket};

/// The three display partitions, each sorted by scheduled time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlarmBuckets {
    pub active: Vec<Alarm>,
    pub pending: Vec<Alarm>,
    pub past: Vec<Alarm>,
}

impl AlarmBuckets {
    pub fn get(&self, bucket: Bucket) -> &[Alarm] {
        match bucket {
            Bucket::Active => &self.active,
            Bucket::Pending => &self.pending,
            Bucket::Past => &self.past,
        }
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.pending.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-empty buckets in display order.
    pub fn sections(&self) -> impl Iterator<Item = (Bucket, &[Alarm])> {
        [Bucket::Active, Bucket::Pending, Bucket::Past]
            .into_iter()
            .map(move |b| (b, self.get(b)))
            .filter(|(_, alarms)| !alarms.is_empty())
    }
}

/// Undated alarms sort after every dated one.
fn sort_key(alarm: &Alarm) -> (bool, Option<NaiveDateTime>) {
    let at = alarm.scheduled_at();
    (at.is_none(), at)
}

/// Partition `alarms` against `now`.
///
/// Every input alarm lands in exactly one bucket. Ordering inside a bucket is
/// ascending by scheduled time; ties keep their order from `alarms`.
pub fn partition(alarms: &[Alarm], now: NaiveDateTime) -> AlarmBuckets {
    let mut sorted: Vec<&Alarm> = alarms.iter().collect();
    // `sort_by_key` is stable.
    sorted.sort_by_key(|a| sort_key(a));

    let mut buckets = AlarmBuckets::default();
    for alarm in sorted {
        let target = match alarm.bucket(now) {
            Bucket::Active => &mut buckets.active,
            Bucket::Pending => &mut buckets.pending,
            Bucket::Past => &mut buckets.past,
        };
        target.push(alarm.clone());
    }
    buckets
}
