//! Alarm commands for CLI.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Subcommand};
use wakapp_core::display::{format_date, format_time};
use wakapp_core::{
    Alarm, AlarmBuckets, AlarmDraft, AlarmService, ApiClient, Config, CoreError, FriendService,
    MediaRef, RefreshSlot, Reveal, Session, TargetType, WakeMethod,
};

use super::{api, confirm, now, open_session, CommandResult};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// List alarms grouped into active, pending and past
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Refresh every N seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Create an alarm
    Create {
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Delete an alarm
    Delete {
        /// Alarm ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Create a new alarm with the same wake methods as an existing one
    Clone {
        /// Alarm ID to copy
        id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Show what you may see of an alarm before it goes off
    Reveal {
        /// Alarm ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct DraftArgs {
    /// Who the alarm is for: self or friend
    #[arg(long = "for", value_name = "TARGET")]
    target: Option<TargetType>,
    /// Friendship ID of the friend to wake (implies --for friend)
    #[arg(long)]
    friend: Option<String>,
    /// Date as YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Time as HH:MM (default: now)
    #[arg(long, value_parser = parse_time)]
    time: Option<NaiveTime>,
    /// Wake method: voice, video, song or puzzle (repeatable)
    #[arg(long = "method", value_name = "METHOD")]
    methods: Vec<WakeMethod>,
    /// Media file for a method (repeatable)
    #[arg(long = "media", value_name = "METHOD=PATH", value_parser = parse_media)]
    media: Vec<(WakeMethod, PathBuf)>,
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM, got '{raw}'"))
}

fn parse_media(raw: &str) -> Result<(WakeMethod, PathBuf), String> {
    let (method, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected METHOD=PATH, got '{raw}'"))?;
    let method = method.parse::<WakeMethod>().map_err(|e| e.to_string())?;
    Ok((method, PathBuf::from(path)))
}

impl DraftArgs {
    /// Layer the command-line values over `draft`.
    async fn apply(
        self,
        mut draft: AlarmDraft,
        session: &Session,
        client: &ApiClient,
    ) -> Result<AlarmDraft, Box<dyn std::error::Error>> {
        if let Some(date) = self.date {
            draft.date = date;
        }
        if let Some(time) = self.time {
            draft.time = time;
        }
        for method in self.methods {
            draft.wake_methods.insert(method);
        }
        for (method, path) in self.media {
            let media = MediaRef::from_file(&path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            draft.attach_media(method, media);
        }

        match (self.target, self.friend) {
            (Some(TargetType::Myself), Some(_)) => {
                return Err("--friend cannot be combined with --for self".into());
            }
            (Some(TargetType::Myself), None) => draft.target_self(),
            (_, Some(id)) => {
                let friend = FriendService::new(client)
                    .list(session)
                    .await?
                    .into_iter()
                    .find(|f| f.id == id)
                    .ok_or_else(|| CoreError::NotFound {
                        kind: "friendship",
                        id,
                    })?;
                draft.select_friend(friend);
            }
            (Some(TargetType::Friend), None) => draft.target_type = TargetType::Friend,
            (None, None) => {}
        }
        Ok(draft)
    }
}

fn print_alarm(alarm: &Alarm, viewer_id: &str, hour12: bool) {
    let when = match alarm.alarm_date.as_deref() {
        Some(date) => format!(
            "{} {}",
            format_date(date),
            format_time(alarm.alarm_time.as_deref().unwrap_or(""), hour12)
        ),
        None => "(no date)".to_string(),
    };
    let methods: Vec<&str> = alarm.wake_methods.iter().map(WakeMethod::label).collect();
    println!(
        "  {:<8} {:<20} {:<28} {}",
        alarm.id,
        when.trim_end(),
        methods.join(", "),
        alarm.author_label(viewer_id)
    );
}

fn print_buckets(buckets: &AlarmBuckets, viewer_id: &str, hour12: bool) {
    if buckets.is_empty() {
        println!("No alarms");
        return;
    }
    for (bucket, alarms) in buckets.sections() {
        println!("{} ({})", bucket.title(), alarms.len());
        for alarm in alarms {
            print_alarm(alarm, viewer_id, hour12);
        }
    }
}

async fn find(
    service: &AlarmService<'_>,
    session: &Session,
    id: &str,
) -> Result<Alarm, CoreError> {
    service
        .list(session)
        .await?
        .into_iter()
        .find(|a| a.id == id)
        .ok_or_else(|| CoreError::NotFound {
            kind: "alarm",
            id: id.to_string(),
        })
}

/// Refresh until Ctrl-C. A response still in flight when interrupted is
/// dropped.
async fn watch(
    service: &AlarmService<'_>,
    session: &Session,
    every: u64,
    json: bool,
    hour12: bool,
) -> CommandResult {
    let viewer_id = session.require()?.id.clone();
    let mut slot = RefreshSlot::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(every.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        let ticket = slot.begin();
        let fetched = tokio::select! {
            r = service.buckets(session, now()) => r,
            _ = tokio::signal::ctrl_c() => {
                slot.abandon();
                break;
            }
        };
        match fetched {
            Ok(buckets) => {
                slot.complete(ticket, buckets);
            }
            Err(e) => {
                slot.fail(ticket);
                tracing::warn!(error = %e, "alarm refresh failed");
                continue;
            }
        }

        if let Some(buckets) = slot.value() {
            if json {
                println!("{}", serde_json::to_string(buckets)?);
            } else {
                println!("-- {} --", now().format("%H:%M:%S"));
                print_buckets(buckets, &viewer_id, hour12);
            }
        }
    }
    Ok(())
}

pub async fn run(action: AlarmAction, config: &Config) -> CommandResult {
    let session = open_session()?;
    let client = api(config)?;
    let service = AlarmService::new(&client);
    let hour12 = config.display.hour12;

    match action {
        AlarmAction::List {
            json,
            watch: Some(every),
        } => watch(&service, &session, every, json, hour12).await?,
        AlarmAction::List { json, watch: None } => {
            let buckets = service.buckets(&session, now()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&buckets)?);
            } else {
                print_buckets(&buckets, &session.require()?.id, hour12);
            }
        }
        AlarmAction::Create { draft } => {
            let base = AlarmDraft::new(TargetType::Myself, now());
            let draft = draft.apply(base, &session, &client).await?;
            let alarm = service.create(&session, &draft).await?;
            println!("Alarm created: {} for {}", alarm.id, draft.scheduled_for());
        }
        AlarmAction::Delete { id, yes } => {
            let alarm = find(&service, &session, &id).await?;
            let confirmation = service.propose_delete(&alarm);
            if !confirm(&confirmation, yes)? {
                println!("Cancelled");
                return Ok(());
            }
            let deleted = service.delete(&session, confirmation).await?;
            println!("Alarm deleted: {}", deleted.id);
        }
        AlarmAction::Clone { id, draft } => {
            let viewer_id = session.require()?.id.clone();
            let original = find(&service, &session, &id).await?;
            let base = AlarmDraft::cloned_from(&original, &viewer_id, now());
            let draft = draft.apply(base, &session, &client).await?;
            let alarm = service.create(&session, &draft).await?;
            println!("Alarm created: {} (copy of {})", alarm.id, original.id);
        }
        AlarmAction::Reveal { id, json } => {
            let viewer_id = session.require()?.id.clone();
            let alarm = find(&service, &session, &id).await?;
            let reveal = alarm.reveal(&viewer_id);
            if json {
                println!("{}", serde_json::to_string_pretty(&reveal)?);
                return Ok(());
            }
            match reveal {
                Reveal::Full(summary) => {
                    println!(
                        "{} {}",
                        format_date(summary.date.as_deref().unwrap_or("")),
                        format_time(summary.time.as_deref().unwrap_or(""), hour12)
                    );
                    let methods: Vec<&str> =
                        summary.wake_methods.iter().map(WakeMethod::label).collect();
                    println!("Wake methods: {}", methods.join(", "));
                }
                Reveal::Sealed => println!("Sealed until the alarm goes off"),
            }
        }
    }
    Ok(())
}
