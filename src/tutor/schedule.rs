//! Daily lesson schedule.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::tutor::engine::TutorEvent;

/// Every day at 10:00 (cron crate format: sec min hour day month dow year).
pub const LESSON_CRON: &str = "0 0 10 * * * *";

pub fn lesson_schedule() -> Result<Schedule, String> {
    Schedule::from_str(LESSON_CRON).map_err(|e| format!("Invalid cron: {}", e))
}

/// Next lesson time strictly after `after`, in the same time zone.
pub fn next_lesson_after<Tz: TimeZone>(schedule: &Schedule, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    schedule.after(after).next()
}

/// Spawn the task that emits a lesson tick at every scheduled time
/// (process-local time zone). Stops when the engine goes away.
pub fn spawn_daily_lessons(events: mpsc::Sender<TutorEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let schedule = match lesson_schedule() {
            Ok(schedule) => schedule,
            Err(e) => {
                error!("Daily lessons disabled: {}", e);
                return;
            }
        };

        emit_lessons(schedule, Local::now, events).await;
    })
}

/// Emit one tick per scheduled slot, reading the time from `clock`.
async fn emit_lessons<Tz, C>(schedule: Schedule, clock: C, events: mpsc::Sender<TutorEvent>)
where
    Tz: TimeZone + Send,
    Tz::Offset: fmt::Display + Send,
    C: Fn() -> DateTime<Tz>,
{
    let mut next = next_lesson_after(&schedule, &clock());
    while let Some(due) = next {
        info!("⏰ Next daily lesson at {}", due.format("%Y-%m-%d %H:%M %Z"));

        let wait = (due.clone() - clock()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        if events.send(TutorEvent::LessonTick).await.is_err() {
            info!("Event queue closed, stopping lesson schedule");
            return;
        }

        // Step from the slot just fired, never from the clock: a wake-up that
        // reads a moment before `due` would otherwise fire the same slot again.
        next = next_lesson_after(&schedule, &due);
    }
    error!("No future occurrence for lesson schedule");
}
