//! UUIDs, datetimes, times of day and durations.
//!
//! Durations bind as float seconds. Datetimes without an offset are taken
//! as UTC and come back as RFC 3339.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta};
use parambind_core::{Bound, Param, Shape};
use parambind_web::{App, Endpoint, WebResult};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
struct Schedule {
    item_id: Uuid,
    start_datetime: Option<DateTime<FixedOffset>>,
    end_datetime: Option<DateTime<FixedOffset>>,
    repeat_at: Option<NaiveTime>,
    process_after: Option<f64>,
    start_process: Option<String>,
    duration: Option<f64>,
}

#[allow(clippy::cast_possible_truncation)]
fn seconds_to_delta(seconds: f64) -> Option<TimeDelta> {
    TimeDelta::try_milliseconds((seconds * 1000.0).round() as i64)
}

#[allow(clippy::cast_precision_loss)]
fn delta_to_seconds(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

async fn read_items(params: Bound) -> WebResult<Schedule> {
    let start_datetime: Option<DateTime<FixedOffset>> = params.get("start_datetime")?;
    let end_datetime: Option<DateTime<FixedOffset>> = params.get("end_datetime")?;
    let process_after: Option<f64> = params.get("process_after")?;

    let start_process = start_datetime
        .zip(process_after.and_then(seconds_to_delta))
        .and_then(|(start, after)| start.checked_add_signed(after));
    let duration = end_datetime
        .zip(start_process)
        .map(|(end, start)| delta_to_seconds(end - start));

    Ok(Schedule {
        item_id: params.get("item_id")?,
        start_datetime,
        end_datetime,
        repeat_at: params.get("repeat_at")?,
        process_after,
        start_process: start_process.map(|dt| dt.to_rfc3339()),
        duration,
    })
}

/// `PUT /items/{item_id}` keyed by UUID with optional schedule fields.
#[must_use]
pub fn app() -> App {
    App::new().put(
        "/items/{item_id}",
        Endpoint::new(read_items).params([
            Param::new("item_id", Shape::Uuid),
            Param::body("start_datetime", Shape::DateTime).optional(),
            Param::body("end_datetime", Shape::DateTime).optional(),
            Param::body("repeat_at", Shape::Time).optional(),
            Param::body("process_after", Shape::Duration).optional(),
        ]),
    )
}
