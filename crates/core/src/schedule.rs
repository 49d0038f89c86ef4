//! Bookable exam time slots.
//!
//! Slots are wall-clock times in UTC, from [`SLOT_FIRST_HOUR`] to [`SLOT_LAST_HOUR`] inclusive,
//! every [`SLOT_STEP_MINUTES`]. The last slot starts exactly on the closing hour.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::constants::{SLOT_FIRST_HOUR, SLOT_LAST_HOUR, SLOT_STEP_MINUTES};
use crate::error::{ClinicError, ClinicResult};

const SLOT_FORMAT: &str = "%H:%M";

/// All bookable slots in ascending order.
pub fn exam_time_slots() -> Vec<NaiveTime> {
    let first = SLOT_FIRST_HOUR * 60;
    let last = SLOT_LAST_HOUR * 60;
    (first..=last)
        .step_by(SLOT_STEP_MINUTES as usize)
        .filter_map(|minutes| NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0))
        .collect()
}

/// Slots formatted as `HH:MM`.
pub fn exam_time_slot_labels() -> Vec<String> {
    exam_time_slots()
        .into_iter()
        .map(|slot| slot.format(SLOT_FORMAT).to_string())
        .collect()
}

/// Combines a calendar date with a listed `HH:MM` slot into a UTC timestamp.
///
/// # Errors
///
/// Returns `ClinicError::Validation` if `slot` is malformed or not a bookable slot.
pub fn combine_date_and_slot(date: NaiveDate, slot: &str) -> ClinicResult<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(slot.trim(), SLOT_FORMAT)
        .map_err(|_| ClinicError::validation(format!("time '{slot}' must be HH:MM")))?;

    if !exam_time_slots().contains(&time) {
        return Err(ClinicError::validation(format!(
            "time '{slot}' is not a bookable slot ({} to {} every {} minutes)",
            first_label(),
            last_label(),
            SLOT_STEP_MINUTES
        )));
    }

    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

fn first_label() -> String {
    format!("{SLOT_FIRST_HOUR:02}:00")
}

fn last_label() -> String {
    format!("{SLOT_LAST_HOUR:02}:00")
}
