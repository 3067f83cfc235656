use chrono::{
  Days,
  NaiveDate,
  NaiveDateTime
};
use tracing::trace;

use crate::error::DeadlineError;

pub const MISSING: &str = "N/A";

const DISPLAY_DATE: &str = "%d-%m-%Y";
const DISPLAY_DATE_TIME: &str =
  "%d-%m-%Y %I:%M %p";
const PICKER_DATE: &str = "%Y-%m-%d";

#[must_use]
pub fn format_date(
  value: Option<NaiveDate>
) -> String {
  match value {
    | Some(date) => date
      .format(DISPLAY_DATE)
      .to_string(),
    | None => MISSING.to_string()
  }
}

/// `DD-MM-YYYY hh:mm AM/PM`; midnight
/// reads `12:00 AM`.
#[must_use]
pub fn format_date_time(
  value: Option<NaiveDateTime>
) -> String {
  match value {
    | Some(ts) => ts
      .format(DISPLAY_DATE_TIME)
      .to_string(),
    | None => MISSING.to_string()
  }
}

/// Value for the picker's `min`
/// attribute.
#[must_use]
pub fn picker_min(
  today: NaiveDate
) -> String {
  today.format(PICKER_DATE).to_string()
}

/// Reads a deadline the way the date
/// picker offers it. Empty input means
/// no deadline.
pub fn parse_deadline(
  raw: &str,
  today: NaiveDate
) -> Result<Option<NaiveDate>, DeadlineError>
{
  let token =
    raw.trim().to_ascii_lowercase();
  if token.is_empty() {
    return Ok(None);
  }

  let parsed = match token.as_str() {
    | "today" => Some(today),
    | "tomorrow" => {
      today.checked_add_days(Days::new(1))
    }
    | _ => parse_relative(&token, today)
      .or_else(|| {
        NaiveDate::parse_from_str(
          &token,
          PICKER_DATE
        )
        .ok()
      })
      .or_else(|| {
        NaiveDate::parse_from_str(
          &token,
          DISPLAY_DATE
        )
        .ok()
      })
  };

  let date = parsed.ok_or_else(|| {
    DeadlineError::Unrecognized(
      raw.trim().to_string()
    )
  })?;

  if date < today {
    return Err(
      DeadlineError::BeforeMinimum {
        deadline: date
          .format(PICKER_DATE)
          .to_string(),
        min:      picker_min(today)
      }
    );
  }

  trace!(input = %raw, deadline = %date, "parsed deadline");
  Ok(Some(date))
}

fn parse_relative(
  token: &str,
  today: NaiveDate
) -> Option<NaiveDate> {
  let rest = token.strip_prefix('+')?;
  if !rest.is_ascii() {
    return None;
  }
  let (num, unit) =
    rest.split_at(rest.len().checked_sub(1)?);
  let amount: u64 = num.parse().ok()?;
  let days = match unit {
    | "d" => amount,
    | "w" => amount.checked_mul(7)?,
    | _ => return None
  };
  today.checked_add_days(Days::new(days))
}
