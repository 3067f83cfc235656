use chrono::{
  DateTime,
  Local,
  NaiveDate,
  NaiveDateTime
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str =
  "%Y-%m-%dT%H:%M:%S";

const NAIVE_TIMESTAMP_FORMATS: [&str;
  4] = [
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M"
];

/// Parses a calendar date. Timestamps
/// are accepted and truncated to their
/// date part.
pub fn parse_date(
  raw: &str
) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  NaiveDate::parse_from_str(
    trimmed,
    DATE_FORMAT
  )
  .ok()
  .or_else(|| {
    parse_timestamp(trimmed)
      .map(|ts| ts.date())
  })
}

/// Parses a timestamp into local wall
/// clock time. Offsets are converted to
/// the local zone; naive values are
/// taken as already local.
pub fn parse_timestamp(
  raw: &str
) -> Option<NaiveDateTime> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(
      trimmed
    )
  {
    return Some(
      dt.with_timezone(&Local)
        .naive_local()
    );
  }

  for format in NAIVE_TIMESTAMP_FORMATS
  {
    if let Ok(ts) =
      NaiveDateTime::parse_from_str(
        trimmed, format
      )
    {
      return Some(ts);
    }
  }

  NaiveDate::parse_from_str(
    trimmed,
    DATE_FORMAT
  )
  .ok()
  .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub mod flag {
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawFlag {
    Bool(bool),
    Int(i64),
    Text(String)
  }

  pub fn serialize<S>(
    value: &bool,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    serializer.serialize_bool(*value)
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<bool, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<RawFlag>::deserialize(
        deserializer
      )?;
    match raw {
      | None => Ok(false),
      | Some(RawFlag::Bool(value)) => {
        Ok(value)
      }
      | Some(RawFlag::Int(value)) => {
        Ok(value != 0)
      }
      | Some(RawFlag::Text(text)) => {
        match text
          .trim()
          .to_ascii_lowercase()
          .as_str()
        {
          | "1" | "true" | "yes"
          | "on" => Ok(true),
          | "" | "0" | "false" | "no"
          | "off" => Ok(false),
          | other => {
            Err(serde::de::Error::custom(
              format!(
                "invalid boolean flag: \
                 {other}"
              )
            ))
          }
        }
      }
    }
  }
}

pub mod date {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };
  use tracing::warn;

  pub fn serialize<S>(
    value: &Option<NaiveDate>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match value {
      | Some(date) => serializer
        .serialize_str(
          &date
            .format(super::DATE_FORMAT)
            .to_string()
        ),
      | None => {
        serializer.serialize_none()
      }
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<NaiveDate>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<String>::deserialize(
        deserializer
      )?;
    match raw {
      | None => Ok(None),
      | Some(text)
        if text.trim().is_empty() =>
      {
        Ok(None)
      }
      | Some(text) => {
        let parsed =
          super::parse_date(&text);
        if parsed.is_none() {
          warn!(
            value = %text,
            "unreadable date; treating as unset"
          );
        }
        Ok(parsed)
      }
    }
  }
}

pub mod timestamp {
  use chrono::NaiveDateTime;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };
  use tracing::warn;

  pub fn serialize<S>(
    value: &Option<NaiveDateTime>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match value {
      | Some(ts) => serializer
        .serialize_str(
          &ts
            .format(
              super::TIMESTAMP_FORMAT
            )
            .to_string()
        ),
      | None => {
        serializer.serialize_none()
      }
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<
    Option<NaiveDateTime>,
    D::Error
  >
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<String>::deserialize(
        deserializer
      )?;
    match raw {
      | None => Ok(None),
      | Some(text)
        if text.trim().is_empty() =>
      {
        Ok(None)
      }
      | Some(text) => {
        let parsed =
          super::parse_timestamp(&text);
        if parsed.is_none() {
          warn!(
            value = %text,
            "unreadable timestamp; \
             treating as unset"
          );
        }
        Ok(parsed)
      }
    }
  }
}
