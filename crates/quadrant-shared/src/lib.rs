pub mod wire;

use std::fmt;
use std::str::FromStr;

use chrono::{
  NaiveDate,
  NaiveDateTime
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize,
  Serializer
};

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
)]
pub struct TaskId(String);

impl TaskId {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for TaskId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<u64> for TaskId {
  fn from(value: u64) -> Self {
    Self(value.to_string())
  }
}

impl From<&str> for TaskId {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

impl FromStr for TaskId {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
      return Err(
        "task id cannot be empty"
          .to_string()
      );
    }
    Ok(Self(trimmed.to_string()))
  }
}

impl Serialize for TaskId {
  fn serialize<S>(
    &self,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match self.0.parse::<u64>() {
      | Ok(number) => {
        serializer.serialize_u64(number)
      }
      | Err(_) => {
        serializer.serialize_str(&self.0)
      }
    }
  }
}

impl<'de> Deserialize<'de> for TaskId {
  fn deserialize<D>(
    deserializer: D
  ) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>
  {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
      Int(i64),
      Text(String)
    }

    match RawId::deserialize(
      deserializer
    )? {
      | RawId::Int(value) => {
        Ok(Self(value.to_string()))
      }
      | RawId::Text(value) => {
        Ok(Self(value))
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Task {
  pub id:           TaskId,
  pub text:         String,
  #[serde(default, with = "wire::flag")]
  pub important:    bool,
  #[serde(default, with = "wire::flag")]
  pub urgent:       bool,
  #[serde(default, with = "wire::date")]
  pub deadline:     Option<NaiveDate>,
  #[serde(
    default,
    with = "wire::timestamp"
  )]
  pub created_at:   Option<NaiveDateTime>,
  #[serde(default, with = "wire::flag")]
  pub completed:    bool,
  #[serde(
    default,
    with = "wire::timestamp"
  )]
  pub completed_at: Option<NaiveDateTime>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TaskCreate {
  pub text:      String,
  pub important: bool,
  pub urgent:    bool,
  #[serde(default, with = "wire::date")]
  pub deadline:  Option<NaiveDate>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct Credentials {
  pub username: String,
  pub password: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  Default,
)]
pub struct AuthReply {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub error:   Option<String>
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    Task,
    TaskCreate,
    TaskId
  };

  #[test]
  fn decodes_storage_service_row() {
    let raw = r#"{
      "id": 42,
      "text": "Review code changes",
      "important": 1,
      "urgent": 0,
      "completed": 0,
      "user_id": 1,
      "created_at": "2025-11-20 09:15:00",
      "completed_at": null,
      "deadline": "2025-12-01"
    }"#;

    let task: Task =
      serde_json::from_str(raw)
        .expect("decode task row");

    assert_eq!(task.id, TaskId::from(42));
    assert!(task.important);
    assert!(!task.urgent);
    assert!(!task.completed);
    assert_eq!(
      task.deadline,
      NaiveDate::from_ymd_opt(2025, 12, 1)
    );
    assert!(task.created_at.is_some());
    assert!(task.completed_at.is_none());
  }

  #[test]
  fn empty_deadline_means_none() {
    let raw = r#"{"id":"a7","text":"x","important":true,"urgent":true,"deadline":"","completed":false}"#;
    let task: Task =
      serde_json::from_str(raw)
        .expect("decode task");
    assert_eq!(task.id.as_str(), "a7");
    assert!(task.deadline.is_none());
    assert!(task.created_at.is_none());
  }

  #[test]
  fn unreadable_dates_do_not_drop_the_list()
  {
    let raw = r#"[
      {"id":1,"text":"fine","important":1,"urgent":1,"completed":0,"created_at":"2025-11-20 09:15:00","completed_at":null,"deadline":"2025-12-01"},
      {"id":2,"text":"odd","important":0,"urgent":1,"completed":1,"created_at":"yesterday-ish","completed_at":"n/a","deadline":"12/05/2025"}
    ]"#;

    let tasks: Vec<Task> =
      serde_json::from_str(raw)
        .expect("decode task list");

    assert_eq!(tasks.len(), 2);
    assert_eq!(
      tasks[0].deadline,
      NaiveDate::from_ymd_opt(2025, 12, 1)
    );
    assert_eq!(tasks[1].text, "odd");
    assert!(tasks[1].completed);
    assert!(tasks[1].deadline.is_none());
    assert!(tasks[1].created_at.is_none());
    assert!(tasks[1].completed_at.is_none());
  }

  #[test]
  fn create_body_uses_plain_date() {
    let body = TaskCreate {
      text:      "Plan".to_string(),
      important: true,
      urgent:    false,
      deadline:  NaiveDate::from_ymd_opt(
        2024, 6, 1
      )
    };
    let json = serde_json::to_value(&body)
      .expect("encode create body");
    assert_eq!(json["deadline"], "2024-06-01");
    assert_eq!(json["important"], true);

    let without = TaskCreate {
      deadline: None,
      ..body
    };
    let json =
      serde_json::to_value(&without)
        .expect("encode create body");
    assert!(json["deadline"].is_null());
  }
}
