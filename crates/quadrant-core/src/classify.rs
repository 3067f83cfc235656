#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub enum Quadrant {
  ImportantUrgent,
  NotImportantUrgent,
  ImportantNotUrgent,
  NotImportantNotUrgent
}

impl Quadrant {
  pub const ALL: [Quadrant; 4] = [
    Quadrant::ImportantUrgent,
    Quadrant::NotImportantUrgent,
    Quadrant::ImportantNotUrgent,
    Quadrant::NotImportantNotUrgent
  ];

  #[must_use]
  pub fn from_flags(
    important: bool,
    urgent: bool
  ) -> Self {
    match (important, urgent) {
      | (true, true) => {
        Quadrant::ImportantUrgent
      }
      | (false, true) => {
        Quadrant::NotImportantUrgent
      }
      | (true, false) => {
        Quadrant::ImportantNotUrgent
      }
      | (false, false) => {
        Quadrant::NotImportantNotUrgent
      }
    }
  }

  /// `(important, urgent)`
  #[must_use]
  pub fn flags(self) -> (bool, bool) {
    match self {
      | Quadrant::ImportantUrgent => {
        (true, true)
      }
      | Quadrant::NotImportantUrgent => {
        (false, true)
      }
      | Quadrant::ImportantNotUrgent => {
        (true, false)
      }
      | Quadrant::NotImportantNotUrgent => {
        (false, false)
      }
    }
  }

  #[must_use]
  pub fn label(self) -> &'static str {
    match self {
      | Quadrant::ImportantUrgent => {
        "Important & Urgent"
      }
      | Quadrant::NotImportantUrgent => {
        "NotImportant & Urgent"
      }
      | Quadrant::ImportantNotUrgent => {
        "Important & NotUrgent"
      }
      | Quadrant::NotImportantNotUrgent => {
        "NotImportant & NotUrgent"
      }
    }
  }

  #[must_use]
  pub fn style_class(
    self
  ) -> &'static str {
    match self {
      | Quadrant::ImportantUrgent => {
        "prio-critical"
      }
      | Quadrant::NotImportantUrgent => {
        "prio-urgent"
      }
      | Quadrant::ImportantNotUrgent => {
        "prio-important"
      }
      | Quadrant::NotImportantNotUrgent => {
        "prio-normal"
      }
    }
  }

  /// Key shared by the filter selectors
  /// and the quadrant buttons.
  #[must_use]
  pub fn filter_key(
    self
  ) -> &'static str {
    match self {
      | Quadrant::ImportantUrgent => {
        "imp_urg"
      }
      | Quadrant::NotImportantUrgent => {
        "notimp_urg"
      }
      | Quadrant::ImportantNotUrgent => {
        "imp_noturg"
      }
      | Quadrant::NotImportantNotUrgent => {
        "notimp_noturg"
      }
    }
  }

  /// Strict lookup by filter key or
  /// short alias (`do`, `delegate`,
  /// `schedule`, `drop`).
  pub fn parse(
    value: &str
  ) -> Option<Self> {
    let key =
      value.trim().to_ascii_lowercase();
    Self::ALL
      .into_iter()
      .find(|q| q.filter_key() == key)
      .or(match key.as_str() {
        | "do" => {
          Some(Quadrant::ImportantUrgent)
        }
        | "delegate" => Some(
          Quadrant::NotImportantUrgent
        ),
        | "schedule" => Some(
          Quadrant::ImportantNotUrgent
        ),
        | "drop" => Some(
          Quadrant::NotImportantNotUrgent
        ),
        | _ => None
      })
  }
}

#[must_use]
pub fn priority_label(
  important: bool,
  urgent: bool
) -> &'static str {
  Quadrant::from_flags(important, urgent)
    .label()
}

#[must_use]
pub fn priority_class(
  important: bool,
  urgent: bool
) -> &'static str {
  Quadrant::from_flags(important, urgent)
    .style_class()
}
