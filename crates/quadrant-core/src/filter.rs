use std::cmp::Ordering;

use quadrant_shared::Task;
use tracing::trace;

use crate::classify::Quadrant;

pub const ALL_KEY: &str = "all";

/// Selector value for one view.
/// Unknown values behave like `All`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum QuadrantFilter {
  #[default]
  All,
  Only(Quadrant)
}

impl QuadrantFilter {
  #[must_use]
  pub fn parse(
    value: Option<&str>
  ) -> Self {
    let Some(raw) = value else {
      return Self::All;
    };

    match Quadrant::ALL
      .into_iter()
      .find(|q| q.filter_key() == raw)
    {
      | Some(q) => Self::Only(q),
      | None => {
        if !raw.is_empty()
          && raw != ALL_KEY
        {
          trace!(value = %raw, "unrecognized filter value; showing all tasks");
        }
        Self::All
      }
    }
  }

  #[must_use]
  pub fn key(self) -> &'static str {
    match self {
      | Self::All => ALL_KEY,
      | Self::Only(q) => q.filter_key()
    }
  }

  #[must_use]
  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | Self::All => true,
      | Self::Only(q) => {
        Quadrant::from_flags(
          task.important,
          task.urgent
        ) == q
      }
    }
  }
}

#[must_use]
pub fn matches_filter(
  task: &Task,
  value: Option<&str>
) -> bool {
  QuadrantFilter::parse(value)
    .matches(task)
}

/// Open tasks in the filter, soonest
/// deadline first, undated last in
/// their input order.
#[must_use]
pub fn select_pending(
  tasks: &[Task],
  filter: QuadrantFilter
) -> Vec<&Task> {
  let mut out: Vec<&Task> = tasks
    .iter()
    .filter(|t| {
      !t.completed && filter.matches(t)
    })
    .collect();
  out.sort_by(|a, b| {
    deadline_order(a, b)
  });
  out
}

/// Completed tasks in the filter, in
/// snapshot order.
#[must_use]
pub fn select_done(
  tasks: &[Task],
  filter: QuadrantFilter
) -> Vec<&Task> {
  tasks
    .iter()
    .filter(|t| {
      t.completed && filter.matches(t)
    })
    .collect()
}

fn deadline_order(
  a: &Task,
  b: &Task
) -> Ordering {
  match (a.deadline, b.deadline) {
    | (None, None) => Ordering::Equal,
    | (None, Some(_)) => {
      Ordering::Greater
    }
    | (Some(_), None) => Ordering::Less,
    | (Some(x), Some(y)) => x.cmp(&y)
  }
}
