use std::io::{self, BufRead, Write};

use chrono::NaiveDate;
use quadrant_shared::{Task, TaskId};
use tracing::debug;

use crate::datetime::{parse_deadline, picker_min};
use crate::dispatch::Mutation;
use crate::error::DeadlineError;
use crate::filter::{QuadrantFilter, select_done, select_pending};
use crate::render::{RowAction, TableView, ViewKind, build_rows};

/// Blocking user prompts: a message the user must acknowledge, and a
/// yes/no question.
pub trait Prompt {
    fn alert(&mut self, message: &str);
    fn confirm(&mut self, message: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompt for TerminalPrompt {
    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            debug!(message, "confirmation assumed");
            return true;
        }

        let mut err = io::stderr().lock();
        if write!(err, "{message} [y/N] ").and_then(|_| err.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    focused: bool,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

#[derive(Debug, Clone)]
pub struct DeadlinePicker {
    value: Option<NaiveDate>,
    min: NaiveDate,
}

impl DeadlinePicker {
    pub fn new(today: NaiveDate) -> Self {
        Self { value: None, min: today }
    }

    pub fn value(&self) -> Option<NaiveDate> {
        self.value
    }

    pub fn min_attr(&self) -> String {
        picker_min(self.min)
    }

    /// User entry; dates before the minimum are refused.
    pub fn pick(&mut self, raw: &str) -> Result<Option<NaiveDate>, DeadlineError> {
        let value = parse_deadline(raw, self.min)?;
        self.value = value;
        Ok(value)
    }

    pub fn set(&mut self, value: Option<NaiveDate>) {
        self.value = value;
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    pub input: TextInput,
    pub deadline: DeadlinePicker,
    pending_filter: QuadrantFilter,
    done_filter: QuadrantFilter,
    pending: TableView,
    done: TableView,
}

impl Board {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            input: TextInput::default(),
            deadline: DeadlinePicker::new(today),
            pending_filter: QuadrantFilter::All,
            done_filter: QuadrantFilter::All,
            pending: TableView::new(ViewKind::Pending),
            done: TableView::new(ViewKind::Done),
        }
    }

    pub fn with_filters(mut self, pending: QuadrantFilter, done: QuadrantFilter) -> Self {
        self.pending_filter = pending;
        self.done_filter = done;
        self
    }

    pub fn filter(&self, kind: ViewKind) -> QuadrantFilter {
        match kind {
            ViewKind::Pending => self.pending_filter,
            ViewKind::Done => self.done_filter,
        }
    }

    pub fn select_filter(&mut self, kind: ViewKind, value: Option<&str>) -> QuadrantFilter {
        let filter = QuadrantFilter::parse(value);
        match kind {
            ViewKind::Pending => self.pending_filter = filter,
            ViewKind::Done => self.done_filter = filter,
        }
        debug!(view = ?kind, filter = filter.key(), "filter selected");
        filter
    }

    pub fn view(&self, kind: ViewKind) -> &TableView {
        match kind {
            ViewKind::Pending => &self.pending,
            ViewKind::Done => &self.done,
        }
    }

    pub fn pending(&self) -> &TableView {
        &self.pending
    }

    pub fn done(&self) -> &TableView {
        &self.done
    }

    pub fn render(&mut self, tasks: &[Task]) {
        let pending = select_pending(tasks, self.pending_filter);
        let done = select_done(tasks, self.done_filter);

        self.pending
            .replace(build_rows(ViewKind::Pending, pending));
        self.done.replace(build_rows(ViewKind::Done, done));

        debug!(
            pending = self.pending.len(),
            done = self.done.len(),
            "board rendered"
        );
    }

    /// Routes a row action to the view that offers it.
    pub fn resolve(&self, id: &TaskId, action: RowAction) -> Option<Mutation> {
        let kind = match action {
            RowAction::MarkDone | RowAction::Delete => ViewKind::Pending,
            RowAction::MoveToPending => ViewKind::Done,
        };
        self.view(kind).resolve(id, action)
    }
}
