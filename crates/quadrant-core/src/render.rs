use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use quadrant_shared::{Task, TaskId};
use unicode_width::UnicodeWidthStr;

use crate::classify::Quadrant;
use crate::config::Config;
use crate::datetime::{format_date, format_date_time};
use crate::dispatch::Mutation;

pub const NO_DEADLINE: &str = "No deadline";
pub const DONE_GLYPH: &str = "✅";
pub const PENDING_GLYPH: &str = "⏳";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Pending,
    Done,
}

impl ViewKind {
    pub fn actions(self) -> &'static [RowAction] {
        match self {
            ViewKind::Pending => &[RowAction::MarkDone, RowAction::Delete],
            ViewKind::Done => &[RowAction::MoveToPending],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::Pending => "Pending",
            ViewKind::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    MarkDone,
    Delete,
    MoveToPending,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::MarkDone => "✓ Done",
            RowAction::Delete => "✕ Delete",
            RowAction::MoveToPending => "Move to Pending",
        }
    }

    /// Command word that triggers the action from the CLI and shell.
    pub fn verb(self) -> &'static str {
        match self {
            RowAction::MarkDone => "done",
            RowAction::Delete => "delete",
            RowAction::MoveToPending => "reopen",
        }
    }

    fn css_class(self) -> &'static str {
        match self {
            RowAction::MarkDone => "btn-done",
            RowAction::Delete => "btn-delete",
            RowAction::MoveToPending => "move-pending",
        }
    }
}

#[must_use]
pub fn status_glyph(completed: bool) -> &'static str {
    if completed { DONE_GLYPH } else { PENDING_GLYPH }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: TaskId,
    pub text: String,
    pub created: String,
    pub priority: &'static str,
    pub style: &'static str,
    pub deadline: String,
    pub completed: Option<String>,
    pub status: Option<&'static str>,
    pub actions: &'static [RowAction],
}

#[must_use]
pub fn build_row(kind: ViewKind, task: &Task) -> Row {
    let quadrant = Quadrant::from_flags(task.important, task.urgent);
    let deadline = match task.deadline {
        Some(_) => format_date(task.deadline),
        None => NO_DEADLINE.to_string(),
    };

    let (completed, status) = match kind {
        ViewKind::Pending => (None, None),
        ViewKind::Done => (
            Some(format_date_time(task.completed_at)),
            Some(status_glyph(task.completed)),
        ),
    };

    Row {
        id: task.id.clone(),
        text: task.text.clone(),
        created: format_date_time(task.created_at),
        priority: quadrant.label(),
        style: quadrant.style_class(),
        deadline,
        completed,
        status,
        actions: kind.actions(),
    }
}

pub fn build_rows<'a, I>(kind: ViewKind, tasks: I) -> Vec<Row>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().map(|task| build_row(kind, task)).collect()
}

/// Rendered body of one view. Actions are looked up by row id against the
/// rows currently held, so replacing the rows is all it takes to retire
/// the old ones.
#[derive(Debug, Clone)]
pub struct TableView {
    kind: ViewKind,
    rows: Vec<Row>,
}

impl TableView {
    pub fn new(kind: ViewKind) -> Self {
        Self { kind, rows: vec![] }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn replace(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    pub fn row(&self, id: &TaskId) -> Option<&Row> {
        self.rows.iter().find(|row| &row.id == id)
    }

    pub fn resolve(&self, id: &TaskId, action: RowAction) -> Option<Mutation> {
        let row = self.row(id)?;
        if !row.actions.contains(&action) {
            return None;
        }

        Some(match action {
            RowAction::MarkDone | RowAction::MoveToPending => Mutation::Toggle(row.id.clone()),
            RowAction::Delete => Mutation::Remove(row.id.clone()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Html,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    format: OutputFormat,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
            format: OutputFormat::Table,
        })
    }

    pub fn plain(format: OutputFormat) -> Self {
        Self {
            color: false,
            format,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn write_view<W: Write>(&self, mut out: W, view: &TableView) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Table => {
                writeln!(out, "{} ({})", view.kind().title(), view.len())?;
                let (headers, rows) = self.table_cells(view);
                write_table(&mut out, headers, rows)
            }
            OutputFormat::Html => write_html(&mut out, view),
        }
    }

    fn table_cells(&self, view: &TableView) -> (Vec<String>, Vec<Vec<String>>) {
        let headers: Vec<String> = match view.kind() {
            ViewKind::Pending => vec!["ID", "Task", "Created", "Priority", "Deadline", "Actions"],
            ViewKind::Done => vec![
                "ID",
                "Task",
                "Priority",
                "Created",
                "Deadline",
                "Completed",
                "Status",
                "Actions",
            ],
        }
        .into_iter()
        .map(str::to_string)
        .collect();

        let rows = view
            .rows()
            .iter()
            .map(|row| {
                let id = self.paint(row.id.as_str(), "33");
                let priority = self.paint(row.priority, style_color(row.style));
                let actions = row
                    .actions
                    .iter()
                    .map(|action| action.verb())
                    .collect::<Vec<_>>()
                    .join(" ");

                match view.kind() {
                    ViewKind::Pending => vec![
                        id,
                        row.text.clone(),
                        row.created.clone(),
                        priority,
                        row.deadline.clone(),
                        actions,
                    ],
                    ViewKind::Done => vec![
                        id,
                        row.text.clone(),
                        priority,
                        row.created.clone(),
                        row.deadline.clone(),
                        row.completed.clone().unwrap_or_default(),
                        row.status.unwrap_or_default().to_string(),
                        actions,
                    ],
                }
            })
            .collect();

        (headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn style_color(style: &str) -> &'static str {
    match style {
        "prio-critical" => "31",
        "prio-urgent" => "33",
        "prio-important" => "32",
        _ => "37",
    }
}

fn write_html<W: Write>(writer: &mut W, view: &TableView) -> anyhow::Result<()> {
    for row in view.rows() {
        let id = escape_html(row.id.as_str());
        let text = escape_html(&row.text);
        let buttons = row
            .actions
            .iter()
            .map(|action| {
                format!(
                    r#"<button class="{}" data-id="{id}">{}</button>"#,
                    action.css_class(),
                    action.label()
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        match view.kind() {
            ViewKind::Pending => writeln!(
                writer,
                r#"<tr class="{}" data-id="{id}"><td>{id}</td><td><div class="task-text">{text}</div><div class="task-meta">Created: {}</div></td><td>{}</td><td>{}</td><td>{buttons}</td></tr>"#,
                row.style, row.created, row.priority, row.deadline
            )?,
            ViewKind::Done => writeln!(
                writer,
                r#"<tr class="{} completed" data-id="{id}"><td>{id}</td><td>{text}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{buttons}</td></tr>"#,
                row.style,
                row.priority,
                row.created,
                row.deadline,
                row.completed.as_deref().unwrap_or_default(),
                row.status.unwrap_or_default()
            )?,
        }
    }

    Ok(())
}

#[must_use]
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
