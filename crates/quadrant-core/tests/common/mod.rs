#![allow(dead_code)]

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use quadrant_core::api::TaskApi;
use quadrant_core::board::{Board, Prompt};
use quadrant_core::error::NetworkError;
use quadrant_core::export::{ExportKind, ExportPayload};
use quadrant_core::sync::SyncController;
use quadrant_shared::{Task, TaskCreate, TaskId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub list: usize,
    pub create: usize,
    pub toggle: usize,
    pub delete: usize,
    pub export: usize,
}

#[derive(Debug, Default)]
struct State {
    tasks: Vec<Task>,
    next_id: u64,
    calls: Calls,
    fail_list: bool,
    fail_mutations: bool,
    export: Option<ExportPayload>,
}

/// In-memory task service with the same create/toggle/delete semantics
/// as the real one.
#[derive(Debug, Default)]
pub struct FakeApi {
    state: Mutex<State>,
}

impl FakeApi {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks
            .iter()
            .filter_map(|task| task.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or_default();
        Self {
            state: Mutex::new(State {
                tasks,
                next_id,
                ..State::default()
            }),
        }
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().expect("fake state").calls
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().expect("fake state").tasks.clone()
    }

    pub fn fail_list(&self, fail: bool) {
        self.state.lock().expect("fake state").fail_list = fail;
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.state.lock().expect("fake state").fail_mutations = fail;
    }

    pub fn serve_export(&self, payload: Option<ExportPayload>) {
        self.state.lock().expect("fake state").export = payload;
    }
}

fn server_error(method: &'static str, path: &str) -> NetworkError {
    NetworkError::Status {
        method,
        url: format!("http://fake{path}"),
        status: 500,
        reason: "Internal Server Error".to_string(),
    }
}

impl TaskApi for FakeApi {
    async fn list(&self) -> Result<Vec<Task>, NetworkError> {
        let mut state = self.state.lock().expect("fake state");
        state.calls.list += 1;
        if state.fail_list {
            return Err(server_error("GET", "/api/tasks"));
        }
        Ok(state.tasks.clone())
    }

    async fn create(&self, create: &TaskCreate) -> Result<(), NetworkError> {
        let mut state = self.state.lock().expect("fake state");
        state.calls.create += 1;
        if state.fail_mutations {
            return Err(server_error("POST", "/api/tasks"));
        }
        state.next_id += 1;
        let id = TaskId::from(state.next_id);
        state.tasks.push(Task {
            id,
            text: create.text.clone(),
            important: create.important,
            urgent: create.urgent,
            deadline: create.deadline,
            created_at: Some(at(2024, 3, 5, 10, 15)),
            completed: false,
            completed_at: None,
        });
        Ok(())
    }

    async fn toggle(&self, id: &TaskId) -> Result<(), NetworkError> {
        let mut state = self.state.lock().expect("fake state");
        state.calls.toggle += 1;
        if state.fail_mutations {
            return Err(server_error("POST", "/api/tasks/toggle"));
        }
        if let Some(task) = state.tasks.iter_mut().find(|task| &task.id == id) {
            task.completed = !task.completed;
            task.completed_at = task.completed.then(|| at(2024, 3, 6, 9, 0));
        }
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), NetworkError> {
        let mut state = self.state.lock().expect("fake state");
        state.calls.delete += 1;
        if state.fail_mutations {
            return Err(server_error("DELETE", "/api/tasks"));
        }
        state.tasks.retain(|task| &task.id != id);
        Ok(())
    }

    async fn export(&self, kind: ExportKind) -> Result<ExportPayload, NetworkError> {
        let mut state = self.state.lock().expect("fake state");
        state.calls.export += 1;
        state
            .export
            .clone()
            .ok_or_else(|| server_error("GET", kind.path()))
    }
}

#[derive(Debug, Default)]
pub struct RecordingPrompt {
    pub alerts: Vec<String>,
    pub confirms: Vec<String>,
    pub answer: bool,
}

impl RecordingPrompt {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }
}

impl Prompt for RecordingPrompt {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.confirms.push(message.to_string());
        self.answer
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    day(y, m, d).and_hms_opt(h, min, 0).expect("valid time")
}

pub fn task(id: u64, text: &str, important: bool, urgent: bool, deadline: Option<NaiveDate>) -> Task {
    Task {
        id: TaskId::from(id),
        text: text.to_string(),
        important,
        urgent,
        deadline,
        created_at: Some(at(2024, 3, 1, 8, 0)),
        completed: false,
        completed_at: None,
    }
}

pub fn done_task(id: u64, text: &str) -> Task {
    Task {
        completed: true,
        completed_at: Some(at(2024, 3, 2, 17, 30)),
        ..task(id, text, false, false, None)
    }
}

pub fn controller(api: FakeApi) -> SyncController<FakeApi> {
    SyncController::new(api, Board::new(day(2024, 3, 1)))
}
