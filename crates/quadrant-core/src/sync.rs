use quadrant_shared::Task;
use tracing::{info, instrument, warn};

use crate::api::TaskApi;
use crate::board::Board;
use crate::error::FetchError;
use crate::render::ViewKind;

/// The task collection as of one successful reload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    tasks: Vec<Task>,
}

impl Snapshot {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

pub struct SyncController<A> {
    api: A,
    board: Board,
    snapshot: Option<Snapshot>,
    reloads: u64,
}

impl<A: TaskApi> SyncController<A> {
    pub fn new(api: A, board: Board) -> Self {
        Self {
            api,
            board,
            snapshot: None,
            reloads: 0,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn reloads(&self) -> u64 {
        self.reloads
    }

    /// Fetches everything and re-renders both views. On failure the
    /// previous snapshot and views are left untouched.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<Snapshot, FetchError> {
        let tasks = self.api.list().await.inspect_err(|err| {
            warn!(error = %err, "reload failed");
        })?;

        let snapshot = Snapshot::new(tasks);
        self.board.render(snapshot.tasks());
        self.snapshot = Some(snapshot.clone());
        self.reloads += 1;

        info!(
            tasks = snapshot.len(),
            pending = self.board.pending().len(),
            done = self.board.done().len(),
            reload = self.reloads,
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Re-runs filter, sort and render over the held snapshot.
    pub fn rerender(&mut self) {
        if let Some(snapshot) = &self.snapshot {
            self.board.render(snapshot.tasks());
        }
    }

    #[instrument(skip(self))]
    pub async fn set_filter(
        &mut self,
        kind: ViewKind,
        value: Option<&str>,
    ) -> Result<Snapshot, FetchError> {
        self.board.select_filter(kind, value);
        self.load().await
    }
}
