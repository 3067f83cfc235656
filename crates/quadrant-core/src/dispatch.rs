use chrono::NaiveDate;
use quadrant_shared::{TaskCreate, TaskId};
use tracing::{debug, info, instrument};

use crate::api::TaskApi;
use crate::board::Prompt;
use crate::classify::Quadrant;
use crate::error::{NetworkError, ValidationError};
use crate::sync::{Snapshot, SyncController};

pub const DELETE_PROMPT: &str = "Delete this task?";

/// A user intent that changes server state. Executing it issues the
/// request and then reloads; the local snapshot is never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Quadrant button: submits the board's text and deadline inputs.
    Add(Quadrant),
    Toggle(TaskId),
    Remove(TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Reloaded(Snapshot),
    Rejected(ValidationError),
    Declined,
}

impl Mutation {
    #[instrument(skip(sync, prompt))]
    pub async fn execute<A, P>(
        self,
        sync: &mut SyncController<A>,
        prompt: &mut P,
    ) -> Result<MutationOutcome, NetworkError>
    where
        A: TaskApi,
        P: Prompt,
    {
        match self {
            Mutation::Add(quadrant) => {
                let text = sync.board().input.value().trim().to_string();
                if text.is_empty() {
                    let err = ValidationError::EmptyText;
                    prompt.alert(&err.to_string());
                    sync.board_mut().input.focus();
                    debug!("empty task text rejected");
                    return Ok(MutationOutcome::Rejected(err));
                }

                let (important, urgent) = quadrant.flags();
                let create = TaskCreate {
                    text,
                    important,
                    urgent,
                    deadline: sync.board().deadline.value(),
                };
                sync.api().create(&create).await?;
                info!(quadrant = quadrant.filter_key(), deadline = ?create.deadline, "task created");

                let board = sync.board_mut();
                board.input.clear();
                board.deadline.clear();
            }
            Mutation::Toggle(id) => {
                sync.api().toggle(&id).await?;
                info!(id = %id, "task toggled");
            }
            Mutation::Remove(id) => {
                if !prompt.confirm(DELETE_PROMPT) {
                    debug!(id = %id, "delete declined");
                    return Ok(MutationOutcome::Declined);
                }
                sync.api().delete(&id).await?;
                info!(id = %id, "task deleted");
            }
        }

        sync.load().await.map(MutationOutcome::Reloaded)
    }
}

pub async fn add<A: TaskApi, P: Prompt>(
    sync: &mut SyncController<A>,
    prompt: &mut P,
    text: &str,
    important: bool,
    urgent: bool,
    deadline: Option<NaiveDate>,
) -> Result<MutationOutcome, NetworkError> {
    let board = sync.board_mut();
    board.input.set(text);
    board.deadline.set(deadline);
    Mutation::Add(Quadrant::from_flags(important, urgent))
        .execute(sync, prompt)
        .await
}

pub async fn toggle<A: TaskApi, P: Prompt>(
    sync: &mut SyncController<A>,
    prompt: &mut P,
    id: TaskId,
) -> Result<MutationOutcome, NetworkError> {
    Mutation::Toggle(id).execute(sync, prompt).await
}

pub async fn remove<A: TaskApi, P: Prompt>(
    sync: &mut SyncController<A>,
    prompt: &mut P,
    id: TaskId,
) -> Result<MutationOutcome, NetworkError> {
    Mutation::Remove(id).execute(sync, prompt).await
}
