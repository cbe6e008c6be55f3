#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::ChatPrompt;
use crate::domain::models::Event;

async fn chat(backend: &BackendBox, prompt: ChatPrompt) -> Event {
    match backend.chat(prompt).await {
        Ok(reply) => {
            tracing::debug!(query_id = ?reply.query_id, "Chat reply received");
            return Event::ChatResponse(reply);
        }
        Err(err) => {
            tracing::error!(err = ?err, "Chat request to the analysis service failed");
            return Event::ChatFailure(err.to_string());
        }
    }
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs requests coming from the session against the backend until the
    /// action channel closes. Every request produces exactly one event.
    pub async fn start(
        backend: BackendBox,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let backend = Arc::new(backend);

        while let Some(action) = rx.recv().await {
            match action {
                Action::ChatRequest(prompt) => {
                    let worker_backend = backend.clone();
                    let worker_tx = tx.clone();

                    tokio::spawn(async move {
                        let event = chat(&worker_backend, prompt).await;
                        if worker_tx.send(event).is_err() {
                            tracing::warn!("Session closed before the chat outcome arrived");
                        }
                    });
                }
            }
        }

        return Ok(());
    }
}
