#[cfg(test)]
#[path = "artifact_viewer_test.rs"]
mod tests;

use crate::domain::models::Message;
use crate::domain::models::QueryId;

/// A query graph currently enlarged for viewing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FocusedArtifact {
    pub query_id: QueryId,
    pub graph_ref: String,
}

/// Tracks the one artifact in focus. Focusing never touches the message the
/// artifact came from.
#[derive(Default)]
pub struct ArtifactViewer {
    focused: Option<FocusedArtifact>,
}

impl ArtifactViewer {
    pub fn focus(&mut self, query_id: QueryId, graph_ref: &str) {
        tracing::debug!(query_id, graph_ref, "Focusing artifact");
        self.focused = Some(FocusedArtifact {
            query_id,
            graph_ref: graph_ref.to_string(),
        });
    }

    /// Focuses the graph attached to a message. Returns false, leaving focus
    /// as it was, when the message has no graph.
    pub fn focus_message(&mut self, message: &Message) -> bool {
        if let (Some(query_id), Some(graph_ref)) = (message.query_id(), message.graph_ref()) {
            self.focus(query_id, graph_ref);
            return true;
        }

        return false;
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }

    pub fn focused(&self) -> Option<&FocusedArtifact> {
        return self.focused.as_ref();
    }

    pub fn is_focused(&self, query_id: QueryId) -> bool {
        return self
            .focused
            .as_ref()
            .map(|artifact| return artifact.query_id == query_id)
            .unwrap_or(false);
    }
}
