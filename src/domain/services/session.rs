#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use tokio::sync::mpsc;

use super::ArtifactViewer;
use super::FocusedArtifact;
use crate::domain::models::Action;
use crate::domain::models::ChatPrompt;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::QueryId;
use crate::domain::models::Role;

/// Shown in place of a reply whenever the analysis service could not answer.
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't reach the analysis service. Please check that it is running and try again.";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

/// One open conversation. Owns the message timeline and allows a single
/// outstanding chat request at a time; requests leave through the action
/// channel and their outcome comes back through `handle_event`.
pub struct ConversationSession {
    pub input: String,
    messages: Vec<Message>,
    state: SessionState,
    viewer: ArtifactViewer,
    subscribers: Vec<mpsc::UnboundedSender<Message>>,
    tx: mpsc::UnboundedSender<Action>,
}

impl ConversationSession {
    pub fn new(tx: mpsc::UnboundedSender<Action>) -> ConversationSession {
        return ConversationSession {
            input: "".to_string(),
            messages: vec![],
            state: SessionState::Idle,
            viewer: ArtifactViewer::default(),
            subscribers: vec![],
            tx,
        };
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn state(&self) -> SessionState {
        return self.state;
    }

    pub fn is_awaiting_response(&self) -> bool {
        return self.state == SessionState::AwaitingResponse;
    }

    /// Every message appended after this call is also sent to the returned
    /// receiver. Dropped receivers are pruned on the next append.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel::<Message>();
        self.subscribers.push(tx);
        return rx;
    }

    pub fn push_input(&mut self, text: &str) {
        self.input += text;
    }

    /// Submits whatever has been typed into the input buffer.
    pub fn submit_input(&mut self) -> bool {
        let text = self.input.clone();
        return self.submit(&text);
    }

    /// Sends a user turn to the assistant. Returns false without touching any
    /// state when the text is blank or a reply is still outstanding.
    pub fn submit(&mut self, text: &str) -> bool {
        if self.is_awaiting_response() {
            tracing::debug!("Ignoring submit while awaiting a response");
            return false;
        }

        let prompt = ChatPrompt::new(text);
        if prompt.text.is_empty() {
            return false;
        }

        self.append(Message::new(Role::User, &prompt.text));
        self.input.clear();
        self.state = SessionState::AwaitingResponse;

        if let Err(err) = self.tx.send(Action::ChatRequest(prompt)) {
            self.complete(Event::ChatFailure(err.to_string()));
        }

        return true;
    }

    /// Applies the outcome of the outstanding request. Outcomes arriving while
    /// idle have no request to answer and are discarded.
    pub fn handle_event(&mut self, event: Event) {
        if !self.is_awaiting_response() {
            tracing::warn!("Discarding chat outcome with no request outstanding");
            return;
        }

        self.complete(event);
    }

    fn complete(&mut self, event: Event) {
        let msg = match event {
            Event::ChatResponse(reply) => Message::from_reply(reply),
            Event::ChatFailure(cause) => {
                tracing::error!(cause = %cause, "Chat request failed");
                Message::new(Role::Assistant, FALLBACK_REPLY)
            }
        };

        self.append(msg);
        self.state = SessionState::Idle;
    }

    fn append(&mut self, message: Message) {
        self.subscribers
            .retain(|subscriber| return subscriber.send(message.clone()).is_ok());
        self.messages.push(message);
    }

    /// Clears the timeline and focus. Refused while a request is outstanding,
    /// its reply would otherwise land in the fresh conversation.
    pub fn reset(&mut self) -> bool {
        if self.is_awaiting_response() {
            return false;
        }

        self.messages.clear();
        self.input.clear();
        self.viewer.clear();
        return true;
    }

    pub fn focus_artifact(&mut self, query_id: QueryId, graph_ref: &str) {
        self.viewer.focus(query_id, graph_ref);
    }

    /// Focuses the graph of the message at `index`, if it carries one.
    pub fn focus_message(&mut self, index: usize) -> bool {
        return match self.messages.get(index) {
            Some(message) => self.viewer.focus_message(message),
            None => false,
        };
    }

    pub fn clear_focus(&mut self) {
        self.viewer.clear();
    }

    pub fn focused_artifact(&self) -> Option<&FocusedArtifact> {
        return self.viewer.focused();
    }

    pub fn is_focused(&self, query_id: QueryId) -> bool {
        return self.viewer.is_focused(query_id);
    }

    /// Index of the newest message that has a graph attached.
    pub fn latest_graph_index(&self) -> Option<usize> {
        return self
            .messages
            .iter()
            .rposition(|message| return message.graph_ref().is_some());
    }
}
