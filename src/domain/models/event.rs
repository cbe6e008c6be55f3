use super::ChatReply;

pub enum Event {
    ChatResponse(ChatReply),
    /// The request never produced a reply. Carries the cause for logging only.
    ChatFailure(String),
}
