#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ChatReply;
use super::Role;

/// Identifier the analysis service assigns to an executed query.
pub type QueryId = i64;

/// A query reference attached to a conversation turn. A graph reference can
/// only exist alongside the query it was rendered for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub query_id: QueryId,
    pub graph_ref: Option<String>,
}

impl Artifact {
    pub fn new(query_id: QueryId, graph_ref: Option<String>) -> Artifact {
        return Artifact {
            query_id,
            graph_ref,
        };
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub query_text: Option<String>,
    pub artifact: Option<Artifact>,
}

impl Message {
    pub fn new(role: Role, text: &str) -> Message {
        return Message {
            role,
            text: text.to_string().replace('\t', "  "),
            query_text: None,
            artifact: None,
        };
    }

    /// Builds an assistant turn from a chat reply. A graph reference without a
    /// query id has nothing to anchor to and is dropped.
    pub fn from_reply(reply: ChatReply) -> Message {
        let mut msg = Message::new(Role::Assistant, &reply.text);
        msg.query_text = reply.query_text;

        match (reply.query_id, reply.graph_ref) {
            (Some(query_id), graph_ref) => {
                msg.artifact = Some(Artifact::new(query_id, graph_ref));
            }
            (None, Some(graph_ref)) => {
                tracing::warn!(graph_ref = %graph_ref, "Dropping graph reference without a query id");
            }
            (None, None) => (),
        }

        return msg;
    }

    pub fn query_id(&self) -> Option<QueryId> {
        return self.artifact.as_ref().map(|artifact| return artifact.query_id);
    }

    pub fn graph_ref(&self) -> Option<&str> {
        return self
            .artifact
            .as_ref()
            .and_then(|artifact| return artifact.graph_ref.as_deref());
    }
}
