use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::ConversationSession;
use super::SessionState;
use super::FALLBACK_REPLY;
use crate::domain::models::Action;
use crate::domain::models::ChatReply;
use crate::domain::models::Event;
use crate::domain::models::Role;

fn reply(text: &str) -> Event {
    return Event::ChatResponse(ChatReply {
        text: text.to_string(),
        ..ChatReply::default()
    });
}

fn graph_reply(query_id: i64, graph_ref: &str) -> Event {
    return Event::ChatResponse(ChatReply {
        text: format!("Here's the performance graph for Query {query_id}:"),
        query_id: Some(query_id),
        query_text: None,
        graph_ref: Some(graph_ref.to_string()),
    });
}

fn count_role(session: &ConversationSession, role: Role) -> usize {
    return session
        .messages()
        .iter()
        .filter(|m| return m.role == role)
        .count();
}

mod submit {
    use super::*;

    #[test]
    fn it_sends_one_request() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        assert!(session.submit("  Why is query 7 slow? "));
        assert_eq!(session.state(), SessionState::AwaitingResponse);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages()[0].text, "Why is query 7 slow?");

        match rx.try_recv()? {
            Action::ChatRequest(prompt) => {
                assert_eq!(prompt.text, "Why is query 7 slow?");
            }
        }
        assert!(rx.try_recv().is_err());

        return Ok(());
    }

    #[test]
    fn it_rejects_blank_input() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        assert!(!session.submit(""));
        assert!(!session.submit(" \n\t "));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.messages().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn it_rejects_while_awaiting() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        assert!(session.submit("first"));
        session.push_input("second");
        assert!(!session.submit("second"));
        assert!(!session.submit_input());

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.input, "second");
        assert!(session.is_awaiting_response());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn it_clears_input_buffer() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        session.push_input("show graph ");
        session.push_input("for query 3");
        assert!(session.submit_input());

        assert_eq!(session.input, "");
        assert_eq!(session.messages()[0].text, "show graph for query 3");
    }

    #[test]
    fn it_falls_back_when_worker_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel::<Action>();
        drop(rx);
        let mut session = ConversationSession::new(tx);

        assert!(session.submit("hello"));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].text, FALLBACK_REPLY);
    }
}

mod handle_event {
    use super::*;

    #[test]
    fn it_appends_reply_and_returns_to_idle() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        session.submit("show graph for query 7");
        session.handle_event(graph_reply(7, "g7"));

        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.query_id(), Some(7));
        assert_eq!(last.graph_ref(), Some("g7"));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn it_appends_single_fallback_on_failure() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        session.submit("hello");
        session.handle_event(Event::ChatFailure("connection refused".to_string()));

        assert_eq!(session.messages().len(), 2);
        let last = session.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text, FALLBACK_REPLY);
        assert!(!last.text.contains("connection refused"));
        assert_eq!(last.artifact, None);

        assert!(session.submit("hello again"));
    }

    #[test]
    fn it_discards_outcome_when_idle() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        session.handle_event(reply("stray"));
        session.handle_event(Event::ChatFailure("stray".to_string()));

        assert!(session.messages().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn it_keeps_replies_in_submission_order() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        for idx in 0..3 {
            session.submit(&format!("question {idx}"));
            session.handle_event(reply(&format!("answer {idx}")));
        }

        let texts = session
            .messages()
            .iter()
            .map(|m| return m.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            texts,
            vec![
                "question 0",
                "answer 0",
                "question 1",
                "answer 1",
                "question 2",
                "answer 2",
            ]
        );
    }

    #[test]
    fn it_never_answers_more_than_asked() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        // Interleave submits, duplicate submits, successes, failures and stray
        // outcomes; the pairing must hold after every step.
        let steps = [
            "submit", "reply", "reply", "submit", "submit", "fail", "blank", "fail", "submit",
            "reply", "submit",
        ];

        for step in steps {
            match step {
                "submit" => {
                    session.submit("question");
                }
                "blank" => {
                    session.submit("   ");
                }
                "reply" => session.handle_event(reply("answer")),
                _ => session.handle_event(Event::ChatFailure("down".to_string())),
            }

            let users = count_role(&session, Role::User);
            let assistants = count_role(&session, Role::Assistant);
            let last_unanswered = session
                .messages()
                .last()
                .map(|m| return m.role == Role::User)
                .unwrap_or(false);

            assert!(assistants <= users);
            assert_eq!(session.is_awaiting_response(), last_unanswered);
        }

        assert_eq!(count_role(&session, Role::User), 4);
        assert_eq!(count_role(&session, Role::Assistant), 3);
    }
}

mod subscribe {
    use super::*;

    #[test]
    fn it_streams_appended_messages() -> Result<()> {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);
        let mut messages = session.subscribe();

        session.submit("hi");
        session.handle_event(reply("hello"));

        let first = messages.try_recv()?;
        let second = messages.try_recv()?;
        assert_eq!(first.role, Role::User);
        assert_eq!(second.text, "hello");
        if messages.try_recv().is_ok() {
            bail!("Unexpected extra message");
        }

        return Ok(());
    }

    #[test]
    fn it_prunes_dropped_subscribers() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);
        drop(session.subscribe());

        session.submit("hi");

        assert!(session.subscribers.is_empty());
        assert_eq!(session.messages().len(), 1);
    }
}

mod artifacts {
    use super::*;

    #[test]
    fn it_focuses_latest_pair_only() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        session.focus_artifact(7, "g7");
        session.focus_artifact(9, "g9");
        let focused = session.focused_artifact().unwrap();
        assert_eq!(focused.query_id, 9);
        assert_eq!(focused.graph_ref, "g9");

        session.clear_focus();
        assert_eq!(session.focused_artifact(), None);
    }

    #[test]
    fn it_focuses_message_without_mutating_it() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        session.submit("show graph for query 4");
        session.handle_event(graph_reply(4, "g4"));
        let before = session.messages().to_vec();

        assert_eq!(session.latest_graph_index(), Some(1));
        assert!(!session.focus_message(0));
        assert!(session.focus_message(1));
        assert!(!session.focus_message(42));
        assert_eq!(session.focused_artifact().unwrap().query_id, 4);

        session.clear_focus();
        assert_eq!(session.messages(), before.as_slice());
    }

    #[test]
    fn it_reports_focused_query() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        assert!(!session.is_focused(7));
        session.focus_artifact(7, "g7");
        assert!(session.is_focused(7));
        assert!(!session.is_focused(9));

        session.clear_focus();
        assert!(!session.is_focused(7));
    }
}

mod reset {
    use super::*;

    #[test]
    fn it_clears_when_idle() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        session.submit("show graph for query 4");
        session.handle_event(graph_reply(4, "g4"));
        session.focus_message(1);

        assert!(session.reset());
        assert!(session.messages().is_empty());
        assert_eq!(session.focused_artifact(), None);
    }

    #[test]
    fn it_refuses_while_awaiting() {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut session = ConversationSession::new(tx);

        session.submit("hello");

        assert!(!session.reset());
        assert_eq!(session.messages().len(), 1);
    }
}
