use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use yiqi::conversation::{Conversation, MessageRole, MessageStatus, QueryTransport};
use yiqi::session::{self, SessionDescriptor};

#[derive(Clone, Default)]
struct Echo {
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl QueryTransport for Echo {
    async fn send(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("Deliveries should recover next quarter.".to_string())
    }
}

#[test]
fn test_token_survives_view_path() {
    let descriptor = SessionDescriptor::new(vec!["AAPL".into(), "BRK.B".into()], "Dividend focus & risk?");
    let token = session::encode(&descriptor);
    let path = session::view_path(&token);

    let segment = path
        .strip_prefix("/spaces/")
        .and_then(|rest| rest.strip_suffix("/view"))
        .unwrap();
    assert_eq!(segment, token);
    assert_eq!(session::decode(segment).unwrap(), descriptor);
}

#[test]
fn test_unicode_context_round_trip() {
    let descriptor = SessionDescriptor::new(vec!["BABA".into()], "关注中国市场 📈");
    let decoded = session::decode(&session::encode(&descriptor)).unwrap();
    assert_eq!(decoded, descriptor);
}

#[tokio::test]
async fn test_space_to_resolved_turn() {
    let descriptor = SessionDescriptor::new(vec!["TSLA".into()], "Be concise.");
    let token = session::encode(&descriptor);

    let opened = session::decode(&token).unwrap();
    assert_eq!(opened, descriptor);

    let transport = Echo::default();
    let prompts = transport.prompts.clone();
    let mut conversation = Conversation::new(opened, transport);
    assert!(conversation.select_ticker("tsla"));

    let reply = conversation.submit("What's the outlook?").await.unwrap();
    assert_eq!(reply.status, MessageStatus::Resolved);
    assert_eq!(reply.content, "Deliveries should recover next quarter.");

    let messages = conversation.transcript().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert!(messages.iter().all(|m| !m.pending()));

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("TSLA"));
    assert!(prompts[0].contains("Be concise."));
    assert!(prompts[0].ends_with("What's the outlook?"));
}
