use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Bot,
}

/// One turn of the client-held conversation history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[cfg(test)]
impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
        }
    }
}

/// Renders the last `n` turns as `role: content` lines for prompt context.
pub fn render_recent(history: &[ChatMessage], n: usize) -> String {
    let start = history.len().saturating_sub(n);
    history[start..]
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Bot => "bot",
            };
            format!("{role}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_is_accepted_as_bot() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"Bonjour"}"#).unwrap();
        assert_eq!(msg.role, Role::Bot);
    }

    #[test]
    fn test_render_recent_keeps_last_turns_in_order() {
        let history = vec![
            ChatMessage::user("un"),
            ChatMessage::bot("deux"),
            ChatMessage::user("trois"),
        ];
        assert_eq!(render_recent(&history, 2), "bot: deux\nuser: trois");
        assert_eq!(render_recent(&history, 10).lines().count(), 3);
        assert_eq!(render_recent(&[], 4), "");
    }
}
