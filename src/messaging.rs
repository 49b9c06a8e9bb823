use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{PortalError, Result};
use crate::models::{Message, NotificationType};
use crate::notifications::push_notification;
use crate::store::{Store, new_id};

/// Latest message exchanged with one peer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub peer_id: String,
    pub last_message: Message,
    pub unread_count: usize,
}

/// Deterministic key for the thread between two users: `min-max`.
pub fn conversation_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}-{}", a, b)
    } else {
        format!("{}-{}", b, a)
    }
}

/// One entry per peer holding that peer's newest message, newest first.
pub fn summarize_conversations(messages: &[Message], user_id: &str) -> Vec<Conversation> {
    let mut by_peer: HashMap<&str, Conversation> = HashMap::new();

    for msg in messages {
        let peer = if msg.sender_id == user_id {
            msg.receiver_id.as_str()
        } else if msg.receiver_id == user_id {
            msg.sender_id.as_str()
        } else {
            continue;
        };
        let unread = usize::from(msg.receiver_id == user_id && !msg.read);

        match by_peer.get_mut(peer) {
            Some(conv) => {
                conv.unread_count += unread;
                if msg.timestamp >= conv.last_message.timestamp {
                    conv.last_message = msg.clone();
                }
            }
            None => {
                by_peer.insert(
                    peer,
                    Conversation {
                        peer_id: peer.to_string(),
                        last_message: msg.clone(),
                        unread_count: unread,
                    },
                );
            }
        }
    }

    let mut conversations: Vec<Conversation> = by_peer.into_values().collect();
    conversations.sort_by(|a, b| b.last_message.timestamp.cmp(&a.last_message.timestamp));
    conversations
}

impl Store {
    pub fn send_message(&self, sender_id: &str, receiver_id: &str, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(PortalError::Validation("message cannot be empty".to_string()));
        }
        if sender_id == receiver_id {
            return Err(PortalError::Validation(
                "cannot send a message to yourself".to_string(),
            ));
        }

        let settings = self.notification_settings()?;
        let now = Utc::now();
        let message = Message {
            id: new_id(),
            conversation_id: conversation_id(sender_id, receiver_id),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            timestamp: now,
            read: false,
        };

        self.update(|data| {
            data.messages.push(message.clone());
            push_notification(
                data,
                &settings,
                receiver_id,
                NotificationType::Message,
                "New message",
                &preview(content, 50),
                now,
            );
            Ok(())
        })?;
        info!(conversation = %message.conversation_id, "Message sent");
        Ok(message)
    }

    /// The thread between two users, oldest first.
    pub fn get_messages(&self, user_id: &str, peer_id: &str) -> Result<Vec<Message>> {
        let key = conversation_id(user_id, peer_id);
        let mut messages: Vec<Message> = self
            .get_data()?
            .messages
            .into_iter()
            .filter(|m| m.conversation_id == key)
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(messages)
    }

    pub fn get_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let data = self.get_data()?;
        let conversations = summarize_conversations(&data.messages, user_id);
        debug!(user_id, "Found {} conversations", conversations.len());
        Ok(conversations)
    }

    /// Marks everything `peer_id` sent to `user_id` as read; returns how many changed.
    pub fn mark_conversation_read(&self, user_id: &str, peer_id: &str) -> Result<usize> {
        self.update(|data| {
            let mut changed = 0;
            for msg in data
                .messages
                .iter_mut()
                .filter(|m| m.receiver_id == user_id && m.sender_id == peer_id && !m.read)
            {
                msg.read = true;
                changed += 1;
            }
            Ok(changed)
        })
    }

    pub fn unread_message_count(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .get_data()?
            .messages
            .iter()
            .filter(|m| m.receiver_id == user_id && !m.read)
            .count())
    }
}

fn preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let cut: String = content.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use std::collections::HashSet;

    fn msg(id: &str, from: &str, to: &str, at: DateTime<Utc>, read: bool) -> Message {
        Message {
            id: id.to_string(),
            conversation_id: conversation_id(from, to),
            sender_id: from.to_string(),
            receiver_id: to.to_string(),
            content: format!("message {}", id),
            timestamp: at,
            read,
        }
    }

    #[test]
    fn test_conversation_id_is_order_independent() {
        assert_eq!(conversation_id("7", "3"), "3-7");
        assert_eq!(conversation_id("3", "7"), "3-7");
        // String ordering, not numeric
        assert_eq!(conversation_id("10", "9"), "10-9");
    }

    #[test]
    fn test_summarize_keeps_latest_message_per_peer() {
        let t0 = Utc::now();
        let messages = vec![
            msg("a", "1", "2", t0, true),
            msg("b", "2", "1", t0 + Duration::minutes(5), false),
            msg("c", "1", "2", t0 + Duration::minutes(2), true),
            msg("d", "3", "1", t0 + Duration::minutes(1), false),
            msg("e", "3", "4", t0 + Duration::minutes(9), false),
        ];
        let conversations = summarize_conversations(&messages, "1");

        let peers: HashSet<&str> = conversations.iter().map(|c| c.peer_id.as_str()).collect();
        assert_eq!(peers.len(), conversations.len());
        assert_eq!(peers, HashSet::from(["2", "3"]));

        for conv in &conversations {
            let newest = messages
                .iter()
                .filter(|m| {
                    (m.sender_id == "1" && m.receiver_id == conv.peer_id)
                        || (m.receiver_id == "1" && m.sender_id == conv.peer_id)
                })
                .map(|m| m.timestamp)
                .max()
                .unwrap();
            assert_eq!(conv.last_message.timestamp, newest);
        }
        assert_eq!(conversations[0].peer_id, "2");
        assert_eq!(conversations[0].last_message.id, "b");
        assert_eq!(conversations[0].unread_count, 1);
    }

    #[test]
    fn test_summarize_ignores_other_users_threads() {
        let messages = vec![msg("x", "5", "6", Utc::now(), false)];
        assert!(summarize_conversations(&messages, "1").is_empty());
    }

    #[test]
    fn test_send_message_and_read_thread() {
        let store = Store::in_memory();
        let sent = store.send_message("2", "6", "  Hello there  ").unwrap();
        assert_eq!(sent.content, "Hello there");
        assert_eq!(sent.conversation_id, "2-6");

        let thread = store.get_messages("6", "2").unwrap();
        assert_eq!(thread.len(), 1);

        assert_eq!(store.unread_message_count("6").unwrap(), 1);
        assert_eq!(store.mark_conversation_read("6", "2").unwrap(), 1);
        assert_eq!(store.unread_message_count("6").unwrap(), 0);

        let notes = store.get_data().unwrap().notifications;
        assert!(notes.iter().any(|n| n.user_id == "6" && n.kind == NotificationType::Message));
    }

    #[test]
    fn test_send_message_rejects_empty_and_self() {
        let store = Store::in_memory();
        assert!(store.send_message("2", "3", "   ").is_err());
        assert!(store.send_message("2", "2", "hi").is_err());
    }

    #[test]
    fn test_seeded_conversations_for_student() {
        let store = Store::in_memory();
        let conversations = store.get_conversations("2").unwrap();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].peer_id, "3");
        assert_eq!(conversations[0].last_message.id, "3");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééééééééé", 6), "ééé...");
    }
}
