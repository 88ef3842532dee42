//! Support chats attached to bids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BidNumber, ChatId, Email, OpenlotError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatStatus {
    Open,
    Resolved,
}

impl std::fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "OPEN",
            Self::Resolved => "RESOLVED",
        };
        write!(f, "{s}")
    }
}

/// A single message inside a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Free-form sender label, e.g. the user's email or `"support"`.
    pub sender: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// A support conversation opened by a user, usually about one of their bids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportChat {
    pub id: ChatId,
    /// Bid the chat is about, if the user linked one.
    pub bid_number: Option<BidNumber>,
    pub user_email: Email,
    /// Issue summary given when the chat was opened.
    pub issue: String,
    pub status: ChatStatus,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl SupportChat {
    #[must_use]
    pub fn open(
        user_email: Email,
        issue: impl Into<String>,
        bid_number: Option<BidNumber>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ChatId::new(),
            bid_number,
            user_email,
            issue: issue.into(),
            status: ChatStatus::Open,
            messages: Vec::new(),
            created_at: now,
        }
    }

    /// Append a message. Resolved chats accept no further messages.
    pub fn post(
        &mut self,
        sender: impl Into<String>,
        body: impl Into<String>,
        now: DateTime<Utc>,
    ) -> crate::Result<()> {
        if self.status == ChatStatus::Resolved {
            return Err(OpenlotError::ChatClosed(self.id));
        }
        self.messages.push(ChatMessage {
            sender: sender.into(),
            body: body.into(),
            sent_at: now,
        });
        Ok(())
    }

    /// Close the conversation.
    pub fn resolve(&mut self) -> crate::Result<()> {
        if self.status == ChatStatus::Resolved {
            return Err(OpenlotError::ChatClosed(self.id));
        }
        self.status = ChatStatus::Resolved;
        Ok(())
    }
}
