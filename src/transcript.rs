//! Conversation transcript: abbreviated entries and the wire-format adapter.
//!
//! The transcript holds turns in a terse, typed shorthand. Projection into
//! the verbose wire format (and back) happens here and nowhere else; the
//! round-trip for entries without tool fields is exact.

use serde::{Deserialize, Serialize};

use crate::wire::{Role, WireMessage, WireToolCall};

/// One conversational turn in abbreviated form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TranscriptEntry {
    /// System instruction text.
    System(String),
    /// User-authored text.
    User(String),
    /// Assistant turn; `tool_calls` is empty for plain text answers.
    Assistant {
        content: String,
        tool_calls: Vec<WireToolCall>,
    },
    /// Result of one executed tool call.
    ToolResult {
        tool_call_id: String,
        name: String,
        content: String,
    },
    /// Escape hatch: an entry already in canonical wire form.
    Raw(WireMessage),
}

impl TranscriptEntry {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System(text.into())
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::User(text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            content: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<WireToolCall>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn raw(message: WireMessage) -> Self {
        Self::Raw(message)
    }

    /// Project this entry into canonical wire form.
    pub fn to_wire(&self) -> WireMessage {
        match self {
            Self::System(text) => WireMessage::text(Role::System, text.clone()),
            Self::User(text) => WireMessage::text(Role::User, text.clone()),
            Self::Assistant {
                content,
                tool_calls,
            } => {
                if tool_calls.is_empty() {
                    WireMessage::text(Role::Assistant, content.clone())
                } else {
                    let text = if content.is_empty() {
                        None
                    } else {
                        Some(content.clone())
                    };
                    WireMessage::assistant_with_calls(text, tool_calls.clone())
                }
            }
            Self::ToolResult {
                tool_call_id,
                name,
                content,
            } => WireMessage::tool_result(tool_call_id.clone(), name.clone(), content.clone()),
            Self::Raw(message) => message.clone(),
        }
    }

    /// Read a canonical message back into abbreviated form.
    ///
    /// Tool-bearing messages (and anything else the abbreviation would lose
    /// fields from) are kept in full form as [`TranscriptEntry::Raw`].
    pub fn from_wire(message: WireMessage) -> Self {
        if message.has_tool_fields() || message.name.is_some() || message.role == Role::Tool {
            return Self::Raw(message);
        }
        let content = match message.content {
            Some(ref text) => text.clone(),
            None => return Self::Raw(message),
        };
        match message.role {
            Role::System => Self::System(content),
            Role::User => Self::User(content),
            Role::Assistant => Self::Assistant {
                content,
                tool_calls: Vec::new(),
            },
            Role::Tool => Self::Raw(message),
        }
    }

    /// Text of this entry when it is a plain assistant answer (no tool fields).
    pub fn assistant_text(&self) -> Option<&str> {
        match self {
            Self::Assistant {
                content,
                tool_calls,
            } if tool_calls.is_empty() => Some(content),
            Self::Raw(msg)
                if msg.role == Role::Assistant && !msg.has_tool_fields() =>
            {
                msg.content.as_deref()
            }
            _ => None,
        }
    }
}

/// Ordered store of conversation turns, owned by one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry.
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Append a batch of entries in order.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = TranscriptEntry>) {
        self.entries.extend(entries);
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Project the whole transcript into canonical wire form, in order.
    pub fn to_wire(&self) -> Vec<WireMessage> {
        self.entries.iter().map(TranscriptEntry::to_wire).collect()
    }

    /// Rebuild a transcript from a previously adapted message list.
    pub fn from_wire(messages: impl IntoIterator<Item = WireMessage>) -> Self {
        Self {
            entries: messages
                .into_iter()
                .map(TranscriptEntry::from_wire)
                .collect(),
        }
    }
}
