//! Conversation message model.
//!
//! Messages are immutable once built. Constructors take `SystemTime`
//! explicitly; callers own the clock.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{NonEmptyString, PersonaId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One entry in the conversation log.
///
/// Only assistant messages carry a persona tag. The constructors enforce that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: NonEmptyString,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    persona: Option<PersonaId>,
    timestamp: SystemTime,
}

impl Message {
    #[must_use]
    pub fn user(text: NonEmptyString, timestamp: SystemTime) -> Self {
        Self {
            role: Role::User,
            text,
            persona: None,
            timestamp,
        }
    }

    #[must_use]
    pub fn assistant(persona: PersonaId, text: NonEmptyString, timestamp: SystemTime) -> Self {
        Self {
            role: Role::Assistant,
            text,
            persona: Some(persona),
            timestamp,
        }
    }

    #[must_use]
    pub fn system(text: NonEmptyString, timestamp: SystemTime) -> Self {
        Self {
            role: Role::System,
            text,
            persona: None,
            timestamp,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    #[must_use]
    pub fn persona(&self) -> Option<PersonaId> {
        self.persona
    }

    #[must_use]
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_assistant_messages_carry_persona() {
        let now = SystemTime::now();
        let text = NonEmptyString::new("hi").unwrap();

        assert_eq!(Message::user(text.clone(), now).persona(), None);
        assert_eq!(Message::system(text.clone(), now).persona(), None);
        assert_eq!(
            Message::assistant(PersonaId::Scribe, text, now).persona(),
            Some(PersonaId::Scribe)
        );
    }

    #[test]
    fn serializes_role_lowercase() {
        let msg = Message::user(NonEmptyString::new("hello").unwrap(), SystemTime::UNIX_EPOCH);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("persona").is_none());
    }
}
