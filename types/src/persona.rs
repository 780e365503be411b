//! The fixed team of personas the user can address.
//!
//! Personas are static data: each one binds a display identity to the system
//! instruction that is prepended to every prompt sent while it is active.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier for one of the four team members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaId {
    #[default]
    Bolt,
    Mintaka,
    Scribe,
    Justus,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown persona: {0}")]
pub struct UnknownPersonaError(pub String);

impl PersonaId {
    pub const ALL: [PersonaId; 4] = [Self::Bolt, Self::Mintaka, Self::Scribe, Self::Justus];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bolt => "bolt",
            Self::Mintaka => "mintaka",
            Self::Scribe => "scribe",
            Self::Justus => "justus",
        }
    }

    /// Parse an identifier or a role alias, case-insensitively.
    ///
    /// `"legal"` resolves to Justus, `"cto"` to Mintaka, and so on.
    pub fn parse(raw: &str) -> Result<Self, UnknownPersonaError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bolt" | "coo" | "ops" | "assistant" => Ok(Self::Bolt),
            "mintaka" | "cto" | "code" | "engineering" => Ok(Self::Mintaka),
            "scribe" | "docs" | "documentation" => Ok(Self::Scribe),
            "justus" | "legal" | "counsel" => Ok(Self::Justus),
            _ => Err(UnknownPersonaError(raw.to_string())),
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Bolt => 0,
            Self::Mintaka => 1,
            Self::Scribe => 2,
            Self::Justus => 3,
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub const fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    #[must_use]
    pub const fn persona(self) -> &'static Persona {
        &PERSONAS[self.index()]
    }
}

impl std::fmt::Display for PersonaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PersonaId {
    type Err = UnknownPersonaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Accent colour used to tint a persona in the UI.
///
/// Kept abstract here; the renderer maps it onto a concrete palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Blue,
    Purple,
    Orange,
    Emerald,
}

/// Immutable persona record.
#[derive(Debug, PartialEq, Eq)]
pub struct Persona {
    pub id: PersonaId,
    pub name: &'static str,
    pub role: &'static str,
    pub accent: Accent,
    pub instruction: &'static str,
}

/// Persona table, indexed by [`PersonaId::index`].
pub static PERSONAS: [Persona; 4] = [
    Persona {
        id: PersonaId::Bolt,
        name: "Bolt",
        role: "Chief of Staff",
        accent: Accent::Blue,
        instruction: "You are Bolt, the COO/Assistant. You are friendly and organized.",
    },
    Persona {
        id: PersonaId::Mintaka,
        name: "Mintaka",
        role: "Code Director",
        accent: Accent::Purple,
        instruction: "You are Mintaka, the CTO. You are an expert engineer focused on clean code.",
    },
    Persona {
        id: PersonaId::Scribe,
        name: "Scribe",
        role: "Documentation",
        accent: Accent::Orange,
        instruction: "You are Scribe, the Documentation specialist. You summarize brainstorms.",
    },
    Persona {
        id: PersonaId::Justus,
        name: "Justus",
        role: "Legal Counsel",
        accent: Accent::Emerald,
        instruction: "You are Justus, the Legal Counsel. You focus on SLAs and POPIA compliance.",
    },
];
