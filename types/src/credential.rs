//! Named secrets held by the credential vault.

/// The three secrets the application knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialName {
    /// Generative-language API key.
    Gemini,
    /// Source-hosting personal access token.
    GitHub,
    /// Drive folder identifier. Stored only; nothing consumes it yet.
    Drive,
}

impl CredentialName {
    pub const ALL: [CredentialName; 3] = [Self::Gemini, Self::GitHub, Self::Drive];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::GitHub => "github",
            Self::Drive => "drive",
        }
    }

    /// Key under which the secret is persisted.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Gemini => "orion_gemini_key",
            Self::GitHub => "orion_github_key",
            Self::Drive => "orion_drive_id",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gemini => "Gemini API Key",
            Self::GitHub => "GitHub Token",
            Self::Drive => "Drive Folder ID",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    const fn slot(self) -> usize {
        match self {
            Self::Gemini => 0,
            Self::GitHub => 1,
            Self::Drive => 2,
        }
    }
}

impl std::fmt::Display for CredentialName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory copy of all three secrets. An empty string means absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    values: [String; 3],
}

impl CredentialSet {
    #[must_use]
    pub fn get(&self, name: CredentialName) -> &str {
        &self.values[name.slot()]
    }

    pub fn set(&mut self, name: CredentialName, value: impl Into<String>) {
        self.values[name.slot()] = value.into();
    }

    #[must_use]
    pub fn is_present(&self, name: CredentialName) -> bool {
        !self.get(name).is_empty()
    }

    pub fn clear(&mut self) {
        for value in &mut self.values {
            value.clear();
        }
    }
}

// Manual Debug impl to prevent leaking secrets in logs.
impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |name| {
            if self.is_present(name) {
                "[REDACTED]"
            } else {
                "None"
            }
        };
        f.debug_struct("CredentialSet")
            .field("gemini", &mask(CredentialName::Gemini))
            .field("github", &mask(CredentialName::GitHub))
            .field("drive", &mask(CredentialName::Drive))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_means_absent() {
        let mut set = CredentialSet::default();
        assert!(!set.is_present(CredentialName::Gemini));
        set.set(CredentialName::Gemini, "k");
        assert!(set.is_present(CredentialName::Gemini));
        set.set(CredentialName::Gemini, "");
        assert!(!set.is_present(CredentialName::Gemini));
    }

    #[test]
    fn debug_redacts_values() {
        let mut set = CredentialSet::default();
        set.set(CredentialName::GitHub, "ghp_secret");
        let rendered = format!("{set:?}");
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn storage_keys_are_namespaced() {
        for name in CredentialName::ALL {
            assert!(name.storage_key().starts_with("orion_"));
        }
        assert_eq!(CredentialName::parse("GitHub"), Some(CredentialName::GitHub));
        assert_eq!(CredentialName::parse("dropbox"), None);
    }
}
