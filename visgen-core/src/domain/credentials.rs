//! Credential pair used to sign provider requests

use std::fmt;

/// Access key / secret key pair
///
/// Supplied by the caller for every call and never persisted. The secret is
/// redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// True when either half of the pair is empty or only whitespace
    pub fn is_incomplete(&self) -> bool {
        self.access_key.trim().is_empty() || self.secret_key.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("AKLTexample", "super-secret");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("AKLTexample"));
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn test_is_incomplete() {
        assert!(!Credentials::new("ak", "sk").is_incomplete());
        assert!(Credentials::new("ak", "").is_incomplete());
        assert!(Credentials::new("", "sk").is_incomplete());
        assert!(Credentials::new("ak", "   ").is_incomplete());
    }
}
