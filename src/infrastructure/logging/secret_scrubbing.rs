use regex::{Captures, Regex};
use std::fmt;
use std::sync::OnceLock;

/// Redacts key material and tokens from text before it is logged or shown
/// to the user.
#[derive(Clone)]
pub struct SecretScrubber {
    pem_pattern: Regex,
    bearer_pattern: Regex,
    jwt_pattern: Regex,
    field_pattern: Regex,
}

impl SecretScrubber {
    /// Create a new secret scrubber
    pub fn new() -> Self {
        Self {
            // Whole PEM blocks, with real or escaped newlines
            pem_pattern: Regex::new(r"-----BEGIN [A-Z0-9 ]+-----(?s:.*?)-----END [A-Z0-9 ]+-----")
                .expect("valid PEM pattern"),
            // Bearer tokens in Authorization headers
            bearer_pattern: Regex::new(r"Bearer\s+[A-Za-z0-9\-_\.=+/:]+").expect("valid bearer pattern"),
            // Bare JWTs (header.payload.signature)
            jwt_pattern: Regex::new(r"eyJ[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+")
                .expect("valid JWT pattern"),
            // password / passphrase / token / secret assignments
            field_pattern: Regex::new(
                r#"(?i)(["']?(?:password|passphrase|private_key_pwd|token|secret)["']?\s*[:=]\s*)["']?[^"'\s,}]+["']?"#,
            )
            .expect("valid field pattern"),
        }
    }

    /// Process-wide shared instance
    pub fn global() -> &'static Self {
        static SCRUBBER: OnceLock<SecretScrubber> = OnceLock::new();
        SCRUBBER.get_or_init(Self::new)
    }

    /// Scrub a message of sensitive data
    pub fn scrub_message(&self, message: &str) -> String {
        let scrubbed = self
            .pem_pattern
            .replace_all(message, "[PRIVATE_KEY_REDACTED]");
        let scrubbed = self
            .bearer_pattern
            .replace_all(&scrubbed, "Bearer [TOKEN_REDACTED]");
        let scrubbed = self.jwt_pattern.replace_all(&scrubbed, "[TOKEN_REDACTED]");
        self.field_pattern
            .replace_all(&scrubbed, |caps: &Captures| format!("{}[REDACTED]", &caps[1]))
            .into_owned()
    }
}

impl Default for SecretScrubber {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}
