//! SMTP connection secrets.
//!
//! Stored as JSON:
//!
//! ```json
//! {
//!   "SmtpHost": "smtp.example.com",
//!   "SmtpUser": "z@example.com",
//!   "SmtpPass": "app password",
//!   "From": { "Name": "Z", "Address": "z@example.com" },
//!   "Headers": { "Reply-To": "noreply@example.com" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use mailforge_mime::Address;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Instructions for connecting to an SMTP server.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Secrets {
    /// Server hostname, e.g. `smtp.example.com`.
    pub smtp_host: String,
    /// User to authenticate as; also the envelope sender.
    pub smtp_user: String,
    /// Password for authentication.
    pub smtp_pass: String,
    /// Identity used as `From` for messages built from these secrets.
    #[serde(default)]
    pub from: Address,
    /// Extra headers added to every outgoing message.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Secrets {
    /// Parses secrets from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a required field is
    /// missing.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads secrets from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let secrets = Self::from_json(&contents)?;
        tracing::debug!(path = %path.display(), host = %secrets.smtp_host, "loaded secrets");
        Ok(secrets)
    }

    /// Default location of the secrets file:
    /// `<config dir>/mailforge/secrets.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no configuration directory.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("mailforge").join("secrets.json"))
            .ok_or_else(|| Error::Config("No configuration directory".to_string()))
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_pass", &"<redacted>")
            .field("from", &self.from)
            .field("headers", &self.headers)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "SmtpHost": "smtp.example.com",
        "SmtpUser": "z@example.com",
        "SmtpPass": "hunter2",
        "From": {"Name": "Z", "Address": "z@example.com"},
        "Headers": {"Reply-To": "noreply@example.com"}
    }"#;

    #[test]
    fn test_from_json() {
        let secrets = Secrets::from_json(JSON).unwrap();
        assert_eq!(secrets.smtp_host, "smtp.example.com");
        assert_eq!(secrets.smtp_user, "z@example.com");
        assert_eq!(secrets.smtp_pass, "hunter2");
        assert_eq!(secrets.from, Address::new("Z", "z@example.com"));
        assert_eq!(secrets.headers["Reply-To"], "noreply@example.com");
    }

    #[test]
    fn test_from_json_optional_fields() {
        let secrets = Secrets::from_json(
            r#"{"SmtpHost": "h", "SmtpUser": "u", "SmtpPass": "p"}"#,
        )
        .unwrap();
        assert_eq!(secrets.from, Address::default());
        assert!(secrets.headers.is_empty());
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            Secrets::from_json(r#"{"SmtpHost": "h"}"#),
            Err(Error::Serde(_))
        ));
        assert!(Secrets::from_json("not json").is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let secrets = Secrets::from_json(JSON).unwrap();
        let json = serde_json::to_string(&secrets).unwrap();
        assert!(json.contains("\"SmtpPass\":\"hunter2\""));
        assert_eq!(Secrets::from_json(&json).unwrap(), secrets);
    }

    #[test]
    fn test_load() {
        let path = std::env::temp_dir().join(format!("mailforge-secrets-{}.json", std::process::id()));
        std::fs::write(&path, JSON).unwrap();
        let secrets = Secrets::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(secrets.smtp_host, "smtp.example.com");

        assert!(matches!(
            Secrets::load("/nonexistent/mailforge/secrets.json"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let secrets = Secrets::from_json(JSON).unwrap();
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_default_path() {
        if let Ok(path) = Secrets::default_path() {
            assert!(path.ends_with("mailforge/secrets.json"));
        }
    }
}
