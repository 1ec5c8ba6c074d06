// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the Agent Toolbelt.
//!
//! This crate provides [`ToolbeltConfig`] — per-vendor credential entries and
//! application-level settings — together with helpers for loading from TOML
//! files, merging overlays, and producing advisory [`ConfigWarning`]s.
//!
//! The toolbelt core never reads environment variables or files on its own;
//! adapters take credentials as constructor arguments. This crate exists for
//! applications that want a file-based credential source and only ever parses
//! what the caller hands it.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Vendor names the toolbelt ships adapters for.
pub const KNOWN_VENDORS: &[&str] = &[
    "github",
    "stripe",
    "notion",
    "linear",
    "jira",
    "resend",
    "twilio",
    "vercel",
    "supabase",
    "paypal",
    "mux",
    "firecrawl",
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found or unreadable.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A credentials entry names a vendor the toolbelt has no adapter for.
    UnknownVendor {
        /// The unrecognized vendor name.
        name: String,
    },
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::UnknownVendor { name } => {
                write!(f, "no adapter ships for vendor '{name}'")
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level configuration for an application using the toolbelt.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ToolbeltConfig {
    /// Default vendor name when none is specified by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_vendor: Option<String>,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Per-vendor credential entries.
    #[serde(default)]
    pub vendors: BTreeMap<String, CredentialEntry>,
}

/// Credentials for a single vendor.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "auth")]
pub enum CredentialEntry {
    /// A plain API key sent in a vendor-specific header.
    #[serde(rename = "api_key")]
    ApiKey {
        /// The key value.
        key: String,
    },
    /// A bearer token for `Authorization: Bearer`.
    #[serde(rename = "bearer")]
    Bearer {
        /// The token value.
        token: String,
    },
    /// HTTP basic credentials (e.g. Twilio account SID + auth token,
    /// JIRA email + API token, Mux token id + secret).
    #[serde(rename = "basic")]
    Basic {
        /// Username half of the pair.
        username: String,
        /// Secret half of the pair.
        secret: String,
    },
    /// An OAuth client pair for applications that perform their own token
    /// exchange (e.g. PayPal).
    #[serde(rename = "oauth_client")]
    OAuthClient {
        /// OAuth client id.
        client_id: String,
        /// OAuth client secret.
        client_secret: String,
    },
}

impl ToolbeltConfig {
    /// Load and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })
    }

    /// Look up the credentials entry for a vendor.
    pub fn credentials(&self, vendor: &str) -> Option<&CredentialEntry> {
        self.vendors.get(vendor)
    }

    /// Semantic validation.
    ///
    /// Hard failures (empty secrets, a `default_vendor` with no credentials
    /// entry) are errors; recognizable-but-suspect settings come back as
    /// warnings.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        let mut reasons = Vec::new();
        let mut warnings = Vec::new();

        if let Some(default) = &self.default_vendor
            && !self.vendors.contains_key(default)
        {
            reasons.push(format!(
                "default_vendor '{default}' has no credentials entry"
            ));
        }

        if let Some(level) = &self.log_level
            && !["trace", "debug", "info", "warn", "error"].contains(&level.as_str())
        {
            reasons.push(format!("unknown log_level '{level}'"));
        }

        for (vendor, entry) in &self.vendors {
            if !KNOWN_VENDORS.contains(&vendor.as_str()) {
                warnings.push(ConfigWarning::UnknownVendor {
                    name: vendor.clone(),
                });
            }
            let empty = match entry {
                CredentialEntry::ApiKey { key } => key.is_empty(),
                CredentialEntry::Bearer { token } => token.is_empty(),
                CredentialEntry::Basic { username, secret } => {
                    username.is_empty() || secret.is_empty()
                }
                CredentialEntry::OAuthClient {
                    client_id,
                    client_secret,
                } => client_id.is_empty() || client_secret.is_empty(),
            };
            if empty {
                reasons.push(format!("vendor '{vendor}' has empty credentials"));
            }
        }

        if self.log_level.is_none() {
            warnings.push(ConfigWarning::MissingOptionalField {
                field: "log_level".into(),
                hint: "defaults to the subscriber's filter".into(),
            });
        }

        if reasons.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigError::ValidationError { reasons })
        }
    }

    /// Merge an overlay on top of this config. Overlay scalars win; vendor
    /// entries are unioned with the overlay taking precedence per vendor.
    #[must_use]
    pub fn merge(mut self, overlay: Self) -> Self {
        if overlay.default_vendor.is_some() {
            self.default_vendor = overlay.default_vendor;
        }
        if overlay.log_level.is_some() {
            self.log_level = overlay.log_level;
        }
        for (vendor, entry) in overlay.vendors {
            self.vendors.insert(vendor, entry);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
default_vendor = "github"
log_level = "debug"

[vendors.github]
auth = "bearer"
token = "ghp_xxx"

[vendors.twilio]
auth = "basic"
username = "AC123"
secret = "tok"

[vendors.paypal]
auth = "oauth_client"
client_id = "cid"
client_secret = "cs"
"#;

    #[test]
    fn parses_tagged_credential_entries() {
        let config = ToolbeltConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.default_vendor.as_deref(), Some("github"));
        assert_eq!(
            config.credentials("github"),
            Some(&CredentialEntry::Bearer {
                token: "ghp_xxx".into()
            })
        );
        assert!(matches!(
            config.credentials("twilio"),
            Some(CredentialEntry::Basic { .. })
        ));
        assert!(matches!(
            config.credentials("paypal"),
            Some(CredentialEntry::OAuthClient { .. })
        ));
    }

    #[test]
    fn valid_config_passes_with_no_warnings() {
        let config = ToolbeltConfig::from_toml_str(SAMPLE).unwrap();
        let warnings = config.validate().unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn unknown_vendor_is_a_warning_not_an_error() {
        let config = ToolbeltConfig::from_toml_str(
            r#"
[vendors.acme]
auth = "api_key"
key = "k"
"#,
        )
        .unwrap();
        let warnings = config.validate().unwrap();
        assert!(warnings.iter().any(
            |w| matches!(w, ConfigWarning::UnknownVendor { name } if name == "acme")
        ));
    }

    #[test]
    fn empty_secret_is_an_error() {
        let config = ToolbeltConfig::from_toml_str(
            r#"
[vendors.stripe]
auth = "bearer"
token = ""
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { reasons }
            if reasons.iter().any(|r| r.contains("stripe"))));
    }

    #[test]
    fn default_vendor_must_have_credentials() {
        let config = ToolbeltConfig::from_toml_str(r#"default_vendor = "github""#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ToolbeltConfig::from_toml_str(SAMPLE).unwrap();
        let overlay = ToolbeltConfig::from_toml_str(
            r#"
log_level = "warn"

[vendors.github]
auth = "bearer"
token = "ghp_override"
"#,
        )
        .unwrap();
        let merged = base.merge(overlay);
        assert_eq!(merged.log_level.as_deref(), Some("warn"));
        assert_eq!(merged.default_vendor.as_deref(), Some("github"));
        assert_eq!(
            merged.credentials("github"),
            Some(&CredentialEntry::Bearer {
                token: "ghp_override".into()
            })
        );
        // untouched entries survive
        assert!(merged.credentials("twilio").is_some());
    }

    #[test]
    fn load_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = ToolbeltConfig::load(file.path()).unwrap();
        assert_eq!(config.vendors.len(), 3);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = ToolbeltConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = ToolbeltConfig::from_toml_str("vendors = 3").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
