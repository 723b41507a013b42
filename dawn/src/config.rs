//! Task Dawn configuration types and loading
//!
//! Non-secret settings come from a YAML file; credentials come from
//! environment variables whose names the file can override.

use chrono::Weekday;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::retry::RetryPolicy;

/// Main Task Dawn configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Google Tasks access
    pub google: GoogleConfig,

    /// Retry budget for remote calls
    pub retry: RetryPolicy,

    /// Outgoing email
    pub email: EmailConfig,

    /// Digest contents and schedule
    pub digest: DigestConfig,
}

impl Config {
    /// Resolve every credential from the environment
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn secrets(&self) -> Result<Secrets> {
        let google = self.google_secrets()?;

        let user = require_env(&self.email.user_env)?;
        if user.parse::<lettre::Address>().is_err() {
            return Err(eyre!(
                "{} must be an email address, got '{}'",
                self.email.user_env,
                user
            ));
        }
        let email = EmailSecrets {
            user,
            password: require_env(&self.email.password_env)?,
        };

        Ok(Secrets { google, email })
    }

    /// Check settings that parse but cannot produce a useful digest
    pub fn validate(&self) -> Result<()> {
        if self.digest.top_n == 0 {
            return Err(eyre!("digest.top-n must be at least 1"));
        }
        Ok(())
    }

    /// Resolve only the Google credentials; enough for previews and listings
    pub fn google_secrets(&self) -> Result<GoogleSecrets> {
        Ok(GoogleSecrets {
            client_id: require_env(&self.google.client_id_env)?,
            client_secret: require_env(&self.google.client_secret_env)?,
            refresh_token: require_env(&self.google.refresh_token_env)?,
        })
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .taskdawn.yml
        let local_config = PathBuf::from(".taskdawn.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/taskdawn/taskdawn.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskdawn").join("taskdawn.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; the full load reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".taskdawn.yml")];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("taskdawn").join("taskdawn.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(eyre!("Environment variable {} is empty", name)),
        Err(_) => Err(eyre!("Environment variable {} is not set", name)),
    }
}

/// Google Tasks API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Environment variable containing the OAuth client id
    #[serde(rename = "client-id-env")]
    pub client_id_env: String,

    /// Environment variable containing the OAuth client secret
    #[serde(rename = "client-secret-env")]
    pub client_secret_env: String,

    /// Environment variable containing the OAuth refresh token
    #[serde(rename = "refresh-token-env")]
    pub refresh_token_env: String,

    /// OAuth token endpoint
    #[serde(rename = "token-url")]
    pub token_url: String,

    /// Tasks API base URL
    #[serde(rename = "api-base-url")]
    pub api_base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id_env: "GOOGLE_CLIENT_ID".to_string(),
            client_secret_env: "GOOGLE_CLIENT_SECRET".to_string(),
            refresh_token_env: "GOOGLE_REFRESH_TOKEN".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            api_base_url: "https://tasks.googleapis.com".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Outgoing email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Environment variable containing the sender address (also the SMTP login)
    #[serde(rename = "user-env")]
    pub user_env: String,

    /// Environment variable containing the SMTP (app) password
    #[serde(rename = "password-env")]
    pub password_env: String,

    /// SMTP relay host
    #[serde(rename = "smtp-host")]
    pub smtp_host: String,

    /// SMTP port (STARTTLS)
    #[serde(rename = "smtp-port")]
    pub smtp_port: u16,

    /// Recipient; defaults to the sender
    pub to: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            user_env: "EMAIL_USER".to_string(),
            password_env: "EMAIL_PASS".to_string(),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            to: None,
        }
    }
}

/// Digest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Number of ranked tasks in the digest
    #[serde(rename = "top-n")]
    pub top_n: usize,

    /// Weekdays on which no digest is sent
    #[serde(rename = "skip-days")]
    pub skip_days: Vec<Weekday>,

    /// Optional Handlebars template overriding the built-in body
    pub template: Option<PathBuf>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            skip_days: vec![Weekday::Sat],
            template: None,
        }
    }
}

impl DigestConfig {
    pub fn is_rest_day(&self, day: Weekday) -> bool {
        self.skip_days.contains(&day)
    }
}

/// Resolved OAuth credentials
#[derive(Clone)]
pub struct GoogleSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for GoogleSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSecrets")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// Resolved SMTP credentials
#[derive(Clone)]
pub struct EmailSecrets {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for EmailSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSecrets")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Every credential the run needs
#[derive(Debug, Clone)]
pub struct Secrets {
    pub google: GoogleSecrets,
    pub email: EmailSecrets,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::Duration;

    const VARS: [&str; 5] = [
        "GOOGLE_CLIENT_ID",
        "GOOGLE_CLIENT_SECRET",
        "GOOGLE_REFRESH_TOKEN",
        "EMAIL_USER",
        "EMAIL_PASS",
    ];

    fn set_all_vars() {
        // SAFETY: tests touching the environment are serialized
        unsafe {
            std::env::set_var("GOOGLE_CLIENT_ID", "client-id");
            std::env::set_var("GOOGLE_CLIENT_SECRET", "client-secret");
            std::env::set_var("GOOGLE_REFRESH_TOKEN", "refresh-token");
            std::env::set_var("EMAIL_USER", "me@example.com");
            std::env::set_var("EMAIL_PASS", "abcd efgh ijkl mnop");
        }
    }

    fn clear_all_vars() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.google.client_id_env, "GOOGLE_CLIENT_ID");
        assert_eq!(config.google.token_url, "https://oauth2.googleapis.com/token");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.digest.top_n, 3);
        assert_eq!(config.digest.skip_days, vec![Weekday::Sat]);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

google:
  client-id-env: MY_CLIENT_ID
  api-base-url: http://localhost:9000
  timeout-ms: 5000

retry:
  max-retries: 5
  base-delay-ms: 200

email:
  smtp-host: smtp.example.com
  smtp-port: 2525
  to: team@example.com

digest:
  top-n: 5
  skip-days: [Sat, Sun]
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.google.client_id_env, "MY_CLIENT_ID");
        assert_eq!(config.google.api_base_url, "http://localhost:9000");
        assert_eq!(config.google.timeout_ms, 5000);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.base_delay, Duration::from_millis(200));
        assert_eq!(config.email.smtp_host, "smtp.example.com");
        assert_eq!(config.email.smtp_port, 2525);
        assert_eq!(config.email.to.as_deref(), Some("team@example.com"));
        assert_eq!(config.digest.top_n, 5);
        assert!(config.digest.is_rest_day(Weekday::Sun));
        assert!(!config.digest.is_rest_day(Weekday::Mon));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
digest:
  top-n: 1
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.digest.top_n, 1);

        // Defaults for unspecified
        assert_eq!(config.digest.skip_days, vec![Weekday::Sat]);
        assert_eq!(config.google.refresh_token_env, "GOOGLE_REFRESH_TOKEN");
        assert_eq!(config.retry.base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dawn.yml");
        fs::write(&path, "log-level: warn\ndigest:\n  top-n: 2\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.digest.top_n, 2);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_zero_top_n_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dawn.yml");
        fs::write(&path, "digest:\n  top-n: 0\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("top-n"));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    #[serial]
    fn test_secrets_resolved_from_env() {
        set_all_vars();
        let secrets = Config::default().secrets().unwrap();
        clear_all_vars();

        assert_eq!(secrets.google.client_id, "client-id");
        assert_eq!(secrets.google.refresh_token, "refresh-token");
        assert_eq!(secrets.email.user, "me@example.com");
        assert!(!format!("{:?}", secrets).contains("refresh-token"));
    }

    #[test]
    #[serial]
    fn test_secrets_missing_var_is_error() {
        set_all_vars();
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::remove_var("GOOGLE_REFRESH_TOKEN") };
        let err = Config::default().secrets().unwrap_err();
        clear_all_vars();

        assert!(err.to_string().contains("GOOGLE_REFRESH_TOKEN"));
    }

    #[test]
    #[serial]
    fn test_secrets_empty_var_is_error() {
        set_all_vars();
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::set_var("EMAIL_PASS", "  ") };
        let err = Config::default().secrets().unwrap_err();
        clear_all_vars();

        assert!(err.to_string().contains("EMAIL_PASS"));
    }

    #[test]
    #[serial]
    fn test_google_secrets_ignore_email_vars() {
        set_all_vars();
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::remove_var("EMAIL_PASS") };
        let google = Config::default().google_secrets();
        let all = Config::default().secrets();
        clear_all_vars();

        assert_eq!(google.unwrap().client_secret, "client-secret");
        assert!(all.is_err());
    }

    #[test]
    #[serial]
    fn test_secrets_rejects_malformed_email() {
        set_all_vars();
        // SAFETY: tests touching the environment are serialized
        unsafe { std::env::set_var("EMAIL_USER", "not-an-address") };
        let err = Config::default().secrets().unwrap_err();
        clear_all_vars();

        assert!(err.to_string().contains("EMAIL_USER"));
    }
}
