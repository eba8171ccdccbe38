//! Configuration module for the hackathon backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::schedule::{Review, Schedule};
use crate::validation::ResumePolicy;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory holding one subdirectory per storage bucket
    pub storage_dir: PathBuf,
    /// Base of the public file URLs, without trailing slash
    pub public_base_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    pub resume_policy: ResumePolicy,
    /// Adds the payment step and receipt upload to registration
    pub payment_enabled: bool,
    pub receipts_bucket: String,
    pub submissions_bucket: String,
    pub max_presentation_bytes: u64,
    pub max_receipt_bytes: u64,
    /// Countdown schedule; absent unless both start and final times are set
    pub schedule: Option<Schedule>,
    /// Fallbacks taken while loading, logged once logging is up
    pub warnings: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Values that fail to parse
    /// fall back to their defaults and are listed in `warnings`.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut warnings = Vec::new();
        let text = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let bind_addr = text("HACK_BIND_ADDR", "127.0.0.1:8080")
            .parse()
            .expect("Invalid HACK_BIND_ADDR format");

        let log_format = match var("HACK_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                warnings.push(format!("Unknown HACK_LOG_FORMAT '{}', using pretty", other));
                LogFormat::Pretty
            }
        };

        let resume_policy = if flag(&var, &mut warnings, "HACK_RESUME_REQUIRED", true) {
            ResumePolicy::Required
        } else {
            ResumePolicy::Optional
        };
        let payment_enabled = flag(&var, &mut warnings, "HACK_PAYMENT_ENABLED", false);
        let max_presentation_bytes =
            megabytes(&var, &mut warnings, "HACK_MAX_PRESENTATION_MB", 15);
        let max_receipt_bytes = megabytes(&var, &mut warnings, "HACK_MAX_RECEIPT_MB", 5);
        let schedule = schedule(&var, &mut warnings);

        Self {
            db_path: text("HACK_DB_PATH", "./data/hackathon.sqlite").into(),
            storage_dir: text("HACK_STORAGE_DIR", "./data/storage").into(),
            public_base_url: text("HACK_PUBLIC_BASE_URL", "http://127.0.0.1:8080")
                .trim_end_matches('/')
                .to_string(),
            bind_addr,
            log_level: text("HACK_LOG_LEVEL", "info"),
            log_format,
            resume_policy,
            payment_enabled,
            receipts_bucket: text("HACK_RECEIPTS_BUCKET", "receipts"),
            submissions_bucket: text("HACK_SUBMISSIONS_BUCKET", "PPTs"),
            max_presentation_bytes,
            max_receipt_bytes,
            schedule,
            warnings,
        }
    }

    /// Largest upload any endpoint accepts.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_presentation_bytes.max(self.max_receipt_bytes)
    }
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn flag(var: Lookup<'_>, warnings: &mut Vec<String>, key: &str, default: bool) -> bool {
    match var(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => default,
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        Some(v) => {
            warnings.push(format!("Invalid {} value '{}', using {}", key, v, default));
            default
        }
    }
}

fn megabytes(var: Lookup<'_>, warnings: &mut Vec<String>, key: &str, default: u64) -> u64 {
    let Some(raw) = var(key) else {
        return default * MB;
    };
    match raw.trim().parse::<u64>().ok().filter(|mb| *mb > 0) {
        Some(mb) => match mb.checked_mul(MB) {
            Some(bytes) => bytes,
            None => {
                warnings.push(format!(
                    "{} value '{}' is too large, using {}MB",
                    key, raw, default
                ));
                default * MB
            }
        },
        None => {
            warnings.push(format!("Invalid {} value '{}', using {}MB", key, raw, default));
            default * MB
        }
    }
}

fn timestamp(var: Lookup<'_>, warnings: &mut Vec<String>, key: &str) -> Option<DateTime<Utc>> {
    let raw = var(key)?;
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(time) => Some(time.with_timezone(&Utc)),
        Err(e) => {
            warnings.push(format!("Invalid {} value '{}': {}", key, raw, e));
            None
        }
    }
}

fn schedule(var: Lookup<'_>, warnings: &mut Vec<String>) -> Option<Schedule> {
    let start = timestamp(var, warnings, "HACK_START_TIME");
    let final_submission = timestamp(var, warnings, "HACK_FINAL_SUBMISSION_TIME");

    let reviews = match var("HACK_REVIEWS") {
        None => Vec::new(),
        Some(raw) => serde_json::from_str::<Vec<Review>>(&raw).unwrap_or_else(|e| {
            warnings.push(format!("Invalid HACK_REVIEWS, ignoring reviews: {}", e));
            Vec::new()
        }),
    };

    Some(Schedule {
        start: start?,
        reviews,
        final_submission: final_submission?,
    })
}
