//! Field validation rules.
//!
//! Every rule is a pure check that returns `Ok(())` or an [`Invalid`] naming
//! the field and a message the page can show as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::storage::UploadedFile;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[6-9]\d{9}$").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Media types accepted for presentation files.
pub const PRESENTATION_TYPES: [&str; 3] = [
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/pdf",
];

/// Media types accepted for payment receipts.
pub const RECEIPT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// A failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invalid {
    pub field: String,
    pub reason: String,
}

impl Invalid {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Invalid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

pub type Check = Result<(), Invalid>;

/// Whether members must provide a resume link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePolicy {
    Required,
    /// Blank is accepted and stored as [`crate::models::NO_RESUME`].
    Optional,
}

/// Size and type limits for an uploaded file.
#[derive(Debug, Clone)]
pub struct FileRule {
    pub max_bytes: u64,
    pub allowed_types: Vec<String>,
    /// Message used when the media type is not allowed.
    pub type_message: String,
}

impl FileRule {
    pub fn presentation(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            allowed_types: PRESENTATION_TYPES.iter().map(|t| t.to_string()).collect(),
            type_message: "Please upload a valid PPT, PPTX, or PDF file".to_string(),
        }
    }

    pub fn receipt(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            allowed_types: RECEIPT_TYPES.iter().map(|t| t.to_string()).collect(),
            type_message: "Payment receipt must be a JPEG, PNG, or WebP image".to_string(),
        }
    }
}

pub fn required(field: &str, label: &str, value: &str) -> Check {
    if value.trim().is_empty() {
        return Err(Invalid::new(field, format!("{} is required", label)));
    }
    Ok(())
}

/// Ten digits, first digit 6-9, after all whitespace is removed.
pub fn phone(field: &str, role: &str, value: &str) -> Check {
    if !PHONE_RE.is_match(&strip_whitespace(value)) {
        return Err(Invalid::new(
            field,
            format!("{} phone must be a valid 10-digit number", role),
        ));
    }
    Ok(())
}

/// Permissive shape check: one `@`, and a `.` somewhere after it.
pub fn email(field: &str, role: &str, value: &str) -> Check {
    if !EMAIL_RE.is_match(value) {
        return Err(Invalid::new(field, format!("{} email is invalid", role)));
    }
    Ok(())
}

/// Accepts anything that parses as an absolute URL.
pub fn url(field: &str, message: &str, value: &str) -> Check {
    if url::Url::parse(value.trim()).is_err() {
        return Err(Invalid::new(field, message));
    }
    Ok(())
}

pub fn resume_link(field: &str, role: &str, value: &str, policy: ResumePolicy) -> Check {
    if value.trim().is_empty() {
        return match policy {
            ResumePolicy::Required => Err(Invalid::new(
                field,
                format!("{} resume link is required", role),
            )),
            ResumePolicy::Optional => Ok(()),
        };
    }
    url(
        field,
        &format!("{} resume link must be a valid URL", role),
        value,
    )
}

pub fn file_constraint(field: &str, file: &UploadedFile, rule: &FileRule) -> Check {
    if !rule
        .allowed_types
        .iter()
        .any(|allowed| allowed == &file.content_type)
    {
        return Err(Invalid::new(field, rule.type_message.clone()));
    }
    if file.len() > rule.max_bytes {
        return Err(Invalid::new(
            field,
            format!(
                "File size must be less than {}MB",
                rule.max_bytes / (1024 * 1024)
            ),
        ));
    }
    Ok(())
}

pub fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}
