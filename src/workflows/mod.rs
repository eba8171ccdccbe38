//! Registration, team editing and presentation submission.
//!
//! Each workflow awaits its store and storage calls one after another and
//! turns any failure into a single [`crate::errors::AppError`].

mod registration;
mod submission;

pub use registration::*;
pub use submission::*;

use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch, used to name uploaded objects.
fn upload_stamp(now: DateTime<Utc>) -> i64 {
    now.timestamp_millis()
}
