//! Data models for the hackathon registration backend.
//!
//! Records mirror the `teams`, `team_members` and `ppt_submissions` tables and
//! serialize in camelCase for the registration site.

mod member;
mod submission;
mod team;

pub use member::*;
pub use submission::*;
pub use team::*;
