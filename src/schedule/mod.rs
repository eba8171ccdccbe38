//! Event schedule and countdown.
//!
//! Milestones sit on a 0..=100 timeline: the start at 0, the final
//! submission at 100, and reviews evenly spaced in between. The countdown
//! targets the first milestone that is still in the future.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const START: &str = "Start";
const FINAL_SUBMISSION: &str = "Final Submission";
/// Under this many hours to the target the countdown is flagged urgent.
const URGENT_HOURS: i64 = 3;

/// An intermediate checkpoint between start and final submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub name: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub start: DateTime<Utc>,
    pub reviews: Vec<Review>,
    pub final_submission: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneView {
    pub name: String,
    pub time: DateTime<Utc>,
    pub position: f64,
    pub is_passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownStatus {
    /// Name of the milestone being counted down to.
    pub milestone: String,
    pub remaining: Remaining,
    pub is_expired: bool,
    pub is_urgent: bool,
    /// Position on the timeline, `0..=100`.
    pub progress: f64,
    pub milestones: Vec<MilestoneView>,
}

struct Milestone<'a> {
    name: &'a str,
    time: DateTime<Utc>,
    position: f64,
}

impl Schedule {
    fn milestones(&self) -> Vec<Milestone<'_>> {
        let slots = (self.reviews.len() + 1) as f64;
        let mut milestones = Vec::with_capacity(self.reviews.len() + 2);
        milestones.push(Milestone {
            name: START,
            time: self.start,
            position: 0.0,
        });
        for (i, review) in self.reviews.iter().enumerate() {
            milestones.push(Milestone {
                name: &review.name,
                time: review.time,
                position: (i + 1) as f64 / slots * 100.0,
            });
        }
        milestones.push(Milestone {
            name: FINAL_SUBMISSION,
            time: self.final_submission,
            position: 100.0,
        });
        milestones
    }

    pub fn status(&self, now: DateTime<Utc>) -> CountdownStatus {
        let milestones = self.milestones();
        let last = milestones.len() - 1;
        let target = milestones
            .iter()
            .position(|m| m.time > now)
            .unwrap_or(last);

        let progress = if target == 0 {
            0.0
        } else {
            let prev = &milestones[target - 1];
            let next = &milestones[target];
            let span = (next.time - prev.time).num_milliseconds() as f64;
            let elapsed = (now - prev.time).num_milliseconds() as f64;
            let fraction = if span > 0.0 {
                (elapsed / span).clamp(0.0, 1.0)
            } else {
                1.0
            };
            prev.position + fraction * (next.position - prev.position)
        }
        .clamp(0.0, 100.0);

        let target_time = milestones[target].time;
        let left = (target_time - now).num_seconds();
        let (remaining, is_expired) = if target_time > now {
            let remaining = Remaining {
                days: left / 86_400,
                hours: (left / 3_600) % 24,
                minutes: (left / 60) % 60,
                seconds: left % 60,
            };
            (remaining, false)
        } else {
            (Remaining::default(), true)
        };
        let is_urgent = !is_expired && remaining.days == 0 && remaining.hours < URGENT_HOURS;

        let views = milestones
            .iter()
            .enumerate()
            .map(|(i, m)| MilestoneView {
                name: m.name.to_string(),
                time: m.time,
                position: m.position,
                is_passed: i != last && now > m.time,
            })
            .collect();

        CountdownStatus {
            milestone: milestones[target].name.to_string(),
            remaining,
            is_expired,
            is_urgent,
            progress,
            milestones: views,
        }
    }
}
