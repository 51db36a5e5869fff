//! Review queue ordering.
//!
//! Overdue items come first, weighted by how late they are. Within the same
//! lateness, items the learner struggles with and items still being learned
//! are pulled forward.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::DEFAULT_EASE_FACTOR;

const POINTS_PER_OVERDUE_DAY: i64 = 100;
const EASE_BONUS_SPAN: f64 = 1.2;
const EASE_BONUS_SCALE: f64 = 20.0;
const LEARNING_REPETITIONS: u32 = 3;
const POINTS_PER_MISSING_REPETITION: i64 = 10;

/// Score and lateness of one due item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Priority {
    pub score: i64,
    pub overdue_days: i64,
}

/// Compute the priority of a review item. Higher is more urgent.
pub fn priority(
    next_review_at: DateTime<Utc>,
    ease_factor: f64,
    repetitions: u32,
    now: DateTime<Utc>,
) -> Priority {
    let late = now - next_review_at;
    let (overdue_days, overdue_hours) = if late > Duration::zero() {
        let days = late.num_days();
        let hours = (late - Duration::days(days)).num_hours();
        (days, hours)
    } else {
        (0, 0)
    };

    let ease_bonus =
        (((DEFAULT_EASE_FACTOR - ease_factor) / EASE_BONUS_SPAN) * EASE_BONUS_SCALE).round() as i64;
    let rep_bonus = if repetitions < LEARNING_REPETITIONS {
        i64::from(LEARNING_REPETITIONS - repetitions) * POINTS_PER_MISSING_REPETITION
    } else {
        0
    };

    Priority {
        score: overdue_days * POINTS_PER_OVERDUE_DAY + overdue_hours + ease_bonus.max(0) + rep_bonus,
        overdue_days,
    }
}

/// An item with existing review state.
#[derive(Debug, Clone)]
pub struct DueItem<T> {
    pub item: T,
    pub next_review_at: DateTime<Utc>,
    pub ease_factor: f64,
    pub repetitions: u32,
}

/// An item the learner has never reviewed.
#[derive(Debug, Clone)]
pub struct NewItem<T> {
    pub item: T,
    pub difficulty: i32,
    pub sort_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry<T> {
    pub item: T,
    pub priority: i64,
    pub overdue_days: i64,
    pub is_new: bool,
}

/// Build the review queue: due items by descending priority, then new items
/// by ascending difficulty while room remains.
///
/// Items in `due` whose review date is still in the future are skipped.
pub fn build_queue<T>(
    due: Vec<DueItem<T>>,
    fresh: Vec<NewItem<T>>,
    limit: usize,
    include_new: bool,
    now: DateTime<Utc>,
) -> Vec<QueueEntry<T>> {
    let mut queue: Vec<QueueEntry<T>> = due
        .into_iter()
        .filter(|d| d.next_review_at <= now)
        .map(|d| {
            let p = priority(d.next_review_at, d.ease_factor, d.repetitions, now);
            QueueEntry {
                item: d.item,
                priority: p.score,
                overdue_days: p.overdue_days,
                is_new: false,
            }
        })
        .collect();

    // sort_by is stable, so ties keep their input order
    queue.sort_by(|a, b| b.priority.cmp(&a.priority));
    queue.truncate(limit);

    if include_new && queue.len() < limit {
        let mut fresh = fresh;
        fresh.sort_by(|a, b| {
            a.difficulty
                .cmp(&b.difficulty)
                .then_with(|| a.sort_key.cmp(&b.sort_key))
        });

        let room = limit - queue.len();
        queue.extend(fresh.into_iter().take(room).map(|n| QueueEntry {
            item: n.item,
            priority: 0,
            overdue_days: 0,
            is_new: true,
        }));
    }

    queue
}
