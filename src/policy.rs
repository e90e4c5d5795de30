//! Pure per-item decisions: no I/O, trivially testable.
//!
//! The reconciler evaluates every candidate through [`evaluate`] and then
//! executes the resulting [`Decision`] through the forge. Keeping the
//! decision step free of API calls mirrors the split between finding
//! work and performing it.

use chrono::{DateTime, Utc};

use crate::{
    rules::{AUXILIARY_REMOVE_LABELS, LabelRule, RuleSet},
    types::{TimelineEvent, TrackedItem},
};

/// What the reconciler should do with one candidate item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Activity arrived after the pending labeling; strip the pending
    /// labels and leave the item open.
    Reactivate,
    /// Stale past the cutoff with no later activity; close under this rule.
    Close { rule: &'static LabelRule },
    /// Still within the grace period; leave untouched.
    KeepOpen,
    /// Carries none of the rule set's pending labels (the label was
    /// removed between fetch and processing); nothing to do.
    NoPendingLabel,
}

/// Whether any tracked activity occurred after the most recent
/// `pending:*` labeling.
///
/// Scans newest to oldest. Labeling events are skipped unless they apply
/// a `pending:*` label, which ends the scan: the pending labeling is the
/// most recent relevant event, so nothing superseded it. Any non-label
/// event seen first means the item was touched after being labeled.
/// An empty or labels-only timeline defers to the cutoff check.
pub fn updated_after_labeling(timeline: &[TimelineEvent]) -> bool {
    for event in timeline.iter().rev() {
        match event {
            TimelineEvent::Labeled { label } => {
                if label.starts_with("pending:") {
                    return false;
                }
            }
            TimelineEvent::Activity { .. } => return true,
        }
    }
    false
}

/// Strictly before the cutoff instant counts as stale; an item updated
/// exactly at `now - cutoff` is kept.
pub fn is_stale(updated_at: DateTime<Utc>, now: DateTime<Utc>, cutoff: chrono::Duration) -> bool {
    updated_at < now - cutoff
}

/// Decides what to do with one candidate item.
pub fn evaluate(item: &TrackedItem, rules: &RuleSet, now: DateTime<Utc>) -> Decision {
    if updated_after_labeling(&item.timeline) {
        return Decision::Reactivate;
    }
    if !is_stale(item.updated_at, now, rules.cutoff) {
        return Decision::KeepOpen;
    }
    match rules.matching_rule(item) {
        Some(rule) => Decision::Close { rule },
        None => Decision::NoPendingLabel,
    }
}

/// IDs of the item's labels that are recognized pending labels; the
/// removal set on reactivation.
pub fn pending_label_ids(item: &TrackedItem, rules: &RuleSet) -> Vec<String> {
    item.labels
        .iter()
        .filter(|label| rules.is_pending_label(&label.name))
        .map(|label| label.id.clone())
        .collect()
}

/// IDs removed on close: recognized pending labels plus the fixed
/// auxiliary triage labels, whichever are present.
pub fn close_removal_label_ids(item: &TrackedItem, rules: &RuleSet) -> Vec<String> {
    item.labels
        .iter()
        .filter(|label| {
            rules.is_pending_label(&label.name)
                || AUXILIARY_REMOVE_LABELS.contains(&label.name.as_str())
        })
        .map(|label| label.id.clone())
        .collect()
}
