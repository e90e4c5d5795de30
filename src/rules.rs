use chrono::Duration;

use crate::types::{ItemKind, TrackedItem};

/// Labels stripped on every auto-close in addition to the recognized
/// pending labels, whichever rule triggered.
pub const AUXILIARY_REMOVE_LABELS: [&str; 2] = ["to-triage", ":wave: team-triage"];

/// Maps one pending label to the close label and comment used when the
/// item is auto-closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelRule {
    pub pending_label: &'static str,
    pub close_label: &'static str,
    pub message: &'static str,
}

/// Immutable per-kind configuration: the ordered rule table and the
/// staleness cutoff. Built once at startup and passed into the
/// reconciler; rule order is the tie-break when an item carries more
/// than one pending label.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub kind: ItemKind,
    pub rules: &'static [LabelRule],
    pub cutoff: Duration,
}

static ISSUE_RULES: [LabelRule; 2] = [
    LabelRule {
        pending_label: "pending:reproducer",
        close_label: "closed:unreproducible",
        message: "While we asked for a reproducer, none was provided. If you provide a valid reproducer, we will consider this issue again.\nIn the meantime, closing as unreproducible.",
    },
    LabelRule {
        pending_label: "pending:feedback",
        close_label: "closed:missing-feedback",
        message: "While we asked for feedback, none was provided. If you provide the requested feedback, we will consider this issue again.\nIn the meantime, closing as missing feedback.",
    },
];

static PULL_RULES: [LabelRule; 2] = [
    LabelRule {
        pending_label: "pending:dco",
        close_label: "closed:missing-dco",
        message: "While we asked to sign your commits, it has not been done. If you sign your commits, we will consider this pull request again.\nIn the meantime, closing as missing DCO (see the [Developer Certificate of Origin](https://probot.github.io/apps/dco/) GitHub app).",
    },
    LabelRule {
        pending_label: "pending:feedback",
        close_label: "closed:missing-feedback",
        message: "While we asked for changes to this PR, we received no reaction. If you provide the requested changes, we will consider this pull request again.\nIn the meantime, closing as missing PR feedback.",
    },
];

impl RuleSet {
    /// Issues close after 7 days without activity.
    pub fn for_issues() -> Self {
        Self {
            kind: ItemKind::Issue,
            rules: &ISSUE_RULES,
            cutoff: Duration::days(7),
        }
    }

    /// Pull requests get a longer grace period: 14 days.
    pub fn for_pulls() -> Self {
        Self {
            kind: ItemKind::PullRequest,
            rules: &PULL_RULES,
            cutoff: Duration::days(14),
        }
    }

    /// Pending label names in declaration order; doubles as the
    /// server-side label filter of the candidate query.
    pub fn pending_label_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.pending_label).collect()
    }

    pub fn is_pending_label(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.pending_label == name)
    }

    /// First rule whose pending label is present on the item.
    pub fn matching_rule(&self, item: &TrackedItem) -> Option<&'static LabelRule> {
        self.rules
            .iter()
            .find(|rule| item.has_label(rule.pending_label))
    }
}
