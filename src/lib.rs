//! Stalemate: auto-closes issues and pull requests stuck on unanswered
//! "pending:*" labels.
//!
//! Scans a repository for open items labeled pending:reproducer,
//! pending:feedback, or pending:dco, strips the labels when later
//! activity shows the request was answered, and closes the rest with an
//! explanatory comment and a "closed:*" label once a per-kind grace
//! period (7 days for issues, 14 for pull requests) expires. Intended to
//! run on a schedule; each run is a single reconciliation pass and is
//! safe to repeat.

pub mod github;
pub mod graphql;
pub mod policy;
pub mod reconcile;
pub mod rules;
pub mod types;

pub use github::GitHub;
pub use policy::{Decision, evaluate};
pub use reconcile::{Summary, reconcile, run};
pub use rules::{AUXILIARY_REMOVE_LABELS, LabelRule, RuleSet};
pub use types::{Forge, ItemKind, Label, Repo, TimelineEvent, TrackedItem};
