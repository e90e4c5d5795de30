//! The reconciliation engine.
//!
//! One run fetches candidates for each configured rule set, decides every
//! item's fate through the pure policy layer, and executes the resulting
//! actions through the forge. Mutations for a batch run concurrently but
//! are all joined before this module returns, so the process never exits
//! with work still in flight. One item failing is logged and counted
//! without affecting its siblings.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::{
    policy::{self, Decision},
    rules::{LabelRule, RuleSet},
    types::{Forge, ItemKind, Repo, TrackedItem},
};

/// Counts of the work performed in one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub closed: usize,
    pub reactivated: usize,
    pub kept_open: usize,
    /// Items that needed no mutation despite matching the candidate
    /// query (e.g. the pending label vanished between fetch and
    /// processing).
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    fn absorb(&mut self, other: Summary) {
        self.closed += other.closed;
        self.reactivated += other.reactivated;
        self.kept_open += other.kept_open;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

enum PlannedAction<'a> {
    Close {
        item: &'a TrackedItem,
        rule: &'static LabelRule,
        close_label_id: &'a str,
        remove_label_ids: Vec<String>,
    },
    Reactivate {
        item: &'a TrackedItem,
        label_ids: Vec<String>,
    },
}

enum Applied {
    Closed,
    Reactivated,
}

/// Reconciles every configured rule set against the repository.
///
/// Close-label IDs are resolved once up front; the rule sets then run
/// sequentially (issues, then pull requests), each with its own
/// concurrent mutation batch.
pub async fn run<F>(forge: &F, repo: &Repo, rule_sets: &[RuleSet], dry_run: bool) -> Result<Summary>
where
    F: Forge + Sync,
{
    let close_labels = forge
        .close_labels(repo)
        .await
        .context("Failed to resolve 'closed:' label IDs")?;

    let mut summary = Summary::default();
    for rules in rule_sets {
        summary.absorb(reconcile(forge, repo, rules, &close_labels, dry_run).await?);
    }
    Ok(summary)
}

/// Reconciles one rule set (one item kind) against the repository.
pub async fn reconcile<F>(
    forge: &F,
    repo: &Repo,
    rules: &RuleSet,
    close_labels: &HashMap<String, String>,
    dry_run: bool,
) -> Result<Summary>
where
    F: Forge + Sync,
{
    let pending_labels = rules.pending_label_names();
    let items = forge.fetch_candidates(repo, rules.kind, &pending_labels).await?;
    info!(kind = %rules.kind, candidates = items.len(), "fetched candidates");

    let now = Utc::now();
    let mut summary = Summary::default();
    let mut plans = Vec::new();

    for item in &items {
        match policy::evaluate(item, rules, now) {
            Decision::KeepOpen => summary.kept_open += 1,
            Decision::NoPendingLabel => {
                warn!(
                    kind = %rules.kind,
                    number = item.number,
                    "candidate no longer carries a pending label, skipping"
                );
                summary.skipped += 1;
            }
            Decision::Reactivate => {
                let label_ids = policy::pending_label_ids(item, rules);
                if label_ids.is_empty() {
                    warn!(
                        kind = %rules.kind,
                        number = item.number,
                        "reactivated but no pending labels left to remove"
                    );
                    summary.skipped += 1;
                } else if dry_run {
                    info!(
                        kind = %rules.kind,
                        number = item.number,
                        "dry-run: would remove pending labels (activity after labeling)"
                    );
                    summary.reactivated += 1;
                } else {
                    plans.push(PlannedAction::Reactivate { item, label_ids });
                }
            }
            Decision::Close { rule } => match close_labels.get(rule.close_label) {
                Some(close_label_id) => {
                    if dry_run {
                        info!(
                            kind = %rules.kind,
                            number = item.number,
                            updated_at = %item.updated_at,
                            label = rule.pending_label,
                            "dry-run: would close"
                        );
                        summary.closed += 1;
                    } else {
                        plans.push(PlannedAction::Close {
                            item,
                            rule,
                            close_label_id: close_label_id.as_str(),
                            remove_label_ids: policy::close_removal_label_ids(item, rules),
                        });
                    }
                }
                None => {
                    error!(
                        kind = %rules.kind,
                        number = item.number,
                        label = rule.close_label,
                        "close label does not exist in the repository"
                    );
                    summary.failed += 1;
                }
            },
        }
    }

    let results = join_all(
        plans
            .iter()
            .map(|plan| apply_plan(forge, rules.kind, plan)),
    )
    .await;

    for result in results {
        match result {
            Ok(Applied::Closed) => summary.closed += 1,
            Ok(Applied::Reactivated) => summary.reactivated += 1,
            Err(err) => {
                error!(kind = %rules.kind, "item processing failed: {err:#}");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

async fn apply_plan<F>(forge: &F, kind: ItemKind, plan: &PlannedAction<'_>) -> Result<Applied>
where
    F: Forge + Sync,
{
    match plan {
        PlannedAction::Close {
            item,
            rule,
            close_label_id,
            remove_label_ids,
        } => {
            forge
                .close_item(kind, &item.id, rule.message, close_label_id, remove_label_ids)
                .await
                .with_context(|| format!("Failed to close {} #{}", kind, item.number))?;
            info!(
                kind = %kind,
                number = item.number,
                updated_at = %item.updated_at,
                label = rule.pending_label,
                "closed: last updated past the cutoff"
            );
            Ok(Applied::Closed)
        }
        PlannedAction::Reactivate { item, label_ids } => {
            forge
                .remove_labels(&item.id, label_ids)
                .await
                .with_context(|| {
                    format!("Failed to remove pending labels from {} #{}", kind, item.number)
                })?;
            info!(
                kind = %kind,
                number = item.number,
                "removed pending labels: activity after labeling"
            );
            Ok(Applied::Reactivated)
        }
    }
}
