use std::{collections::HashMap, sync::Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use stalemate::{Forge, ItemKind, Label, Repo, RuleSet, TimelineEvent, TrackedItem, run};

/// Mock forge that serves canned candidates and records every mutation.
struct MockForge {
    issues: Vec<TrackedItem>,
    pulls: Vec<TrackedItem>,
    close_labels: HashMap<String, String>,
    calls: Mutex<Vec<Call>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Close {
        kind: ItemKind,
        item_id: String,
        body: String,
        close_label_id: String,
        remove_label_ids: Vec<String>,
    },
    RemoveLabels {
        item_id: String,
        label_ids: Vec<String>,
    },
}

impl MockForge {
    fn new(issues: Vec<TrackedItem>, pulls: Vec<TrackedItem>) -> Self {
        let close_labels = HashMap::from([
            ("closed:unreproducible".to_string(), "CL_unrepro".to_string()),
            ("closed:missing-feedback".to_string(), "CL_feedback".to_string()),
            ("closed:missing-dco".to_string(), "CL_dco".to_string()),
        ]);
        Self {
            issues,
            pulls,
            close_labels,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn without_close_labels(mut self) -> Self {
        self.close_labels.clear();
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forge for MockForge {
    async fn fetch_candidates(
        &self,
        _repo: &Repo,
        kind: ItemKind,
        _pending_labels: &[&str],
    ) -> Result<Vec<TrackedItem>> {
        Ok(match kind {
            ItemKind::Issue => self.issues.clone(),
            ItemKind::PullRequest => self.pulls.clone(),
        })
    }

    async fn close_labels(&self, _repo: &Repo) -> Result<HashMap<String, String>> {
        Ok(self.close_labels.clone())
    }

    async fn close_item(
        &self,
        kind: ItemKind,
        item_id: &str,
        body: &str,
        close_label_id: &str,
        remove_label_ids: &[String],
    ) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Close {
            kind,
            item_id: item_id.to_string(),
            body: body.to_string(),
            close_label_id: close_label_id.to_string(),
            remove_label_ids: remove_label_ids.to_vec(),
        });
        Ok(())
    }

    async fn remove_labels(&self, item_id: &str, label_ids: &[String]) -> Result<()> {
        self.calls.lock().unwrap().push(Call::RemoveLabels {
            item_id: item_id.to_string(),
            label_ids: label_ids.to_vec(),
        });
        Ok(())
    }
}

fn test_repo() -> Repo {
    Repo::new("owner", "repo")
}

/// Builds a tracked item whose last update was `age_days` ago.
fn item(
    id: &str,
    number: u64,
    age_days: i64,
    labels: &[(&str, &str)],
    timeline: Vec<TimelineEvent>,
) -> TrackedItem {
    TrackedItem {
        id: id.to_string(),
        number,
        updated_at: Utc::now() - Duration::days(age_days),
        labels: labels
            .iter()
            .map(|(id, name)| Label::new(*id, *name))
            .collect(),
        timeline,
    }
}

#[tokio::test]
async fn stale_issue_closes_with_comment_close_label_and_removals() {
    let forge = MockForge::new(
        vec![item(
            "I_1",
            101,
            8,
            &[
                ("LA_pending", "pending:reproducer"),
                ("LA_triage", "to-triage"),
                ("LA_bug", "bug"),
            ],
            vec![
                TimelineEvent::activity("IssueComment"),
                TimelineEvent::labeled("pending:reproducer"),
            ],
        )],
        vec![],
    );

    let summary = run(&forge, &test_repo(), &[RuleSet::for_issues()], false)
        .await
        .unwrap();

    assert_eq!(summary.closed, 1);
    assert_eq!(summary.failed, 0);

    let calls = forge.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Call::Close {
            kind,
            item_id,
            body,
            close_label_id,
            remove_label_ids,
        } => {
            assert_eq!(*kind, ItemKind::Issue);
            assert_eq!(item_id, "I_1");
            assert_eq!(body, RuleSet::for_issues().rules[0].message);
            assert!(body.contains("closing as unreproducible"));
            assert_eq!(close_label_id, "CL_unrepro");
            // Pending label plus the auxiliary triage label; "bug" stays.
            assert_eq!(remove_label_ids, &["LA_pending", "LA_triage"]);
        }
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn reactivated_item_only_loses_its_pending_labels() {
    let forge = MockForge::new(
        vec![item(
            "I_2",
            102,
            30,
            &[
                ("LA_pending", "pending:feedback"),
                ("LA_triage", "to-triage"),
            ],
            vec![
                TimelineEvent::labeled("pending:feedback"),
                TimelineEvent::activity("IssueComment"),
            ],
        )],
        vec![],
    );

    let summary = run(&forge, &test_repo(), &[RuleSet::for_issues()], false)
        .await
        .unwrap();

    assert_eq!(summary.reactivated, 1);
    assert_eq!(summary.closed, 0);

    let calls = forge.calls();
    assert_eq!(
        calls,
        vec![Call::RemoveLabels {
            item_id: "I_2".to_string(),
            // Only the pending label; reactivation leaves triage labels alone.
            label_ids: vec!["LA_pending".to_string()],
        }]
    );
}

#[tokio::test]
async fn item_inside_grace_period_is_untouched() {
    let forge = MockForge::new(
        vec![item(
            "I_3",
            103,
            2,
            &[("LA_pending", "pending:feedback")],
            vec![],
        )],
        vec![],
    );

    let summary = run(&forge, &test_repo(), &[RuleSet::for_issues()], false)
        .await
        .unwrap();

    assert_eq!(summary.kept_open, 1);
    assert!(forge.calls().is_empty());
}

#[tokio::test]
async fn pull_requests_get_the_longer_cutoff() {
    let forge = MockForge::new(
        vec![],
        vec![
            // 10 days would close an issue but not a pull request.
            item("PR_1", 201, 10, &[("LA_dco", "pending:dco")], vec![]),
            item("PR_2", 202, 15, &[("LA_dco2", "pending:dco")], vec![]),
        ],
    );

    let summary = run(&forge, &test_repo(), &[RuleSet::for_pulls()], false)
        .await
        .unwrap();

    assert_eq!(summary.kept_open, 1);
    assert_eq!(summary.closed, 1);

    let calls = forge.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Call::Close {
            kind,
            item_id,
            body,
            close_label_id,
            ..
        } => {
            assert_eq!(*kind, ItemKind::PullRequest);
            assert_eq!(item_id, "PR_2");
            assert!(body.contains("missing DCO"));
            assert_eq!(close_label_id, "CL_dco");
        }
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn first_rule_in_declaration_order_wins() {
    let forge = MockForge::new(
        vec![],
        vec![item(
            "PR_3",
            203,
            20,
            &[
                ("LA_feedback", "pending:feedback"),
                ("LA_dco", "pending:dco"),
            ],
            vec![],
        )],
    );

    let summary = run(&forge, &test_repo(), &[RuleSet::for_pulls()], false)
        .await
        .unwrap();

    assert_eq!(summary.closed, 1);
    match &forge.calls()[0] {
        Call::Close {
            body,
            close_label_id,
            remove_label_ids,
            ..
        } => {
            // pending:dco is declared first, so its rule supplies the
            // comment and close label even though pending:feedback was
            // listed first on the item.
            assert_eq!(body, &RuleSet::for_pulls().rules[0].message);
            assert_eq!(close_label_id, "CL_dco");
            // Both pending labels are still removed.
            assert_eq!(remove_label_ids, &["LA_feedback", "LA_dco"]);
        }
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn stale_candidate_without_pending_label_is_skipped() {
    let forge = MockForge::new(
        vec![item("I_4", 104, 30, &[("LA_bug", "bug")], vec![])],
        vec![],
    );

    let summary = run(&forge, &test_repo(), &[RuleSet::for_issues()], false)
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert!(forge.calls().is_empty());
}

#[tokio::test]
async fn missing_close_label_fails_the_item_not_the_run() {
    let forge = MockForge::new(
        vec![
            item(
                "I_5",
                105,
                30,
                &[("LA_pending", "pending:feedback")],
                vec![],
            ),
            item("I_6", 106, 2, &[("LA_pending2", "pending:feedback")], vec![]),
        ],
        vec![],
    )
    .without_close_labels();

    let summary = run(&forge, &test_repo(), &[RuleSet::for_issues()], false)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.kept_open, 1);
    assert!(forge.calls().is_empty());
}

#[tokio::test]
async fn dry_run_decides_but_mutates_nothing() {
    let forge = MockForge::new(
        vec![
            item(
                "I_7",
                107,
                30,
                &[("LA_pending", "pending:reproducer")],
                vec![],
            ),
            item(
                "I_8",
                108,
                30,
                &[("LA_pending2", "pending:feedback")],
                vec![
                    TimelineEvent::labeled("pending:feedback"),
                    TimelineEvent::activity("IssueComment"),
                ],
            ),
        ],
        vec![],
    );

    let summary = run(&forge, &test_repo(), &[RuleSet::for_issues()], true)
        .await
        .unwrap();

    assert_eq!(summary.closed, 1);
    assert_eq!(summary.reactivated, 1);
    assert!(forge.calls().is_empty());
}

#[tokio::test]
async fn one_run_covers_issues_then_pull_requests() {
    let forge = MockForge::new(
        vec![item(
            "I_9",
            109,
            8,
            &[("LA_pending", "pending:feedback")],
            vec![],
        )],
        vec![item("PR_4", 204, 15, &[("LA_dco", "pending:dco")], vec![])],
    );

    let rule_sets = [RuleSet::for_issues(), RuleSet::for_pulls()];
    let summary = run(&forge, &test_repo(), &rule_sets, false).await.unwrap();

    assert_eq!(summary.closed, 2);

    let kinds: Vec<ItemKind> = forge
        .calls()
        .iter()
        .map(|call| match call {
            Call::Close { kind, .. } => *kind,
            other => panic!("expected close, got {other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec![ItemKind::Issue, ItemKind::PullRequest]);
}
