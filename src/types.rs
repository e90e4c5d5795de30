use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// GitHub repository coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub owner: String,
    pub name: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses `owner/name` into repository coordinates.
    pub fn parse(repo: &str) -> Result<Self> {
        let parts: Vec<&str> = repo.split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(*owner, *name))
            }
            _ => anyhow::bail!("Repository must be in format 'owner/repo', got: '{}'", repo),
        }
    }
}

impl std::fmt::Display for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The two kinds of tracked items. Drives the query shape, the close
/// mutation, and which rule table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Issue => "issue",
            ItemKind::PullRequest => "pull request",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository label. Mutations take the opaque node ID, rules are
/// written against the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: String,
    pub name: String,
}

impl Label {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One timeline entry. Only labeling events carry data; every other
/// tracked event type matters solely as a sign of activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    /// A label was applied to the item.
    Labeled { label: String },
    /// Any other tracked event (comment, close, rename, review, commit).
    Activity { kind: String },
}

impl TimelineEvent {
    pub fn labeled(label: impl Into<String>) -> Self {
        TimelineEvent::Labeled {
            label: label.into(),
        }
    }

    pub fn activity(kind: impl Into<String>) -> Self {
        TimelineEvent::Activity { kind: kind.into() }
    }
}

/// An open issue or pull request carrying at least one pending label,
/// as returned by the candidate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedItem {
    /// GraphQL node ID, used as the subject of every mutation.
    pub id: String,
    pub number: u64,
    pub updated_at: DateTime<Utc>,
    pub labels: Vec<Label>,
    /// Recent timeline events, ordered oldest to newest.
    pub timeline: Vec<TimelineEvent>,
}

impl TrackedItem {
    pub fn label_named(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.name == name)
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.label_named(name).is_some()
    }
}

/// The forge operations the reconciler needs. Production code talks to
/// GitHub's GraphQL API; tests substitute a recording mock.
#[async_trait]
pub trait Forge {
    /// Fetches open items of `kind` carrying any of `pending_labels`,
    /// with labels and recent timeline events. Single page of 100.
    async fn fetch_candidates(
        &self,
        repo: &Repo,
        kind: ItemKind,
        pending_labels: &[&str],
    ) -> Result<Vec<TrackedItem>>;

    /// Resolves the repository's `closed:` labels to a name -> node ID map.
    async fn close_labels(&self, repo: &Repo) -> Result<HashMap<String, String>>;

    /// Posts `body` as a comment, closes the item (issues close as "not
    /// planned"), attaches the close label, and removes `remove_label_ids`.
    async fn close_item(
        &self,
        kind: ItemKind,
        item_id: &str,
        body: &str,
        close_label_id: &str,
        remove_label_ids: &[String],
    ) -> Result<()>;

    /// Removes the given labels without touching anything else.
    async fn remove_labels(&self, item_id: &str, label_ids: &[String]) -> Result<()>;
}
