use std::{collections::HashMap, process::Command};

use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;

use crate::{
    graphql,
    types::{Forge, ItemKind, Repo, TrackedItem},
};

pub fn get_github_token() -> Result<String> {
    // Prefer environment variables over gh CLI to avoid subprocess overhead.
    if let Ok(token) = std::env::var("GITHUB_TOKEN") {
        return Ok(token);
    }

    if let Ok(token) = std::env::var("GH_TOKEN") {
        return Ok(token);
    }

    let output = Command::new("gh").args(["auth", "token"]).output()?;

    if !output.status.success() {
        anyhow::bail!("Failed to get GitHub token from gh CLI. Please run 'gh auth login' first");
    }

    let token = String::from_utf8(output.stdout)?.trim().to_string();

    if token.is_empty() {
        anyhow::bail!("Empty token returned from gh CLI");
    }

    Ok(token)
}

/// Creates an authenticated GitHub client using available credentials.
pub async fn setup_github_client() -> Result<Octocrab> {
    let token = get_github_token().context("Failed to obtain GitHub authentication token")?;
    Octocrab::builder()
        .personal_token(token)
        .build()
        .context("Failed to create GitHub client")
}

/// Production [`Forge`] backed by GitHub's GraphQL API.
pub struct GitHub {
    client: Octocrab,
}

impl GitHub {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    pub async fn from_env() -> Result<Self> {
        Ok(Self::new(setup_github_client().await?))
    }
}

#[async_trait]
impl Forge for GitHub {
    async fn fetch_candidates(
        &self,
        repo: &Repo,
        kind: ItemKind,
        pending_labels: &[&str],
    ) -> Result<Vec<TrackedItem>> {
        let query = graphql::candidate_query(kind, repo, pending_labels);
        let response: graphql::CandidateResponse = self
            .client
            .graphql(&query)
            .await
            .with_context(|| format!("Failed to fetch candidate {}s from {}", kind, repo))?;

        Ok(response
            .data
            .repository
            .items
            .nodes
            .into_iter()
            .map(graphql::convert_item)
            .collect())
    }

    async fn close_labels(&self, repo: &Repo) -> Result<HashMap<String, String>> {
        let query = graphql::close_labels_query(repo);
        let response: graphql::CloseLabelsResponse = self
            .client
            .graphql(&query)
            .await
            .with_context(|| format!("Failed to fetch 'closed:' labels from {}", repo))?;

        Ok(response
            .data
            .repository
            .labels
            .nodes
            .into_iter()
            .map(|label| (label.name, label.id))
            .collect())
    }

    async fn close_item(
        &self,
        kind: ItemKind,
        item_id: &str,
        body: &str,
        close_label_id: &str,
        remove_label_ids: &[String],
    ) -> Result<()> {
        let mutation =
            graphql::close_mutation(kind, item_id, body, close_label_id, remove_label_ids);
        let _: serde_json::Value = self
            .client
            .graphql(&mutation)
            .await
            .with_context(|| format!("Failed to close {} {}", kind, item_id))?;
        Ok(())
    }

    async fn remove_labels(&self, item_id: &str, label_ids: &[String]) -> Result<()> {
        let mutation = graphql::remove_labels_mutation(item_id, label_ids);
        let _: serde_json::Value = self
            .client
            .graphql(&mutation)
            .await
            .with_context(|| format!("Failed to remove labels from {}", item_id))?;
        Ok(())
    }
}
