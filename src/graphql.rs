//! GraphQL documents and response shapes for the GitHub API.
//!
//! Both item kinds alias their connection to `items` so one set of serde
//! structs covers issues and pull requests.

use serde::Deserialize;

use crate::types::{ItemKind, Label, Repo, TimelineEvent, TrackedItem};

const ISSUE_CANDIDATES: &str = r#"
    query($owner: String!, $name: String!, $labels: [String!]) {
        repository(owner: $owner, name: $name) {
            items: issues(last: 100, states: [OPEN], labels: $labels) {
                nodes {
                    id
                    number
                    updatedAt
                    labels(first: 100) {
                        nodes { id name }
                    }
                    timelineItems(last: 100, itemTypes: [
                        LABELED_EVENT,
                        ISSUE_COMMENT,
                        CLOSED_EVENT,
                        RENAMED_TITLE_EVENT
                    ]) {
                        nodes {
                            __typename
                            ... on LabeledEvent {
                                createdAt
                                label { name }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

const PULL_CANDIDATES: &str = r#"
    query($owner: String!, $name: String!, $labels: [String!]) {
        repository(owner: $owner, name: $name) {
            items: pullRequests(last: 100, states: [OPEN], labels: $labels) {
                nodes {
                    id
                    number
                    updatedAt
                    labels(first: 100) {
                        nodes { id name }
                    }
                    timelineItems(last: 100, itemTypes: [
                        LABELED_EVENT,
                        ISSUE_COMMENT,
                        PULL_REQUEST_REVIEW,
                        PULL_REQUEST_COMMIT,
                        CLOSED_EVENT,
                        RENAMED_TITLE_EVENT
                    ]) {
                        nodes {
                            __typename
                            ... on LabeledEvent {
                                createdAt
                                label { name }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

const CLOSE_LABELS: &str = r#"
    query($owner: String!, $name: String!, $query: String!) {
        repository(owner: $owner, name: $name) {
            labels(query: $query, first: 100) {
                nodes { id name }
            }
        }
    }
"#;

const CLOSE_ISSUE: &str = r#"
    mutation($itemId: ID!, $body: String!, $closeLabelIds: [ID!]!, $removeLabelIds: [ID!]!) {
        addComment(input: {subjectId: $itemId, body: $body}) {
            clientMutationId
        }
        closeIssue(input: {issueId: $itemId, stateReason: NOT_PLANNED}) {
            clientMutationId
        }
        addLabelsToLabelable(input: {labelableId: $itemId, labelIds: $closeLabelIds}) {
            clientMutationId
        }
        removeLabelsFromLabelable(input: {labelableId: $itemId, labelIds: $removeLabelIds}) {
            clientMutationId
        }
    }
"#;

const CLOSE_PULL: &str = r#"
    mutation($itemId: ID!, $body: String!, $closeLabelIds: [ID!]!, $removeLabelIds: [ID!]!) {
        addComment(input: {subjectId: $itemId, body: $body}) {
            clientMutationId
        }
        closePullRequest(input: {pullRequestId: $itemId}) {
            clientMutationId
        }
        addLabelsToLabelable(input: {labelableId: $itemId, labelIds: $closeLabelIds}) {
            clientMutationId
        }
        removeLabelsFromLabelable(input: {labelableId: $itemId, labelIds: $removeLabelIds}) {
            clientMutationId
        }
    }
"#;

const REMOVE_LABELS: &str = r#"
    mutation($itemId: ID!, $labelIds: [ID!]!) {
        removeLabelsFromLabelable(input: {labelableId: $itemId, labelIds: $labelIds}) {
            clientMutationId
        }
    }
"#;

pub fn candidate_query(kind: ItemKind, repo: &Repo, pending_labels: &[&str]) -> serde_json::Value {
    let document = match kind {
        ItemKind::Issue => ISSUE_CANDIDATES,
        ItemKind::PullRequest => PULL_CANDIDATES,
    };
    serde_json::json!({
        "query": document,
        "variables": {
            "owner": repo.owner,
            "name": repo.name,
            "labels": pending_labels,
        }
    })
}

pub fn close_labels_query(repo: &Repo) -> serde_json::Value {
    serde_json::json!({
        "query": CLOSE_LABELS,
        "variables": {
            "owner": repo.owner,
            "name": repo.name,
            "query": "closed:",
        }
    })
}

pub fn close_mutation(
    kind: ItemKind,
    item_id: &str,
    body: &str,
    close_label_id: &str,
    remove_label_ids: &[String],
) -> serde_json::Value {
    let document = match kind {
        ItemKind::Issue => CLOSE_ISSUE,
        ItemKind::PullRequest => CLOSE_PULL,
    };
    serde_json::json!({
        "query": document,
        "variables": {
            "itemId": item_id,
            "body": body,
            "closeLabelIds": [close_label_id],
            "removeLabelIds": remove_label_ids,
        }
    })
}

pub fn remove_labels_mutation(item_id: &str, label_ids: &[String]) -> serde_json::Value {
    serde_json::json!({
        "query": REMOVE_LABELS,
        "variables": {
            "itemId": item_id,
            "labelIds": label_ids,
        }
    })
}

#[derive(Debug, Deserialize)]
pub struct CandidateResponse {
    pub data: CandidateData,
}

#[derive(Debug, Deserialize)]
pub struct CandidateData {
    pub repository: CandidateRepository,
}

#[derive(Debug, Deserialize)]
pub struct CandidateRepository {
    pub items: NodeConnection<GraphQLItem>,
}

#[derive(Debug, Deserialize)]
pub struct NodeConnection<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLItem {
    pub id: String,
    pub number: u64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub labels: NodeConnection<GraphQLLabel>,
    pub timeline_items: NodeConnection<GraphQLTimelineItem>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLLabel {
    pub id: String,
    pub name: String,
}

// Only LabeledEvent contributes fields; every other member of the union
// deserializes to its __typename alone.
#[derive(Debug, Deserialize)]
pub struct GraphQLTimelineItem {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub label: Option<GraphQLTimelineLabel>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLTimelineLabel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CloseLabelsResponse {
    pub data: CloseLabelsData,
}

#[derive(Debug, Deserialize)]
pub struct CloseLabelsData {
    pub repository: CloseLabelsRepository,
}

#[derive(Debug, Deserialize)]
pub struct CloseLabelsRepository {
    pub labels: NodeConnection<GraphQLLabel>,
}

/// Converts a GraphQL candidate node into the reconciler's item type.
pub fn convert_item(item: GraphQLItem) -> TrackedItem {
    TrackedItem {
        id: item.id,
        number: item.number,
        updated_at: item.updated_at,
        labels: item
            .labels
            .nodes
            .into_iter()
            .map(|label| Label::new(label.id, label.name))
            .collect(),
        timeline: item
            .timeline_items
            .nodes
            .into_iter()
            .map(convert_timeline_item)
            .collect(),
    }
}

fn convert_timeline_item(item: GraphQLTimelineItem) -> TimelineEvent {
    match (item.typename.as_str(), item.label) {
        ("LabeledEvent", Some(label)) => TimelineEvent::labeled(label.name),
        (_, _) => TimelineEvent::activity(item.typename),
    }
}
