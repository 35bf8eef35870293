//! Decoding of Reddit JSON listings into domain types.

use super::PlatformError;
use crate::domain::{
    Comment, CommentNode, InboxItem, Message, MoreComments, Notification, Submission,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

const DELETED_AUTHOR: &str = "[deleted]";

/// A `{kind, data}` envelope; `data` is decoded once `kind` is known.
#[derive(Debug, Deserialize)]
pub struct Thing {
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    depth: u32,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct RawMore {
    #[serde(default)]
    parent_id: String,
    #[serde(default)]
    depth: u32,
    #[serde(default)]
    children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    id: String,
    subreddit: String,
    permalink: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    name: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    is_suspended: bool,
}

#[derive(Debug, Deserialize)]
struct RawSubredditRef {
    #[serde(default)]
    subreddit: String,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenResponse {
    json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
struct MoreChildrenJson {
    #[serde(default)]
    errors: Vec<Value>,
    #[serde(default)]
    data: MoreChildrenData,
}

#[derive(Debug, Default, Deserialize)]
struct MoreChildrenData {
    #[serde(default)]
    things: Vec<Thing>,
}

fn malformed(endpoint: &str, reason: impl Into<String>) -> PlatformError {
    PlatformError::Malformed { endpoint: endpoint.to_string(), reason: reason.into() }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, PlatformError> {
    serde_json::from_value(value).map_err(|e| malformed(endpoint, e.to_string()))
}

fn normalize_author(author: Option<String>) -> Option<String> {
    author.filter(|name| !name.is_empty() && name != DELETED_AUTHOR)
}

fn comment_from(endpoint: &str, data: Value) -> Result<Comment, PlatformError> {
    let raw: RawComment = decode(endpoint, data)?;
    Ok(Comment {
        id: raw.id,
        author: normalize_author(raw.author),
        depth: raw.depth,
        subreddit: raw.subreddit,
        body: raw.body,
    })
}

/// Decode the nodes of a top-level comment listing, keeping their order.
pub fn comment_nodes(
    endpoint: &str,
    link_id: &str,
    children: Vec<Thing>,
) -> Result<Vec<CommentNode>, PlatformError> {
    let mut nodes = Vec::with_capacity(children.len());
    for thing in children {
        match thing.kind.as_str() {
            "t1" => nodes.push(CommentNode::Concrete(comment_from(endpoint, thing.data)?)),
            "more" => {
                let raw: RawMore = decode(endpoint, thing.data)?;
                nodes.push(CommentNode::Continuation(MoreComments {
                    link_id: link_id.to_string(),
                    parent_id: raw.parent_id,
                    children: raw.children,
                    depth: raw.depth,
                }));
            }
            other => tracing::debug!("Ignoring {} thing in comment listing", other),
        }
    }
    Ok(nodes)
}

/// Decode `GET /comments/{id}`: a two-element array of (thread, comments) listings.
pub fn submission(endpoint: &str, value: Value) -> Result<Submission, PlatformError> {
    let listings: Vec<Listing> = decode(endpoint, value)?;
    let mut listings = listings.into_iter();
    let (Some(link_listing), Some(comment_listing)) = (listings.next(), listings.next()) else {
        return Err(malformed(endpoint, "expected thread and comment listings"));
    };

    let link_thing = link_listing
        .data
        .children
        .into_iter()
        .find(|thing| thing.kind == "t3")
        .ok_or_else(|| malformed(endpoint, "thread listing has no t3 entry"))?;
    let link: RawLink = decode(endpoint, link_thing.data)?;
    let link_id = format!("t3_{}", link.id);
    let comments = comment_nodes(endpoint, &link_id, comment_listing.data.children)?;

    Ok(Submission { id: link.id, subreddit: link.subreddit, permalink: link.permalink, comments })
}

/// Decode `GET /api/morechildren` for the placeholder `more`.
///
/// Concrete comments keep their order. Top-level placeholders in the response,
/// plus `remainder` (IDs not requested in this page), are merged into one
/// placeholder at the tail. Placeholders for deeper reply levels are dropped.
pub fn more_children(
    endpoint: &str,
    value: Value,
    more: &MoreComments,
    remainder: Vec<String>,
) -> Result<Vec<CommentNode>, PlatformError> {
    let response: MoreChildrenResponse = decode(endpoint, value)?;
    if !response.json.errors.is_empty() {
        return Err(malformed(endpoint, format!("api errors: {:?}", response.json.errors)));
    }

    let mut nodes = Vec::with_capacity(response.json.data.things.len() + 1);
    let mut pending = Vec::new();
    for thing in response.json.data.things {
        match thing.kind.as_str() {
            "t1" => nodes.push(CommentNode::Concrete(comment_from(endpoint, thing.data)?)),
            "more" => {
                let raw: RawMore = decode(endpoint, thing.data)?;
                if raw.parent_id == more.link_id {
                    pending.extend(raw.children);
                }
            }
            other => tracing::debug!("Ignoring {} thing in morechildren response", other),
        }
    }

    pending.extend(remainder);
    if !pending.is_empty() {
        nodes.push(CommentNode::Continuation(MoreComments {
            link_id: more.link_id.clone(),
            parent_id: more.parent_id.clone(),
            children: pending,
            depth: more.depth,
        }));
    }
    Ok(nodes)
}

/// Decode `GET /user/{name}/about` into the account creation time.
pub fn account_created(
    endpoint: &str,
    name: &str,
    value: Value,
) -> Result<DateTime<Utc>, PlatformError> {
    let thing: Thing = decode(endpoint, value)?;
    let account: RawAccount = decode(endpoint, thing.data)?;
    if account.is_suspended {
        return Err(PlatformError::UnavailableAccount(name.to_string()));
    }
    account
        .created_utc
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .ok_or_else(|| PlatformError::UnavailableAccount(name.to_string()))
}

/// Decode a user overview listing into the subreddit of each item.
pub fn activity_subreddits(endpoint: &str, value: Value) -> Result<Vec<String>, PlatformError> {
    let listing: Listing = decode(endpoint, value)?;
    listing
        .data
        .children
        .into_iter()
        .map(|thing| decode::<RawSubredditRef>(endpoint, thing.data).map(|r| r.subreddit))
        .collect()
}

/// Decode an inbox listing. Reddit lists newest first; the result is oldest first.
pub fn inbox(endpoint: &str, value: Value) -> Result<Vec<InboxItem>, PlatformError> {
    let listing: Listing = decode(endpoint, value)?;
    let mut items = Vec::with_capacity(listing.data.children.len());
    for thing in listing.data.children {
        let raw: RawMessage = decode(endpoint, thing.data)?;
        let item = if thing.kind == "t4" {
            InboxItem::DirectMessage(Message {
                fullname: raw.name,
                author: normalize_author(raw.author),
                subject: raw.subject,
                body: raw.body,
            })
        } else {
            InboxItem::OtherNotification(Notification {
                fullname: raw.name,
                author: normalize_author(raw.author),
            })
        };
        items.push(item);
    }
    items.reverse();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EP: &str = "test";

    fn sample_more() -> MoreComments {
        MoreComments {
            link_id: "t3_abc".to_string(),
            parent_id: "t3_abc".to_string(),
            children: vec!["c3".to_string(), "c4".to_string()],
            depth: 0,
        }
    }

    #[test]
    fn submission_decodes_thread_and_top_level_nodes() {
        let value = json!([
            {"kind": "Listing", "data": {"children": [
                {"kind": "t3", "data": {"id": "abc", "subreddit": "Test", "permalink": "/r/Test/comments/abc/t/"}}
            ]}},
            {"kind": "Listing", "data": {"children": [
                {"kind": "t1", "data": {"id": "c1", "author": "alice", "depth": 0, "subreddit": "Test", "body": "hi"}},
                {"kind": "t1", "data": {"id": "c2", "author": "[deleted]", "depth": 0, "subreddit": "Test", "body": "[deleted]"}},
                {"kind": "more", "data": {"parent_id": "t3_abc", "depth": 0, "children": ["c3", "c4"]}}
            ]}}
        ]);

        let submission = submission(EP, value).expect("decode");
        assert_eq!(submission.id, "abc");
        assert_eq!(submission.subreddit, "Test");
        assert_eq!(submission.comments.len(), 3);
        match &submission.comments[1] {
            CommentNode::Concrete(c) => assert_eq!(c.author, None),
            other => panic!("unexpected node {other:?}"),
        }
        match &submission.comments[2] {
            CommentNode::Continuation(m) => {
                assert_eq!(m.link_id, "t3_abc");
                assert_eq!(m.children, vec!["c3", "c4"]);
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn submission_rejects_single_listing() {
        let value = json!([{"kind": "Listing", "data": {"children": []}}]);
        assert!(matches!(submission(EP, value), Err(PlatformError::Malformed { .. })));
    }

    #[test]
    fn more_children_merges_top_level_placeholders_at_tail() {
        let value = json!({"json": {"errors": [], "data": {"things": [
            {"kind": "t1", "data": {"id": "c3", "author": "bob", "depth": 0, "subreddit": "Test"}},
            {"kind": "more", "data": {"parent_id": "t1_c3", "depth": 1, "children": ["r1"]}},
            {"kind": "more", "data": {"parent_id": "t3_abc", "depth": 0, "children": ["c9"]}},
            {"kind": "t1", "data": {"id": "c4", "author": "carol", "depth": 0, "subreddit": "Test"}}
        ]}}});

        let nodes = more_children(EP, value, &sample_more(), vec!["c10".to_string()]).expect("decode");
        assert_eq!(nodes.len(), 3);
        assert!(matches!(&nodes[0], CommentNode::Concrete(c) if c.id == "c3"));
        assert!(matches!(&nodes[1], CommentNode::Concrete(c) if c.id == "c4"));
        match &nodes[2] {
            CommentNode::Continuation(m) => assert_eq!(m.children, vec!["c9", "c10"]),
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn more_children_without_leftovers_has_no_placeholder() {
        let value = json!({"json": {"errors": [], "data": {"things": [
            {"kind": "t1", "data": {"id": "c3", "author": "bob", "depth": 0}}
        ]}}});
        let nodes = more_children(EP, value, &sample_more(), Vec::new()).expect("decode");
        assert_eq!(nodes.len(), 1);
        assert!(!nodes[0].is_continuation());
    }

    #[test]
    fn more_children_surfaces_api_errors() {
        let value = json!({"json": {"errors": [["RATELIMIT", "slow down"]]}});
        assert!(more_children(EP, value, &sample_more(), Vec::new()).is_err());
    }

    #[test]
    fn suspended_account_is_unavailable() {
        let value = json!({"kind": "t2", "data": {"name": "gone", "is_suspended": true}});
        assert!(matches!(
            account_created(EP, "gone", value),
            Err(PlatformError::UnavailableAccount(name)) if name == "gone"
        ));
    }

    #[test]
    fn account_created_reads_epoch_seconds() {
        let value = json!({"kind": "t2", "data": {"name": "alice", "created_utc": 1_600_000_000.0}});
        let created = account_created(EP, "alice", value).expect("decode");
        assert_eq!(created.timestamp(), 1_600_000_000);
    }

    #[test]
    fn inbox_is_oldest_first_and_split_by_kind() {
        let value = json!({"kind": "Listing", "data": {"children": [
            {"kind": "t1", "data": {"name": "t1_new", "author": "bob", "body": "reply"}},
            {"kind": "t4", "data": {"name": "t4_old", "author": "alice", "subject": "s", "body": "b"}}
        ]}});
        let items = inbox(EP, value).expect("decode");
        assert!(matches!(&items[0], InboxItem::DirectMessage(m) if m.fullname == "t4_old"));
        assert!(matches!(&items[1], InboxItem::OtherNotification(n) if n.fullname == "t1_new"));
    }

    #[test]
    fn activity_lists_subreddits_in_order() {
        let value = json!({"kind": "Listing", "data": {"children": [
            {"kind": "t1", "data": {"subreddit": "Test"}},
            {"kind": "t3", "data": {"subreddit": "other"}}
        ]}});
        assert_eq!(activity_subreddits(EP, value).expect("decode"), vec!["Test", "other"]);
    }
}
