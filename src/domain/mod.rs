//! Core data types shared by the pipeline stages.

/// A concrete comment as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    /// `None` when the account that wrote the comment has been deleted.
    pub author: Option<String>,
    /// 0 for top-level comments, incremented per reply level.
    pub depth: u32,
    pub subreddit: String,
    pub body: String,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }
}

/// Continuation placeholder: comments that exist but were not fetched yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoreComments {
    /// Fullname of the thread (`t3_...`) the children belong to.
    pub link_id: String,
    /// Fullname of the parent thing; equals `link_id` for top-level placeholders.
    pub parent_id: String,
    /// IDs of the unfetched children.
    pub children: Vec<String>,
    pub depth: u32,
}

/// One node of a comment listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentNode {
    Concrete(Comment),
    Continuation(MoreComments),
}

impl CommentNode {
    pub fn is_continuation(&self) -> bool {
        matches!(self, CommentNode::Continuation(_))
    }
}

/// A thread together with its unresolved top-level listing.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: String,
    pub subreddit: String,
    /// Path relative to the site root, e.g. `/r/test/comments/abc123/title/`.
    pub permalink: String,
    pub comments: Vec<CommentNode>,
}

/// A private message from the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Fullname (`t4_...`) used for mark-read and reply calls.
    pub fullname: String,
    pub author: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Any inbox entry that is not a private message (comment replies, mentions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub fullname: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboxItem {
    DirectMessage(Message),
    OtherNotification(Notification),
}

impl InboxItem {
    pub fn fullname(&self) -> &str {
        match self {
            InboxItem::DirectMessage(m) => &m.fullname,
            InboxItem::OtherNotification(n) => &n.fullname,
        }
    }

    pub fn author(&self) -> Option<&str> {
        match self {
            InboxItem::DirectMessage(m) => m.author.as_deref(),
            InboxItem::OtherNotification(n) => n.author.as_deref(),
        }
    }
}

/// Summary of one top-level commenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub name: String,
    pub age_days: u32,
    pub in_count: u32,
    pub out_count: u32,
}

impl AuthorRecord {
    pub fn new(name: impl Into<String>, age_days: u32, in_count: u32, out_count: u32) -> Self {
        Self { name: name.into(), age_days, in_count, out_count }
    }

    /// Signed in/out balance used by ratio ordering.
    pub fn balance(&self) -> i64 {
        i64::from(self.in_count) - i64::from(self.out_count)
    }
}
