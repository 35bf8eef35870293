//! Inbox polling loop and per-message pipeline.

use crate::config::Settings;
use crate::domain::{InboxItem, Message};
use crate::extract::extract_thread_id;
use crate::paste::{publish_report, PasteError, PasteService};
use crate::platform::{Platform, PlatformError};
use crate::rank::SortKey;
use crate::render::{Report, ReportFormat};
use crate::thread::{aggregate_authors, resolve_comments, top_level_authors};
use chrono::Utc;
use seen::SeenItems;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use thiserror::Error;

pub mod replies;
pub mod seen;

/// How many handled inbox fullnames are remembered between polls.
const SEEN_CAPACITY: usize = 301;

/// Upper bound on recent items classified per author.
pub const MAX_ACTIVITY_LIMIT: usize = 100;

/// Runtime switches for the controller.
#[derive(Debug, Clone)]
pub struct BotOptions {
    /// Handle at most one inbox item, then stop.
    pub once: bool,
    /// Log every rendered report row.
    pub debug: bool,
    pub sort: SortKey,
    pub format: ReportFormat,
    pub activity_limit: usize,
    pub cooldown: Duration,
    pub owner: String,
    pub paste_domain: String,
}

impl BotOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            once: false,
            debug: false,
            sort: settings.sort,
            format: settings.format,
            activity_limit: settings.activity_limit.min(MAX_ACTIVITY_LIMIT),
            cooldown: settings.cooldown(),
            owner: settings.owner.clone(),
            paste_domain: settings.paste_domain.clone(),
        }
    }
}

/// Why a message did not produce a summary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no thread link in message")]
    NoLink,

    #[error("failed to load thread {id}")]
    LoadFailed {
        id: String,
        #[source]
        source: PlatformError,
    },

    #[error("failed to publish summary")]
    Paste(#[from] PasteError),
}

impl PipelineError {
    /// Reply text sent to the requester in place of a summary.
    pub fn user_message(&self, owner: &str) -> String {
        match self {
            PipelineError::NoLink => replies::NO_LINK.to_string(),
            PipelineError::LoadFailed { .. } => replies::LOAD_FAILED.to_string(),
            PipelineError::Paste(_) => replies::paste_failed(owner),
        }
    }
}

/// Counts for one pass over the inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub messages: usize,
    pub notifications: usize,
    /// Items still unread on the platform but already handled earlier.
    pub skipped: usize,
}

impl CycleReport {
    pub fn handled(&self) -> usize {
        self.messages + self.notifications
    }
}

pub struct Bot<P, S> {
    platform: P,
    paste: S,
    options: BotOptions,
    seen: RefCell<SeenItems>,
}

impl<P, S> Bot<P, S>
where
    P: Platform,
    S: PasteService,
{
    pub fn new(platform: P, paste: S, options: BotOptions) -> Self {
        Self { platform, paste, options, seen: RefCell::new(SeenItems::new(SEEN_CAPACITY)) }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn paste_service(&self) -> &S {
        &self.paste
    }

    /// Poll forever (or once), surviving any failure inside a cycle.
    pub fn run(&self) {
        loop {
            match panic::catch_unwind(AssertUnwindSafe(|| self.run_cycle())) {
                Ok(Ok(report)) => {
                    tracing::debug!(
                        messages = report.messages,
                        notifications = report.notifications,
                        skipped = report.skipped,
                        "Inbox cycle finished"
                    );
                }
                Ok(Err(err)) => {
                    tracing::warn!("Hit an error in main loop");
                    tracing::warn!("{:?}", anyhow::Error::new(err));
                }
                Err(payload) => {
                    tracing::warn!("Hit an error in main loop");
                    tracing::warn!("panic: {}", panic_message(payload.as_ref()));
                }
            }

            if self.options.once {
                break;
            }
            std::thread::sleep(self.options.cooldown);
        }
    }

    /// Fetch the unread inbox and handle each item in delivery order.
    pub fn run_cycle(&self) -> Result<CycleReport, PlatformError> {
        let mut report = CycleReport::default();
        for item in self.platform.unread_inbox()? {
            // marked before handling so a failing item is not retried every poll
            if !self.seen.borrow_mut().insert(item.fullname()) {
                report.skipped += 1;
                continue;
            }
            match item {
                InboxItem::DirectMessage(_) => report.messages += 1,
                InboxItem::OtherNotification(_) => report.notifications += 1,
            }
            self.handle_item(&item);
            if self.options.once {
                break;
            }
        }
        Ok(report)
    }

    pub fn handle_item(&self, item: &InboxItem) {
        let started = Instant::now();
        tracing::debug!("Processing message from: {}", item.author().unwrap_or("[deleted]"));

        match item {
            InboxItem::DirectMessage(message) => {
                let result = self.process_message(message, started);
                let text = format!("{}{}", result, replies::footer(&self.options.owner));
                if let Err(err) = self
                    .platform
                    .mark_read(&message.fullname)
                    .and_then(|_| self.platform.reply(&message.fullname, &text))
                {
                    tracing::debug!(error = %err, "Exception replying to message");
                }
            }
            InboxItem::OtherNotification(notification) => {
                tracing::debug!("Marking comment as read");
                if let Err(err) = self.platform.mark_read(&notification.fullname) {
                    tracing::debug!(error = %err, "Exception marking comment as read");
                }
            }
        }

        tracing::debug!("Message processed after: {}", started.elapsed().as_secs());
    }

    /// Run the pipeline for one message and return the reply body (no footer).
    pub fn process_message(&self, message: &Message, started: Instant) -> String {
        match self.summarize(message, started) {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(error = ?err, "Message produced no summary");
                err.user_message(&self.options.owner)
            }
        }
    }

    fn summarize(&self, message: &Message, started: Instant) -> Result<String, PipelineError> {
        let id = extract_thread_id(&message.body).ok_or(PipelineError::NoLink)?;

        let submission = self
            .platform
            .submission(&id)
            .map_err(|source| PipelineError::LoadFailed { id: id.clone(), source })?;
        let subreddit = submission.subreddit.to_lowercase();
        let permalink = submission.permalink.clone();
        tracing::debug!("Found submission in subreddit: {}", subreddit);

        let resolved = resolve_comments(&self.platform, submission, || {
            self.notify_big_thread(message)
        })
        .map_err(|source| PipelineError::LoadFailed { id: id.clone(), source })?;

        let authors = top_level_authors(&resolved.comments);
        let table = aggregate_authors(
            &self.platform,
            &authors,
            &subreddit,
            Utc::now(),
            self.options.activity_limit,
            self.options.sort,
        );

        let report = Report::build(&table, self.options.format);
        if self.options.debug {
            for row in &report.rows {
                tracing::info!("{}", row);
            }
        }

        let url = publish_report(
            &self.paste,
            &replies::paste_title(&permalink),
            &report.to_text(),
            &self.options.paste_domain,
        )
        .inspect_err(|err| {
            if let PasteError::Rejected(body) = err {
                tracing::debug!("Something went wrong pasting: {}", body);
            }
        })?;
        tracing::debug!("Finished pasting: {}", url);

        Ok(replies::finished(started.elapsed().as_secs(), &url))
    }

    /// One-off heads-up before paging through a large thread; failures are ignored.
    fn notify_big_thread(&self, message: &Message) {
        let text = format!("{}{}", replies::BIG_THREAD, replies::footer(&self.options.owner));
        if let Err(err) = self.platform.reply(&message.fullname, &text) {
            tracing::debug!(error = %err, "Exception replying to message");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommentNode, MoreComments, Notification, Submission};
    use chrono::{DateTime, Utc};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingPlatform {
        inbox: Vec<InboxItem>,
        fail_inbox: bool,
        panic_on_submission: bool,
        unmarkable: Option<&'static str>,
        marked: RefCell<Vec<String>>,
        replies: RefCell<Vec<(String, String)>>,
    }

    impl Platform for RecordingPlatform {
        fn unread_inbox(&self) -> Result<Vec<InboxItem>, PlatformError> {
            if self.fail_inbox {
                return Err(PlatformError::Status { endpoint: "/message/unread".into(), status: 500 });
            }
            Ok(self.inbox.clone())
        }
        fn mark_read(&self, fullname: &str) -> Result<(), PlatformError> {
            if self.unmarkable == Some(fullname) {
                return Err(PlatformError::Status { endpoint: "/api/read_message".into(), status: 500 });
            }
            self.marked.borrow_mut().push(fullname.to_string());
            Ok(())
        }
        fn reply(&self, fullname: &str, text: &str) -> Result<(), PlatformError> {
            self.replies.borrow_mut().push((fullname.to_string(), text.to_string()));
            Ok(())
        }
        fn submission(&self, id: &str) -> Result<Submission, PlatformError> {
            if self.panic_on_submission {
                panic!("submission exploded");
            }
            Err(PlatformError::Status { endpoint: format!("/comments/{id}"), status: 404 })
        }
        fn expand(&self, _: &MoreComments) -> Result<Vec<CommentNode>, PlatformError> {
            Ok(Vec::new())
        }
        fn account_created(&self, name: &str) -> Result<DateTime<Utc>, PlatformError> {
            Err(PlatformError::UnavailableAccount(name.to_string()))
        }
        fn recent_activity(&self, _: &str, _: usize) -> Result<Vec<String>, PlatformError> {
            Ok(Vec::new())
        }
    }

    struct NeverPaste;

    impl PasteService for NeverPaste {
        fn publish(&self, _: &str, _: &str) -> Result<String, PasteError> {
            panic!("nothing should be pasted");
        }
    }

    fn options(once: bool) -> BotOptions {
        BotOptions {
            once,
            cooldown: Duration::ZERO,
            ..BotOptions::from_settings(&Settings::default())
        }
    }

    fn dm(fullname: &str, body: &str) -> InboxItem {
        InboxItem::DirectMessage(Message {
            fullname: fullname.to_string(),
            author: Some("requester".to_string()),
            subject: "summary please".to_string(),
            body: body.to_string(),
        })
    }

    fn notification(fullname: &str) -> InboxItem {
        InboxItem::OtherNotification(Notification {
            fullname: fullname.to_string(),
            author: Some("someone".to_string()),
        })
    }

    #[test]
    fn message_without_link_gets_no_link_reply() {
        let platform = RecordingPlatform { inbox: vec![dm("t4_a", "hello bot")], ..Default::default() };
        let bot = Bot::new(platform, NeverPaste, options(false));

        let report = bot.run_cycle().expect("cycle");
        assert_eq!(report, CycleReport { messages: 1, notifications: 0, skipped: 0 });

        let sent = bot.platform().replies.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "t4_a");
        assert!(sent[0].1.starts_with(replies::NO_LINK));
        assert!(sent[0].1.ends_with(&replies::footer("Watchful1")));
        assert_eq!(*bot.platform().marked.borrow(), vec!["t4_a"]);
    }

    #[test]
    fn unloadable_thread_gets_load_failed_reply() {
        let platform = RecordingPlatform {
            inbox: vec![dm("t4_a", "https://reddit.com/r/test/comments/zzz999/")],
            ..Default::default()
        };
        let bot = Bot::new(platform, NeverPaste, options(false));
        bot.run_cycle().expect("cycle");

        let sent = bot.platform().replies.borrow();
        assert!(sent[0].1.starts_with(replies::LOAD_FAILED));
    }

    #[test]
    fn notifications_are_only_marked_read() {
        let platform = RecordingPlatform {
            inbox: vec![notification("t1_x"), dm("t4_b", "no link"), notification("t1_y")],
            ..Default::default()
        };
        let bot = Bot::new(platform, NeverPaste, options(false));

        let report = bot.run_cycle().expect("cycle");
        assert_eq!(report.handled(), 3);
        assert_eq!(report.notifications, 2);
        assert_eq!(*bot.platform().marked.borrow(), vec!["t1_x", "t4_b", "t1_y"]);
        assert_eq!(bot.platform().replies.borrow().len(), 1);
    }

    #[test]
    fn failed_mark_read_does_not_stop_the_next_item() {
        let platform = RecordingPlatform {
            inbox: vec![dm("t4_a", "no link"), dm("t4_b", "no link either")],
            unmarkable: Some("t4_a"),
            ..Default::default()
        };
        let bot = Bot::new(platform, NeverPaste, options(false));

        let report = bot.run_cycle().expect("cycle");
        assert_eq!(report.messages, 2);
        assert_eq!(*bot.platform().marked.borrow(), vec!["t4_b"]);
        let sent = bot.platform().replies.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "t4_b");

        // still unread upstream, but not retried
        drop(sent);
        let second = bot.run_cycle().expect("second cycle");
        assert_eq!(second.skipped, 2);
        assert_eq!(bot.platform().replies.borrow().len(), 1);
    }

    #[test]
    fn items_still_unread_are_not_handled_twice() {
        let platform = RecordingPlatform { inbox: vec![dm("t4_a", "no link")], ..Default::default() };
        let bot = Bot::new(platform, NeverPaste, options(false));

        bot.run_cycle().expect("first cycle");
        let second = bot.run_cycle().expect("second cycle");
        assert_eq!(second, CycleReport { messages: 0, notifications: 0, skipped: 1 });
        assert_eq!(bot.platform().replies.borrow().len(), 1);
    }

    #[test]
    fn once_mode_stops_after_first_item() {
        let platform = RecordingPlatform {
            inbox: vec![dm("t4_a", "no link"), dm("t4_b", "no link")],
            ..Default::default()
        };
        let bot = Bot::new(platform, NeverPaste, options(true));
        bot.run();

        assert_eq!(*bot.platform().marked.borrow(), vec!["t4_a"]);
    }

    #[test]
    fn loop_survives_inbox_failure() {
        let platform = RecordingPlatform { fail_inbox: true, ..Default::default() };
        let bot = Bot::new(platform, NeverPaste, options(true));
        bot.run();
        assert!(bot.platform().replies.borrow().is_empty());
    }

    #[test]
    fn loop_survives_panic_inside_a_message() {
        let platform = RecordingPlatform {
            inbox: vec![dm("t4_a", "reddit.com/r/test/comments/abc123")],
            panic_on_submission: true,
            ..Default::default()
        };
        let bot = Bot::new(platform, NeverPaste, options(true));
        bot.run();
        assert!(bot.platform().replies.borrow().is_empty());
    }

    #[test]
    fn activity_limit_is_capped() {
        let settings = Settings { activity_limit: 500, ..Settings::default() };
        assert_eq!(BotOptions::from_settings(&settings).activity_limit, MAX_ACTIVITY_LIMIT);

        let settings = Settings { activity_limit: 25, ..Settings::default() };
        assert_eq!(BotOptions::from_settings(&settings).activity_limit, 25);
    }

    #[test]
    fn user_messages_cover_every_failure() {
        assert_eq!(PipelineError::NoLink.user_message("op"), replies::NO_LINK);
        let load = PipelineError::LoadFailed {
            id: "abc".to_string(),
            source: PlatformError::UnavailableAccount("x".to_string()),
        };
        assert_eq!(load.user_message("op"), replies::LOAD_FAILED);
        let paste = PipelineError::Paste(PasteError::Rejected("nope".to_string()));
        assert!(paste.user_message("op").contains("Please let /u/op know"));
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let text: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(text.as_ref()), "boom");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(owned.as_ref()), "bang");
    }
}
