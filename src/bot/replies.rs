//! Fixed user-facing reply texts.

pub const NO_LINK: &str = "I couldn't find a link in your message";

pub const LOAD_FAILED: &str =
    "I found a link, but something went wrong when I tried to load the post";

pub const BIG_THREAD: &str = "This looks like a big thread, it might take a while";

const FORMAT_NOTE: &str = "Format is redditor name, age of account in days, then of their last \
     100 comments, how many are in the subreddit the thread is in versus how many are out of it";

pub fn footer(owner: &str) -> String {
    format!(
        "\n\n*****\n\nThis is a bot run by /u/{owner}, it analyses threads and returns a summary \
         of the authors of top level comments"
    )
}

pub fn paste_failed(owner: &str) -> String {
    format!(
        "Something went wrong generating the pastebin of your summary. Please let /u/{owner} know"
    )
}

pub fn finished(seconds: u64, url: &str) -> String {
    format!("Finished processing in {seconds} seconds, here's your summary: {url}\n\n{FORMAT_NOTE}")
}

pub fn paste_title(permalink: &str) -> String {
    format!("Thread summary: https://www.reddit.com{permalink}")
}
