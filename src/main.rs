//! thread-integrity: Reddit bot that summarises the authors of a thread
//!
//! Run with an account selector from the config file, e.g.
//! `thread-integrity Watchful1 --once --debug`.

use anyhow::Result;

fn main() -> Result<()> {
    thread_integrity::cli::run()
}
