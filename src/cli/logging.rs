//! Logging setup: stderr plus a size-rotated log file.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE_NAME: &str = "bot.log";

/// Where and how large the log file may grow.
#[derive(Debug, Clone)]
pub struct LogFileOptions {
    pub dir: PathBuf,
    pub max_bytes: u64,
    pub backups: usize,
}

/// Filter used when RUST_LOG is unset: everything this crate logs, INFO elsewhere.
pub const DEFAULT_DIRECTIVES: &str = "info,thread_integrity=debug";

/// Install the global subscriber.
///
/// RUST_LOG in the environment replaces [`DEFAULT_DIRECTIVES`]; `verbose`
/// adds a DEBUG directive for every crate.
pub fn init_logging(verbose: bool, file: Option<&LogFileOptions>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let filter = if verbose { filter.add_directive(Level::DEBUG.into()) } else { filter };

    let file_layer = match file {
        Some(options) => {
            Some(fmt::layer().with_ansi(false).with_writer(open_log_writer(options)?))
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .try_init();
    Ok(())
}

/// Open `<dir>/bot.log` for the file layer.
pub fn open_log_writer(options: &LogFileOptions) -> Result<Mutex<RotatingFile>> {
    let path = options.dir.join(LOG_FILE_NAME);
    let writer = RotatingFile::open(&path, options.max_bytes, options.backups)
        .with_context(|| format!("Failed opening log file: {}", path.display()))?;
    Ok(Mutex::new(writer))
}

/// Append-only file that rolls over to `<name>.1 .. <name>.N` past `max_bytes`.
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    backups: usize,
}

impl RotatingFile {
    pub fn open(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(path)?;
        let written = file.metadata()?.len();
        Ok(Self { path: path.to_path_buf(), file, written, max_bytes, backups })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.backups == 0 {
            self.file = File::create(&self.path)?;
        } else {
            for index in (1..self.backups).rev() {
                let src = self.backup_path(index);
                if src.exists() {
                    let dst = self.backup_path(index + 1);
                    if dst.exists() {
                        fs::remove_file(&dst)?;
                    }
                    fs::rename(&src, &dst)?;
                }
            }
            let first = self.backup_path(1);
            if first.exists() {
                fs::remove_file(&first)?;
            }
            fs::rename(&self.path, &first)?;
            self.file = open_append(&self.path)?;
        }
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.max_bytes > 0 && self.written > 0 && self.written + buf.len() as u64 > self.max_bytes
        {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
