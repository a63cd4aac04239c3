//! Per-launch session log for HySkin.
//!
//! One file in the OS data directory, truncated on every start:
//!   Windows:  `%APPDATA%\HySkin\hyskin.log`
//!   Linux:    `~/.local/share/HySkin/hyskin.log`
//!   macOS:    `~/Library/Application Support/HySkin/hyskin.log`
//!
//! Code logs through `log_info!` / `log_warn!` / `log_err!`.  Before [`init`]
//! runs (unit tests, embedding the library) the macros do nothing.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Panic,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Panic => "PANIC",
        })
    }
}

struct SessionLog {
    file: Mutex<File>,
    path: PathBuf,
    echo: bool,
    started: Instant,
}

static SESSION: OnceLock<SessionLog> = OnceLock::new();

pub fn log_path() -> Option<&'static Path> {
    SESSION.get().map(|s| s.path.as_path())
}

/// Append one message.  Write failures are swallowed.
pub fn write(level: Level, msg: &str) {
    let Some(session) = SESSION.get() else {
        return;
    };
    let line = format_line(wall_clock(), session.started.elapsed().as_secs_f64(), level, msg);
    if let Ok(mut file) = session.file.lock() {
        let _ = writeln!(file, "{}", line);
    }
    if session.echo {
        eprintln!("{}", line);
    }
}

/// `[HH:MM:SS +elapsed] LEVEL message`
fn format_line(clock: String, elapsed_secs: f64, level: Level, msg: &str) -> String {
    format!("[{} +{:.3}s] {:<5} {}", clock, elapsed_secs, level, msg)
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, &format!($($arg)*))
    };
}

/// Open the session log at the default location.  With `echo`, lines are
/// mirrored to stderr (`--verbose`).
pub fn init(echo: bool) {
    init_at(&data_dir().join("HySkin").join("hyskin.log"), echo);
}

/// Open the session log at `path`.  Only the first call takes effect.
pub fn init_at(path: &Path, echo: bool) {
    if SESSION.get().is_some() {
        return;
    }
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).write(true).truncate(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("[logger] cannot open {}: {}", path.display(), e);
            return;
        }
    };

    let _ = SESSION.set(SessionLog {
        file: Mutex::new(file),
        path: path.to_path_buf(),
        echo,
        started: Instant::now(),
    });

    log_info!("HySkin {} session log, {}", env!("CARGO_PKG_VERSION"), path.display());

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write(Level::Panic, &info.to_string());
        previous(info);
    }));
}

/// Platform data directory (without the app sub-folder).
pub(crate) fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support");
        }
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/share")))
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// UTC time of day.
fn wall_clock() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{:02}:{:02}:{:02}", (secs % 86_400) / 3600, (secs % 3600) / 60, secs % 60)
}
