//! Diagnostic log sink.
//!
//! The engine never links a logging facade. Hosts that want diagnostics
//! install a callback with [`set_log_callback`] and forward messages to
//! whatever they use (`tracing`, `log`, a status line). Messages are only
//! formatted while a callback is installed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

/// Log level for diagnostic callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

type LogCallback = Box<dyn Fn(LogLevel, &str) + Send + Sync + 'static>;

static INSTALLED: AtomicBool = AtomicBool::new(false);

fn log_callback() -> &'static Mutex<Option<LogCallback>> {
    static CALLBACK: OnceLock<Mutex<Option<LogCallback>>> = OnceLock::new();
    CALLBACK.get_or_init(|| Mutex::new(None))
}

/// Install the process-wide log callback, replacing any previous one.
pub fn set_log_callback<F>(callback: F)
where
    F: Fn(LogLevel, &str) + Send + Sync + 'static,
{
    let mut guard = match log_callback().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Some(Box::new(callback));
    INSTALLED.store(true, Ordering::Release);
}

/// Remove the log callback. Subsequent messages are dropped unformatted.
pub fn clear_log_callback() {
    INSTALLED.store(false, Ordering::Release);
    if let Ok(mut guard) = log_callback().lock() {
        *guard = None;
    }
}

/// Whether a callback is installed.
#[inline]
#[must_use]
pub fn log_enabled() -> bool {
    INSTALLED.load(Ordering::Acquire)
}

/// Send a message to the installed callback, if any.
pub fn emit_log(level: LogLevel, message: &str) {
    if !log_enabled() {
        return;
    }
    if let Ok(guard) = log_callback().lock() {
        if let Some(callback) = guard.as_ref() {
            callback(level, message);
        }
    }
}

macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::log::log_enabled() {
            $crate::log::emit_log($crate::log::LogLevel::Debug, &format!($($arg)*));
        }
    };
}

macro_rules! log_warn {
    ($($arg:tt)*) => {
        if $crate::log::log_enabled() {
            $crate::log::emit_log($crate::log::LogLevel::Warn, &format!($($arg)*));
        }
    };
}

pub(crate) use log_debug;
pub(crate) use log_warn;
