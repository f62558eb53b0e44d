use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(usize)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    fn from_usize(v: usize) -> LogLevel {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// Process-wide log level, defaulting to `Info`.
///
/// Not a real logging framework: this crate is meant to be embedded in a VMM
/// that may already own stderr, so we keep this to a single global filter
/// level and a stable line format rather than pulling in a facade.
pub struct Logger {
    level: AtomicUsize,
}

impl Logger {
    const fn new() -> Logger {
        Logger {
            level: AtomicUsize::new(LogLevel::Info as usize),
        }
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as usize, Ordering::Relaxed);
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_usize(self.level.load(Ordering::Relaxed))
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level()
    }

    pub fn log(&self, level: LogLevel, args: fmt::Arguments) {
        if !self.enabled(level) {
            return;
        }
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        eprintln!("[{:.3}] juke-shm {}: {}", secs, level.tag(), args);
    }
}

lazy_static! {
    pub static ref LOGGER: Logger = Logger::new();
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::util::log::LOGGER.log($crate::util::log::LogLevel::Error, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::util::log::LOGGER.log($crate::util::log::LogLevel::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::util::log::LOGGER.log($crate::util::log::LogLevel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::util::log::LOGGER.log($crate::util::log::LogLevel::Debug, format_args!($($arg)*))
    };
}
