//! Status events for the presentation layer.
//!
//! Every event carries its level and the file it belongs to, so consumers never
//! need to scan printed text. `StatusStream` renders the line protocol
//! (`✓` success, `!` warning, `×` error) for shells that still expect it.

use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn sigil(self) -> char {
        match self {
            Level::Success => '✓',
            Level::Warning => '!',
            Level::Error => '×',
        }
    }

    fn log_level(self) -> log::Level {
        match self {
            Level::Success => log::Level::Info,
            Level::Warning => log::Level::Warn,
            Level::Error => log::Level::Error,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub level: Level,
    pub filename: String,
    pub message: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.level.sigil(), self.filename, self.message)
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, level: Level, filename: &str, message: &str);
}

/// Writes one sigil-prefixed line per event.
pub struct StatusStream<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> StatusStream<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> EventSink for StatusStream<W> {
    fn emit(&self, level: Level, filename: &str, message: &str) {
        let event = Event {
            level,
            filename: filename.to_string(),
            message: message.to_string(),
        };
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{event}") {
            log::warn!("status stream write failed: {e}");
        }
    }
}

/// Keeps every event in memory; buckets files into success and error sets.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn for_file(&self, filename: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.filename == filename)
            .collect()
    }

    pub fn error_files(&self) -> BTreeSet<String> {
        self.events()
            .into_iter()
            .filter(|e| e.level == Level::Error)
            .map(|e| e.filename)
            .collect()
    }

    /// Files with a success event and no error event.
    pub fn success_files(&self) -> BTreeSet<String> {
        let errors = self.error_files();
        self.events()
            .into_iter()
            .filter(|e| e.level == Level::Success && !errors.contains(&e.filename))
            .map(|e| e.filename)
            .collect()
    }
}

impl EventSink for EventLog {
    fn emit(&self, level: Level, filename: &str, message: &str) {
        let event = Event {
            level,
            filename: filename.to_string(),
            message: message.to_string(),
        };
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Forwards every event to several sinks.
pub struct Fanout<'a> {
    sinks: Vec<&'a dyn EventSink>,
}

impl<'a> Fanout<'a> {
    pub fn new(sinks: Vec<&'a dyn EventSink>) -> Self {
        Self { sinks }
    }
}

impl EventSink for Fanout<'_> {
    fn emit(&self, level: Level, filename: &str, message: &str) {
        for sink in &self.sinks {
            sink.emit(level, filename, message);
        }
    }
}

/// Event emitter bound to the file currently being processed; mirrors each
/// event to the `log` facade.
#[derive(Clone, Copy)]
pub struct FileEvents<'a> {
    sink: &'a dyn EventSink,
    filename: &'a str,
}

impl<'a> FileEvents<'a> {
    pub fn new(sink: &'a dyn EventSink, filename: &'a str) -> Self {
        Self { sink, filename }
    }

    pub fn emit(&self, level: Level, message: &str) {
        log::log!(level.log_level(), "{} {}: {message}", level.sigil(), self.filename);
        self.sink.emit(level, self.filename, message);
    }

    pub fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    pub fn warning(&self, message: &str) {
        self.emit(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }
}
