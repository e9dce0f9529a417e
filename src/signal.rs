//! The event bus: named extension points that observers subscribe to and the
//! pipeline fires at fixed stages. A bus is built once per build, populated
//! before the build starts, and handed to the loader and the renderer.
//!
//! Firing is synchronous. Observers run inline in registration order and an
//! observer's error aborts the build.

use crate::config::Config;
use crate::content::ContentItem;
use crate::markdown::Converted;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The twelve extension points, in before/during/after triples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    BeforeContentLoad,
    DuringContentLoad,
    AfterContentLoad,
    BeforeContentRender,
    DuringContentRender,
    AfterContentRender,
    BeforeRenderIndex,
    DuringRenderIndex,
    AfterRenderIndex,
    BeforeRenderArchive,
    DuringRenderArchive,
    AfterRenderArchive,
}

impl Signal {
    pub const ALL: [Signal; 12] = [
        Signal::BeforeContentLoad,
        Signal::DuringContentLoad,
        Signal::AfterContentLoad,
        Signal::BeforeContentRender,
        Signal::DuringContentRender,
        Signal::AfterContentRender,
        Signal::BeforeRenderIndex,
        Signal::DuringRenderIndex,
        Signal::AfterRenderIndex,
        Signal::BeforeRenderArchive,
        Signal::DuringRenderArchive,
        Signal::AfterRenderArchive,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Signal::BeforeContentLoad => "before_content_load",
            Signal::DuringContentLoad => "during_content_load",
            Signal::AfterContentLoad => "after_content_load",
            Signal::BeforeContentRender => "before_content_render",
            Signal::DuringContentRender => "during_content_render",
            Signal::AfterContentRender => "after_content_render",
            Signal::BeforeRenderIndex => "before_render_index",
            Signal::DuringRenderIndex => "during_render_index",
            Signal::AfterRenderIndex => "after_render_index",
            Signal::BeforeRenderArchive => "before_render_archive",
            Signal::DuringRenderArchive => "during_render_archive",
            Signal::AfterRenderArchive => "after_render_archive",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Signal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Signal::ALL
            .iter()
            .copied()
            .find(|signal| signal.name() == s)
            .ok_or_else(|| Error::UnknownSignal(s.to_owned()))
    }
}

/// What an observer gets to see when a signal fires.
#[derive(Clone, Copy, Debug)]
pub enum Context<'a> {
    /// The whole build's state. Used for every `before_*`/`after_*` signal
    /// and for the index and archive `during_*` signals.
    Site(Site<'a>),

    /// A file that has been converted but not yet validated
    /// (`during_content_load`).
    Loading {
        source_path: &'a Path,
        converted: &'a Converted,
    },

    /// The item about to be written (`during_content_render`).
    Item(&'a ContentItem),
}

/// A read-only view of the build state.
#[derive(Clone, Copy, Debug)]
pub struct Site<'a> {
    pub config: &'a Config,

    /// Everything loaded so far, in load order.
    pub content: &'a [ContentItem],

    /// Sorted posts. Empty until content is sorted.
    pub posts: &'a [&'a ContentItem],

    /// Sorted pages. Empty until content is sorted.
    pub pages: &'a [&'a ContentItem],
}

impl<'a> Site<'a> {
    /// A view with loaded content but no sorted views yet.
    pub fn loading(config: &'a Config, content: &'a [ContentItem]) -> Site<'a> {
        Site {
            config,
            content,
            posts: &[],
            pages: &[],
        }
    }
}

/// The error type observers return.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// A subscriber to a [`Signal`].
pub type Observer = Box<dyn Fn(Signal, &Context) -> std::result::Result<(), ObserverError>>;

/// A set of signals and their observers.
#[derive(Default)]
pub struct EventBus {
    observers: HashMap<Signal, Vec<Observer>>,
}

impl EventBus {
    pub fn new() -> EventBus {
        EventBus::default()
    }

    /// Subscribes `observer` to the signal called `name`. Fails if no signal
    /// has that name.
    pub fn subscribe<F>(&mut self, name: &str, observer: F) -> Result<()>
    where
        F: Fn(Signal, &Context) -> std::result::Result<(), ObserverError> + 'static,
    {
        let signal = name.parse::<Signal>()?;
        self.connect(signal, observer);
        Ok(())
    }

    /// Subscribes `observer` to `signal`.
    pub fn connect<F>(&mut self, signal: Signal, observer: F)
    where
        F: Fn(Signal, &Context) -> std::result::Result<(), ObserverError> + 'static,
    {
        self.observers
            .entry(signal)
            .or_insert_with(Vec::new)
            .push(Box::new(observer));
    }

    /// The number of observers subscribed to `signal`.
    pub fn observer_count(&self, signal: Signal) -> usize {
        self.observers.get(&signal).map_or(0, Vec::len)
    }

    /// Runs every observer of `signal` in registration order, stopping at
    /// the first failure.
    pub fn fire(&self, signal: Signal, context: &Context) -> Result<()> {
        if let Some(observers) = self.observers.get(&signal) {
            log::debug!("firing `{}` to {} observer(s)", signal, observers.len());
            for observer in observers {
                observer(signal, context).map_err(|err| Error::Observer { signal, err })?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut map = f.debug_map();
        for signal in Signal::ALL.iter() {
            let count = self.observer_count(*signal);
            if count > 0 {
                map.entry(&signal.name(), &count);
            }
        }
        map.finish()
    }
}

/// The result of a fallible event bus operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error subscribing to or firing a signal.
#[derive(Debug)]
pub enum Error {
    /// Returned when subscribing to a signal name that doesn't exist.
    UnknownSignal(String),

    /// Returned when an observer fails.
    Observer { signal: Signal, err: ObserverError },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownSignal(name) => write!(f, "unknown signal `{}`", name),
            Error::Observer { signal, err } => {
                write!(f, "observer of `{}` failed: {}", signal, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UnknownSignal(_) => None,
            Error::Observer { signal: _, err } => Some(err.as_ref()),
        }
    }
}
