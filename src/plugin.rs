//! Plugins extend a build by subscribing to signals. A plugin is anything
//! implementing [`Plugin`]; a [`Registry`] maps identifiers to plugins so
//! the identifiers listed in the config can be resolved and installed on an
//! [`EventBus`] before the build starts.

use crate::signal::{self, Context, EventBus, Signal};
use std::collections::BTreeMap;
use std::fmt;

/// Something that can subscribe observers to an [`EventBus`].
pub trait Plugin {
    fn register(&self, bus: &mut EventBus) -> signal::Result<()>;
}

impl<F> Plugin for F
where
    F: Fn(&mut EventBus) -> signal::Result<()>,
{
    fn register(&self, bus: &mut EventBus) -> signal::Result<()> {
        self(bus)
    }
}

/// Maps plugin identifiers to plugins.
pub struct Registry {
    plugins: BTreeMap<String, Box<dyn Plugin>>,
}

impl Default for Registry {
    /// A registry holding the built-in plugins.
    fn default() -> Self {
        let mut registry = Registry::empty();
        registry.add(STEP_LOGGER, StepLogger);
        registry
    }
}

impl Registry {
    /// A registry with no plugins at all.
    pub fn empty() -> Registry {
        Registry {
            plugins: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) the plugin called `name`.
    pub fn add<P: Plugin + 'static>(&mut self, name: &str, plugin: P) {
        self.plugins.insert(name.to_owned(), Box::new(plugin));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Registers each named plugin on `bus`, in order. Fails on the first
    /// name with no plugin, before registering anything.
    pub fn install<S: AsRef<str>>(&self, names: &[S], bus: &mut EventBus) -> Result<()> {
        let mut plugins = Vec::with_capacity(names.len());
        for name in names {
            match self.plugins.get(name.as_ref()) {
                Some(plugin) => plugins.push((name.as_ref(), plugin)),
                None => return Err(Error::UnknownPlugin(name.as_ref().to_owned())),
            }
        }
        for (name, plugin) in plugins {
            log::debug!("installing plugin `{}`", name);
            plugin.register(bus).map_err(|err| Error::Register {
                plugin: name.to_owned(),
                err,
            })?;
        }
        Ok(())
    }
}

/// The identifier of the [`StepLogger`] plugin.
pub const STEP_LOGGER: &str = "step_logger";

/// Logs every pipeline stage at `info` level.
pub struct StepLogger;

impl Plugin for StepLogger {
    fn register(&self, bus: &mut EventBus) -> signal::Result<()> {
        for signal in Signal::ALL.iter() {
            bus.connect(*signal, |signal, context| {
                match context {
                    Context::Site(site) => log::info!(
                        "{}: {} item(s), {} post(s), {} page(s)",
                        signal,
                        site.content.len(),
                        site.posts.len(),
                        site.pages.len()
                    ),
                    Context::Loading { source_path, .. } => {
                        log::info!("{}: {}", signal, source_path.display())
                    }
                    Context::Item(item) => {
                        log::info!("{}: {}", signal, item.output_file().display())
                    }
                }
                Ok(())
            });
        }
        Ok(())
    }
}

/// The result of a fallible plugin operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error installing plugins.
#[derive(Debug)]
pub enum Error {
    /// Returned when a configured plugin identifier isn't registered.
    UnknownPlugin(String),

    /// Returned when a plugin fails to register its observers.
    Register { plugin: String, err: signal::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownPlugin(name) => write!(f, "unknown plugin `{}`", name),
            Error::Register { plugin, err } => {
                write!(f, "registering plugin `{}`: {}", plugin, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UnknownPlugin(_) => None,
            Error::Register { err, .. } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn greeter(bus: &mut EventBus) -> signal::Result<()> {
        bus.subscribe("during_content_load", |_, _| Ok(()))
    }

    fn broken(bus: &mut EventBus) -> signal::Result<()> {
        bus.subscribe("during_lunch", |_, _| Ok(()))
    }

    #[test]
    fn test_install_resolves_names() -> Result<()> {
        let mut registry = Registry::default();
        registry.add("greeter", greeter);
        assert_eq!(vec!["greeter", STEP_LOGGER], registry.names().collect::<Vec<_>>());

        let mut bus = EventBus::new();
        registry.install(&["greeter", STEP_LOGGER], &mut bus)?;
        assert_eq!(2, bus.observer_count(Signal::DuringContentLoad));
        assert_eq!(1, bus.observer_count(Signal::AfterRenderArchive));
        Ok(())
    }

    #[test]
    fn test_unknown_plugin_installs_nothing() {
        let mut registry = Registry::default();
        registry.add("greeter", greeter);
        let mut bus = EventBus::new();
        match registry.install(&["greeter", "missing"], &mut bus) {
            Err(Error::UnknownPlugin(name)) => assert_eq!("missing", name),
            other => panic!("wanted UnknownPlugin; found {:?}", other),
        }
        assert_eq!(0, bus.observer_count(Signal::DuringContentLoad));
    }

    #[test]
    fn test_registration_failure_names_plugin() {
        let mut registry = Registry::empty();
        registry.add("broken", broken);
        let mut bus = EventBus::new();
        match registry.install(&["broken"], &mut bus) {
            Err(Error::Register { plugin, err: signal::Error::UnknownSignal(name) }) => {
                assert_eq!("broken", plugin);
                assert_eq!("during_lunch", name);
            }
            other => panic!("wanted Register; found {:?}", other),
        }
    }
}
