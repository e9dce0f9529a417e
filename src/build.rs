//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output site: loading content ([`crate::loader`]),
//! sorting it ([`crate::sort`]), and rendering item, index, and archive pages
//! plus the static assets ([`crate::write`]).

use crate::config::Config;
use crate::loader::{Error as LoadError, Loader};
use crate::markdown::{MarkdownAdapter, Pulldown};
use crate::plugin::{Error as PluginError, Registry, STEP_LOGGER};
use crate::signal::EventBus;
use crate::sort::partition_and_sort;
use crate::theme::{Error as ThemeError, Templates, Theme};
use crate::util;
use crate::write::{Error as WriteError, Renderer};
use std::fmt;
use std::path::PathBuf;

/// What a successful build produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub posts: usize,
    pub pages: usize,
    pub output_directory: PathBuf,
}

/// Builds an [`EventBus`] with the plugins `config` asks for installed: every
/// identifier in `plugins`, plus the step logger when `log_steps` is set.
pub fn event_bus(config: &Config, registry: &Registry) -> Result<EventBus> {
    let mut names: Vec<&str> = config.plugins.iter().map(String::as_str).collect();
    if config.log_steps && !names.contains(&STEP_LOGGER) {
        names.push(STEP_LOGGER);
    }
    let mut bus = EventBus::new();
    registry.install(&names, &mut bus)?;
    Ok(bus)
}

/// Builds the site described by `config` with the stock markdown adapter
/// and the configured theme. Observers on `bus` see every stage.
pub fn build_site(config: &Config, bus: &EventBus) -> Result<Summary> {
    let markdown = Pulldown::with_extensions(&config.markdown_extensions);
    let theme = Theme::load(&config.theme_directory())?;
    build_site_with(config, &markdown, &theme, bus)
}

/// Builds the site with the given markdown adapter and templates. The output
/// directory is emptied first. Any failure stops the build immediately and
/// leaves already-written output in place.
pub fn build_site_with(
    config: &Config,
    markdown: &dyn MarkdownAdapter,
    templates: &dyn Templates,
    bus: &EventBus,
) -> Result<Summary> {
    util::recreate_dir(&config.output_directory).map_err(|err| Error::Clean {
        path: config.output_directory.clone(),
        err,
    })?;

    log::info!("loading content from `{}`", config.content_directory.display());
    let content = Loader::new(config, markdown, bus).load()?;
    let (posts, pages) = partition_and_sort(&content, config);

    log::info!("rendering {} post(s) and {} page(s)", posts.len(), pages.len());
    Renderer::new(config, templates, bus).render(&content, &posts, &pages)?;

    Ok(Summary {
        posts: posts.len(),
        pages: pages.len(),
        output_directory: config.output_directory.clone(),
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during loading,
/// writing, cleaning the output directory, loading the theme, and
/// installing plugins.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading content.
    Load(LoadError),

    /// Returned for errors rendering pages to disk.
    Write(WriteError),

    /// Returned for errors loading the theme.
    Theme(ThemeError),

    /// Returned for errors installing plugins.
    Plugin(PluginError),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Load(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Theme(err) => err.fmt(f),
            Error::Plugin(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Load(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Theme(err) => Some(err),
            Error::Plugin(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
        }
    }
}

impl From<LoadError> for Error {
    /// Converts [`LoadError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: LoadError) -> Error {
        Error::Load(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<ThemeError> for Error {
    /// Converts [`ThemeError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ThemeError) -> Error {
        Error::Theme(err)
    }
}

impl From<PluginError> for Error {
    /// Converts [`PluginError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: PluginError) -> Error {
        Error::Plugin(err)
    }
}
