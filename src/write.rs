//! Defines the [`Renderer`], which templates [`ContentItem`]s, the index
//! page, and the post archive and writes them under the output directory.
//! Output is not transactional: a failure leaves whatever was already
//! written on disk.

use crate::config::Config;
use crate::content::ContentItem;
use crate::signal::{self, Context, EventBus, Signal, Site};
use crate::theme::{self, Templates};
use crate::util;
use crate::value;
use gtmpl::Value;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Responsible for templating and writing every output page.
pub struct Renderer<'a> {
    pub config: &'a Config,

    /// Provides `post.html`, `page.html`, `index.html`, and `archive.html`.
    pub templates: &'a dyn Templates,

    pub bus: &'a EventBus,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a Config, templates: &'a dyn Templates, bus: &'a EventBus) -> Self {
        Renderer {
            config,
            templates,
            bus,
        }
    }

    /// Writes every item page (then copies static assets), the index page,
    /// and the archive page, in that order.
    pub fn render(
        &self,
        content: &[ContentItem],
        posts: &[&ContentItem],
        pages: &[&ContentItem],
    ) -> Result<()> {
        let site = Site {
            config: self.config,
            content,
            posts,
            pages,
        };
        self.render_content(&site)?;
        self.render_index(&site)?;
        self.render_archive(&site)?;
        Ok(())
    }

    /// Writes `{item.output_directory}/index.html` for every item using the
    /// template for its type, then copies the static directory into the
    /// output directory.
    pub fn render_content(&self, site: &Site) -> Result<()> {
        self.bus.fire(Signal::BeforeContentRender, &Context::Site(*site))?;

        let site_value = Value::from(site);
        let config_value = Value::from(self.config);
        for item in site.content {
            let template = item.content_type.template_name();
            self.bus.fire(Signal::DuringContentRender, &Context::Item(item))?;

            let mut bindings = HashMap::new();
            bindings.insert("this".to_owned(), Value::from(item));
            bindings.insert("config".to_owned(), config_value.clone());
            bindings.insert("site".to_owned(), site_value.clone());
            let html = self.templates.render(template, bindings)?;
            write_page(&item.output_directory, &html)?;
            log::debug!("wrote `{}`", item.output_file().display());
        }

        self.copy_static()?;
        self.bus.fire(Signal::AfterContentRender, &Context::Site(*site))?;
        log::info!("rendered {} content page(s)", site.content.len());
        Ok(())
    }

    /// Writes `{output_directory}/index.html` from the sorted posts and
    /// pages.
    pub fn render_index(&self, site: &Site) -> Result<()> {
        self.bus.fire(Signal::BeforeRenderIndex, &Context::Site(*site))?;

        let mut bindings = HashMap::new();
        bindings.insert("posts".to_owned(), value::items(site.posts));
        bindings.insert("pages".to_owned(), value::items(site.pages));
        bindings.insert("config".to_owned(), Value::from(self.config));
        bindings.insert("site".to_owned(), Value::from(site));

        self.bus.fire(Signal::DuringRenderIndex, &Context::Site(*site))?;
        let html = self.templates.render("index.html", bindings)?;
        write_page(&self.config.output_directory, &html)?;

        self.bus.fire(Signal::AfterRenderIndex, &Context::Site(*site))?;
        log::info!("rendered the index page");
        Ok(())
    }

    /// Writes `{output_directory}/{blog_directory}/archive/index.html` from
    /// the sorted posts.
    pub fn render_archive(&self, site: &Site) -> Result<()> {
        self.bus.fire(Signal::BeforeRenderArchive, &Context::Site(*site))?;

        let mut bindings = HashMap::new();
        bindings.insert("posts".to_owned(), value::items(site.posts));
        bindings.insert("config".to_owned(), Value::from(self.config));
        bindings.insert("site".to_owned(), Value::from(site));

        self.bus.fire(Signal::DuringRenderArchive, &Context::Site(*site))?;
        let html = self.templates.render("archive.html", bindings)?;
        write_page(&self.config.archive_directory(), &html)?;

        self.bus.fire(Signal::AfterRenderArchive, &Context::Site(*site))?;
        log::info!("rendered the archive page");
        Ok(())
    }

    fn copy_static(&self) -> Result<()> {
        let src = self.config.static_directory();
        if !src.is_dir() {
            log::debug!("no static directory at `{}`", src.display());
            return Ok(());
        }
        let copied = util::copy_tree(&src, &self.config.output_directory).map_err(|err| {
            Error::Io {
                path: src.clone(),
                err,
            }
        })?;
        log::info!(
            "copied {} static file(s) into `{}`",
            copied,
            self.config.output_directory.display()
        );
        Ok(())
    }
}

/// Creates `dir` (and its parents) and writes `html` to `dir/index.html`.
fn write_page(dir: &Path, html: &str) -> Result<()> {
    let file = dir.join("index.html");
    std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&file, html))
        .map_err(|err| Error::Io { path: file, err })
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error finding or executing a template.
    Template(theme::Error),

    /// An error writing an output file or copying a static file.
    Io { path: PathBuf, err: io::Error },

    /// An observer failed.
    Signal(signal::Error),
}

impl From<theme::Error> for Error {
    /// Converts a [`theme::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator for fallible template operations.
    fn from(err: theme::Error) -> Error {
        Error::Template(err)
    }
}

impl From<signal::Error> for Error {
    /// Converts a [`signal::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator when firing signals.
    fn from(err: signal::Error) -> Error {
        Error::Signal(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Io { path, err } => write!(f, "writing `{}`: {}", path.display(), err),
            Error::Signal(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Io { err, .. } => Some(err),
            Error::Signal(err) => Some(err),
        }
    }
}
