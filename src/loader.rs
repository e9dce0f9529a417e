//! Defines the [`Loader`], which discovers content source files, converts
//! them with a [`MarkdownAdapter`], validates their metadata, and assembles
//! them into [`ContentItem`]s. Loading is fail-fast: the first bad file
//! aborts the whole load.

use crate::config::Config;
use crate::content::{self, ContentItem, ContentType, UnknownContentType};
use crate::markdown::{self, Converted, MarkdownAdapter};
use crate::signal::{self, Context, EventBus, Signal, Site};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads the content set for a build.
pub struct Loader<'a> {
    config: &'a Config,
    markdown: &'a dyn MarkdownAdapter,
    bus: &'a EventBus,
}

impl<'a> Loader<'a> {
    pub fn new(
        config: &'a Config,
        markdown: &'a dyn MarkdownAdapter,
        bus: &'a EventBus,
    ) -> Loader<'a> {
        Loader {
            config,
            markdown,
            bus,
        }
    }

    /// Loads every file under the content directory whose extension matches
    /// the configured markdown extension. The returned items are in
    /// discovery order, which depends on the filesystem; callers that care
    /// about order sort afterwards (see [`crate::sort`]).
    ///
    /// Fires `before_content_load` once up front, `during_content_load` for
    /// each file between conversion and validation, and `after_content_load`
    /// once at the end.
    ///
    /// Two items may not share an output directory, and no item may land
    /// where the index or archive page is written.
    pub fn load(&self) -> Result<Vec<ContentItem>> {
        let mut content: Vec<ContentItem> = Vec::new();
        self.bus.fire(
            Signal::BeforeContentLoad,
            &Context::Site(Site::loading(self.config, &content)),
        )?;

        let mut claimed = self.reserved_outputs();
        for path in self.source_files()? {
            log::debug!("loading `{}`", path.display());
            let item = self.load_file(&path)?;
            if let Some(claimed_by) = claimed.insert(
                item.output_directory.clone(),
                format!("`{}`", item.source_path.display()),
            ) {
                return Err(Error::OutputConflict {
                    path,
                    output_directory: item.output_directory,
                    claimed_by,
                });
            }
            content.push(item);
        }

        self.bus.fire(
            Signal::AfterContentLoad,
            &Context::Site(Site::loading(self.config, &content)),
        )?;
        log::info!("loaded {} content file(s)", content.len());
        Ok(content)
    }

    fn reserved_outputs(&self) -> HashMap<PathBuf, String> {
        let mut reserved = HashMap::new();
        reserved.insert(self.config.output_directory.clone(), "the index page".to_owned());
        reserved.insert(self.config.archive_directory(), "the post archive".to_owned());
        reserved
    }

    fn source_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        // skip the static tree; it's copied verbatim, not loaded
        let static_directory = self.config.static_directory();
        let walker = WalkDir::new(&self.config.content_directory)
            .into_iter()
            .filter_entry(|entry| entry.path() != static_directory.as_path());
        for result in walker {
            let entry = result?;
            if entry.file_type().is_file()
                && entry.path().extension().map_or(false, |ext| {
                    ext.to_string_lossy() == self.config.markdown_file_extension
                })
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Loads a single [`ContentItem`] from `path`.
    pub fn load_file(&self, path: &Path) -> Result<ContentItem> {
        use std::io::Read;
        let mut text = String::new();
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut text))
            .map_err(|err| Error::Io {
                path: path.to_owned(),
                err,
            })?;

        let converted = self.markdown.convert(&text).map_err(|err| Error::Markdown {
            path: path.to_owned(),
            err,
        })?;
        self.bus.fire(
            Signal::DuringContentLoad,
            &Context::Loading {
                source_path: path,
                converted: &converted,
            },
        )?;

        self.validate(path, &converted)?;
        self.assemble(path, converted)
    }

    /// Checks the configured required fields, in order, by key membership.
    fn validate(&self, path: &Path, converted: &Converted) -> Result<()> {
        if self.config.required_metadata_fields.is_empty() {
            return Ok(());
        }
        if converted.metadata.is_empty() {
            return Err(Error::MissingMetadata(path.to_owned()));
        }
        match self
            .config
            .required_metadata_fields
            .iter()
            .find(|field| !converted.metadata.contains_key(field.as_str()))
        {
            Some(field) => Err(Error::MissingRequiredField {
                path: path.to_owned(),
                field: field.clone(),
            }),
            None => Ok(()),
        }
    }

    fn assemble(&self, path: &Path, converted: Converted) -> Result<ContentItem> {
        let Converted { html, metadata } = converted;
        let field = |name: &str| {
            metadata
                .get(name)
                .ok_or_else(|| Error::MissingRequiredField {
                    path: path.to_owned(),
                    field: name.to_owned(),
                })
        };

        let raw_date = field("date")?;
        let date = content::parse_date(raw_date, &self.config.date_format).map_err(|err| {
            Error::InvalidDate {
                path: path.to_owned(),
                value: raw_date.clone(),
                format: self.config.date_format.clone(),
                err,
            }
        })?;
        let readable_date = date
            .format(&content::readable_format(&self.config.date_format))
            .to_string();

        let content_type = field("type")?
            .parse::<ContentType>()
            .map_err(|UnknownContentType(value)| Error::UnknownContentType {
                path: path.to_owned(),
                value,
            })?;

        let slug = content::derive_slug(&self.config.content_directory, path)
            .ok_or_else(|| Error::EmptySlug(path.to_owned()))?;
        let location = content::locate(self.config, content_type, &date, &slug);
        let permalink = content::permalink(&self.config.site_url, &location.url)
            .map_err(|err| Error::UrlParse {
                path: path.to_owned(),
                err,
            })?;

        Ok(ContentItem {
            source_path: path.to_owned(),
            metadata,
            content_type,
            html,
            date,
            readable_date,
            slug,
            output_directory: location.output_directory,
            url: location.url,
            permalink,
        })
    }
}

/// The result of a fallible load operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading content. Every variant that concerns a single
/// file names it.
#[derive(Debug)]
pub enum Error {
    /// Returned when metadata fields are required but the file has no
    /// metadata at all.
    MissingMetadata(PathBuf),

    /// Returned when the file's metadata lacks a required field.
    MissingRequiredField { path: PathBuf, field: String },

    /// Returned when the `date` field doesn't match the configured format.
    InvalidDate {
        path: PathBuf,
        value: String,
        format: String,
        err: chrono::ParseError,
    },

    /// Returned when the `type` field is neither `post` nor `page`.
    UnknownContentType { path: PathBuf, value: String },

    /// Returned when the file name has nothing to build a slug from.
    EmptySlug(PathBuf),

    /// Returned when the file would be written over another item's page, the
    /// index page, or the post archive.
    OutputConflict {
        path: PathBuf,
        output_directory: PathBuf,
        claimed_by: String,
    },

    /// Returned when the markdown adapter rejects the file.
    Markdown { path: PathBuf, err: markdown::Error },

    /// Returned when the item's permalink can't be built.
    UrlParse { path: PathBuf, err: url::ParseError },

    /// Returned when a file can't be read.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned for errors walking the content directory.
    WalkDir(walkdir::Error),

    /// Returned when an observer fails.
    Signal(signal::Error),
}

impl Error {
    /// The source file the error concerns, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::MissingMetadata(path)
            | Error::MissingRequiredField { path, .. }
            | Error::InvalidDate { path, .. }
            | Error::UnknownContentType { path, .. }
            | Error::EmptySlug(path)
            | Error::OutputConflict { path, .. }
            | Error::Markdown { path, .. }
            | Error::UrlParse { path, .. }
            | Error::Io { path, .. } => Some(path),
            Error::WalkDir(err) => err.path(),
            Error::Signal(_) => None,
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingMetadata(path) => {
                write!(f, "The file `{}` does not contain any metadata", path.display())
            }
            Error::MissingRequiredField { path, field } => write!(
                f,
                "The file `{}` is missing the required metadata: {}",
                path.display(),
                field
            ),
            Error::InvalidDate {
                path,
                value,
                format,
                err,
            } => write!(
                f,
                "The file `{}` has date `{}` which doesn't match `{}`: {}",
                path.display(),
                value,
                format,
                err
            ),
            Error::UnknownContentType { path, value } => write!(
                f,
                "The file `{}` has {}",
                path.display(),
                UnknownContentType(value.clone())
            ),
            Error::EmptySlug(path) => write!(
                f,
                "The file name of `{}` has no characters usable in a URL",
                path.display()
            ),
            Error::OutputConflict {
                path,
                output_directory,
                claimed_by,
            } => write!(
                f,
                "The file `{}` would be written to `{}`, which is already taken by {}",
                path.display(),
                output_directory.display(),
                claimed_by
            ),
            Error::Markdown { path, err } => {
                write!(f, "converting `{}`: {}", path.display(), err)
            }
            Error::UrlParse { path, err } => {
                write!(f, "building the URL for `{}`: {}", path.display(), err)
            }
            Error::Io { path, err } => write!(f, "reading `{}`: {}", path.display(), err),
            Error::WalkDir(err) => err.fmt(f),
            Error::Signal(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingMetadata(_) => None,
            Error::MissingRequiredField { .. } => None,
            Error::InvalidDate { err, .. } => Some(err),
            Error::UnknownContentType { .. } => None,
            Error::EmptySlug(_) => None,
            Error::OutputConflict { .. } => None,
            Error::Markdown { err, .. } => Some(err),
            Error::UrlParse { err, .. } => Some(err),
            Error::Io { err, .. } => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Signal(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator while walking the content directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<signal::Error> for Error {
    /// Converts a [`signal::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator when firing signals.
    fn from(err: signal::Error) -> Error {
        Error::Signal(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::markdown::Pulldown;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> std::io::Result<(TempDir, Config)> {
        let dir = TempDir::new()?;
        let config = Config::new(dir.path());
        for (relative, text) in files {
            let path = config.content_directory.join(relative);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, text)?;
        }
        Ok((dir, config))
    }

    fn load(config: &Config) -> Result<Vec<ContentItem>> {
        Loader::new(config, &Pulldown::default(), &EventBus::new()).load()
    }

    #[test]
    fn test_load_post() -> Result<()> {
        let (_dir, config) = site(&[(
            "posts/hi.md",
            "---\ntitle: Hi\ndate: 01/02/21 at 10:00\ntype: post\n---\nHello *there*.\n",
        )])
        .unwrap();

        let content = load(&config)?;
        assert_eq!(1, content.len());
        let item = &content[0];
        assert_eq!(ContentType::Post, item.content_type);
        assert_eq!("hi", item.slug);
        assert_eq!("blog/hi", item.url);
        assert_eq!(config.output_directory.join("blog").join("hi"), item.output_directory);
        assert_eq!("01/02/21 at 10:00 AM", item.readable_date);
        assert_eq!("<p>Hello <em>there</em>.</p>\n", item.html);
        assert_eq!("http://localhost:8000/blog/hi/", item.permalink.as_str());
        Ok(())
    }

    #[test]
    fn test_load_page_named_after_a_type_directory() -> Result<()> {
        let (_dir, mut config) = site(&[(
            "pages/posts.md",
            "---\ntitle: My Posts Page\ndate: 01/02/21 at 10:00\ntype: page\n---\n",
        )])
        .unwrap();
        config.pretty_permalinks_on_pages = true;

        let content = load(&config)?;
        assert_eq!(1, content.len());
        assert_eq!("posts", content[0].slug);
        assert_eq!("posts", content[0].url);
        assert_eq!(config.output_directory.join("posts"), content[0].output_directory);
        Ok(())
    }

    #[test]
    fn test_unsluggable_file_name() {
        let (_dir, config) = site(&[(
            "posts/!!!.md",
            "---\ntitle: Bang\ndate: 01/02/21 at 10:00\ntype: post\n---\n",
        )])
        .unwrap();
        match load(&config) {
            Err(Error::EmptySlug(path)) => assert!(path.ends_with("posts/!!!.md")),
            other => panic!("wanted EmptySlug; found {:?}", other),
        }
    }

    #[test]
    fn test_post_cannot_replace_archive() {
        let (_dir, config) = site(&[(
            "posts/archive.md",
            "---\ntitle: Archive\ndate: 01/02/21 at 10:00\ntype: post\n---\n",
        )])
        .unwrap();
        match load(&config) {
            Err(Error::OutputConflict {
                output_directory,
                claimed_by,
                ..
            }) => {
                assert_eq!(config.archive_directory(), output_directory);
                assert_eq!("the post archive", claimed_by);
            }
            other => panic!("wanted OutputConflict; found {:?}", other),
        }
    }

    #[test]
    fn test_items_cannot_share_output() {
        let page = "---\ntitle: A\ndate: 01/02/21 at 10:00\ntype: page\n---\n";
        let (_dir, mut config) = site(&[("pages/a b.md", page), ("pages/a-b.md", page)]).unwrap();
        config.pretty_permalinks_on_pages = true;
        match load(&config) {
            Err(Error::OutputConflict {
                output_directory, ..
            }) => assert_eq!(config.output_directory.join("a-b"), output_directory),
            other => panic!("wanted OutputConflict; found {:?}", other),
        }
    }

    #[test]
    fn test_load_ignores_other_extensions_and_static() -> Result<()> {
        let (_dir, config) = site(&[
            ("pages/about.md", "---\ntitle: About\ndate: 01/02/21 at 10:00\ntype: page\n---\n"),
            ("pages/notes.txt", "not content"),
            ("static/readme.md", "no front matter here"),
        ])
        .unwrap();

        let content = load(&config)?;
        assert_eq!(1, content.len());
        assert_eq!("2021/01/02/about", content[0].url);
        Ok(())
    }

    #[test]
    fn test_missing_required_field_names_field() {
        let (_dir, config) = site(&[("posts/x.md", "---\ntitle: X\ntype: post\n---\n")]).unwrap();
        match load(&config) {
            Err(Error::MissingRequiredField { path, field }) => {
                assert_eq!("date", field);
                assert!(path.ends_with("posts/x.md"));
            }
            other => panic!("wanted MissingRequiredField; found {:?}", other),
        }
    }

    #[test]
    fn test_missing_metadata() {
        let (_dir, config) = site(&[("posts/x.md", "no front matter\n")]).unwrap();
        match load(&config) {
            Err(Error::MissingMetadata(path)) => assert!(path.ends_with("posts/x.md")),
            other => panic!("wanted MissingMetadata; found {:?}", other),
        }
    }

    #[test]
    fn test_required_fields_checked_in_order() {
        let (_dir, mut config) = site(&[("posts/x.md", "---\ntype: post\n---\n")]).unwrap();
        config.required_metadata_fields = vec!["author".to_owned(), "title".to_owned()];
        match load(&config) {
            Err(Error::MissingRequiredField { field, .. }) => assert_eq!("author", field),
            other => panic!("wanted MissingRequiredField; found {:?}", other),
        }
    }

    #[test]
    fn test_invalid_date() {
        let (_dir, config) = site(&[(
            "posts/x.md",
            "---\ntitle: X\ndate: 2021-01-02\ntype: post\n---\n",
        )])
        .unwrap();
        match load(&config) {
            Err(err @ Error::InvalidDate { .. }) => {
                assert!(err.path().unwrap().ends_with("posts/x.md"));
                assert!(err.to_string().contains("2021-01-02"));
            }
            other => panic!("wanted InvalidDate; found {:?}", other),
        }
    }

    #[test]
    fn test_unknown_content_type() {
        let (_dir, config) = site(&[(
            "posts/x.md",
            "---\ntitle: X\ndate: 01/02/21 at 10:00\ntype: gallery\n---\n",
        )])
        .unwrap();
        match load(&config) {
            Err(Error::UnknownContentType { value, .. }) => assert_eq!("gallery", value),
            other => panic!("wanted UnknownContentType; found {:?}", other),
        }
    }

    #[test]
    fn test_no_required_fields_still_needs_date_and_type() {
        let (_dir, mut config) =
            site(&[("pages/x.md", "---\ndate: 01/02/21 at 10:00\n---\n")]).unwrap();
        config.required_metadata_fields.clear();
        match load(&config) {
            Err(Error::MissingRequiredField { field, .. }) => assert_eq!("type", field),
            other => panic!("wanted MissingRequiredField; found {:?}", other),
        }
    }

    #[test]
    fn test_load_signals() -> Result<()> {
        let (_dir, config) = site(&[(
            "posts/hi.md",
            "---\ntitle: Hi\ndate: 01/02/21 at 10:00\ntype: post\n---\n",
        )])
        .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for signal in &[
            Signal::BeforeContentLoad,
            Signal::DuringContentLoad,
            Signal::AfterContentLoad,
        ] {
            let seen = Rc::clone(&seen);
            bus.connect(*signal, move |signal, context| {
                let detail = match context {
                    Context::Site(site) => format!("{} items", site.content.len()),
                    Context::Loading { converted, .. } => converted.metadata["title"].clone(),
                    Context::Item(item) => item.slug.clone(),
                };
                seen.borrow_mut().push(format!("{}: {}", signal, detail));
                Ok(())
            });
        }

        Loader::new(&config, &Pulldown::default(), &bus).load()?;
        assert_eq!(
            vec![
                "before_content_load: 0 items",
                "during_content_load: Hi",
                "after_content_load: 1 items",
            ],
            *seen.borrow()
        );
        Ok(())
    }

    #[test]
    fn test_during_load_observer_can_abort() {
        let (_dir, config) = site(&[(
            "posts/hi.md",
            "---\ntitle: Hi\ndate: 01/02/21 at 10:00\ntype: post\n---\n",
        )])
        .unwrap();
        let mut bus = EventBus::new();
        bus.connect(Signal::DuringContentLoad, |_, _| Err("rejected".into()));
        match Loader::new(&config, &Pulldown::default(), &bus).load() {
            Err(Error::Signal(signal::Error::Observer { signal, .. })) => {
                assert_eq!(Signal::DuringContentLoad, signal)
            }
            other => panic!("wanted an observer error; found {:?}", other),
        }
    }
}
