//! Defines the [`Config`] type, the fully-resolved site settings the build
//! pipeline reads. A [`Config`] is loaded from a `kiln.yaml` project file
//! whose relative directories are resolved against the file's parent.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file [`Config::from_directory`] searches for.
pub const PROJECT_FILE_NAME: &str = "kiln.yaml";

/// The on-disk shape of `kiln.yaml`. Every field has a default so a project
/// file only needs to mention what it changes.
#[derive(Deserialize)]
#[serde(default)]
struct Project {
    site_title: String,
    site_url: Url,
    content_directory: PathBuf,
    output_directory: PathBuf,
    blog_directory: String,
    themes_directory: PathBuf,
    theme_name: String,
    markdown_file_extension: String,
    pretty_permalinks_on_posts: bool,
    pretty_permalinks_on_pages: bool,
    date_format: String,
    sort_posts_by: String,
    sort_pages_by: String,
    sort_posts_reverse: bool,
    sort_pages_reverse: bool,
    required_metadata_fields: Vec<String>,
    markdown_extensions: BTreeMap<String, String>,
    plugins: Vec<String>,
    log_steps: bool,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            site_title: String::from("Kiln"),
            // a literal that always parses
            site_url: Url::parse("http://localhost:8000/").unwrap(),
            content_directory: PathBuf::from("content"),
            output_directory: PathBuf::from("public"),
            blog_directory: String::from("blog"),
            themes_directory: PathBuf::from("themes"),
            theme_name: String::from("default"),
            markdown_file_extension: String::from("md"),
            pretty_permalinks_on_posts: true,
            pretty_permalinks_on_pages: false,
            date_format: String::from("%m/%d/%y at %H:%M"),
            sort_posts_by: String::from("date"),
            sort_pages_by: String::from("title"),
            sort_posts_reverse: false,
            sort_pages_reverse: true,
            required_metadata_fields: vec![String::from("title"), String::from("date")],
            markdown_extensions: BTreeMap::new(),
            plugins: Vec::new(),
            log_steps: false,
        }
    }
}

/// Site settings for a single build. Directory fields are absolute (or at
/// least relative to the process's working directory, never to the project
/// file) by the time a [`Config`] exists.
#[derive(Clone, Debug)]
pub struct Config {
    pub site_title: String,

    /// The absolute root URL of the deployed site. [`crate::content::ContentItem::permalink`]
    /// values are resolved against it.
    pub site_url: Url,

    pub content_directory: PathBuf,
    pub output_directory: PathBuf,

    /// The site-relative directory posts (and the archive) live under.
    pub blog_directory: String,

    pub themes_directory: PathBuf,
    pub theme_name: String,

    /// The extension (without a leading `.`) of content source files.
    pub markdown_file_extension: String,

    pub pretty_permalinks_on_posts: bool,
    pub pretty_permalinks_on_pages: bool,

    /// The `strftime`-style format used to parse every item's `date` field.
    pub date_format: String,

    pub sort_posts_by: String,
    pub sort_pages_by: String,
    pub sort_posts_reverse: bool,
    pub sort_pages_reverse: bool,

    /// Metadata keys every content file must define. May be empty.
    pub required_metadata_fields: Vec<String>,

    /// Maps a markdown extension's install name to its import name. See
    /// [`crate::markdown::Pulldown::with_extensions`].
    pub markdown_extensions: BTreeMap<String, String>,

    /// Identifiers of plugins to install before the build.
    pub plugins: Vec<String>,

    /// Installs the built-in step logger when set.
    pub log_steps: bool,
}

impl Config {
    /// Builds a [`Config`] with every setting at its default, with
    /// directories resolved against `root`.
    pub fn new(root: &Path) -> Config {
        Config::from_project(Project::default(), root)
    }

    /// Looks for [`PROJECT_FILE_NAME`] in `dir` and then in each of its
    /// ancestors, loading the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE_NAME);
        if path.exists() {
            match Config::from_project_file(&path) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            }
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE_NAME
                )),
            }
        }
    }

    /// Loads a [`Config`] from a specific project file.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Ok(Config::from_project(project, project_root)),
        }
    }

    fn from_project(project: Project, root: &Path) -> Config {
        Config {
            site_title: project.site_title,
            site_url: project.site_url,
            content_directory: root.join(project.content_directory),
            output_directory: root.join(project.output_directory),
            blog_directory: project.blog_directory.trim_matches('/').to_owned(),
            themes_directory: root.join(project.themes_directory),
            theme_name: project.theme_name,
            markdown_file_extension: project
                .markdown_file_extension
                .trim_start_matches('.')
                .to_owned(),
            pretty_permalinks_on_posts: project.pretty_permalinks_on_posts,
            pretty_permalinks_on_pages: project.pretty_permalinks_on_pages,
            date_format: project.date_format,
            sort_posts_by: project.sort_posts_by,
            sort_pages_by: project.sort_pages_by,
            sort_posts_reverse: project.sort_posts_reverse,
            sort_pages_reverse: project.sort_pages_reverse,
            required_metadata_fields: project.required_metadata_fields,
            markdown_extensions: project.markdown_extensions,
            plugins: project.plugins,
            log_steps: project.log_steps,
        }
    }

    /// The active theme's directory, `{themes_directory}/{theme_name}`.
    pub fn theme_directory(&self) -> PathBuf {
        self.themes_directory.join(&self.theme_name)
    }

    /// The source directory for static assets, `{content_directory}/static`.
    pub fn static_directory(&self) -> PathBuf {
        self.content_directory.join("static")
    }

    /// Where the post archive is written, `{output_directory}/{blog_directory}/archive`.
    pub fn archive_directory(&self) -> PathBuf {
        self.output_directory.join(&self.blog_directory).join("archive")
    }
}
