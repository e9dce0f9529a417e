//! Bootstraps a new site: a default `kiln.yaml`, the content directory
//! layout, and a minimal default theme. Existing files are never
//! overwritten.

use crate::config::{Config, PROJECT_FILE_NAME};
use crate::content::ContentType;
use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_PROJECT: &str = r#"# All directories are relative to this file.
site_title: Kiln
site_url: http://localhost:8000/

pretty_permalinks_on_posts: true
pretty_permalinks_on_pages: false

sort_posts_by: date
sort_pages_by: title
sort_posts_reverse: false
sort_pages_reverse: true

date_format: "%m/%d/%y at %H:%M"

content_directory: content
output_directory: public
blog_directory: blog

themes_directory: themes
theme_name: default

# Without a leading `.`
markdown_file_extension: md

required_metadata_fields:
  - title
  - date

# install name: import name
markdown_extensions:
  markdown-full-yaml-metadata: full_yaml_metadata
  tables: tables
  footnotes: footnotes

plugins: []
log_steps: false
"#;

const ITEM_TEMPLATE: &str = r#"<!doctype html>
<html>
    <head>
        <title>{{ .this.metadata.title }} | {{ .config.site_title }}</title>
    </head>
    <body>
        <a href="{{ .site.url }}">{{ .config.site_title }}</a>
        <h1>{{ .this.metadata.title }}</h1>
        <p>{{ .this.readable_date }}</p>
        {{ .this.content }}
    </body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"<!doctype html>
<html>
    <head>
        <title>{{ .config.site_title }}</title>
    </head>
    <body>
        <h1>{{ .config.site_title }}</h1>
        <nav>
        {{ range .pages }}
            <a href="{{ .permalink }}">{{ .metadata.title }}</a>
        {{ end }}
        </nav>
        {{ range .posts }}
            <h2><a href="{{ .permalink }}">{{ .metadata.title }}</a></h2>
            {{ .content }}
        {{ end }}
    </body>
</html>
"#;

const ARCHIVE_TEMPLATE: &str = r#"<!doctype html>
<html>
    <head>
        <title>Archive | {{ .config.site_title }}</title>
    </head>
    <body>
        <h1>Archive</h1>
        <ul>
        {{ range .posts }}
            <li>{{ .readable_date }}: <a href="{{ .permalink }}">{{ .metadata.title }}</a></li>
        {{ end }}
        </ul>
    </body>
</html>
"#;

/// The default theme's templates by file name.
pub const DEFAULT_THEME: [(&str, &str); 4] = [
    ("post.html", ITEM_TEMPLATE),
    ("page.html", ITEM_TEMPLATE),
    ("index.html", INDEX_TEMPLATE),
    ("archive.html", ARCHIVE_TEMPLATE),
];

/// Initializes a site in `root` and returns its [`Config`]. Returns the
/// paths of the files it created alongside.
pub fn init_site(root: &Path) -> Result<(Config, Vec<PathBuf>)> {
    let mut created = Vec::new();
    fs::create_dir_all(root).with_context(|| format!("creating `{}`", root.display()))?;
    write_if_absent(&root.join(PROJECT_FILE_NAME), DEFAULT_PROJECT, &mut created)?;

    let config = Config::from_project_file(&root.join(PROJECT_FILE_NAME))?;
    let mut directories: Vec<PathBuf> = ContentType::ALL
        .iter()
        .map(|t| config.content_directory.join(t.plural()))
        .collect();
    directories.push(config.static_directory());
    for dir in &directories {
        fs::create_dir_all(dir).with_context(|| format!("creating `{}`", dir.display()))?;
    }

    write_theme(&config.theme_directory(), &mut created)?;
    Ok((config, created))
}

/// Writes the default theme into `dir`, keeping any template already there.
pub fn write_theme(dir: &Path, created: &mut Vec<PathBuf>) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating `{}`", dir.display()))?;
    for (name, body) in DEFAULT_THEME.iter() {
        write_if_absent(&dir.join(name), body, created)?;
    }
    Ok(())
}

fn write_if_absent(path: &Path, contents: &str, created: &mut Vec<PathBuf>) -> Result<()> {
    if path.exists() {
        log::debug!("keeping existing `{}`", path.display());
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("writing `{}`", path.display()))?;
    created.push(path.to_owned());
    Ok(())
}
