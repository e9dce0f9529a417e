//! Defines [`ContentItem`], the record produced for each source file, along
//! with the rules that derive an item's date, slug, output directory, and
//! URL from its source path and metadata.

use crate::config::Config;
use chrono::{Datelike, NaiveDate, NaiveDateTime, ParseResult};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Flat front matter: field name to value.
pub type Metadata = BTreeMap<String, String>;

/// The closed set of content types. An item's type comes from its `type`
/// metadata field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentType {
    Post,
    Page,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [ContentType::Post, ContentType::Page];

    /// The value of the `type` field and the theme template's base name.
    pub fn name(self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Page => "page",
        }
    }

    /// The directory under the content root holding sources of this type.
    pub fn plural(self) -> &'static str {
        match self {
            ContentType::Post => "posts",
            ContentType::Page => "pages",
        }
    }

    /// The theme template used to render items of this type.
    pub fn template_name(self) -> &'static str {
        match self {
            ContentType::Post => "post.html",
            ContentType::Page => "page.html",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentType::Post),
            "page" => Ok(ContentType::Page),
            _ => Err(UnknownContentType(s.to_owned())),
        }
    }
}

/// Returned when a `type` field names something other than `post` or
/// `page`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownContentType(pub String);

impl fmt::Display for UnknownContentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown content type `{}` (expected `post` or `page`)", self.0)
    }
}

impl std::error::Error for UnknownContentType {}

/// A fully loaded content file. Every field is computed once by the loader;
/// nothing downstream mutates an item.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentItem {
    /// The source file. Unique within a build.
    pub source_path: PathBuf,

    /// The front matter, verbatim.
    pub metadata: Metadata,

    pub content_type: ContentType,

    /// The body as produced by the markdown adapter.
    pub html: String,

    /// The `date` field parsed with the configured format.
    pub date: NaiveDateTime,

    /// `date` formatted for display. See [`readable_format`].
    pub readable_date: String,

    /// The slugified path of the source file relative to its type directory,
    /// with `/` between segments.
    pub slug: String,

    /// The directory the item's `index.html` is written to.
    pub output_directory: PathBuf,

    /// The site-relative URL path for the item (no leading or trailing `/`).
    pub url: String,

    /// The absolute URL for the item.
    pub permalink: Url,
}

impl ContentItem {
    /// The file the item is rendered into.
    pub fn output_file(&self) -> PathBuf {
        self.output_directory.join("index.html")
    }
}

/// Parses a date string with exactly one format. Formats with no time
/// component parse to midnight; the second attempt reads the value as a bare
/// date with the same `format`, never a different one.
pub fn parse_date(value: &str, format: &str) -> ParseResult<NaiveDateTime> {
    match NaiveDateTime::parse_from_str(value, format) {
        Ok(date) => Ok(date),
        Err(e) => match NaiveDate::parse_from_str(value, format) {
            Ok(date) => Ok(date.and_hms(0, 0, 0)),
            Err(_) => Err(e),
        },
    }
}

/// The display variant of `format`: a 24-hour `%H:%M` becomes a 12-hour
/// `%I:%M %p`. Other formats are used as they are.
pub fn readable_format(format: &str) -> String {
    format.replace("%H:%M", "%I:%M %p")
}

/// Derives an item's slug from its source path. The path is made relative to
/// `content_directory`; a leading content-type directory and any directory
/// named like the content root are dropped. The file stem is always kept, and
/// each remaining segment is slugified. Returns `None` when the stem has no
/// URL-safe characters to slugify.
pub fn derive_slug(content_directory: &Path, source_path: &Path) -> Option<String> {
    let relative = source_path
        .strip_prefix(content_directory)
        .unwrap_or(source_path);
    let root_name = content_directory
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let mut directories: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|component| match component {
                    Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    if directories
        .first()
        .map_or(false, |first| ContentType::ALL.iter().any(|t| t.plural() == first.as_str()))
    {
        directories.remove(0);
    }
    directories.retain(|segment| root_name.as_deref() != Some(segment.as_str()));

    let stem = slug::slugify(relative.file_stem()?.to_string_lossy());
    if stem.is_empty() {
        return None;
    }
    let mut segments: Vec<String> = directories
        .iter()
        .map(slug::slugify)
        .filter(|segment| !segment.is_empty())
        .collect();
    segments.push(stem);
    Some(segments.join("/"))
}

/// Where an item lives: the directory its `index.html` goes in and its
/// site-relative URL.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub output_directory: PathBuf,
    pub url: String,
}

/// Computes an item's [`Location`] from its type, date, and slug. With pretty
/// permalinks the URL is the slug (under the blog directory for posts);
/// otherwise a `yyyy/mm/dd` segment precedes the slug.
pub fn locate(
    config: &Config,
    content_type: ContentType,
    date: &NaiveDateTime,
    slug: &str,
) -> Location {
    let (pretty, prefix) = match content_type {
        ContentType::Post => (
            config.pretty_permalinks_on_posts,
            Some(config.blog_directory.as_str()),
        ),
        ContentType::Page => (config.pretty_permalinks_on_pages, None),
    };

    let mut segments: Vec<String> = Vec::new();
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        segments.push(prefix.to_owned());
    }
    if !pretty {
        segments.push(format!("{}", date.year()));
        segments.push(format!("{:02}", date.month()));
        segments.push(format!("{:02}", date.day()));
    }
    if !slug.is_empty() {
        segments.push(slug.to_owned());
    }

    let url = segments.join("/");
    let output_directory = url
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(config.output_directory.clone(), |dir, s| dir.join(s));
    Location {
        output_directory,
        url,
    }
}

/// Resolves a site-relative URL against the site root. Directory-style URLs
/// get a trailing `/`.
pub fn permalink(site_url: &Url, url: &str) -> Result<Url, url::ParseError> {
    let mut base = site_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    if url.is_empty() {
        Ok(base)
    } else {
        base.join(&format!("{}/", url))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd(y, m, d).and_hms(10, 0, 0)
    }

    #[test]
    fn test_content_type_from_str() {
        assert_eq!(Ok(ContentType::Post), "post".parse::<ContentType>());
        assert_eq!(Ok(ContentType::Page), "page".parse::<ContentType>());
        assert_eq!(
            Err(UnknownContentType("Post".to_owned())),
            "Post".parse::<ContentType>()
        );
    }

    #[test]
    fn test_parse_date_and_readable_format() -> ParseResult<()> {
        let format = "%m/%d/%y at %H:%M";
        let parsed = parse_date("01/02/21 at 10:00", format)?;
        assert_eq!(date(2021, 1, 2), parsed);
        assert_eq!("%m/%d/%y at %I:%M %p", readable_format(format));
        assert_eq!(
            "01/02/21 at 10:00 AM",
            parsed.format(&readable_format(format)).to_string()
        );
        let evening = parse_date("01/02/21 at 22:05", format)?;
        assert_eq!(
            "01/02/21 at 10:05 PM",
            evening.format(&readable_format(format)).to_string()
        );
        Ok(())
    }

    #[test]
    fn test_parse_date_only_format() -> ParseResult<()> {
        let parsed = parse_date("2021-04-16", "%Y-%m-%d")?;
        assert_eq!(NaiveDate::from_ymd(2021, 4, 16).and_hms(0, 0, 0), parsed);
        assert_eq!("%Y-%m-%d", readable_format("%Y-%m-%d"));
        Ok(())
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("2021-01-02 10:00", "%m/%d/%y at %H:%M").is_err());
    }

    #[test]
    fn test_derive_slug() {
        let root = Path::new("/site/content");
        let slug = |path: &str| derive_slug(root, Path::new(path));
        assert_eq!(Some("hello".to_owned()), slug("/site/content/posts/hello.md"));
        assert_eq!(
            Some("travel/my-trip-to-oslo".to_owned()),
            slug("/site/content/posts/Travel/My Trip to Oslo!.md")
        );
        assert_eq!(Some("about".to_owned()), slug("/site/content/pages/about.md"));
        assert_eq!(Some("v1-2".to_owned()), slug("/site/content/pages/v1.2.md"));
        // a nested directory named like the content root is dropped too
        assert_eq!(Some("x".to_owned()), slug("/site/content/pages/content/x.md"));
        // only the leading type directory is dropped
        assert_eq!(Some("pages/x".to_owned()), slug("/site/content/posts/pages/x.md"));
    }

    #[test]
    fn test_derive_slug_keeps_stem_named_like_a_directory() {
        let root = Path::new("/site/content");
        let slug = |path: &str| derive_slug(root, Path::new(path));
        assert_eq!(Some("posts".to_owned()), slug("/site/content/pages/posts.md"));
        assert_eq!(Some("pages".to_owned()), slug("/site/content/posts/pages.md"));
        assert_eq!(Some("content".to_owned()), slug("/site/content/posts/content.md"));
    }

    #[test]
    fn test_derive_slug_rejects_unsluggable_stem() {
        let root = Path::new("/site/content");
        assert_eq!(None, derive_slug(root, Path::new("/site/content/posts/!!!.md")));
    }

    #[test]
    fn test_locate_posts() {
        let mut config = Config::new(Path::new("/site"));
        config.blog_directory = "blog".to_owned();

        config.pretty_permalinks_on_posts = true;
        let pretty = locate(&config, ContentType::Post, &date(2021, 1, 2), "hi");
        assert_eq!("blog/hi", pretty.url);
        assert_eq!(PathBuf::from("/site/public/blog/hi"), pretty.output_directory);

        config.pretty_permalinks_on_posts = false;
        let dated = locate(&config, ContentType::Post, &date(2021, 1, 2), "hi");
        assert_eq!("blog/2021/01/02/hi", dated.url);
        assert_eq!(
            PathBuf::from("/site/public/blog/2021/01/02/hi"),
            dated.output_directory
        );
    }

    #[test]
    fn test_locate_pages() {
        let mut config = Config::new(Path::new("/site"));

        config.pretty_permalinks_on_pages = true;
        let pretty = locate(&config, ContentType::Page, &date(2020, 11, 9), "about/team");
        assert_eq!("about/team", pretty.url);
        assert_eq!(PathBuf::from("/site/public/about/team"), pretty.output_directory);

        config.pretty_permalinks_on_pages = false;
        let dated = locate(&config, ContentType::Page, &date(2020, 11, 9), "about");
        assert_eq!("2020/11/09/about", dated.url);
        assert_eq!(PathBuf::from("/site/public/2020/11/09/about"), dated.output_directory);
    }

    #[test]
    fn test_permalink() -> Result<(), url::ParseError> {
        let root = Url::parse("https://example.org")?;
        assert_eq!(
            "https://example.org/blog/hi/",
            permalink(&root, "blog/hi")?.as_str()
        );
        let nested = Url::parse("https://example.org/~me")?;
        assert_eq!(
            "https://example.org/~me/about/",
            permalink(&nested, "about")?.as_str()
        );
        Ok(())
    }
}
