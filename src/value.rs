//! Conversions from build state into template [`Value`]s. Templates see:
//!
//! * an item as `{source_path, type, metadata, content, date, readable_date,
//!   slug, url, permalink}`, with `content` holding the HTML body verbatim;
//! * the config under its field names;
//! * the site handle as `{title, url, posts, pages}`.

use crate::config::Config;
use crate::content::ContentItem;
use crate::signal::Site;
use gtmpl::Value;
use std::collections::HashMap;

impl From<&ContentItem> for Value {
    fn from(item: &ContentItem) -> Value {
        let metadata: HashMap<String, Value> = item
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "source_path".to_owned(),
            Value::String(item.source_path.display().to_string()),
        );
        m.insert("type".to_owned(), Value::String(item.content_type.name().to_owned()));
        m.insert("metadata".to_owned(), Value::Object(metadata));
        m.insert("content".to_owned(), Value::String(item.html.clone()));
        m.insert(
            "date".to_owned(),
            Value::String(item.date.format("%Y-%m-%dT%H:%M:%S").to_string()),
        );
        m.insert("readable_date".to_owned(), Value::String(item.readable_date.clone()));
        m.insert("slug".to_owned(), Value::String(item.slug.clone()));
        m.insert("url".to_owned(), Value::String(item.url.clone()));
        m.insert("permalink".to_owned(), Value::String(item.permalink.to_string()));
        Value::Object(m)
    }
}

impl From<&Config> for Value {
    fn from(config: &Config) -> Value {
        let string = |s: &str| Value::String(s.to_owned());
        let path = |p: &std::path::Path| Value::String(p.display().to_string());

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("site_title".to_owned(), string(&config.site_title));
        m.insert("site_url".to_owned(), string(config.site_url.as_str()));
        m.insert("content_directory".to_owned(), path(&config.content_directory));
        m.insert("output_directory".to_owned(), path(&config.output_directory));
        m.insert("blog_directory".to_owned(), string(&config.blog_directory));
        m.insert("themes_directory".to_owned(), path(&config.themes_directory));
        m.insert("theme_name".to_owned(), string(&config.theme_name));
        m.insert(
            "markdown_file_extension".to_owned(),
            string(&config.markdown_file_extension),
        );
        m.insert(
            "pretty_permalinks_on_posts".to_owned(),
            Value::Bool(config.pretty_permalinks_on_posts),
        );
        m.insert(
            "pretty_permalinks_on_pages".to_owned(),
            Value::Bool(config.pretty_permalinks_on_pages),
        );
        m.insert("date_format".to_owned(), string(&config.date_format));
        m.insert("sort_posts_by".to_owned(), string(&config.sort_posts_by));
        m.insert("sort_pages_by".to_owned(), string(&config.sort_pages_by));
        m.insert("sort_posts_reverse".to_owned(), Value::Bool(config.sort_posts_reverse));
        m.insert("sort_pages_reverse".to_owned(), Value::Bool(config.sort_pages_reverse));
        m.insert(
            "required_metadata_fields".to_owned(),
            Value::Array(
                config
                    .required_metadata_fields
                    .iter()
                    .map(|f| string(f.as_str()))
                    .collect(),
            ),
        );
        Value::Object(m)
    }
}

impl From<&Site<'_>> for Value {
    fn from(site: &Site) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(site.config.site_title.clone()));
        m.insert("url".to_owned(), Value::String(site.config.site_url.to_string()));
        m.insert("posts".to_owned(), items(site.posts));
        m.insert("pages".to_owned(), items(site.pages));
        Value::Object(m)
    }
}

/// Converts a sorted view into a [`Value::Array`], preserving order.
pub fn items(items: &[&ContentItem]) -> Value {
    Value::Array(items.iter().map(|item| Value::from(*item)).collect())
}
