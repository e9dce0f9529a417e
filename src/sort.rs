//! Splits the content set into posts and pages and orders each one.

use crate::config::Config;
use crate::content::{ContentItem, ContentType};
use std::cmp::Ordering;

/// Partitions `content` by type and sorts posts by `sort_posts_by` and pages
/// by `sort_pages_by`, each in its own direction. The sorts are stable, so
/// items with equal keys keep their load order (also when reversed). Items
/// are borrowed, never modified.
pub fn partition_and_sort<'a>(
    content: &'a [ContentItem],
    config: &Config,
) -> (Vec<&'a ContentItem>, Vec<&'a ContentItem>) {
    let (mut posts, mut pages): (Vec<&ContentItem>, Vec<&ContentItem>) = content
        .iter()
        .partition(|item| item.content_type == ContentType::Post);
    sort_by_field(&mut posts, &config.sort_posts_by, config.sort_posts_reverse);
    sort_by_field(&mut pages, &config.sort_pages_by, config.sort_pages_reverse);
    (posts, pages)
}

/// Stable-sorts `items` by the metadata field `field`. Items missing the
/// field sort before items that have it.
pub fn sort_by_field(items: &mut [&ContentItem], field: &str, reverse: bool) {
    items.sort_by(|a, b| match reverse {
        false => compare(a, b, field),
        true => compare(b, a, field),
    });
}

/// `date` compares chronologically by the parsed date; every other field
/// compares its raw string value.
fn compare(a: &ContentItem, b: &ContentItem, field: &str) -> Ordering {
    match field {
        "date" => a.date.cmp(&b.date),
        _ => a.metadata.get(field).cmp(&b.metadata.get(field)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::content::Metadata;
    use chrono::NaiveDate;
    use std::path::{Path, PathBuf};
    use url::Url;

    fn item(name: &str, content_type: ContentType, day: u32, title: &str) -> ContentItem {
        let mut metadata = Metadata::new();
        metadata.insert("title".to_owned(), title.to_owned());
        metadata.insert("type".to_owned(), content_type.name().to_owned());
        ContentItem {
            source_path: PathBuf::from(name),
            metadata,
            content_type,
            html: String::new(),
            date: NaiveDate::from_ymd(2021, 1, day).and_hms(10, 0, 0),
            readable_date: String::new(),
            slug: name.to_owned(),
            output_directory: PathBuf::from(name),
            url: name.to_owned(),
            permalink: Url::parse("http://localhost/").unwrap(),
        }
    }

    fn names(items: &[&ContentItem]) -> Vec<String> {
        items.iter().map(|i| i.slug.clone()).collect()
    }

    fn content() -> Vec<ContentItem> {
        vec![
            item("p3", ContentType::Post, 3, "C"),
            item("g1", ContentType::Page, 9, "Zeta"),
            item("p1", ContentType::Post, 1, "B"),
            item("g2", ContentType::Page, 2, "Alpha"),
            item("p2", ContentType::Post, 2, "A"),
        ]
    }

    #[test]
    fn test_partition_and_sort_defaults() {
        let content = content();
        let config = Config::new(Path::new("/site"));
        let (posts, pages) = partition_and_sort(&content, &config);
        // posts by date ascending, pages by title descending
        assert_eq!(vec!["p1", "p2", "p3"], names(&posts));
        assert_eq!(vec!["g1", "g2"], names(&pages));
    }

    #[test]
    fn test_equal_keys_keep_load_order() {
        let content = vec![
            item("a", ContentType::Post, 5, "A"),
            item("b", ContentType::Post, 5, "B"),
            item("c", ContentType::Post, 4, "C"),
        ];
        let mut config = Config::new(Path::new("/site"));
        let (posts, _) = partition_and_sort(&content, &config);
        assert_eq!(vec!["c", "a", "b"], names(&posts));

        config.sort_posts_reverse = true;
        let (posts, _) = partition_and_sort(&content, &config);
        assert_eq!(vec!["a", "b", "c"], names(&posts));
    }

    #[test]
    fn test_posts_and_pages_sort_independently() {
        let content = content();
        let mut config = Config::new(Path::new("/site"));
        let (posts_before, _) = partition_and_sort(&content, &config);

        config.sort_pages_by = "date".to_owned();
        config.sort_pages_reverse = false;
        let (posts_after, pages) = partition_and_sort(&content, &config);
        assert_eq!(names(&posts_before), names(&posts_after));
        assert_eq!(vec!["g2", "g1"], names(&pages));

        config.sort_posts_by = "title".to_owned();
        config.sort_posts_reverse = true;
        let (posts, pages_after) = partition_and_sort(&content, &config);
        assert_eq!(vec!["p3", "p1", "p2"], names(&posts));
        assert_eq!(names(&pages), names(&pages_after));
    }

    #[test]
    fn test_missing_field_sorts_first() {
        let mut content = content();
        content[4].metadata.remove("title");
        let mut config = Config::new(Path::new("/site"));
        config.sort_posts_by = "title".to_owned();
        let (posts, _) = partition_and_sort(&content, &config);
        assert_eq!(vec!["p2", "p1", "p3"], names(&posts));
    }
}
