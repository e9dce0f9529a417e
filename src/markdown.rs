//! The markdown adapter: turns the raw text of a content file into an HTML
//! body plus the flat metadata mapping from its front matter. The pipeline
//! only depends on the [`MarkdownAdapter`] trait; [`Pulldown`] is the stock
//! implementation backed by [`pulldown_cmark`].

use crate::content::Metadata;
use pulldown_cmark::{html, Options, Parser};
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use std::fmt;

/// The result of converting one content file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Converted {
    /// The rendered HTML body.
    pub html: String,

    /// The front matter, empty when the file has none.
    pub metadata: Metadata,
}

/// Converts raw content text into HTML and metadata.
pub trait MarkdownAdapter {
    fn convert(&self, text: &str) -> Result<Converted>;
}

/// A [`MarkdownAdapter`] built on [`pulldown_cmark`]. Front matter is a YAML
/// mapping between a leading `---` line and the next `---` line.
#[derive(Clone, Copy, Debug)]
pub struct Pulldown {
    options: Options,
}

impl Default for Pulldown {
    fn default() -> Self {
        Pulldown {
            options: Options::empty(),
        }
    }
}

impl Pulldown {
    /// Builds an adapter from the configured extension registry (install
    /// name → import name). Only the import names matter here; each one that
    /// names a [`pulldown_cmark`] feature switches it on. Front matter is
    /// always parsed, so `full_yaml_metadata` and `meta` are accepted without
    /// effect. Unrecognized names are logged and ignored.
    pub fn with_extensions(registry: &BTreeMap<String, String>) -> Pulldown {
        let mut options = Options::empty();
        for (install_name, import_name) in registry {
            match import_name.as_str() {
                "tables" => options.insert(Options::ENABLE_TABLES),
                "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
                "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
                "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
                "smarty" | "smart_punctuation" => {
                    options.insert(Options::ENABLE_SMART_PUNCTUATION)
                }
                "full_yaml_metadata" | "meta" => {}
                _ => log::warn!(
                    "ignoring unsupported markdown extension `{}` ({})",
                    import_name,
                    install_name
                ),
            }
        }
        Pulldown { options }
    }
}

impl MarkdownAdapter for Pulldown {
    fn convert(&self, text: &str) -> Result<Converted> {
        let (frontmatter, body) = split_frontmatter(text)?;
        let metadata = match frontmatter {
            Some(yaml) => parse_metadata(yaml)?,
            None => Metadata::new(),
        };
        let mut converted = Converted {
            html: String::with_capacity(body.len() * 3 / 2),
            metadata,
        };
        html::push_html(&mut converted.html, Parser::new_ext(body, self.options));
        Ok(converted)
    }
}

const FENCE: &str = "---";

/// Splits `input` into its YAML front matter (if any) and its markdown body.
/// A file has front matter only if its first line is a fence.
fn split_frontmatter(input: &str) -> Result<(Option<&str>, &str)> {
    let first_line_end = input.find('\n').unwrap_or_else(|| input.len());
    if input[..first_line_end].trim_end() != FENCE {
        return Ok((None, input));
    }
    let yaml_start = (first_line_end + 1).min(input.len());
    let rest = &input[yaml_start..];

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(yaml), body));
        }
        offset += line.len();
    }
    Err(Error::FrontmatterMissingEndFence)
}

fn parse_metadata(yaml: &str) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    if yaml.trim().is_empty() {
        return Ok(metadata);
    }
    match serde_yaml::from_str::<YamlValue>(yaml)? {
        YamlValue::Null => Ok(metadata),
        YamlValue::Mapping(mapping) => {
            for (key, value) in mapping {
                let key = scalar_to_string(&key).ok_or(Error::NonScalarKey)?;
                let value =
                    scalar_to_string(&value).ok_or_else(|| Error::NonScalarValue(key.clone()))?;
                metadata.insert(key, value);
            }
            Ok(metadata)
        }
        _ => Err(Error::FrontmatterNotMapping),
    }
}

fn scalar_to_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Null => Some(String::new()),
        YamlValue::Sequence(_) | YamlValue::Mapping(_) => None,
    }
}

/// The result of a fallible markdown conversion.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error converting a content file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the opening `---` fence has no matching closing fence.
    FrontmatterMissingEndFence,

    /// Returned when the front matter is valid YAML but not a mapping.
    FrontmatterNotMapping,

    /// Returned when a front matter key is a sequence or mapping.
    NonScalarKey,

    /// Returned when the value for the named key is a sequence or mapping.
    NonScalarValue(String),

    /// Returned when the front matter isn't valid YAML.
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---` after front matter")
            }
            Error::FrontmatterNotMapping => {
                write!(f, "Front matter must be a mapping of keys to values")
            }
            Error::NonScalarKey => write!(f, "Front matter keys must be scalars"),
            Error::NonScalarValue(key) => {
                write!(f, "Front matter field `{}` must be a scalar", key)
            }
            Error::DeserializeYaml(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DeserializeYaml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}
