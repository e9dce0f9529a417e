//! Loads a theme's templates and renders them. The renderer only sees the
//! [`Templates`] trait; [`Theme`] implements it with [`gtmpl`] (Go-style
//! `{{ .field }}` templates).

use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The templates every theme must provide.
pub const REQUIRED_TEMPLATES: [&str; 4] = ["post.html", "page.html", "index.html", "archive.html"];

/// Renders a named template against a set of bindings.
pub trait Templates {
    fn render(&self, name: &str, bindings: HashMap<String, Value>) -> Result<String>;
}

/// A set of parsed templates keyed by file name.
pub struct Theme {
    directory: PathBuf,
    templates: HashMap<String, Template>,
}

impl Theme {
    /// Parses every template in [`REQUIRED_TEMPLATES`] from `directory`.
    /// Fails with [`Error::TemplateNotFound`] for the first one missing.
    pub fn load(directory: &Path) -> Result<Theme> {
        let mut templates = HashMap::new();
        for name in REQUIRED_TEMPLATES.iter() {
            let path = directory.join(name);
            if !path.is_file() {
                return Err(Error::TemplateNotFound {
                    name: (*name).to_owned(),
                    directory: directory.to_owned(),
                });
            }
            templates.insert((*name).to_owned(), parse_template(&path)?);
        }
        log::debug!("loaded theme from `{}`", directory.display());
        Ok(Theme {
            directory: directory.to_owned(),
            templates,
        })
    }
}

impl Templates for Theme {
    fn render(&self, name: &str, bindings: HashMap<String, Value>) -> Result<String> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound {
                name: name.to_owned(),
                directory: self.directory.clone(),
            })?;
        let context = Context::from(Value::Object(bindings)).map_err(|err| Error::Execute {
            name: name.to_owned(),
            err: err.to_string(),
        })?;
        let mut out: Vec<u8> = Vec::new();
        template
            .execute(&mut out, &context)
            .map_err(|err| Error::Execute {
                name: name.to_owned(),
                err: err.to_string(),
            })?;
        String::from_utf8(out).map_err(|err| Error::Execute {
            name: name.to_owned(),
            err: err.to_string(),
        })
    }
}

fn parse_template(path: &Path) -> Result<Template> {
    use std::io::Read;
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;

    let mut template = Template::default();
    template.parse(&contents).map_err(|err| Error::ParseTemplate {
        path: path.to_owned(),
        err: err.to_string(),
    })?;
    Ok(template)
}

/// The result of a fallible template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or rendering templates.
#[derive(Debug)]
pub enum Error {
    /// Returned when the theme lacks a required template.
    TemplateNotFound { name: String, directory: PathBuf },

    /// Returned when a template file can't be parsed.
    ParseTemplate { path: PathBuf, err: String },

    /// Returned when a template fails to render.
    Execute { name: String, err: String },

    /// Returned when a template file can't be read.
    Io { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::TemplateNotFound { name, directory } => write!(
                f,
                "Template `{}` not found in theme directory `{}`",
                name,
                directory.display()
            ),
            Error::ParseTemplate { path, err } => {
                write!(f, "Parsing template `{}`: {}", path.display(), err)
            }
            Error::Execute { name, err } => write!(f, "Rendering template `{}`: {}", name, err),
            Error::Io { path, err } => {
                write!(f, "Opening template file `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { err, .. } => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_theme(dir: &Path, skip: Option<&str>) -> std::io::Result<()> {
        for name in REQUIRED_TEMPLATES.iter().filter(|n| Some(**n) != skip) {
            fs::write(dir.join(name), format!("{}: {{{{ .title }}}}", name))?;
        }
        Ok(())
    }

    #[test]
    fn test_load_and_render() -> Result<()> {
        let dir = TempDir::new().unwrap();
        write_theme(dir.path(), None).unwrap();
        let theme = Theme::load(dir.path())?;

        let mut bindings = HashMap::new();
        bindings.insert("title".to_owned(), Value::String("Hello".to_owned()));
        assert_eq!("page.html: Hello", theme.render("page.html", bindings)?);
        Ok(())
    }

    #[test]
    fn test_missing_template() {
        let dir = TempDir::new().unwrap();
        write_theme(dir.path(), Some("archive.html")).unwrap();
        match Theme::load(dir.path()) {
            Err(Error::TemplateNotFound { name, .. }) => assert_eq!("archive.html", name),
            Err(other) => panic!("wanted TemplateNotFound; found {:?}", other),
            Ok(_) => panic!("wanted TemplateNotFound; found a theme"),
        }
    }
}
