//! The library code for the `kiln` static site generator. A build is a single
//! synchronous pass through these steps:
//!
//! 1. Loading content from source files on disk ([`crate::loader`]): each
//!    markdown file is converted ([`crate::markdown`]), its front matter is
//!    validated, and its date, slug, output directory, and URL are derived
//!    ([`crate::content`]).
//! 2. Splitting the content into posts and pages and sorting each
//!    ([`crate::sort`]).
//! 3. Rendering item pages, the index page, and the post archive through the
//!    theme's templates, and copying static assets ([`crate::write`],
//!    [`crate::theme`]).
//!
//! An [`signal::EventBus`] is threaded through every step. Plugins
//! ([`crate::plugin`]) subscribe to its signals before the build starts and
//! can observe or abort any stage. [`build::build_site`] ties it together.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod content;
pub mod init;
pub mod loader;
pub mod markdown;
pub mod plugin;
pub mod signal;
pub mod sort;
pub mod theme;
pub mod value;
pub mod write;

mod util;
