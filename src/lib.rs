//! The library code for the `revved` blog generator. The architecture can be
//! generally broken down into two distinct steps:
//!
//! 1. Parsing posts from source files on disk ([`crate::parser`])
//! 2. Converting the posts into output files on disk ([`crate::write`])
//!
//! The second step is the more involved. Every post gets its own page, and
//! every feed (the main feed holding all posts plus one feed per tag) is
//! paginated into feed pages. Each feed page is produced by
//! [`render::render_feed`], which resolves the display fallbacks for each
//! post (title, description, author, and thumbnail) and computes the
//! pagination state. The resulting view models are converted into template
//! values and rendered to disk.
//!
//! Site-wide concerns live in [`crate::config`] (the project file) and
//! [`crate::typography`] (the stylesheet and web fonts, initialized once at
//! startup). [`crate::build`] ties everything together, including the Atom
//! feed ([`crate::feed`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod author;
pub mod build;
pub mod config;
pub mod excerpt;
pub mod feed;
pub mod markdown;
pub mod pagination;
pub mod parser;
pub mod post;
pub mod render;
pub mod tag;
pub mod thumbnail;
pub mod typography;
mod value;
pub mod write;
