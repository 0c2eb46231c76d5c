//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the posts
//! ([`crate::parser`]), loading the author roster ([`crate::author`]),
//! rendering feed, post and topics pages ([`crate::write`]), copying the static source
//! directory into the static output directory, and generating the Atom feed
//! ([`crate::feed`]).

use crate::author::{load_authors, Error as AuthorError};
use crate::config::Config;
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::parser::{Error as ParseError, Parser as PostParser, StaticFile};
use crate::thumbnail::featured_thumbnails;
use crate::typography::Typography;
use crate::write::{Error as WriteError, SiteContext, Writer};
use gtmpl::Template;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Builds the site from a [`Config`] object and the site [`Typography`]. This
/// calls into [`PostParser::parse_posts`], [`Writer::write_posts`], and
/// [`write_feed`] which do the heavy-lifting. This function also copies the
/// static assets from source directory to the output directory.
pub fn build_site(config: &Config, typography: &Typography) -> Result<()> {
    let post_parser = PostParser::new(
        &config.index_url,
        &config.posts_url,
        &config.posts_output_directory,
        config.excerpt_length,
    );

    // collect all posts
    let (posts, static_files) = post_parser.parse_posts(&config.posts_source_directory)?;
    let authors = load_authors(&config.authors_file, &config.static_url)?;
    let thumbnails = featured_thumbnails(&posts);

    // Parse the template files.
    let index_template = parse_template(config.index_template.iter())?;
    let posts_template = parse_template(config.posts_template.iter())?;
    let topics_template = parse_template(config.topics_template.iter())?;

    // Blow away the old output directories so we don't have any collisions.
    // The root output directory itself is left alone in case it was passed by
    // mistake.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.index_output_directory)?;
    rmdir(&config.static_output_directory)?;
    rmdir(&config.topics_output_directory)?;

    std::fs::create_dir_all(&config.posts_output_directory)?;
    copy_static_files(&static_files)?;

    // write the post and feed pages
    let site = SiteContext {
        title: &config.title,
        headline: config.headline.as_deref(),
        tagline: config.tagline.as_deref(),
        seo: &config.seo,
        header: &config.header,
        typography,
        home_page: &config.home_page,
        static_url: &config.static_url,
        atom_url: &config.atom_url,
    };
    let writer = Writer {
        posts_template: &posts_template,
        index_template: &index_template,
        topics_template: &topics_template,
        topics_url: &config.topics_url,
        topics_output_directory: &config.topics_output_directory,
        index_base_url: &config.index_url,
        index_output_directory: &config.index_output_directory,
        index_page_size: config.page_size,
        authors: &authors,
        thumbnails: &thumbnails,
        site: &site,
    };
    writer.write_posts(&posts)?;

    // copy static directory
    if config.static_source_directory.is_dir() {
        copy_dir(
            &config.static_source_directory,
            &config.static_output_directory,
        )?;
    }

    // copy /pages/index.html to /index.html
    std::fs::copy(
        config.index_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    // create the atom feed
    write_feed(
        &FeedConfig {
            title: &config.title,
            id: config.home_page.to_string(),
            author: config.author.as_ref(),
            home_page: &config.home_page,
            atom_url: &config.atom_url,
        },
        &posts,
        &authors,
        File::create(config.root_output_directory.join("feed.atom"))?,
    )?;

    log::info!(
        "built {} posts into {}",
        posts.len(),
        config.root_output_directory.display()
    );
    Ok(())
}

/// Copies bundle assets to their output locations.
fn copy_static_files(static_files: &[StaticFile]) -> Result<()> {
    for (src, dst) in static_files {
        if let Some(dir) = dst.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::copy(src, dst)?;
    }
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dst.join(entry.file_name()))?;
        } else {
            std::fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }

    Ok(())
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template
        .parse(&contents)
        .map_err(|e| Error::ParseTemplate(e.to_string()))?;
    Ok(template)
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing, loading
/// authors, writing, cleaning output directories, parsing template files, and
/// other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors loading the author roster.
    Authors(AuthorError),

    /// Returned for errors writing [`crate::post::Post`]s to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Authors(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Authors(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Feed(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<AuthorError> for Error {
    fn from(err: AuthorError) -> Error {
        Error::Authors(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}
