//! Defines the [`Author`] roster and the [`AuthorIndex`] used to resolve a
//! post's author id. The roster is loaded from `authors.json`:
//!
//! ```json
//! [
//!   { "id": "jdoe", "name": "Jane Doe", "avatar": "avatars/jdoe.jpg" }
//! ]
//! ```
//!
//! Avatar paths are resolved against the site's static URL.

use crate::post::Image;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// A contributor profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub avatar: Image,
}

#[derive(Deserialize)]
struct AuthorRecord {
    id: String,
    name: String,
    avatar: String,
}

/// Loads the author roster from `path`. A missing file yields an empty
/// roster; posts then render without an author.
pub fn load_authors(path: &Path, static_url: &Url) -> Result<Vec<Author>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("no author roster at `{}`", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(Error::Open {
                path: path.to_owned(),
                err: e,
            })
        }
    };

    let records: Vec<AuthorRecord> = serde_json::from_reader(file)?;
    records
        .into_iter()
        .map(|record| -> Result<Author> {
            Ok(Author {
                avatar: Image {
                    src: static_url.join(&record.avatar)?,
                    alt: record.name.clone(),
                },
                id: record.id,
                name: record.name,
            })
        })
        .collect()
}

/// An id-keyed view over an author roster. Lookups for unknown ids return
/// `None`; they are never an error.
pub struct AuthorIndex<'a> {
    authors: HashMap<&'a str, &'a Author>,
}

impl<'a> AuthorIndex<'a> {
    /// Indexes `authors` by id. When ids repeat, the last entry wins.
    pub fn new(authors: &'a [Author]) -> AuthorIndex<'a> {
        AuthorIndex {
            authors: authors.iter().map(|a| (a.id.as_str(), a)).collect(),
        }
    }

    /// Looks up an author by id.
    pub fn get(&self, id: &str) -> Option<&'a Author> {
        self.authors.get(id).copied()
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the author roster.
#[derive(Debug)]
pub enum Error {
    /// Returned when the roster file exists but can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the roster isn't valid JSON of the expected shape.
    DeserializeJson(serde_json::Error),

    /// Returned when an avatar path can't be joined onto the static URL.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening author roster '{}': {}", path.display(), err)
            }
            Error::DeserializeJson(err) => write!(f, "Parsing author roster: {}", err),
            Error::UrlParse(err) => write!(f, "Resolving author avatar: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::DeserializeJson(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts [`serde_json::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: serde_json::Error) -> Error {
        Error::DeserializeJson(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
