//! Support for creating Atom feeds from a list of posts.

use crate::author::{Author, AuthorIndex};
use crate::config::FeedAuthor;
use crate::post::Post;
use crate::render::PostSummary;
use crate::thumbnail::ThumbnailMap;
use atom_syndication::{Category, Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig<'a> {
    pub title: &'a str,
    pub id: String,
    pub author: Option<&'a FeedAuthor>,
    pub home_page: &'a Url,
    pub atom_url: &'a Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`Post`]s (newest first) and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(
    config: &FeedConfig,
    posts: &[Post],
    authors: &[Author],
    w: W,
) -> Result<()> {
    feed(config, posts, authors).write_to(w)?;
    log::info!("wrote Atom feed with {} entries", posts.len());
    Ok(())
}

fn feed(config: &FeedConfig, posts: &[Post], authors: &[Author]) -> Feed {
    let index = AuthorIndex::new(authors);
    // Feed entries don't carry thumbnails.
    let thumbnails = ThumbnailMap::new();

    let mut feed = Feed::default();
    feed.set_title(config.title.to_owned());
    feed.set_id(config.id.as_str());
    // The newest post dates the feed; an empty feed falls back to the epoch so
    // output stays reproducible.
    feed.set_updated(match posts.first() {
        Some(post) => post.date,
        None => DateTime::<Utc>::from(std::time::UNIX_EPOCH).into(),
    });
    feed.set_authors(site_people(config.author));
    feed.set_links(vec![
        link(config.home_page, "alternate"),
        link(config.atom_url, "self"),
    ]);
    feed.set_entries(
        posts
            .iter()
            .map(|post| entry(config, &PostSummary::resolve(post, &index, &thumbnails), post))
            .collect::<Vec<Entry>>(),
    );
    feed
}

fn entry(config: &FeedConfig, summary: &PostSummary, post: &Post) -> Entry {
    let date: DateTime<FixedOffset> = post.date;
    let mut entry = Entry::default();
    entry.set_id(summary.url.as_str());
    entry.set_title(summary.title.clone());
    entry.set_updated(date);
    entry.set_published(Some(date));
    entry.set_summary(Some(Text::from(summary.description.clone())));
    entry.set_links(vec![link(&summary.url, "alternate")]);
    entry.set_categories(
        summary
            .tags
            .iter()
            .map(|tag| {
                let mut category = Category::default();
                category.set_term(tag.name.as_str());
                category
            })
            .collect::<Vec<Category>>(),
    );
    entry.set_authors(match summary.author {
        Some(author) => vec![person(&author.name, None)],
        None => site_people(config.author),
    });
    entry
}

fn link(href: &Url, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href.as_str());
    link.set_rel(rel);
    link
}

fn person(name: &str, email: Option<&str>) -> Person {
    let mut person = Person::default();
    person.set_name(name);
    person.set_email(email.map(str::to_owned));
    person
}

fn site_people(author: Option<&FeedAuthor>) -> Vec<Person> {
    match author {
        Some(author) => vec![person(&author.name, author.email.as_deref())],
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants inlude I/O and Atom issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}
