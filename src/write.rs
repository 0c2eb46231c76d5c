use crate::author::{Author, AuthorIndex};
use crate::config::{Header, Seo};
use crate::pagination::{page_contexts, page_file_name};
use crate::post::Post;
use crate::render::{render_feed, PostSummary};
use crate::tag::Tag;
use crate::thumbnail::ThumbnailMap;
use crate::typography::Typography;
use crate::value::{array, href, number, object, option, string};
use gtmpl::{Template, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use url::Url;

/// Responsible for paginating, templating, and writing HTML pages to disk from
/// [`Post`] sources.
pub struct Writer<'a> {
    /// The template for post pages.
    pub posts_template: &'a Template,

    /// The template for feed pages.
    pub index_template: &'a Template,

    /// The template for the topics listing.
    pub topics_template: &'a Template,

    /// The URL of the topics listing.
    pub topics_url: &'a Url,

    /// The directory the topics listing is written into as `index.html`.
    pub topics_output_directory: &'a Path,

    /// The base URL for feed pages. The main feed pages are located at
    /// `{index_base_url}/index.html`, `{index_base_url}/2.html`, etc. The tag
    /// feed pages are located at `{index_base_url}/{tag_name}/index.html`,
    /// `{index_base_url}/{tag_name}/2.html`, etc.
    pub index_base_url: &'a Url,

    /// The directory in which the feed HTML files will be written, laid out
    /// the same way as [`Writer::index_base_url`].
    pub index_output_directory: &'a Path,

    /// The number of posts per feed page.
    pub index_page_size: NonZeroUsize,

    /// The author roster posts are resolved against.
    pub authors: &'a [Author],

    /// Precomputed thumbnails for posts without one of their own.
    pub thumbnails: &'a ThumbnailMap,

    /// Site-wide values made available to every template.
    pub site: &'a SiteContext<'a>,
}

/// Values shared by every page: site metadata, header, SEO, and typography.
pub struct SiteContext<'a> {
    pub title: &'a str,
    pub headline: Option<&'a str>,
    pub tagline: Option<&'a str>,
    pub seo: &'a Seo,
    pub header: &'a Header,
    pub typography: &'a Typography,

    /// The URL for the site's home page, typically the destination for the
    /// header logo link.
    pub home_page: &'a Url,

    /// The URL for the static assets, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    /// The URL of the Atom feed.
    pub atom_url: &'a Url,
}

impl SiteContext<'_> {
    fn insert_into(&self, obj: &mut std::collections::HashMap<String, Value>) {
        let mut insert = |key: &str, value: Value| {
            obj.insert(key.to_owned(), value);
        };
        insert("site_title", string(self.title));
        insert("headline", option(self.headline, string));
        insert("tagline", option(self.tagline, string));
        insert("seo", Value::from(self.seo));
        insert("header", Value::from(self.header));
        insert("typography_css", string(self.typography.css()));
        insert(
            "google_fonts_url",
            option(self.typography.google_fonts_url(), string),
        );
        insert("home_page", href(self.home_page));
        insert("static_url", href(self.static_url));
        insert("atom_url", href(self.atom_url));
    }
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: Page, topics: &Value) -> Result<()> {
        let mut value = page.item;
        if let Value::Object(obj) = &mut value {
            self.site.insert_into(obj);
            obj.insert("topics".to_owned(), topics.clone());
            obj.insert("location".to_owned(), href(&page.url));
        }
        let context = gtmpl::Context::from(value).map_err(|e| Error::Template(e.to_string()))?;
        page.template
            .execute(&mut std::fs::File::create(&page.file_path)?, &context)
            .map_err(|e| Error::Template(e.to_string()))?;
        log::debug!("wrote {}", page.file_path.display());
        Ok(())
    }

    /// Takes a slice of [`Post`]s (sorted newest first), indexes it by tag, and
    /// writes post and feed pages to disk.
    pub fn write_posts(&self, posts: &[Post]) -> Result<()> {
        let topics = topics(posts);
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut written = 0;
        for page in self.pages(posts, &topics)? {
            if let Some(dir) = page.file_path.parent() {
                if seen_dirs.insert(dir.to_owned()) {
                    std::fs::create_dir_all(dir)?;
                }
            }
            self.write_page(page, &topics)?;
            written += 1;
        }
        log::info!("wrote {} pages for {} posts", written, posts.len());
        Ok(())
    }

    /// Creates all of the feed, post and topics [`Page`]s for a set of
    /// [`Post`]s.
    fn pages<'t>(&'t self, posts: &[Post], topics: &Value) -> Result<Vec<Page<'t>>> {
        let mut pages = Vec::new();
        for index in index_posts(self.index_base_url, self.index_output_directory, posts)? {
            pages.extend(index.to_pages(self)?);
        }
        pages.extend(self.post_pages(posts));
        pages.push(self.topics_page(topics));
        Ok(pages)
    }

    /// Creates the topics listing [`Page`]: every tag with its post count and
    /// feed URL, sorted by tag name, as `item`.
    fn topics_page<'t>(&'t self, topics: &Value) -> Page<'t> {
        Page {
            item: object(vec![
                ("item", topics.clone()),
                ("title", string(format!("{}: All Topics", self.site.title))),
            ]),
            url: self.topics_url.clone(),
            file_path: self.topics_output_directory.join("index.html"),
            template: self.topics_template,
        }
    }

    /// Creates the post [`Page`]s. `prev` links to the newer neighbour and
    /// `next` to the older one.
    fn post_pages<'t>(&'t self, posts: &[Post]) -> Vec<Page<'t>> {
        let authors = AuthorIndex::new(self.authors);
        posts
            .iter()
            .enumerate()
            .map(|(i, post)| {
                let summary = PostSummary::resolve(post, &authors, self.thumbnails);
                let mut item = Value::from(&summary);
                if let Value::Object(obj) = &mut item {
                    obj.insert("body".to_owned(), string(post.body.as_str()));
                }
                let prev = match i < 1 {
                    true => None,
                    false => Some(&posts[i - 1].url),
                };
                let next = posts.get(i + 1).map(|p| &p.url);
                Page {
                    item: object(vec![
                        ("item", item),
                        ("title", string(summary.title.as_str())),
                        ("prev", option(prev, href)),
                        ("next", option(next, href)),
                    ]),
                    url: post.url.clone(),
                    file_path: post.file_path.clone(),
                    template: self.posts_template,
                }
            })
            .collect()
    }
}

/// An output HTML file: the template value, where it lives, and the template
/// that renders it.
struct Page<'a> {
    item: Value,
    url: Url,
    file_path: PathBuf,
    template: &'a Template,
}

/// `Index` represents the posts of one feed: the main feed (all posts) or a
/// tag's feed.
struct Index<'a> {
    /// The tag for a tag feed, `None` for the main feed.
    tag: Option<Tag>,

    /// The base URL for the feed's pages (with a trailing slash).
    url: Url,

    /// The output directory for the feed's pages.
    output_directory: PathBuf,

    /// The posts in the feed, newest first.
    posts: Vec<&'a Post>,
}

impl<'a> Index<'a> {
    /// Paginates the feed and renders each page through the feed renderer.
    fn to_pages<'t>(&self, writer: &'t Writer) -> Result<Vec<Page<'t>>> {
        let mut pages = Vec::new();
        for context in page_contexts(self.posts.len(), writer.index_page_size) {
            let start = context.skip().min(self.posts.len());
            let end = (start + context.limit.get()).min(self.posts.len());
            let feed = render_feed(
                self.posts[start..end].iter().copied(),
                writer.authors,
                &context,
                writer.thumbnails,
            );

            let pagination = &feed.pagination;
            let page_url = |n: usize| self.url.join(&page_file_name(n));
            let prev = pagination.prev().map(page_url).transpose()?;
            let next = pagination.next().map(page_url).transpose()?;
            let mut links = Vec::new();
            for n in pagination.pages() {
                links.push(object(vec![
                    ("number", number(n)),
                    ("url", href(&page_url(n)?)),
                    ("current", Value::Bool(n == pagination.current)),
                ]));
            }

            let title = match &self.tag {
                Some(tag) => format!("{}: {}", writer.site.title, tag.name),
                None => writer.site.title.to_owned(),
            };

            pages.push(Page {
                item: object(vec![
                    ("item", array(&feed.summaries, Value::from)),
                    (
                        "pagination",
                        object(vec![
                            ("total_count", number(pagination.total_count)),
                            ("current", number(pagination.current)),
                            ("posts_per_page", number(pagination.posts_per_page)),
                            ("total_pages", number(pagination.total_pages)),
                            ("prev_url", option(prev.as_ref(), href)),
                            ("next_url", option(next.as_ref(), href)),
                            ("pages", Value::Array(links)),
                        ]),
                    ),
                    ("prev", option(prev.as_ref(), href)),
                    ("next", option(next.as_ref(), href)),
                    ("tag", option(self.tag.as_ref(), Value::from)),
                    ("title", string(title)),
                ]),
                url: page_url(pagination.current)?,
                file_path: self.output_directory.join(page_file_name(pagination.current)),
                template: writer.index_template,
            });
        }
        Ok(pages)
    }
}

/// Groups `posts` into feeds: the main feed holding every post, followed by
/// one feed per tag in name order. Post order within each feed follows
/// `posts`.
///
/// * `base_url` is the base URL for feed pages. See [`Writer::index_base_url`]
///   for more details.
/// * `base_directory` is the base directory for feed pages. See
///   [`Writer::index_output_directory`] for more details.
fn index_posts<'a>(
    base_url: &Url,
    base_directory: &Path,
    posts: &'a [Post],
) -> Result<Vec<Index<'a>>> {
    let mut tag_indices: BTreeMap<&str, Index> = BTreeMap::new();
    for post in posts {
        for tag in post.tags.iter() {
            // A nameless tag would write over the main feed.
            if tag.name.is_empty() {
                continue;
            }
            match tag_indices.get_mut(tag.name.as_str()) {
                Some(index) => index.posts.push(post),
                None => {
                    tag_indices.insert(
                        &tag.name,
                        Index {
                            tag: Some(tag.clone()),
                            url: base_url.join(&format!("{}/", tag.name))?,
                            output_directory: base_directory.join(&tag.name),
                            posts: vec![post],
                        },
                    );
                }
            }
        }
    }

    let main = Index {
        tag: None,
        url: base_url.to_owned(),
        output_directory: base_directory.to_owned(),
        posts: posts.iter().collect(),
    };
    Ok(std::iter::once(main)
        .chain(tag_indices.into_iter().map(|(_, index)| index))
        .collect())
}

/// Lists every tag with its post count, sorted by tag name.
fn topics(posts: &[Post]) -> Value {
    let mut counts: BTreeMap<&str, (&Tag, usize)> = BTreeMap::new();
    for tag in posts.iter().flat_map(|p| p.tags.iter()) {
        if tag.name.is_empty() {
            continue;
        }
        counts.entry(&tag.name).or_insert((tag, 0)).1 += 1;
    }
    array(counts.values(), |(tag, count)| {
        object(vec![
            ("tag", string(tag.name.as_str())),
            ("url", href(&tag.url)),
            ("count", number(*count)),
        ])
    })
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error building a page URL.
    UrlParse(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. This allows us to use
    /// the `?` operator when joining page URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
