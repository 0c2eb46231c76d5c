//! Defines the [`Parser`] and its [`Error`] type: the logic for reading posts
//! from the file system into memory. The parser assigns each post its slug,
//! excerpt, resolved thumbnail and featured image; see [`crate::render`] for
//! how those are turned into feed summaries.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    fs::{read_dir, File},
    path::{Component, Path, PathBuf},
};

use serde::Deserialize;
use url::Url;

use crate::{
    excerpt,
    markdown,
    post::{non_empty, parse_date, Image, Post},
    tag::Tag,
};

const MARKDOWN_EXTENSION: &str = ".md";
const BUNDLE_INDEX: &str = "index.md";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `index_url` is the base URL for feed pages. It's used to prefix tag
    /// feed URLs (i.e., the URL for the first page of a tag is
    /// `{index_url}/{tag_name}/index.html`).
    index_url: &'a Url,

    /// `posts_url` is the base URL for post pages. A post is served from
    /// `{posts_url}/{display_slug}.html` and its bundle assets from
    /// `{posts_url}/{slug}/`.
    posts_url: &'a Url,

    /// `posts_directory` is the directory in which post pages will be
    /// rendered.
    posts_directory: &'a Path,

    /// The maximum length of the plain-text excerpt, in characters.
    excerpt_length: usize,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(
        index_url: &'a Url,
        posts_url: &'a Url,
        posts_directory: &'a Path,
        excerpt_length: usize,
    ) -> Parser<'a> {
        Parser {
            index_url,
            posts_url,
            posts_directory,
            excerpt_length,
        }
    }

    fn parse_post_bundle(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
        static_files: &mut Vec<StaticFile>,
    ) -> Result<Post> {
        // We want to make sure we can parse a post before we mutate
        // `static_files`
        let post = self.parse_post(
            posts_source_directory,
            &relative_path.join(BUNDLE_INDEX),
        )?;

        use walkdir::WalkDir;
        let abs = posts_source_directory.join(relative_path);
        let bundle_output = self.posts_directory.join(&post.slug);
        for result in WalkDir::new(&abs) {
            let entry = result?;
            if entry.file_type().is_file() && entry.file_name() != BUNDLE_INDEX {
                // `abs` is always an ancestor of the entry
                let relative = entry
                    .path()
                    .strip_prefix(&abs)
                    .map_err(|_| InvalidFileNameError(entry.path().to_owned()))?;
                static_files.push((entry.path().to_owned(), bundle_output.join(relative)));
            }
        }

        Ok(post)
    }

    /// Parses the post at `relative_path` (relative to the
    /// `posts_source_directory`), annotating any error with the path.
    fn parse_post(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
    ) -> Result<Post> {
        log::debug!("parsing post {:?}", relative_path);
        match self._parse_post(posts_source_directory, relative_path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{:?}`", relative_path),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
    ) -> Result<Post> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(posts_source_directory.join(relative_path))?
            .read_to_string(&mut contents)?;
        let input: &str = &contents;

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter =
            serde_yaml::from_str(&input[yaml_start..yaml_stop])?;
        let body = &input[body_start..];

        let (slug, is_bundle) = slug_for(relative_path)?;
        let asset_base = match is_bundle {
            true => self.posts_url.join(&format!("{}/", slug))?,
            false => self.posts_url.clone(),
        };

        let date = parse_date(&frontmatter.date)
            .map_err(|e| Error::InvalidDate(frontmatter.date.clone(), e))?;

        let permalink = match non_empty(&frontmatter.permalink) {
            Some(permalink) => Some(normalize_permalink(permalink)?),
            None => None,
        };

        let thumbnail = match non_empty(&frontmatter.thumbnail) {
            Some(thumbnail) => Some(Image {
                src: asset_base.join(thumbnail)?,
                alt: non_empty(&frontmatter.title).unwrap_or("").to_owned(),
            }),
            None => None,
        };

        let rendered = markdown::to_html(body, &asset_base)?;
        let display_slug = permalink.as_deref().unwrap_or(slug.as_str());
        let file_name = format!("{}.html", display_slug);

        Ok(Post {
            url: self.posts_url.join(&file_name)?,
            file_path: self.posts_directory.join(&file_name),
            excerpt: excerpt::excerpt(body, self.excerpt_length),
            tags: Tag::from_labels(&frontmatter.tags, self.index_url)?,
            slug,
            title: frontmatter.title,
            description: frontmatter.description,
            date,
            author: frontmatter.author,
            thumbnail,
            permalink,
            featured_image: rendered.featured_image,
            body: rendered.html,
        })
    }

    /// Searches a provided `source_directory` for post files (extension =
    /// `.md`) and post bundles (directories containing an `index.md`) and
    /// returns the posts sorted by date (most recent first; same-day posts by
    /// slug) along with the bundle assets to copy. Each post file must be
    /// structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with a `date` and optionally `title`,
    ///    `description`, `author`, `thumbnail`, `permalink` and `tags`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// author: jdoe
    /// tags: [greet]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Posts> {
        let mut posts = Vec::new();
        let mut static_files = Vec::new();
        for result in read_dir(source_directory)? {
            let entry = result?;
            let os_file_name = entry.file_name();
            let file_name = os_file_name.to_string_lossy();
            let path = entry.path();
            let relative = path
                .strip_prefix(source_directory)
                .map_err(|_| InvalidFileNameError(path.clone()))?;
            if Self::is_bundle(&entry)? {
                posts.push(self.parse_post_bundle(
                    source_directory,
                    relative,
                    &mut static_files,
                )?)
            } else if file_name.ends_with(MARKDOWN_EXTENSION) {
                posts.push(self.parse_post(source_directory, relative)?);
            }
        }

        check_unique(&posts)?;
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        log::info!("parsed {} posts from {:?}", posts.len(), source_directory);
        Ok((posts, static_files))
    }

    fn is_bundle(entry: &std::fs::DirEntry) -> std::io::Result<bool> {
        Ok(entry.file_type()?.is_dir()
            && entry.path().join(BUNDLE_INDEX).is_file())
    }
}

fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    match input[FENCE.len()..].find(FENCE) {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => Ok((
            FENCE.len(),                        // yaml_start
            FENCE.len() + offset,               // yaml_stop
            FENCE.len() + offset + FENCE.len(), // body_start
        )),
    }
}

/// Derives the slug from a post's path relative to the posts directory:
/// `foo.md` becomes `foo`, and the bundle `foo/index.md` also becomes `foo`.
/// The boolean reports whether the post is a bundle.
fn slug_for(relative_path: &Path) -> Result<(String, bool)> {
    let invalid = || InvalidFileNameError(relative_path.to_owned());
    let (stem_path, is_bundle) = if relative_path.ends_with(BUNDLE_INDEX) {
        (relative_path.parent().ok_or_else(invalid)?, true)
    } else {
        (relative_path, false)
    };

    let stem = match is_bundle {
        true => stem_path.file_name(),
        false => stem_path.file_stem(),
    }
    .ok_or_else(invalid)?
    .to_str()
    .ok_or_else(invalid)?;
    Ok((stem.to_owned(), is_bundle))
}

/// Strips surrounding slashes from a permalink and rejects any that would
/// escape the posts directory.
fn normalize_permalink(permalink: &str) -> Result<String> {
    let trimmed = permalink.trim().trim_matches('/');
    let escapes = Path::new(trimmed)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if trimmed.is_empty() || escapes {
        return Err(Error::InvalidPermalink(permalink.to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// Rejects two posts sharing a slug or resolving to the same page.
fn check_unique(posts: &[Post]) -> Result<()> {
    let mut slugs: HashSet<&str> = HashSet::new();
    let mut pages: HashMap<&Path, &str> = HashMap::new();
    for post in posts {
        if !slugs.insert(&post.slug) {
            return Err(Error::DuplicateSlug(post.slug.clone()));
        }
        if let Some(other) = pages.insert(&post.file_path, &post.slug) {
            return Err(Error::DuplicateSlug(format!(
                "{} (collides with {})",
                post.display_slug(),
                other
            )));
        }
    }
    Ok(())
}

#[derive(Deserialize, Clone)]
struct Frontmatter {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    description: Option<String>,

    /// The date of the post: `YYYY-MM-DD` or a full timestamp.
    date: String,

    /// The author's id in the author roster.
    #[serde(default)]
    author: Option<String>,

    /// A thumbnail path, relative to the post's asset directory, or a URL.
    #[serde(default)]
    thumbnail: Option<String>,

    /// Overrides the slug in the post's URL.
    #[serde(default)]
    permalink: Option<String>,

    #[serde(default)]
    tags: HashSet<String>,
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    /// Implements the [`std::error::Error`] trait for [`InvalidFileNameError`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

pub type Posts = (Vec<Post>, Vec<StaticFile>);

/// A bundle asset: its source path and its output path.
pub type StaticFile = (PathBuf, PathBuf);

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the frontmatter date isn't a date or timestamp.
    InvalidDate(String, chrono::ParseError),

    /// Returned when a permalink is empty after trimming or leaves the posts
    /// directory.
    InvalidPermalink(String),

    /// Returned when two posts share a slug or an output page.
    DuplicateSlug(String),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate(date, err) => {
                write!(f, "invalid date `{}`: {}", date, err)
            }
            Error::InvalidPermalink(permalink) => {
                write!(f, "invalid permalink `{}`", permalink)
            }
            Error::DuplicateSlug(slug) => write!(f, "duplicate slug `{}`", slug),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate(_, err) => Some(err),
            Error::InvalidPermalink(_) => None,
            Error::DuplicateSlug(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    struct Fixture {
        dir: tempfile::TempDir,
        index_url: Url,
        posts_url: Url,
        output: PathBuf,
    }

    impl Fixture {
        fn new() -> std::result::Result<Fixture, Box<dyn std::error::Error>> {
            let dir = tempfile::tempdir()?;
            fs::create_dir(dir.path().join("posts"))?;
            let output = dir.path().join("out/posts");
            Ok(Fixture {
                dir,
                index_url: Url::parse("https://example.com/pages/")?,
                posts_url: Url::parse("https://example.com/posts/")?,
                output,
            })
        }

        fn write(&self, relative: &str, contents: &str) -> std::io::Result<()> {
            let path = self.dir.path().join("posts").join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, contents)
        }

        fn parse(&self) -> Result<Posts> {
            Parser::new(&self.index_url, &self.posts_url, &self.output, 180)
                .parse_posts(&self.dir.path().join("posts"))
        }
    }

    #[test]
    fn test_parse_posts() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.write(
            "older.md",
            "---\ntitle: Older\ndate: 2021-01-01\nauthor: jdoe\ntags: [Rust, Blogging]\n---\nFirst post.\n",
        )?;
        fixture.write(
            "newer.md",
            "---\ndate: 2021-02-01\ndescription: The newer one\n---\nSecond post.\n",
        )?;

        let (posts, static_files) = fixture.parse()?;
        assert!(static_files.is_empty());
        assert_eq!(2, posts.len());

        let newer = &posts[0];
        assert_eq!("newer", newer.slug);
        assert_eq!(None, newer.title);
        assert_eq!(Some(String::from("The newer one")), newer.description);
        assert_eq!("https://example.com/posts/newer.html", newer.url.as_str());
        assert_eq!(fixture.output.join("newer.html"), newer.file_path);

        let older = &posts[1];
        assert_eq!("older", older.slug);
        assert_eq!(Some(String::from("Older")), older.title);
        assert_eq!(Some(String::from("jdoe")), older.author);
        assert_eq!("First post.", older.excerpt);
        assert!(older.body.contains("<p>First post.</p>"));
        let mut tags: Vec<&str> = older.tags.iter().map(|t| t.name.as_str()).collect();
        tags.sort_unstable();
        assert_eq!(vec!["blogging", "rust"], tags);
        Ok(())
    }

    #[test]
    fn test_parse_bundle() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.write(
            "bundle/index.md",
            "---\ntitle: Bundled\ndate: 2021-03-01\nthumbnail: thumb.png\n---\n![Cover](cover.jpg)\n",
        )?;
        fixture.write("bundle/cover.jpg", "jpeg")?;

        let (posts, static_files) = fixture.parse()?;
        assert_eq!(1, posts.len());
        let post = &posts[0];
        assert_eq!("bundle", post.slug);
        assert_eq!(
            "https://example.com/posts/bundle/thumb.png",
            post.thumbnail.as_ref().map(|i| i.src.as_str()).unwrap_or_default()
        );
        assert_eq!(
            "https://example.com/posts/bundle/cover.jpg",
            post.featured_image.as_ref().map(|i| i.src.as_str()).unwrap_or_default()
        );
        assert_eq!(1, static_files.len());
        assert_eq!(fixture.output.join("bundle/cover.jpg"), static_files[0].1);
        Ok(())
    }

    #[test]
    fn test_permalink_sets_url() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.write(
            "post.md",
            "---\ndate: 2021-03-01\npermalink: /2021/hello/\n---\nBody\n",
        )?;
        let (posts, _) = fixture.parse()?;
        assert_eq!(Some(String::from("2021/hello")), posts[0].permalink);
        assert_eq!("https://example.com/posts/2021/hello.html", posts[0].url.as_str());
        Ok(())
    }

    #[test]
    fn test_permalink_cannot_escape() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.write("post.md", "---\ndate: 2021-03-01\npermalink: ../../etc\n---\n")?;
        assert!(fixture.parse().is_err());
        Ok(())
    }

    #[test]
    fn test_missing_fences() -> TestResult {
        assert!(matches!(
            frontmatter_indices("no frontmatter"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            frontmatter_indices("---\ndate: 2021-01-01\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
        Ok(())
    }

    #[test]
    fn test_invalid_date_is_annotated() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.write("post.md", "---\ndate: yesterday\n---\n")?;
        match fixture.parse() {
            Err(Error::Annotated(annotation, err)) => {
                assert!(annotation.contains("post.md"));
                assert!(matches!(*err, Error::InvalidDate(_, _)));
            }
            other => panic!("expected an annotated date error, got {:?}", other.err()),
        }
        Ok(())
    }

    #[test]
    fn test_timestamps_order_same_day_posts() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.write("morning.md", "---\ndate: 2019-04-03T10:00:00.000Z\n---\n")?;
        fixture.write("evening.md", "---\ndate: 2019-04-03 18:00:00\n---\n")?;
        fixture.write("plain.md", "---\ndate: 2019-04-03\ntags: [\"!!!\", Rust]\n---\n")?;

        let (posts, _) = fixture.parse()?;
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["evening", "morning", "plain"], slugs);
        assert_eq!("April 03, 2019", posts[1].formatted_date());

        let tags: Vec<&str> = posts[2].tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(vec!["rust"], tags);
        Ok(())
    }

    #[test]
    fn test_permalink_collision_is_rejected() -> TestResult {
        let fixture = Fixture::new()?;
        fixture.write("a.md", "---\ndate: 2021-03-01\n---\n")?;
        fixture.write("b.md", "---\ndate: 2021-03-02\npermalink: a\n---\n")?;
        assert!(matches!(fixture.parse(), Err(Error::DuplicateSlug(_))));
        Ok(())
    }
}
