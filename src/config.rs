//! Loads the immutable site [`Config`] from a project directory:
//!
//! ```text
//! revved.yaml        project file (see below)
//! authors.json       author roster (optional)
//! posts/             post sources and bundles
//! static/            assets copied verbatim
//! theme/theme.yaml   template file lists (index, posts, topics)
//! ```
//!
//! The project file only accepts the options below; unknown keys are an
//! error.
//!
//! ```yaml
//! site_root: https://blog.example.com/
//! title: Revved
//! home_page: pages/index.html
//! page_size: 10
//! excerpt_length: 180
//! headline: Welcome to Revved
//! tagline: From the team building the marketplace.
//! author: { name: Jane Doe, email: jane@example.com }
//! seo: { title: Revved, images: [social/revved.jpg], keywords: [blog] }
//! header:
//!   logo: logo.svg
//!   links:
//!     - { label: RSS, href: feed.atom }
//! typography: { base_font_size: 18px }
//! ```

use crate::typography::TypographyConfig;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use url::Url;

/// The project file name searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "revved.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct ExcerptLength(usize);
impl Default for ExcerptLength {
    fn default() -> Self {
        ExcerptLength(crate::excerpt::DEFAULT_EXCERPT_LENGTH)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    site_root: Url,
    title: String,

    #[serde(default)]
    home_page: Option<String>,

    #[serde(default)]
    page_size: PageSize,

    #[serde(default)]
    excerpt_length: ExcerptLength,

    #[serde(default)]
    headline: Option<String>,

    #[serde(default)]
    tagline: Option<String>,

    #[serde(default)]
    author: Option<FeedAuthor>,

    #[serde(default)]
    seo: SeoSettings,

    #[serde(default)]
    header: HeaderSettings,

    #[serde(default)]
    typography: TypographyConfig,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SeoSettings {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct HeaderSettings {
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    links: Option<Vec<NavLinkSettings>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NavLinkSettings {
    label: String,
    href: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
    topics_template: Vec<PathBuf>,
}

/// The site author credited in the Atom feed.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FeedAuthor {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// SEO metadata emitted on feed pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seo {
    pub title: String,
    pub images: Vec<Url>,
    pub keywords: Vec<String>,
}

/// A link in the site header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavLink {
    pub label: String,
    pub href: Url,
}

/// The branded header: a logo linking home plus navigation links.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub logo: Option<Url>,
    pub links: Vec<NavLink>,
}

/// The resolved, immutable site configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub title: String,
    pub headline: Option<String>,
    pub tagline: Option<String>,
    pub author: Option<FeedAuthor>,
    pub seo: Seo,
    pub header: Header,
    pub typography: TypographyConfig,

    pub page_size: NonZeroUsize,
    pub excerpt_length: usize,

    pub posts_source_directory: PathBuf,
    pub static_source_directory: PathBuf,
    pub authors_file: PathBuf,
    pub index_template: Vec<PathBuf>,
    pub posts_template: Vec<PathBuf>,
    pub topics_template: Vec<PathBuf>,

    pub site_root: Url,
    pub home_page: Url,
    pub index_url: Url,
    pub posts_url: Url,
    pub static_url: Url,
    pub atom_url: Url,

    /// The URL of the topics listing (every tag with its post count).
    pub topics_url: Url,

    pub root_output_directory: PathBuf,
    pub index_output_directory: PathBuf,
    pub posts_output_directory: PathBuf,
    pub static_output_directory: PathBuf,
    pub topics_output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and then its ancestors for the project file and loads
    /// it.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::ProjectFileNotFound),
            }
        }
    }

    /// Loads the project file at `path` and the theme beside it.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = read_yaml(path)?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoParentDirectory(path.to_owned()))?;
        let theme_dir = project_root.join("theme");
        let theme: Theme = read_yaml(&theme_dir.join("theme.yaml"))?;

        let page_size =
            NonZeroUsize::new(project.page_size.0).ok_or(Error::InvalidPageSize)?;

        // `Url::join` drops the last path segment unless it ends in a slash.
        let mut site_root = project.site_root;
        if !site_root.path().ends_with('/') {
            let path = format!("{}/", site_root.path());
            site_root.set_path(&path);
        }

        let index_url = site_root.join("pages/")?;
        let static_url = site_root.join("static/")?;
        let atom_url = site_root.join("feed.atom")?;
        let topics_url = site_root.join("tags/")?;
        let home_page = match &project.home_page {
            Some(home_page) => site_root.join(home_page)?,
            None => site_root.clone(),
        };

        let seo = Seo {
            title: match project.seo.title {
                Some(title) => title,
                None => project.title.clone(),
            },
            images: project
                .seo
                .images
                .iter()
                .map(|image| static_url.join(image))
                .collect::<std::result::Result<Vec<Url>, url::ParseError>>()?,
            keywords: project.seo.keywords,
        };

        let links = match project.header.links {
            Some(links) => links
                .into_iter()
                .map(|link| -> Result<NavLink> {
                    Ok(NavLink {
                        href: site_root.join(&link.href)?,
                        label: link.label,
                    })
                })
                .collect::<Result<Vec<NavLink>>>()?,
            None => vec![
                NavLink {
                    label: String::from("All Topics"),
                    href: topics_url.clone(),
                },
                NavLink {
                    label: String::from("RSS"),
                    href: atom_url.clone(),
                },
            ],
        };
        let header = Header {
            logo: match &project.header.logo {
                Some(logo) => Some(static_url.join(logo)?),
                None => None,
            },
            links,
        };

        Ok(Config {
            title: project.title,
            headline: project.headline,
            tagline: project.tagline,
            author: project.author,
            seo,
            header,
            typography: project.typography,
            page_size,
            excerpt_length: project.excerpt_length.0,
            posts_source_directory: project_root.join("posts"),
            static_source_directory: project_root.join("static"),
            authors_file: project_root.join("authors.json"),
            index_template: theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            posts_template: theme
                .posts_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            topics_template: theme
                .topics_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            posts_url: site_root.join("posts/")?,
            index_url,
            static_url,
            atom_url,
            topics_url,
            home_page,
            site_root,
            root_output_directory: output_directory.to_owned(),
            index_output_directory: output_directory.join("pages"),
            posts_output_directory: output_directory.join("posts"),
            static_output_directory: output_directory.join("static"),
            topics_output_directory: output_directory.join("tags"),
        })
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|err| Error::Open {
        path: path.to_owned(),
        err,
    })?;
    serde_yaml::from_reader(file).map_err(|err| Error::DeserializeYaml {
        path: path.to_owned(),
        err,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or its ancestors.
    ProjectFileNotFound,

    /// Returned when the project file path has no parent directory.
    NoParentDirectory(PathBuf),

    /// Returned when a configuration file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when a configuration file isn't valid YAML or contains
    /// unrecognized options.
    DeserializeYaml { path: PathBuf, err: serde_yaml::Error },

    /// Returned when `page_size` is zero.
    InvalidPageSize,

    /// Returned when a configured path can't be joined onto the site root.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectFileNotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::NoParentDirectory(path) => write!(
                f,
                "Can't get parent directory for project file '{}'",
                path.display()
            ),
            Error::Open { path, err } => {
                write!(f, "Opening '{}': {}", path.display(), err)
            }
            Error::DeserializeYaml { path, err } => {
                write!(f, "Loading '{}': {}", path.display(), err)
            }
            Error::InvalidPageSize => write!(f, "`page_size` must be at least 1"),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectFileNotFound => None,
            Error::NoParentDirectory(_) => None,
            Error::Open { path: _, err } => Some(err),
            Error::DeserializeYaml { path: _, err } => Some(err),
            Error::InvalidPageSize => None,
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
