//! Defines the [`Post`] and [`Image`] types. Posts are produced by
//! [`crate::parser::Parser`] and consumed read-only by the feed renderer
//! ([`crate::render`]), the page writer ([`crate::write`]) and the Atom feed
//! ([`crate::feed`]).

use crate::tag::Tag;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use url::Url;

/// The display format for post dates, e.g. `April 16, 2021`.
pub const DATE_FORMAT: &str = "%B %d, %Y";

/// A resolved image reference (thumbnail, featured image, author avatar).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    /// The absolute URL of the image.
    pub src: Url,

    /// Alternate text. Empty when the source didn't provide any.
    pub alt: String,
}

/// Represents a blog post.
#[derive(Clone, Debug)]
pub struct Post {
    /// The slug assigned from the source location: the path relative to the
    /// posts directory without its extension, or the bundle directory name for
    /// `<dir>/index.md` bundles. Unique across the site.
    pub slug: String,

    /// The title from the frontmatter, if any.
    pub title: Option<String>,

    /// The description from the frontmatter, if any.
    pub description: Option<String>,

    /// The publication timestamp. Date-only frontmatter is midnight UTC.
    pub date: DateTime<FixedOffset>,

    /// The id of the post's author in the author roster, if any.
    pub author: Option<String>,

    /// The thumbnail declared in the frontmatter, if any.
    pub thumbnail: Option<Image>,

    /// The frontmatter override for the slug, if any.
    pub permalink: Option<String>,

    /// A plain-text excerpt of the body, already pruned to the configured
    /// excerpt length.
    pub excerpt: String,

    /// The first image in the post body, if any.
    pub featured_image: Option<Image>,

    /// The post's topics.
    pub tags: HashSet<Tag>,

    /// The URL of the rendered post page.
    pub url: Url,

    /// The output location of the rendered post page.
    pub file_path: PathBuf,

    /// The post body rendered to HTML.
    pub body: String,
}

impl Post {
    /// Returns the slug used to address the post: the permalink when it is
    /// set and non-empty, otherwise the assigned slug.
    pub fn display_slug(&self) -> &str {
        non_empty(&self.permalink).unwrap_or(self.slug.as_str())
    }

    /// Returns the publication date formatted for display.
    pub fn formatted_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Naive timestamp layouts accepted in frontmatter, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a frontmatter date. RFC 3339 timestamps (`2019-04-03T10:00:00.000Z`)
/// keep their offset, naive timestamps are taken as UTC, and plain dates
/// (`2019-04-03`) are midnight UTC.
pub fn parse_date(s: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Ok(date);
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(utc(naive));
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
    Ok(utc(date.and_time(NaiveTime::MIN)))
}

fn utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).into()
}

/// Treats an empty string the same as a missing one.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    match value.as_deref() {
        Some("") | None => None,
        Some(s) => Some(s),
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Builds a bare post for tests. Only the slug and date are set.
    pub(crate) fn fixture(slug: &str, date: &str) -> Post {
        Post {
            slug: slug.to_owned(),
            title: None,
            description: None,
            date: parse_date(date).unwrap(),
            author: None,
            thumbnail: None,
            permalink: None,
            excerpt: String::new(),
            featured_image: None,
            tags: HashSet::new(),
            url: Url::parse("https://example.com/posts/")
                .unwrap()
                .join(&format!("{}.html", slug))
                .unwrap(),
            file_path: PathBuf::from(format!("posts/{}.html", slug)),
            body: String::new(),
        }
    }

    #[test]
    fn test_display_slug_prefers_permalink() {
        let mut post = fixture("a-post", "2021-04-16");
        assert_eq!("a-post", post.display_slug());

        post.permalink = Some("custom/path".to_owned());
        assert_eq!("custom/path", post.display_slug());

        post.permalink = Some(String::new());
        assert_eq!("a-post", post.display_slug());
    }

    #[test]
    fn test_formatted_date() {
        let post = fixture("a-post", "2021-04-06");
        assert_eq!("April 06, 2021", post.formatted_date());
    }

    #[test]
    fn test_parse_date_accepts_timestamps() -> Result<(), chrono::ParseError> {
        let plain = parse_date("2019-04-03")?;
        assert_eq!("2019-04-03T00:00:00+00:00", plain.to_rfc3339());

        let rfc3339 = parse_date("2019-04-03T10:00:00.000Z")?;
        assert_eq!("2019-04-03T10:00:00+00:00", rfc3339.to_rfc3339());
        assert!(rfc3339 > plain);

        let offset = parse_date("2019-04-03T10:00:00+02:00")?;
        assert_eq!("2019-04-03T08:00:00+00:00", offset.with_timezone(&Utc).to_rfc3339());

        let naive = parse_date("2019-04-03 18:30:00")?;
        assert_eq!("2019-04-03T18:30:00+00:00", naive.to_rfc3339());

        assert!(parse_date("yesterday").is_err());
        Ok(())
    }

    #[test]
    fn test_timestamp_formats_as_day() -> Result<(), chrono::ParseError> {
        let mut post = fixture("a-post", "2021-04-06");
        post.date = parse_date("2021-04-16T23:15:00Z")?;
        assert_eq!("April 16, 2021", post.formatted_date());
        Ok(())
    }
}
