//! Defines the [`Tag`] type, which represents a [`crate::post::Post`] topic.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use url::Url;

/// Represents a [`crate::post::Post`] topic. Tag names are slugified on
/// construction so e.g., `macOS` and `MacOS` resolve to the same tag and the
/// name can be dropped straight into a [`Url`].
#[derive(Clone, Debug)]
pub struct Tag {
    /// The slugified tag name.
    pub name: String,

    /// The URL for the tag's first feed page. Given an `index_url`, this
    /// looks like `{index_url}/{tag_name}/index.html`.
    pub url: Url,
}

impl Tag {
    /// Builds a [`Tag`] from a raw frontmatter label. The feed URL is
    /// `{index_url}/{slug}/index.html`.
    pub fn new(label: &str, index_url: &Url) -> Result<Tag, url::ParseError> {
        let name = slug::slugify(label);
        // `index_url` ends with a slash, so joining keeps the `pages/` prefix.
        let url = index_url.join(&format!("{}/index.html", name))?;
        Ok(Tag { name, url })
    }

    /// Builds the tag set for a post from its frontmatter labels. Labels that
    /// slugify to nothing (e.g. `!!!`) can't name a feed and are skipped.
    pub fn from_labels<I, S>(labels: I, index_url: &Url) -> Result<HashSet<Tag>, url::ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags = HashSet::new();
        for label in labels {
            let label = label.as_ref();
            if slug::slugify(label).is_empty() {
                log::warn!("skipping tag `{}`: it has no usable characters", label);
                continue;
            }
            tags.insert(Tag::new(label, index_url)?);
        }
        Ok(tags)
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `name`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `name` field.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Tag {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_slugifies_label() -> Result<(), url::ParseError> {
        let index_url = Url::parse("https://example.com/pages/")?;
        let tag = Tag::new("Machine Learning", &index_url)?;
        assert_eq!("machine-learning", tag.name);
        assert_eq!(
            "https://example.com/pages/machine-learning/index.html",
            tag.url.as_str()
        );
        Ok(())
    }

    #[test]
    fn test_equality_ignores_case_of_label() -> Result<(), url::ParseError> {
        let index_url = Url::parse("https://example.com/pages/")?;
        assert_eq!(Tag::new("macOS", &index_url)?, Tag::new("MacOS", &index_url)?);
        Ok(())
    }

    #[test]
    fn test_from_labels_skips_empty_slugs() -> Result<(), url::ParseError> {
        let index_url = Url::parse("https://example.com/pages/")?;
        let tags = Tag::from_labels(vec!["!!!", "---", "+", "Rust", "rust"], &index_url)?;
        assert_eq!(1, tags.len());
        assert!(tags.iter().all(|tag| tag.name == "rust"));
        Ok(())
    }
}
