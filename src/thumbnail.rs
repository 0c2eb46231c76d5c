//! Precomputed post thumbnails, keyed by slug. The feed renderer falls back to
//! this map when a post doesn't declare a `thumbnail` in its frontmatter.

use crate::post::{Image, Post};
use std::collections::HashMap;

/// Maps a post's slug to its precomputed thumbnail.
pub type ThumbnailMap = HashMap<String, Image>;

/// Builds the thumbnail map from each post's featured image (the first image
/// in its body). Posts without one are left out.
pub fn featured_thumbnails(posts: &[Post]) -> ThumbnailMap {
    posts
        .iter()
        .filter_map(|post| {
            post.featured_image
                .as_ref()
                .map(|image| (post.slug.clone(), image.clone()))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::fixture;
    use url::Url;

    #[test]
    fn test_featured_thumbnails() -> Result<(), url::ParseError> {
        let image = Image {
            src: Url::parse("https://example.com/posts/a/cover.jpg")?,
            alt: String::from("cover"),
        };
        let mut with_image = fixture("a", "2021-01-02");
        with_image.featured_image = Some(image.clone());
        let without_image = fixture("b", "2021-01-01");

        let thumbnails = featured_thumbnails(&[with_image, without_image]);
        assert_eq!(1, thumbnails.len());
        assert_eq!(Some(&image), thumbnails.get("a"));
        assert_eq!(None, thumbnails.get("b"));
        Ok(())
    }
}
