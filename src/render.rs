//! The feed page renderer. Turns one page worth of [`Post`]s into
//! [`PostSummary`] view models plus a [`Pagination`] descriptor.
//!
//! Each optional post field has exactly one fallback, resolved once when the
//! summary is built:
//!
//! | field          | first choice            | fallback                      |
//! |----------------|-------------------------|-------------------------------|
//! | `title`        | frontmatter `title`     | slug                          |
//! | `display_slug` | frontmatter `permalink` | slug                          |
//! | `description`  | frontmatter description | pruned excerpt                |
//! | `thumbnail`    | frontmatter `thumbnail` | [`ThumbnailMap`] entry, else none |
//! | `author`       | roster entry for the id | none                          |
//!
//! Nothing here fails: a sparse post degrades to whatever it can show.

use crate::author::{Author, AuthorIndex};
use crate::pagination::{Pagination, PaginationContext};
use crate::post::{non_empty, Image, Post};
use crate::tag::Tag;
use crate::thumbnail::ThumbnailMap;
use url::Url;

/// A post resolved for presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct PostSummary<'a> {
    pub slug: String,
    pub title: String,
    pub display_slug: String,
    pub url: Url,
    pub description: String,
    pub date: String,
    pub author: Option<&'a Author>,
    pub thumbnail: Option<Image>,
    pub tags: Vec<Tag>,
}

impl<'a> PostSummary<'a> {
    /// Resolves `post` against the author index and the thumbnail map.
    pub fn resolve(
        post: &Post,
        authors: &AuthorIndex<'a>,
        thumbnails: &ThumbnailMap,
    ) -> PostSummary<'a> {
        let author = match post.author.as_deref() {
            Some(id) => {
                let author = authors.get(id);
                if author.is_none() {
                    log::warn!("post `{}` references unknown author `{}`", post.slug, id);
                }
                author
            }
            None => None,
        };

        let mut tags: Vec<Tag> = post.tags.iter().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        PostSummary {
            slug: post.slug.clone(),
            title: non_empty(&post.title).unwrap_or(post.slug.as_str()).to_owned(),
            display_slug: post.display_slug().to_owned(),
            url: post.url.clone(),
            description: non_empty(&post.description)
                .unwrap_or(post.excerpt.as_str())
                .to_owned(),
            date: post.formatted_date(),
            author,
            thumbnail: post
                .thumbnail
                .as_ref()
                .or_else(|| thumbnails.get(&post.slug))
                .cloned(),
            tags,
        }
    }
}

/// One rendered feed page.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedPage<'a> {
    /// One summary per input post, in input order.
    pub summaries: Vec<PostSummary<'a>>,
    pub pagination: Pagination,
}

/// Renders a feed page. `posts` must already be the page's slice of the feed,
/// in display order; they are neither re-sorted nor filtered. The author index
/// is built fresh from `authors` for every call.
pub fn render_feed<'a, 'p, I>(
    posts: I,
    authors: &'a [Author],
    context: &PaginationContext,
    thumbnails: &ThumbnailMap,
) -> FeedPage<'a>
where
    I: IntoIterator<Item = &'p Post>,
{
    let index = AuthorIndex::new(authors);
    let summaries: Vec<PostSummary<'a>> = posts
        .into_iter()
        .map(|post| PostSummary::resolve(post, &index, thumbnails))
        .collect();
    let pagination = Pagination::new(context);
    log::debug!(
        "rendered feed page {}/{} with {} posts",
        pagination.current,
        pagination.total_pages,
        summaries.len()
    );
    FeedPage {
        summaries,
        pagination,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::author::test::fixture as author;
    use crate::post::test::fixture as post;
    use std::num::NonZeroUsize;

    fn context(total_count: usize, current: usize, limit: usize) -> PaginationContext {
        PaginationContext {
            total_count,
            current,
            limit: NonZeroUsize::new(limit).unwrap(),
        }
    }

    fn image(src: &str) -> Image {
        Image {
            src: Url::parse(src).unwrap(),
            alt: String::new(),
        }
    }

    #[test]
    fn test_title_falls_back_to_slug() {
        let mut untitled = post("untitled", "2021-01-01");
        let mut empty = post("empty", "2021-01-01");
        empty.title = Some(String::new());
        untitled.title = None;
        let mut titled = post("titled", "2021-01-01");
        titled.title = Some(String::from("Hello, World"));

        let page = render_feed(
            &[untitled, empty, titled],
            &[],
            &context(3, 1, 10),
            &ThumbnailMap::new(),
        );
        let titles: Vec<&str> = page.summaries.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(vec!["untitled", "empty", "Hello, World"], titles);
    }

    #[test]
    fn test_display_slug_prefers_permalink() {
        let mut permalinked = post("a-post", "2021-01-01");
        permalinked.permalink = Some(String::from("custom"));
        let plain = post("b-post", "2021-01-01");

        let page = render_feed(
            &[permalinked, plain],
            &[],
            &context(2, 1, 10),
            &ThumbnailMap::new(),
        );
        assert_eq!("custom", page.summaries[0].display_slug);
        assert_eq!("b-post", page.summaries[1].display_slug);
    }

    #[test]
    fn test_description_falls_back_to_excerpt() {
        let mut described = post("a", "2021-01-01");
        described.description = Some(String::from("Hand-written"));
        described.excerpt = String::from("Excerpt A…");
        let mut bare = post("b", "2021-01-01");
        bare.excerpt = String::from("Excerpt B…");

        let page = render_feed(
            &[described, bare],
            &[],
            &context(2, 1, 10),
            &ThumbnailMap::new(),
        );
        assert_eq!("Hand-written", page.summaries[0].description);
        assert_eq!("Excerpt B…", page.summaries[1].description);
    }

    #[test]
    fn test_thumbnail_precedence() {
        let own = image("https://example.com/own.jpg");
        let mapped = image("https://example.com/mapped.jpg");

        let mut with_own = post("with-own", "2021-01-03");
        with_own.thumbnail = Some(own.clone());
        let from_map = post("from-map", "2021-01-02");
        let without = post("without", "2021-01-01");

        let mut thumbnails = ThumbnailMap::new();
        thumbnails.insert(String::from("with-own"), mapped.clone());
        thumbnails.insert(String::from("from-map"), mapped.clone());

        let page = render_feed(
            &[with_own, from_map, without],
            &[],
            &context(3, 1, 10),
            &thumbnails,
        );
        assert_eq!(Some(own), page.summaries[0].thumbnail);
        assert_eq!(Some(mapped), page.summaries[1].thumbnail);
        assert_eq!(None, page.summaries[2].thumbnail);
    }

    #[test]
    fn test_unknown_author_resolves_to_none() {
        let authors = vec![author("jdoe", "Jane Doe")];
        let mut known = post("known", "2021-01-02");
        known.author = Some(String::from("jdoe"));
        let mut unknown = post("unknown", "2021-01-01");
        unknown.author = Some(String::from("ghost"));
        let anonymous = post("anonymous", "2021-01-01");

        let page = render_feed(
            &[known, unknown, anonymous],
            &authors,
            &context(3, 1, 10),
            &ThumbnailMap::new(),
        );
        assert_eq!(Some(&authors[0]), page.summaries[0].author);
        assert_eq!(None, page.summaries[1].author);
        assert_eq!(None, page.summaries[2].author);
    }

    #[test]
    fn test_order_is_preserved() {
        // Deliberately not in date order; the renderer must not re-sort.
        let posts = vec![
            post("c", "2020-01-01"),
            post("a", "2022-01-01"),
            post("b", "2021-01-01"),
        ];
        let page = render_feed(&posts, &[], &context(3, 1, 10), &ThumbnailMap::new());
        let slugs: Vec<&str> = page.summaries.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(vec!["c", "a", "b"], slugs);
    }

    #[test]
    fn test_empty_page() {
        let posts: Vec<Post> = Vec::new();
        let page = render_feed(&posts, &[], &context(0, 1, 10), &ThumbnailMap::new());
        assert!(page.summaries.is_empty());
        assert_eq!(1, page.pagination.current);
    }

    #[test]
    fn test_sparse_post_example() {
        let mut sparse = post("a-post", "2021-04-16");
        sparse.title = Some(String::new());
        sparse.description = Some(String::from("Hi"));
        let img_x = image("https://example.com/x.jpg");
        let mut thumbnails = ThumbnailMap::new();
        thumbnails.insert(String::from("a-post"), img_x.clone());

        let page = render_feed(&[sparse], &[], &context(1, 1, 10), &thumbnails);
        let summary = &page.summaries[0];
        assert_eq!("a-post", summary.title);
        assert_eq!("a-post", summary.display_slug);
        assert_eq!("Hi", summary.description);
        assert_eq!(Some(img_x), summary.thumbnail);
        assert_eq!("April 16, 2021", summary.date);
    }

    #[test]
    fn test_pagination_descriptor() {
        let page = render_feed(&Vec::<Post>::new(), &[], &context(25, 3, 10), &ThumbnailMap::new());
        assert_eq!(3, page.pagination.total_pages);
        assert_eq!(3, page.pagination.current);
        assert_eq!(25, page.pagination.total_count);
    }
}
