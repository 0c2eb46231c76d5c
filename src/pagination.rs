//! Pagination for post feeds. A feed of `total_count` posts is split into pages
//! of `limit` posts; each generated page gets a [`PaginationContext`], and the
//! page's [`Pagination`] descriptor is what templates use to draw page links.

use std::num::NonZeroUsize;
use std::ops::RangeInclusive;

/// The pagination state for one generated feed page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationContext {
    /// The number of posts in the whole feed.
    pub total_count: usize,

    /// The 1-based index of this page.
    pub current: usize,

    /// The number of posts per page.
    pub limit: NonZeroUsize,
}

impl PaginationContext {
    /// Returns `ceil(total_count / limit)`. Zero when the feed is empty.
    pub fn total_pages(&self) -> usize {
        total_pages(self.total_count, self.limit)
    }

    /// Returns the number of posts preceding this page.
    pub fn skip(&self) -> usize {
        self.current.saturating_sub(1) * self.limit.get()
    }
}

fn total_pages(total_count: usize, limit: NonZeroUsize) -> usize {
    let limit = limit.get();
    match total_count % limit {
        0 => total_count / limit,
        _ => total_count / limit + 1,
    }
}

/// Yields one context per page of a feed of `total_count` posts. An empty feed
/// still gets a single (empty) page.
pub fn page_contexts(
    total_count: usize,
    limit: NonZeroUsize,
) -> impl Iterator<Item = PaginationContext> {
    let pages = total_pages(total_count, limit).max(1);
    (1..=pages).map(move |current| PaginationContext {
        total_count,
        current,
        limit,
    })
}

/// The pagination descriptor handed to the pagination control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub total_count: usize,
    pub current: usize,
    pub posts_per_page: usize,
    pub total_pages: usize,
}

impl Pagination {
    /// Builds the descriptor for `context`. A `current` outside
    /// `1..=total_pages` is clamped into range (an empty feed has the single
    /// page 1).
    pub fn new(context: &PaginationContext) -> Pagination {
        let total_pages = context.total_pages();
        let last = total_pages.max(1);
        let current = context.current.max(1).min(last);
        if current != context.current {
            log::warn!(
                "page {} is out of range 1..={}; clamping to {}",
                context.current,
                last,
                current
            );
        }

        Pagination {
            total_count: context.total_count,
            current,
            posts_per_page: context.limit.get(),
            total_pages,
        }
    }

    /// The previous page number, if any.
    pub fn prev(&self) -> Option<usize> {
        match self.current > 1 {
            true => Some(self.current - 1),
            false => None,
        }
    }

    /// The next page number, if any.
    pub fn next(&self) -> Option<usize> {
        match self.current < self.total_pages {
            true => Some(self.current + 1),
            false => None,
        }
    }

    /// All page numbers of the feed. Empty when the feed has no posts.
    pub fn pages(&self) -> RangeInclusive<usize> {
        1..=self.total_pages
    }
}

/// Returns the file name for a 1-based page number: `index.html` for the first
/// page and `{n}.html` for the rest.
pub fn page_file_name(page: usize) -> String {
    match page > 1 {
        false => String::from("index.html"),
        true => format!("{}.html", page),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let context = PaginationContext {
            total_count: 25,
            current: 3,
            limit: limit(10),
        };
        assert_eq!(3, context.total_pages());
        assert_eq!(20, context.skip());

        let pagination = Pagination::new(&context);
        assert_eq!(3, pagination.current);
        assert_eq!(3, pagination.total_pages);
        assert_eq!(10, pagination.posts_per_page);
        assert_eq!(Some(2), pagination.prev());
        assert_eq!(None, pagination.next());
    }

    #[test]
    fn test_total_pages_exact_multiple() {
        let context = PaginationContext {
            total_count: 20,
            current: 1,
            limit: limit(10),
        };
        assert_eq!(2, context.total_pages());
    }

    #[test]
    fn test_page_contexts_cover_every_post_once() {
        for total_count in 0..40 {
            for size in 1..12 {
                let contexts: Vec<_> = page_contexts(total_count, limit(size)).collect();
                assert!(!contexts.is_empty());

                let mut covered = 0;
                for (i, context) in contexts.iter().enumerate() {
                    assert_eq!(i + 1, context.current);
                    assert_eq!(covered, context.skip());
                    covered += size.min(total_count - context.skip().min(total_count));
                }
                assert_eq!(total_count, covered);
            }
        }
    }

    #[test]
    fn test_empty_feed_has_one_page() {
        let contexts: Vec<_> = page_contexts(0, limit(10)).collect();
        assert_eq!(1, contexts.len());

        let pagination = Pagination::new(&contexts[0]);
        assert_eq!(1, pagination.current);
        assert_eq!(0, pagination.total_pages);
        assert_eq!(None, pagination.prev());
        assert_eq!(None, pagination.next());
        assert_eq!(0, pagination.pages().count());
    }

    #[test]
    fn test_out_of_range_current_is_clamped() {
        let high = Pagination::new(&PaginationContext {
            total_count: 25,
            current: 7,
            limit: limit(10),
        });
        assert_eq!(3, high.current);

        let low = Pagination::new(&PaginationContext {
            total_count: 25,
            current: 0,
            limit: limit(10),
        });
        assert_eq!(1, low.current);
    }

    #[test]
    fn test_page_file_name() {
        assert_eq!("index.html", page_file_name(1));
        assert_eq!("2.html", page_file_name(2));
    }
}
