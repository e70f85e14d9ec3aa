//! Provider-agnostic page traversal.
//!
//! [`paginate`] turns a page-fetch closure into a lazy stream of items.
//! Pages are requested strictly one after another; the stream ends when the
//! strategy says no further page exists and fails with `ATS_SERVICE_ERROR`
//! once the page cap is reached while a further page is still indicated.

use std::future::Future;

use futures::stream::{self, Stream, TryStreamExt};

use crate::AtsError;

/// Hard cap on pages fetched for one logical collection.
pub const DEFAULT_MAX_PAGES: usize = 1_000;

/// How the next page is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// Next page is a full URL supplied by the vendor.
    NextLink,
    /// Next page is `offset + page_size`; a short page ends traversal.
    Offset { page_size: usize },
}

/// Position handed to the fetch closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    First,
    Link(String),
    Offset { offset: usize, limit: usize },
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Only consulted by [`PaginationStrategy::NextLink`].
    pub next_link: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            next_link: None,
        }
    }

    pub fn with_next_link(mut self, next_link: Option<String>) -> Self {
        self.next_link = next_link;
        self
    }
}

/// Lazily walks every page, yielding items in vendor order.
pub fn paginate<T, F, Fut>(
    strategy: PaginationStrategy,
    max_pages: usize,
    fetch: F,
) -> impl Stream<Item = Result<T, AtsError>>
where
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, AtsError>>,
{
    let first = match strategy {
        PaginationStrategy::NextLink => PageCursor::First,
        PaginationStrategy::Offset { page_size } => PageCursor::Offset {
            offset: 0,
            limit: page_size.max(1),
        },
    };

    stream::try_unfold(
        (fetch, Some(first), 0_usize),
        move |(mut fetch, cursor, fetched)| async move {
            let Some(cursor) = cursor else {
                return Ok(None);
            };
            if fetched >= max_pages {
                return Err(AtsError::service(
                    format!("pagination aborted after {max_pages} pages"),
                    false,
                )
                .with_detail("max_pages", max_pages));
            }

            let page = fetch(cursor.clone()).await?;
            let next = next_cursor(&cursor, &page);
            Ok(Some((page.items, (fetch, next, fetched + 1))))
        },
    )
    .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
    .try_flatten()
}

/// Drains [`paginate`] into a vector; any page failure fails the whole call.
pub async fn collect_all<T, F, Fut>(
    strategy: PaginationStrategy,
    max_pages: usize,
    fetch: F,
) -> Result<Vec<T>, AtsError>
where
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, AtsError>>,
{
    paginate(strategy, max_pages, fetch).try_collect().await
}

fn next_cursor<T>(cursor: &PageCursor, page: &Page<T>) -> Option<PageCursor> {
    match cursor {
        PageCursor::Offset { offset, limit } => {
            if page.items.is_empty() || page.items.len() < *limit {
                None
            } else {
                Some(PageCursor::Offset {
                    offset: offset + limit,
                    limit: *limit,
                })
            }
        }
        PageCursor::First | PageCursor::Link(_) => page
            .next_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .map(|link| PageCursor::Link(link.to_owned())),
    }
}

/// Extracts the `rel="next"` target from an RFC 8288 `Link` header.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim().to_ascii_lowercase();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .map(str::to_owned)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn follows_links_until_absent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sizes = [100_usize, 100, 37];

        let items = collect_all(PaginationStrategy::NextLink, DEFAULT_MAX_PAGES, |cursor| {
            let calls = Arc::clone(&calls);
            async move {
                let index = calls.fetch_add(1, Ordering::SeqCst);
                match (index, &cursor) {
                    (0, PageCursor::First) => {}
                    (_, PageCursor::Link(link)) => assert_eq!(link, &format!("page-{index}")),
                    other => panic!("unexpected cursor {other:?}"),
                }
                let start = sizes[..index].iter().sum::<usize>();
                let items = (start..start + sizes[index]).collect::<Vec<_>>();
                let next = (index + 1 < sizes.len()).then(|| format!("page-{}", index + 1));
                Ok(Page::new(items).with_next_link(next))
            }
        })
        .await
        .expect("all pages fetched");

        assert_eq!(items.len(), 237);
        assert_eq!(items, (0..237).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn offset_stops_on_short_page() {
        let calls = Arc::new(AtomicUsize::new(0));

        let items = collect_all(
            PaginationStrategy::Offset { page_size: 50 },
            DEFAULT_MAX_PAGES,
            |cursor| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let PageCursor::Offset { offset, limit } = cursor else {
                        panic!("offset strategy must hand out offset cursors");
                    };
                    assert_eq!(limit, 50);
                    let len = if offset == 0 { 50 } else { 12 };
                    Ok(Page::new(vec![offset; len]))
                }
            },
        )
        .await
        .expect("two pages");

        assert_eq!(items.len(), 62);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn aborts_when_page_cap_is_exceeded() {
        let calls = Arc::new(AtomicUsize::new(0));

        let error = collect_all(PaginationStrategy::NextLink, 5, |_| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Page::new(vec![1]).with_next_link(Some(String::from("again"))))
            }
        })
        .await
        .expect_err("runaway pagination is aborted");

        assert_eq!(error.kind(), ErrorKind::Service);
        assert!(!error.retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn a_failed_page_fails_the_whole_collection() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<Vec<u8>, _> = collect_all(PaginationStrategy::NextLink, 10, |_| {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(Page::new(vec![1]).with_next_link(Some(String::from("p2"))))
                } else {
                    Err(AtsError::connection("timed out"))
                }
            }
        })
        .await;

        assert_eq!(result.expect_err("second page fails").kind(), ErrorKind::Connection);
    }

    #[test]
    fn parses_next_relation_from_link_header() {
        let header = r#"<https://harvest.greenhouse.io/v1/jobs?page=2&per_page=100>; rel="next", <https://harvest.greenhouse.io/v1/jobs?page=5&per_page=100>; rel="last""#;

        assert_eq!(
            next_link(header).as_deref(),
            Some("https://harvest.greenhouse.io/v1/jobs?page=2&per_page=100")
        );
        assert_eq!(
            next_link(r#"<https://x.test/jobs?page=1>; rel="prev""#),
            None
        );
    }
}
