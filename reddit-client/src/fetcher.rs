use crate::api::{RedditCommentData, RedditListing, RedditPostData, RedditUserData};
use persona_core::{ContentItem, CoreError, ItemKind, RedditApiError};
use tracing::{debug, info, warn};

/// Reddit caps listing pages at 100 entries.
pub const PAGE_SIZE: usize = 100;
/// Reddit stops paginating user listings after roughly 1000 entries.
const MAX_PAGES: usize = 10;

/// Paginated source of a user's public activity.
pub trait ContentSource {
    async fn user_about(&self, username: &str) -> Result<RedditUserData, CoreError>;

    async fn submissions(
        &self,
        username: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError>;

    async fn comments(
        &self,
        username: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditCommentData>, CoreError>;
}

/// Fetch up to `depth` posts and comments, most recent first.
///
/// Items with empty or deleted bodies are skipped rather than failing the
/// fetch. `depth == 0` is rejected before any request is made.
pub async fn fetch_content<S: ContentSource>(
    source: &S,
    username: &str,
    depth: usize,
) -> Result<Vec<ContentItem>, CoreError> {
    if depth == 0 {
        return Err(CoreError::invalid_input("depth must be a positive integer"));
    }

    let user = source.user_about(username).await?;
    if user.is_suspended {
        warn!("u/{} is suspended", username);
        return Err(CoreError::RedditApi(RedditApiError::AccessDenied {
            username: username.to_string(),
            reason: "account is suspended".to_string(),
        }));
    }

    let posts = fetch_kind(source, username, ItemKind::Post, depth).await?;
    let comments = fetch_kind(source, username, ItemKind::Comment, depth).await?;
    info!(
        "Collected {} posts and {} comments for u/{}",
        posts.len(),
        comments.len(),
        username
    );

    let mut items = posts;
    items.extend(comments);
    sort_most_recent_first(&mut items);
    items.truncate(depth);

    Ok(items)
}

async fn fetch_kind<S: ContentSource>(
    source: &S,
    username: &str,
    kind: ItemKind,
    depth: usize,
) -> Result<Vec<ContentItem>, CoreError> {
    let mut items = Vec::new();
    let mut after: Option<String> = None;
    let mut skipped = 0usize;

    for page in 0..MAX_PAGES {
        let limit = (depth - items.len()).min(PAGE_SIZE) as u32;

        let (entries, raw_count, next) = match kind {
            ItemKind::Post => {
                let listing = source.submissions(username, limit, after.as_deref()).await?;
                let raw_count = listing.data.children.len();
                let entries: Vec<_> = listing
                    .data
                    .children
                    .into_iter()
                    .filter_map(|child| child.data.into_content_item())
                    .collect();
                (entries, raw_count, listing.data.after)
            }
            ItemKind::Comment => {
                let listing = source.comments(username, limit, after.as_deref()).await?;
                let raw_count = listing.data.children.len();
                let entries: Vec<_> = listing
                    .data
                    .children
                    .into_iter()
                    .filter_map(|child| child.data.into_content_item())
                    .collect();
                (entries, raw_count, listing.data.after)
            }
        };

        skipped += raw_count - entries.len();
        items.extend(entries);
        debug!(
            "Page {} of {:?} for u/{}: {} entries, {} kept so far",
            page,
            kind,
            username,
            raw_count,
            items.len()
        );

        if items.len() >= depth || raw_count == 0 || next.is_none() {
            break;
        }
        after = next;
    }

    if skipped > 0 {
        debug!("Skipped {} empty or deleted {:?} entries", skipped, kind);
    }
    items.truncate(depth);
    Ok(items)
}

/// Newest first; equal timestamps fall back to id so ordering is stable.
pub fn sort_most_recent_first(items: &mut [ContentItem]) {
    items.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RedditListingChild, RedditListingData};
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct MockSource {
        missing: bool,
        suspended: bool,
        posts: Vec<RedditPostData>,
        comments: Vec<RedditCommentData>,
        calls: Cell<usize>,
        requested_limits: RefCell<Vec<u32>>,
    }

    fn page<T: Clone>(all: &[T], limit: u32, after: Option<&str>) -> RedditListing<T> {
        let start: usize = after.map(|a| a.parse().unwrap()).unwrap_or(0);
        let end = (start + limit as usize).min(all.len());
        let children = all[start..end]
            .iter()
            .cloned()
            .map(|data| RedditListingChild {
                kind: "t1".to_string(),
                data,
            })
            .collect();
        RedditListing {
            kind: "Listing".to_string(),
            data: RedditListingData {
                children,
                after: (end < all.len()).then(|| end.to_string()),
                before: None,
                dist: None,
            },
        }
    }

    impl ContentSource for MockSource {
        async fn user_about(&self, username: &str) -> Result<RedditUserData, CoreError> {
            self.calls.set(self.calls.get() + 1);
            if self.missing {
                return Err(CoreError::RedditApi(RedditApiError::ProfileNotFound {
                    username: username.to_string(),
                }));
            }
            Ok(RedditUserData {
                id: (!self.suspended).then(|| "abc".to_string()),
                name: username.to_string(),
                is_suspended: self.suspended,
                created_utc: None,
                link_karma: None,
                comment_karma: None,
            })
        }

        async fn submissions(
            &self,
            _username: &str,
            limit: u32,
            after: Option<&str>,
        ) -> Result<RedditListing<RedditPostData>, CoreError> {
            self.calls.set(self.calls.get() + 1);
            self.requested_limits.borrow_mut().push(limit);
            Ok(page(&self.posts, limit, after))
        }

        async fn comments(
            &self,
            _username: &str,
            limit: u32,
            after: Option<&str>,
        ) -> Result<RedditListing<RedditCommentData>, CoreError> {
            self.calls.set(self.calls.get() + 1);
            self.requested_limits.borrow_mut().push(limit);
            Ok(page(&self.comments, limit, after))
        }
    }

    fn post(id: &str, created_utc: f64) -> RedditPostData {
        RedditPostData {
            id: id.to_string(),
            title: format!("post {}", id),
            selftext: String::new(),
            author: "kojied".to_string(),
            subreddit: "rust".to_string(),
            permalink: format!("/r/rust/comments/{}/", id),
            created_utc,
            score: 1,
        }
    }

    fn comment(id: &str, body: &str, created_utc: f64) -> RedditCommentData {
        RedditCommentData {
            id: id.to_string(),
            body: body.to_string(),
            author: "kojied".to_string(),
            subreddit: "AskReddit".to_string(),
            permalink: format!("/r/AskReddit/comments/x/y/{}/", id),
            created_utc,
            score: 1,
            link_title: None,
        }
    }

    #[tokio::test]
    async fn test_zero_depth_makes_no_requests() {
        let source = MockSource::default();
        let result = fetch_content(&source, "kojied", 0).await;
        assert!(matches!(result, Err(CoreError::InvalidInput { .. })));
        assert_eq!(source.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_merges_most_recent_first_and_truncates() {
        let source = MockSource {
            posts: vec![post("p1", 100.0), post("p2", 300.0)],
            comments: vec![
                comment("c1", "first", 200.0),
                comment("c2", "second", 400.0),
                comment("c3", "third", 50.0),
            ],
            ..Default::default()
        };

        let items = fetch_content(&source, "kojied", 3).await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "p2", "c1"]);

        let all = fetch_content(&source, "kojied", 100).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_deleted_items_are_skipped() {
        let source = MockSource {
            comments: vec![
                comment("c1", "[deleted]", 500.0),
                comment("c2", "", 400.0),
                comment("c3", "kept", 300.0),
                comment("c4", "[removed]", 200.0),
            ],
            ..Default::default()
        };

        let items = fetch_content(&source, "kojied", 10).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "c3");
    }

    #[tokio::test]
    async fn test_paginates_until_depth() {
        let comments: Vec<_> = (0..250)
            .map(|i| comment(&format!("c{}", i), "body", 10_000.0 - i as f64))
            .collect();
        let source = MockSource {
            comments,
            ..Default::default()
        };

        let items = fetch_content(&source, "kojied", 150).await.unwrap();
        assert_eq!(items.len(), 150);
        assert_eq!(items[0].id, "c0");
        assert_eq!(items[149].id, "c149");
        // posts page (empty) plus two comment pages
        assert_eq!(*source.requested_limits.borrow(), vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn test_missing_and_suspended_profiles() {
        let missing = MockSource {
            missing: true,
            ..Default::default()
        };
        let err = fetch_content(&missing, "ghost", 10).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::RedditApi(RedditApiError::ProfileNotFound { .. })
        ));

        let suspended = MockSource {
            suspended: true,
            ..Default::default()
        };
        let err = fetch_content(&suspended, "banned", 10).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::RedditApi(RedditApiError::AccessDenied { .. })
        ));
        // only the profile lookup was made
        assert_eq!(suspended.calls.get(), 1);
    }

    #[test]
    fn test_sort_ties_by_id() {
        let mut items: Vec<_> = ["b", "a", "c"]
            .iter()
            .map(|id| comment(id, "same time", 100.0).into_content_item().unwrap())
            .collect();
        sort_most_recent_first(&mut items);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
