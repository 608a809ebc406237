//! Paginated feed controller.
//!
//! A [`FeedController`] owns the ordered list of items loaded so far for one
//! [`FilterSpec`] and pulls further fixed-size pages from a [`PageSource`] on
//! demand. It is safe to drive from several tasks at once:
//!
//! - at most one page fetch is outstanding per feed identity,
//! - every fetch is tagged with the generation it was issued under, and a
//!   result arriving after the filter changed is discarded,
//! - once a short page has been seen the feed is exhausted and further
//!   loads are skipped without touching the network.

mod filter;
mod grouping;
mod sensor;

pub use filter::FilterSpec;
pub use grouping::{
    date_from_name, group_by_month, group_by_month_now, month_key, DateSource, MonthGroup,
    YearMonth,
};
pub use sensor::{LoadGate, ScrollSensor, SentinelGeometry, ViewportHost};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::errors::ClientError;
use crate::models::MediaItem;

/// Supplier of feed pages.
///
/// Implemented by the catalog client (straight to the network) and by the
/// session's cached page source.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch up to `limit` items starting at `offset` for `filter`.
    async fn fetch_page(
        &self,
        filter: &FilterSpec,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<MediaItem>, ClientError>;

    /// Whether the page previously served for these arguments has since been
    /// invalidated by a mutation. Uncached sources never go stale.
    fn is_invalidated(&self, _filter: &FilterSpec, _offset: u32, _limit: u32) -> bool {
        false
    }
}

/// Why a load request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A fetch for this feed identity is already outstanding
    InFlight,
    /// The last page was short; there is nothing more to load
    Exhausted,
}

/// Result of a [`FeedController::load_more`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was appended
    Appended { added: usize, has_more: bool },
    /// No request was issued
    Skipped(SkipReason),
    /// The filter changed while the page was in flight; the page was dropped
    Superseded,
}

/// Point-in-time copy of a feed's observable state.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub filter: FilterSpec,
    pub generation: u64,
    pub items: Vec<MediaItem>,
    pub pages: usize,
    pub is_fetching: bool,
    pub has_more: bool,
    pub last_error: Option<ClientError>,
}

impl FeedSnapshot {
    pub fn month_groups(&self, now: chrono::NaiveDateTime) -> Vec<MonthGroup> {
        group_by_month(&self.items, now)
    }

    pub fn month_groups_now(&self) -> Vec<MonthGroup> {
        group_by_month_now(&self.items)
    }
}

#[derive(Debug, Default)]
struct FeedState {
    filter: FilterSpec,
    generation: u64,
    pages: Vec<Vec<MediaItem>>,
    in_flight: bool,
    exhausted: bool,
    last_error: Option<ClientError>,
    task: Option<AbortHandle>,
}

impl FeedState {
    fn item_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    /// Forget everything loaded under the current identity and move to a new
    /// generation. Any outstanding fetch becomes stale.
    fn reset(&mut self) {
        self.generation += 1;
        self.pages.clear();
        self.in_flight = false;
        self.exhausted = false;
        self.last_error = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Clears the in-flight flag if a load future is dropped before it settles.
struct InFlightGuard<'a> {
    feed: &'a FeedController,
    generation: u64,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.feed.state();
        if state.generation == self.generation {
            debug!(generation = self.generation, "page load cancelled");
            state.in_flight = false;
        }
    }
}

/// Incrementally loaded, filterable list of media items.
pub struct FeedController {
    source: Arc<dyn PageSource>,
    page_size: u32,
    fetch_timeout: Duration,
    state: Mutex<FeedState>,
}

impl FeedController {
    pub fn new(
        source: Arc<dyn PageSource>,
        filter: FilterSpec,
        page_size: u32,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            fetch_timeout,
            state: Mutex::new(FeedState {
                filter,
                ..FeedState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filter(&self) -> FilterSpec {
        self.state().filter.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn is_fetching(&self) -> bool {
        self.state().in_flight
    }

    /// False only after a short page has been received for the current identity.
    pub fn has_more(&self) -> bool {
        !self.state().exhausted
    }

    pub fn len(&self) -> usize {
        self.state().item_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_error(&self) -> Option<ClientError> {
        self.state().last_error.clone()
    }

    pub fn items(&self) -> Vec<MediaItem> {
        self.state().pages.iter().flatten().cloned().collect()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.state();
        FeedSnapshot {
            filter: state.filter.clone(),
            generation: state.generation,
            items: state.pages.iter().flatten().cloned().collect(),
            pages: state.pages.len(),
            is_fetching: state.in_flight,
            has_more: !state.exhausted,
            last_error: state.last_error.clone(),
        }
    }

    /// Month groups of everything loaded so far, against the local clock.
    pub fn month_groups(&self) -> Vec<MonthGroup> {
        group_by_month_now(&self.items())
    }

    /// Change the feed identity.
    ///
    /// Returns false and leaves the feed untouched when `filter` equals the
    /// current one. Otherwise loaded items are discarded, a new generation
    /// starts, and any outstanding fetch is abandoned.
    pub fn set_filter(&self, filter: FilterSpec) -> bool {
        let mut state = self.state();
        if state.filter == filter {
            return false;
        }
        info!(from = %state.filter, to = %filter, "feed filter changed");
        state.filter = filter;
        state.reset();
        true
    }

    /// Drop everything loaded and start over from the first page on the next
    /// load, keeping the current filter.
    pub fn reload(&self) {
        let mut state = self.state();
        debug!(filter = %state.filter, "feed reload");
        state.reset();
    }

    /// Change the filter and load its first page.
    pub async fn switch_filter(&self, filter: FilterSpec) -> Result<LoadOutcome, ClientError> {
        self.set_filter(filter);
        self.load_more().await
    }

    /// Fetch and append the next page.
    ///
    /// Errors are also recorded in the feed state and leave `has_more`
    /// untouched, so calling again retries the same offset.
    pub async fn load_more(&self) -> Result<LoadOutcome, ClientError> {
        let (filter, generation, offset) = {
            let mut state = self.state();
            if state.in_flight {
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }
            if state.exhausted {
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }
            state.in_flight = true;
            state.last_error = None;
            let offset = state.pages.len() as u32 * self.page_size;
            (state.filter.clone(), state.generation, offset)
        };

        let mut guard = InFlightGuard {
            feed: self,
            generation,
            armed: true,
        };

        debug!(filter = %filter, generation, offset, limit = self.page_size, "loading page");
        let result = match tokio::time::timeout(
            self.fetch_timeout,
            self.source.fetch_page(&filter, offset, self.page_size),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(format!(
                "page at offset {} for {} took longer than {:?}",
                offset, filter, self.fetch_timeout
            ))),
        };

        let mut state = self.state();
        guard.disarm();
        if state.generation != generation {
            debug!(
                filter = %filter,
                generation,
                current = state.generation,
                "discarding page from superseded feed"
            );
            return Ok(LoadOutcome::Superseded);
        }
        state.in_flight = false;
        state.task = None;

        match result {
            Ok(page) => {
                let added = page.len();
                state.exhausted = added < self.page_size as usize;
                state.pages.push(page);
                debug!(
                    filter = %filter,
                    offset,
                    added,
                    total = state.item_count(),
                    exhausted = state.exhausted,
                    "page appended"
                );
                Ok(LoadOutcome::Appended {
                    added,
                    has_more: !state.exhausted,
                })
            }
            Err(err) => {
                warn!(filter = %filter, offset, "page load failed: {}", err);
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Run [`load_more`](Self::load_more) on a background task.
    ///
    /// Returns `None` when the feed is busy or exhausted. The task is aborted
    /// if the filter changes before it completes.
    pub fn spawn_load_more(self: &Arc<Self>) -> Option<JoinHandle<Result<LoadOutcome, ClientError>>> {
        let mut state = self.state();
        if state.in_flight || state.exhausted {
            return None;
        }
        let feed = Arc::clone(self);
        let handle = tokio::spawn(async move { feed.load_more().await });
        state.task = Some(handle.abort_handle());
        Some(handle)
    }

    /// Reload from the first page if any loaded page was invalidated since it
    /// was fetched. Returns `None` when everything is still current.
    pub async fn refresh_if_invalidated(&self) -> Result<Option<LoadOutcome>, ClientError> {
        let (filter, pages) = {
            let state = self.state();
            (state.filter.clone(), state.pages.len() as u32)
        };
        let stale = (0..pages)
            .any(|page| self.source.is_invalidated(&filter, page * self.page_size, self.page_size));
        if !stale {
            return Ok(None);
        }

        info!(filter = %filter, pages, "feed invalidated, reloading");
        self.reload();
        self.load_more().await.map(Some)
    }
}

impl LoadGate for FeedController {
    fn is_fetching(&self) -> bool {
        FeedController::is_fetching(self)
    }

    fn has_more(&self) -> bool {
        FeedController::has_more(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, QueryCache};
    use crate::models::MediaKind;
    use crate::test_support::{items, ScriptedSource};

    const PAGE: u32 = 50;

    fn feed(source: &Arc<ScriptedSource>, filter: FilterSpec) -> Arc<FeedController> {
        Arc::new(FeedController::new(
            source.clone(),
            filter,
            PAGE,
            Duration::from_secs(30),
        ))
    }

    fn ids(feed: &FeedController) -> Vec<i64> {
        feed.items().iter().map(|i| i.id).collect()
    }

    #[tokio::test]
    async fn test_pages_until_short_page() {
        let source = Arc::new(ScriptedSource::default());
        source.respond(&FilterSpec::All, 0, Ok(items(1, 50)));
        source.respond(&FilterSpec::All, 50, Ok(items(51, 50)));
        source.respond(&FilterSpec::All, 100, Ok(items(101, 23)));
        let feed = feed(&source, FilterSpec::All);

        assert_eq!(
            feed.load_more().await.unwrap(),
            LoadOutcome::Appended { added: 50, has_more: true }
        );
        feed.load_more().await.unwrap();
        assert_eq!(
            feed.load_more().await.unwrap(),
            LoadOutcome::Appended { added: 23, has_more: false }
        );

        assert_eq!(feed.len(), 123);
        assert!(!feed.has_more());
        assert_eq!(ids(&feed), (1..=123).collect::<Vec<_>>());

        assert_eq!(
            feed.load_more().await.unwrap(),
            LoadOutcome::Skipped(SkipReason::Exhausted)
        );
        let offsets: Vec<u32> = source.calls().iter().map(|c| c.1).collect();
        assert_eq!(offsets, vec![0, 50, 100]);
    }

    #[tokio::test]
    async fn test_empty_first_page_exhausts() {
        let source = Arc::new(ScriptedSource::default());
        let feed = feed(&source, FilterSpec::Tag(9));

        assert_eq!(
            feed.load_more().await.unwrap(),
            LoadOutcome::Appended { added: 0, has_more: false }
        );
        assert!(feed.is_empty());
        assert!(!feed.has_more());
    }

    #[tokio::test]
    async fn test_error_keeps_has_more_and_retries_same_offset() {
        let source = Arc::new(ScriptedSource::default());
        source.respond(&FilterSpec::All, 0, Ok(items(1, 50)));
        source.respond(
            &FilterSpec::All,
            50,
            Err(ClientError::Transport("connection reset".into())),
        );
        let feed = feed(&source, FilterSpec::All);

        feed.load_more().await.unwrap();
        let err = feed.load_more().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(feed.len(), 50);
        assert!(feed.has_more());
        assert!(!feed.is_fetching());
        assert_eq!(feed.last_error(), Some(err));

        source.respond(&FilterSpec::All, 50, Ok(items(51, 10)));
        feed.load_more().await.unwrap();
        assert_eq!(feed.len(), 60);
        assert!(feed.last_error().is_none());
        let offsets: Vec<u32> = source.calls().iter().map(|c| c.1).collect();
        assert_eq!(offsets, vec![0, 50, 50]);
    }

    #[tokio::test]
    async fn test_concurrent_load_is_skipped() {
        let source = Arc::new(ScriptedSource::default());
        let release = source.gate(&FilterSpec::All, 0);
        let feed = feed(&source, FilterSpec::All);

        let first = tokio::spawn({
            let feed = feed.clone();
            async move { feed.load_more().await }
        });
        source.wait_for_calls(1).await;
        assert!(feed.is_fetching());

        assert_eq!(
            feed.load_more().await.unwrap(),
            LoadOutcome::Skipped(SkipReason::InFlight)
        );
        assert!(feed.spawn_load_more().is_none());

        release.send(Ok(items(1, 50))).unwrap();
        first.await.unwrap().unwrap();
        assert_eq!(source.call_count(), 1);
        assert!(!feed.is_fetching());
    }

    async fn race(a_first: bool) {
        let source = Arc::new(ScriptedSource::default());
        let videos = FilterSpec::MediaKind(MediaKind::Video);
        let release_a = source.gate(&FilterSpec::All, 0);
        let release_b = source.gate(&videos, 0);
        let feed = feed(&source, FilterSpec::All);

        let load_a = tokio::spawn({
            let feed = feed.clone();
            async move { feed.load_more().await }
        });
        source.wait_for_calls(1).await;

        assert!(feed.set_filter(videos.clone()));
        assert!(!feed.is_fetching());
        let load_b = tokio::spawn({
            let feed = feed.clone();
            async move { feed.load_more().await }
        });
        source.wait_for_calls(2).await;

        let (outcome_a, outcome_b) = if a_first {
            release_a.send(Ok(items(1, 50))).unwrap();
            let a = load_a.await.unwrap().unwrap();
            release_b.send(Ok(items(1001, 5))).unwrap();
            (a, load_b.await.unwrap().unwrap())
        } else {
            release_b.send(Ok(items(1001, 5))).unwrap();
            let b = load_b.await.unwrap().unwrap();
            release_a.send(Ok(items(1, 50))).unwrap();
            (load_a.await.unwrap().unwrap(), b)
        };

        assert_eq!(outcome_a, LoadOutcome::Superseded);
        assert_eq!(outcome_b, LoadOutcome::Appended { added: 5, has_more: false });
        assert_eq!(ids(&feed), vec![1001, 1002, 1003, 1004, 1005]);
        assert_eq!(feed.filter(), videos);
        assert!(!feed.is_fetching());
    }

    #[tokio::test]
    async fn test_stale_page_dropped_when_it_arrives_last() {
        race(false).await;
    }

    #[tokio::test]
    async fn test_stale_page_dropped_when_it_arrives_first() {
        race(true).await;
    }

    #[tokio::test]
    async fn test_same_filter_is_noop() {
        let source = Arc::new(ScriptedSource::default());
        source.respond(&FilterSpec::Person(4), 0, Ok(items(1, 50)));
        let feed = feed(&source, FilterSpec::Person(4));
        feed.load_more().await.unwrap();
        let generation = feed.generation();

        assert!(!feed.set_filter(FilterSpec::Person(4)));
        assert_eq!(feed.generation(), generation);
        assert_eq!(feed.len(), 50);

        assert!(feed.set_filter(FilterSpec::Person(5)));
        assert!(feed.is_empty());
        assert!(feed.has_more());
        assert_eq!(feed.generation(), generation + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_releases_feed() {
        let source = Arc::new(ScriptedSource::default());
        let _never = source.gate(&FilterSpec::All, 0);
        let feed = Arc::new(FeedController::new(
            source.clone(),
            FilterSpec::All,
            PAGE,
            Duration::from_secs(5),
        ));

        let err = feed.load_more().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
        assert!(!feed.is_fetching());
        assert!(feed.has_more());
        assert!(feed.is_empty());
    }

    /// Scripted pages read through a query cache, like a session feed.
    struct CachedScript {
        source: Arc<ScriptedSource>,
        cache: QueryCache,
    }

    #[async_trait]
    impl PageSource for CachedScript {
        async fn fetch_page(
            &self,
            filter: &FilterSpec,
            offset: u32,
            limit: u32,
        ) -> Result<Vec<MediaItem>, ClientError> {
            let source = self.source.clone();
            let owned = filter.clone();
            self.cache
                .fetch(CacheKey::feed_page(filter, offset, limit), move || async move {
                    source.fetch_page(&owned, offset, limit).await
                })
                .await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_feed_retries_after_timeout() {
        let source = Arc::new(ScriptedSource::default());
        let _never = source.gate(&FilterSpec::All, 0);
        let cached = Arc::new(CachedScript {
            source: source.clone(),
            cache: QueryCache::new(Duration::from_secs(30)),
        });
        let feed = FeedController::new(cached, FilterSpec::All, PAGE, Duration::from_secs(5));

        let err = feed.load_more().await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));

        source.respond(&FilterSpec::All, 0, Ok(items(1, 5)));
        assert_eq!(
            feed.load_more().await.unwrap(),
            LoadOutcome::Appended { added: 5, has_more: false }
        );
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_switching_back_after_abort_refetches() {
        let source = Arc::new(ScriptedSource::default());
        let _held = source.gate(&FilterSpec::All, 0);
        let cached = Arc::new(CachedScript {
            source: source.clone(),
            cache: QueryCache::new(Duration::from_secs(30)),
        });
        let feed = Arc::new(FeedController::new(
            cached,
            FilterSpec::All,
            PAGE,
            Duration::from_secs(30),
        ));

        let handle = feed.spawn_load_more().unwrap();
        source.wait_for_calls(1).await;
        feed.set_filter(FilterSpec::Tag(2));
        assert!(handle.await.unwrap_err().is_cancelled());

        feed.set_filter(FilterSpec::All);
        source.respond(&FilterSpec::All, 0, Ok(items(1, 2)));
        assert_eq!(
            feed.load_more().await.unwrap(),
            LoadOutcome::Appended { added: 2, has_more: false }
        );
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_load_clears_in_flight() {
        let source = Arc::new(ScriptedSource::default());
        let _held = source.gate(&FilterSpec::All, 0);
        let feed = feed(&source, FilterSpec::All);

        let task = tokio::spawn({
            let feed = feed.clone();
            async move { feed.load_more().await }
        });
        source.wait_for_calls(1).await;
        assert!(feed.is_fetching());

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!feed.is_fetching());
        assert!(feed.has_more());
    }

    #[tokio::test]
    async fn test_filter_change_aborts_spawned_load() {
        let source = Arc::new(ScriptedSource::default());
        let _held = source.gate(&FilterSpec::All, 0);
        let feed = feed(&source, FilterSpec::All);

        let handle = feed.spawn_load_more().unwrap();
        source.wait_for_calls(1).await;

        feed.set_filter(FilterSpec::Tag(2));
        assert!(handle.await.unwrap_err().is_cancelled());

        source.respond(&FilterSpec::Tag(2), 0, Ok(items(7, 3)));
        let outcome = feed.spawn_load_more().unwrap().await.unwrap().unwrap();
        assert_eq!(outcome, LoadOutcome::Appended { added: 3, has_more: false });
        assert_eq!(ids(&feed), vec![7, 8, 9]);
    }

    #[tokio::test]
    async fn test_refresh_if_invalidated() {
        let source = Arc::new(ScriptedSource::default());
        source.respond(&FilterSpec::All, 0, Ok(items(1, 50)));
        source.respond(&FilterSpec::All, 50, Ok(items(51, 50)));
        let feed = feed(&source, FilterSpec::All);
        feed.load_more().await.unwrap();
        feed.load_more().await.unwrap();

        assert_eq!(feed.refresh_if_invalidated().await.unwrap(), None);
        assert_eq!(source.call_count(), 2);

        source.set_invalidated(true);
        source.respond(&FilterSpec::All, 0, Ok(items(2, 49)));
        let outcome = feed.refresh_if_invalidated().await.unwrap();
        assert_eq!(
            outcome,
            Some(LoadOutcome::Appended { added: 49, has_more: false })
        );
        assert_eq!(ids(&feed), (2..=50).collect::<Vec<_>>());
        assert_eq!(source.calls().last().map(|c| c.1), Some(0));
    }

    #[tokio::test]
    async fn test_snapshot_and_gate() {
        let source = Arc::new(ScriptedSource::default());
        source.respond(&FilterSpec::All, 0, Ok(items(1, 3)));
        let feed = feed(&source, FilterSpec::All);
        feed.load_more().await.unwrap();

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.items.len(), 3);
        assert_eq!(snapshot.pages, 1);
        assert!(!snapshot.is_fetching);
        assert!(!snapshot.has_more);
        assert!(snapshot.last_error.is_none());

        let gate: &dyn LoadGate = &*feed;
        assert!(!gate.has_more());
        assert!(!gate.is_fetching());
    }
}
