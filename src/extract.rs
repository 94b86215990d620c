//! Cursor-paginated extraction of the recently played history.

use crate::r#trait::SpotifyApi;
use crate::{PlayEvent, Result, SyncError};

/// Maximum page size accepted by the recently played endpoint.
pub const PAGE_SIZE: u32 = 50;

/// Why an extraction stopped fetching pages.
#[derive(Debug)]
pub enum StopReason {
    /// The requested number of events was collected.
    LimitReached,
    /// The API returned an empty page.
    Exhausted,
    /// A page request failed; the events collected before it are kept.
    ApiError(SyncError),
}

/// Result of one extraction run.
#[derive(Debug)]
pub struct Extraction {
    /// Collected events, newest first, at most the requested limit
    pub events: Vec<PlayEvent>,
    pub stop: StopReason,
    /// Number of non-empty pages fetched
    pub pages: u32,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when a failed request cut the run short.
    pub fn is_partial(&self) -> bool {
        matches!(self.stop, StopReason::ApiError(_))
    }
}

/// Paginates the recently played endpoint with a `before` cursor.
///
/// Each page is requested with the play time of the previous page's last (oldest)
/// event as an exclusive upper bound, so pages never overlap. Requests are made
/// once; a failed request ends the run with whatever was collected.
pub struct HistoryExtractor<'a, A: SpotifyApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: SpotifyApi + ?Sized> HistoryExtractor<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Collect up to `limit` events, newest first.
    ///
    /// Only a `played_at` value that cannot be turned into a cursor is returned as
    /// an error; API failures end up in [`Extraction::stop`].
    pub async fn extract(&self, limit: usize) -> Result<Extraction> {
        log::info!("Starting extraction of {limit} recently played tracks...");

        let mut events: Vec<PlayEvent> = Vec::with_capacity(limit.min(PAGE_SIZE as usize));
        let mut before: Option<i64> = None;
        let mut pages = 0;
        let mut stop = StopReason::LimitReached;

        while events.len() < limit {
            log::debug!("Fetching page {} (before: {:?})", pages + 1, before);

            let page = match self.api.fetch_recently_played(PAGE_SIZE, before).await {
                Ok(page) => page,
                Err(e) => {
                    log::error!("API error while fetching recently played: {e}");
                    stop = StopReason::ApiError(e);
                    break;
                }
            };

            let Some(oldest) = page.last() else {
                log::warn!("No more data available.");
                stop = StopReason::Exhausted;
                break;
            };
            before = Some(oldest.cursor()?);

            pages += 1;
            events.extend(page);
            log::info!("Page processed. Total collected: {}", events.len());
        }

        events.truncate(limit);

        Ok(Extraction {
            events,
            stop,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::sample_event;
    use crate::r#trait::MockSpotifyApi;
    use chrono::{Duration, TimeZone, Utc};
    use mockall::predicate::eq;
    use mockall::Sequence;

    /// `count` events, newest first, starting `offset` minutes before 2024-01-01T10:00Z.
    fn page(offset: i64, count: i64) -> Vec<PlayEvent> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                let played_at = start - Duration::minutes(offset + i);
                sample_event(
                    &played_at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
                    &format!("track{}", offset + i),
                    "artist",
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_cursor_from_last_element_of_page() {
        let mut api = MockSpotifyApi::new();
        let mut seq = Sequence::new();

        let first = page(0, 50);
        let expected_cursor = first[49].cursor().unwrap();
        assert_eq!(expected_cursor, 1_704_103_200_000 - 49 * 60_000);

        api.expect_fetch_recently_played()
            .with(eq(50), eq(None::<i64>))
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _| Ok(first.clone()));
        api.expect_fetch_recently_played()
            .with(eq(50), eq(Some(expected_cursor)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(50, 10)));
        api.expect_fetch_recently_played()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Vec::new()));

        let extraction = HistoryExtractor::new(&api).extract(150).await.unwrap();

        assert_eq!(extraction.len(), 60);
        assert_eq!(extraction.pages, 2);
        assert!(matches!(extraction.stop, StopReason::Exhausted));
    }

    #[tokio::test]
    async fn test_single_event_page_cursor() {
        let mut api = MockSpotifyApi::new();
        let mut seq = Sequence::new();

        api.expect_fetch_recently_played()
            .with(eq(50), eq(None::<i64>))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![sample_event("2024-01-01T10:00:00.000Z", "t1", "a1")]));
        api.expect_fetch_recently_played()
            .with(eq(50), eq(Some(1_704_103_200_000)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Vec::new()));

        let extraction = HistoryExtractor::new(&api).extract(10).await.unwrap();
        assert_eq!(extraction.len(), 1);
    }

    #[tokio::test]
    async fn test_overshoot_trimmed_to_limit() {
        let mut api = MockSpotifyApi::new();
        let mut seq = Sequence::new();

        for offset in [0, 50, 100, 150] {
            api.expect_fetch_recently_played()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _| Ok(page(offset, 50)));
        }

        let extraction = HistoryExtractor::new(&api).extract(160).await.unwrap();

        assert_eq!(extraction.len(), 160);
        assert_eq!(extraction.pages, 4);
        assert!(matches!(extraction.stop, StopReason::LimitReached));
        assert_eq!(extraction.events[0].track_id, "track0");
        assert_eq!(extraction.events[159].track_id, "track159");
    }

    #[tokio::test]
    async fn test_first_page_failure_returns_empty() {
        let mut api = MockSpotifyApi::new();
        api.expect_fetch_recently_played()
            .times(1)
            .returning(|_, _| Err(SyncError::Http("connection refused".to_string())));

        let extraction = HistoryExtractor::new(&api).extract(150).await.unwrap();

        assert!(extraction.is_empty());
        assert!(extraction.is_partial());
        assert!(matches!(
            extraction.stop,
            StopReason::ApiError(SyncError::Http(_))
        ));
    }

    #[tokio::test]
    async fn test_later_failure_keeps_collected_events() {
        let mut api = MockSpotifyApi::new();
        let mut seq = Sequence::new();

        api.expect_fetch_recently_played()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(page(0, 50)));
        api.expect_fetch_recently_played()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(SyncError::RateLimit { retry_after: 30 }));

        let extraction = HistoryExtractor::new(&api).extract(150).await.unwrap();

        assert_eq!(extraction.len(), 50);
        assert!(extraction.is_partial());
    }

    #[tokio::test]
    async fn test_malformed_timestamp_aborts() {
        let mut api = MockSpotifyApi::new();
        api.expect_fetch_recently_played()
            .times(1)
            .returning(|_, _| Ok(vec![sample_event("not-a-timestamp", "t1", "a1")]));

        let result = HistoryExtractor::new(&api).extract(150).await;
        assert!(matches!(result, Err(SyncError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unbounded_limit_stops_when_exhausted() {
        let mut api = MockSpotifyApi::new();
        api.expect_fetch_recently_played()
            .with(eq(50), eq(None::<i64>))
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let extraction = HistoryExtractor::new(&api).extract(usize::MAX).await.unwrap();

        assert!(extraction.is_empty());
        assert_eq!(extraction.pages, 0);
        assert!(matches!(extraction.stop, StopReason::Exhausted));
    }
}
