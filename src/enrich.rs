//! Batched artist genre lookup joined back onto play events.

use crate::r#trait::SpotifyApi;
use crate::{PlayEvent, SyncError};
use std::collections::{HashMap, HashSet};

/// Maximum number of ids accepted by one artist lookup.
pub const ARTIST_BATCH_SIZE: usize = 50;

/// Genre assigned to artists whose genre list is empty.
pub const DEFAULT_GENRE: &str = "Pop";

/// A lookup batch that failed; its artists keep no genre.
#[derive(Debug)]
pub struct BatchFailure {
    pub artist_ids: Vec<String>,
    pub error: SyncError,
}

/// Result of enriching a set of events.
#[derive(Debug)]
pub struct Enrichment {
    /// The input events, same order and count, with `artist_genre` set
    pub events: Vec<PlayEvent>,
    /// Number of distinct artists that received a genre
    pub resolved_artists: usize,
    pub failed_batches: Vec<BatchFailure>,
}

impl Enrichment {
    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }
}

/// Resolves each event's artist to a genre label.
pub struct GenreEnricher<'a, A: SpotifyApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: SpotifyApi + ?Sized> GenreEnricher<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Look up genres for the distinct artists in `events` and set
    /// `artist_genre` on every event.
    ///
    /// Only `artist_genre` is touched. Events whose artist was in a failed batch
    /// (or unknown to the API) end up with `None`.
    pub async fn enrich(&self, mut events: Vec<PlayEvent>) -> Enrichment {
        log::info!("Enriching {} events with artist genres...", events.len());

        let artist_ids = distinct_artist_ids(&events);
        let mut genres: HashMap<String, String> = HashMap::with_capacity(artist_ids.len());
        let mut failed_batches = Vec::new();

        for batch in artist_ids.chunks(ARTIST_BATCH_SIZE) {
            match self.api.fetch_artists(batch).await {
                Ok(artists) => {
                    for artist in artists {
                        let genre = artist
                            .genres
                            .into_iter()
                            .next()
                            .unwrap_or_else(|| DEFAULT_GENRE.to_string());
                        genres.insert(artist.id, genre);
                    }
                }
                Err(e) => {
                    log::warn!("Failed to fetch {} artists: {e}", batch.len());
                    failed_batches.push(BatchFailure {
                        artist_ids: batch.to_vec(),
                        error: e,
                    });
                }
            }
        }

        for event in &mut events {
            event.artist_genre = genres.get(&event.artist_id).cloned();
        }

        log::info!(
            "Resolved genres for {} of {} artists ({} failed batches)",
            genres.len(),
            artist_ids.len(),
            failed_batches.len()
        );

        Enrichment {
            events,
            resolved_artists: genres.len(),
            failed_batches,
        }
    }
}

/// Distinct artist ids in order of first appearance.
pub fn distinct_artist_ids(events: &[PlayEvent]) -> Vec<String> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|event| seen.insert(event.artist_id.as_str()))
        .map(|event| event.artist_id.clone())
        .collect()
}
