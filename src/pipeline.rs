//! The extraction run: extract, enrich, write a snapshot.

use crate::enrich::{Enrichment, GenreEnricher};
use crate::extract::{HistoryExtractor, StopReason};
use crate::r#trait::SpotifyApi;
use crate::snapshot::{SnapshotInfo, SnapshotStore};
use crate::Result;

/// Default number of events requested per extraction run.
pub const DEFAULT_EXTRACT_LIMIT: usize = 150;

/// What an extraction run produced.
#[derive(Debug)]
pub struct ExtractionReport {
    pub extracted: usize,
    pub stop: StopReason,
    /// `None` when nothing was extracted and enrichment was skipped
    pub enrichment: Option<Enrichment>,
    /// `None` when no snapshot was written
    pub snapshot: Option<SnapshotInfo>,
}

/// Run extractor, enricher and snapshot writer in sequence.
///
/// An empty extraction skips enrichment and writes no snapshot. Errors are
/// returned only for failures that end the run outright: an unparseable cursor
/// timestamp or a snapshot write failure.
pub async fn run_extraction<A, S>(api: &A, snapshots: &S, limit: usize) -> Result<ExtractionReport>
where
    A: SpotifyApi + ?Sized,
    S: SnapshotStore + ?Sized,
{
    let extraction = HistoryExtractor::new(api).extract(limit).await?;
    let extracted = extraction.len();

    if extraction.is_empty() {
        log::warn!("Extraction returned no events; skipping enrichment and snapshot.");
        return Ok(ExtractionReport {
            extracted,
            stop: extraction.stop,
            enrichment: None,
            snapshot: None,
        });
    }

    let enrichment = GenreEnricher::new(api).enrich(extraction.events).await;
    let snapshot = snapshots.write_snapshot(&enrichment.events)?;

    Ok(ExtractionReport {
        extracted,
        stop: extraction.stop,
        enrichment: Some(enrichment),
        snapshot,
    })
}
