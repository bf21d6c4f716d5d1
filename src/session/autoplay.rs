//! Autoplay seeding: when the queue runs dry after a natural track end,
//! derive search terms from the last played title and queue one
//! recommendation.

use super::queue::TrackQueue;
use super::SESSION_LOG_TARGET;
use crate::node::client::{SearchSource, TrackSearchGateway};
use crate::node::models::TrackDescriptor;
use tracing::{debug, info, instrument, warn};

/// Tracks shorter than this are considered teasers/stings and are never
/// recommended.
const MIN_TRACK_MS: u64 = 30_000;

/// The seeder never grows the queue past this.
const QUEUE_SOFT_CAP: usize = 10;

/// How many results per term are considered before moving on.
const RESULTS_PER_TERM: usize = 5;

/// Derives up to three candidate search terms from a track title: the
/// artist-ish segment before a `" - "` delimiter (or the first word), the
/// first three words, and a genre-flavored variant of the first.
pub(crate) fn candidate_terms(title: &str) -> Vec<String> {
    let lowered = title.to_lowercase();
    let lead = match lowered.split_once(" - ") {
        Some((before, _)) => before.trim().to_string(),
        None => lowered
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let first_three = lowered
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");

    vec![lead.clone(), first_three, format!("music {}", lead)]
}

fn qualifies(track: &TrackDescriptor, reference_title: &str) -> bool {
    if track.title().to_lowercase() == reference_title.to_lowercase() {
        return false;
    }
    matches!(track.duration_ms(), Some(ms) if ms > MIN_TRACK_MS)
}

/// Tries each candidate term in order and enqueues the first qualifying
/// track. Returns whether anything was added.
///
/// Search failures for one term are swallowed and the next term is tried;
/// a completely dry run is not an error, the session just falls idle.
#[instrument(skip(search, queue), fields(reference = %reference_title))]
pub(super) async fn seed(
    search: &dyn TrackSearchGateway,
    source: Option<SearchSource>,
    queue: &mut TrackQueue,
    reference_title: &str,
) -> bool {
    if queue.len() >= QUEUE_SOFT_CAP {
        debug!(target: SESSION_LOG_TARGET,
            "Autoplay: queue already holds {} tracks, not seeding.", queue.len());
        return false;
    }

    for term in candidate_terms(reference_title) {
        if term.is_empty() {
            continue;
        }
        match search.search(&term, source).await {
            Ok(tracks) => {
                if let Some(pick) = tracks
                    .into_iter()
                    .take(RESULTS_PER_TERM)
                    .find(|t| qualifies(t, reference_title))
                {
                    info!(target: SESSION_LOG_TARGET,
                        "Autoplay: queued \"{}\" (term \"{}\")", pick.title(), term);
                    queue.enqueue(pick);
                    return true;
                }
                debug!(target: SESSION_LOG_TARGET,
                    "Autoplay: no qualifying result for term \"{}\"", term);
            }
            Err(e) => {
                warn!(target: SESSION_LOG_TARGET,
                    "Autoplay: search for \"{}\" failed: {}", term, e);
                continue;
            }
        }
    }

    false
}
