pub mod blocks;
pub mod discipline;
pub mod live;
pub mod names;
pub mod playlist;

use rayon::prelude::*;
use tracing::info;

use crate::config::ExtractOptions;
use crate::error::ScrapeError;
pub use live::{extract_matches, LiveMatchRecord};
pub use playlist::{Playlist, PlaylistBuilder};

/// Batch pipeline: documents → match blocks → playlist.
///
/// Documents are scanned in parallel and folded in input order.
pub fn build_playlist<S>(documents: &[S], opts: ExtractOptions) -> Result<Playlist, ScrapeError>
where
    S: AsRef<str> + Sync,
{
    let scanned: Vec<_> = documents
        .par_iter()
        .map(|doc| blocks::scan_document(doc.as_ref()))
        .collect();

    let mut builder = PlaylistBuilder::new(opts);
    for doc_blocks in &scanned {
        builder.add_blocks(doc_blocks);
    }

    let blocks_seen = builder.blocks_seen();
    let playlist = builder.finish();
    // Blocks whose rows were all malformed leave nothing to write.
    if playlist.disciplines().next().is_none() {
        return Err(ScrapeError::NoMatchesFound);
    }
    info!(
        "Folded {} match blocks from {} documents",
        blocks_seen,
        documents.len()
    );
    Ok(playlist)
}

// ── Tests ──
