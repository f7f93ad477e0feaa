//! Per-target pipeline steps: page fetch -> decode -> extract/resolve, and
//! listing fetch -> enumerate. Each step maps every failure into a
//! [`FailureKind`] attributable to the page it was run for.

use engine_logging::{engine_info, engine_warn};

use crate::decode::decode_page;
use crate::fetch::{Fetcher, ProgressSink};
use crate::index::IndexEnumerator;
use crate::resolve::VideoResolver;
use crate::{EngineEvent, FailureKind, IndexEntry, ResolvedVideo, Stage, TargetId, TargetProgress};

async fn fetch_markup(fetcher: &dyn Fetcher, url: &str) -> Result<String, FailureKind> {
    let output = fetcher.fetch_page(url).await.map_err(|err| {
        engine_warn!("page fetch failed for {}: {}", url, err);
        err.kind
    })?;
    engine_info!(
        "fetched {} ({} bytes, {} redirects)",
        output.metadata.final_url,
        output.metadata.byte_len,
        output.metadata.redirect_count
    );
    let page = decode_page(&output.bytes, output.metadata.content_type.as_deref()).map_err(|err| {
        engine_warn!("{}: {}", url, err);
        FailureKind::Decode
    })?;
    Ok(page.markup)
}

/// Fetch a listing page and return its anchor entries in document order.
pub async fn list_index(
    fetcher: &dyn Fetcher,
    enumerator: &IndexEnumerator,
    site_origin: &str,
    url: &str,
) -> Result<Vec<IndexEntry>, FailureKind> {
    let url = crate::canonicalize_page_url(url, site_origin);
    let markup = fetch_markup(fetcher, &url).await?;
    let entries = enumerator.enumerate(&markup);
    engine_info!("listing {} has {} entries", url, entries.len());
    Ok(entries)
}

/// Fetch a video page and resolve its media URL and output filename.
pub async fn resolve_target(
    fetcher: &dyn Fetcher,
    resolver: &VideoResolver,
    target_id: TargetId,
    url: &str,
    sink: &dyn ProgressSink,
) -> Result<ResolvedVideo, FailureKind> {
    let url = resolver.page_url(url);
    sink.emit(EngineEvent::Progress(TargetProgress {
        target_id,
        stage: Stage::FetchingPage,
        bytes: None,
        total_bytes: None,
    }));
    let markup = fetch_markup(fetcher, &url).await?;

    sink.emit(EngineEvent::Progress(TargetProgress {
        target_id,
        stage: Stage::Resolving,
        bytes: None,
        total_bytes: None,
    }));
    resolver.resolve(&markup).map_err(|err| {
        engine_warn!("target {} ({}) not resolved: {}", target_id, url, err);
        FailureKind::Resolution(err)
    })
}
