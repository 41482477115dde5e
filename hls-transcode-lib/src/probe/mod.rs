//! Media probing
//!
//! Runs the external prober, decodes its JSON and caches the typed result
//! per (path, mtime). Concurrent probes of the same file share one run.

mod cache;
mod external;
mod ffprobe;

pub use cache::{ProbeCache, ProbeCacheStats};
pub use external::{find_external_subtitles, DEFAULT_SUBTITLE_EXTENSIONS};
pub use ffprobe::{lowercase_keys, parse_probe_output, probe_invocation};

use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{HlsError, Result};
use crate::runner::{ToolError, ToolRunner};
use crate::types::{MediaFile, ProbeResult};

/// Default cache lifetime of a probe result.
pub const DEFAULT_PROBE_TTL: Duration = Duration::from_secs(30 * 60);

type ProbeCell = Arc<OnceCell<Arc<ProbeResult>>>;

/// Clears an in-flight entry when its caller finishes or is cancelled.
struct InFlightSlot<'a> {
    map: &'a DashMap<String, ProbeCell>,
    key: &'a str,
    cell: ProbeCell,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.map
            .remove_if(self.key, |_, cell| Arc::ptr_eq(cell, &self.cell));
    }
}

/// Probes media files through a [`ToolRunner`].
pub struct MediaProbe {
    runner: Arc<dyn ToolRunner>,
    ffprobe: PathBuf,
    timeout: Duration,
    cache: ProbeCache,
    in_flight: DashMap<String, ProbeCell>,
}

impl MediaProbe {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        ffprobe: impl Into<PathBuf>,
        timeout: Duration,
        ttl: Duration,
    ) -> Self {
        Self {
            runner,
            ffprobe: ffprobe.into(),
            timeout,
            cache: ProbeCache::new(ttl),
            in_flight: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &ProbeCache {
        &self.cache
    }

    /// Probe a file, serving from cache while the entry is live.
    pub async fn probe(&self, media: &MediaFile) -> Result<Arc<ProbeResult>> {
        let key = ProbeCache::make_key(media);

        // Fast path: already cached
        if let Some(hit) = self.cache.get(&key) {
            debug!("probe cache hit for {}", media.path.display());
            return Ok(hit);
        }

        // Slow path: get-or-create an in-flight cell for this key
        let cell = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        let _slot = InFlightSlot {
            map: &self.in_flight,
            key: &key,
            cell: cell.clone(),
        };

        let result = cell
            .get_or_try_init(|| async {
                // A concurrent caller may have finished between our miss and now.
                if let Some(hit) = self.cache.get(&key) {
                    return Ok(hit);
                }
                let probed = Arc::new(self.run_probe(media).await?);
                self.cache.insert(key.clone(), probed.clone());
                Ok::<_, HlsError>(probed)
            })
            .await
            .cloned();
        result
    }

    async fn run_probe(&self, media: &MediaFile) -> Result<ProbeResult> {
        let invocation = probe_invocation(&self.ffprobe, &media.path, self.timeout);
        debug!("probing: {}", invocation.command_line());

        let output = self.runner.run(&invocation).await.map_err(|e| match e {
            ToolError::Timeout { timeout, .. } => {
                HlsError::ProbeFailure(format!("Failed - probe timed out after {:?}", timeout))
            }
            other => HlsError::ProbeFailure(format!("Failed - {}", other)),
        })?;

        if !output.success {
            return Err(HlsError::ProbeFailure(format!(
                "Failed - {}",
                output.diagnostic()
            )));
        }

        let probed = parse_probe_output(&output.stdout)?;
        info!(
            "probed {}: {} streams, {:.3}s",
            media.path.display(),
            probed.streams.len(),
            probed.duration
        );
        Ok(probed)
    }
}
