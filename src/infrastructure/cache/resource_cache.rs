//! Asynchronous remote-resource cache engine.
//!
//! Owns the URL-to-entry map and the background download pipeline. Pollers
//! call [`ResourceCache::query_image`] or [`ResourceCache::query_text`] once
//! per frame; the first poll for a URL schedules its download and every
//! later poll reports progress without blocking.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, trace, warn};

use crate::domain::entities::{ImagePoll, ResourceKind, SharedImage, SharedText, TextPoll};
use crate::domain::ports::{FetchError, FetchPort, FetchResult};
use crate::infrastructure::config::ResourceCacheConfig;
use crate::infrastructure::http::HttpFetcher;

/// One slot in the cache map.
enum CacheEntry {
    /// Download scheduled but not resolved; no payload.
    Pending,
    /// Download finished; the payload is shared with every poller.
    Ready(Payload),
    /// Image download or decode failed; terminal until `clear`.
    Failed,
}

#[derive(Clone)]
enum Payload {
    Image(SharedImage),
    Text(SharedText),
}

/// Map state guarded by a single short-lived lock.
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Bumped by `clear`; fetch tasks compare against it before committing.
    generation: u64,
}

struct FetchJob {
    url: String,
    kind: ResourceKind,
    generation: u64,
}

enum FetchCommand {
    Fetch(FetchJob),
    /// Drop every job that has not started yet.
    Drain,
}

/// Outcome of one locked lookup on the entry map.
enum Lookup {
    /// This call inserted `Pending` and submitted the download.
    Scheduled,
    Pending,
    Ready(Payload),
    Failed,
}

struct Shared {
    state: Mutex<CacheState>,
    fetcher: Arc<dyn FetchPort>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Remote-resource cache with single-flight background downloads.
///
/// Constructed once per session and passed by reference to whatever
/// component polls it. Dropping the cache stops its dispatch worker;
/// downloads already in flight finish and are discarded.
pub struct ResourceCache {
    shared: Arc<Shared>,
    command_tx: mpsc::UnboundedSender<FetchCommand>,
    config: ResourceCacheConfig,
}

impl ResourceCache {
    /// Creates the cache and spawns its dispatch worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ResourceCacheConfig, fetcher: Arc<dyn FetchPort>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                generation: 0,
            }),
            fetcher,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        });

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1)));
        tokio::spawn(Self::run_worker_loop(
            Arc::clone(&shared),
            semaphore,
            command_rx,
        ));

        Self {
            shared,
            command_tx,
            config,
        }
    }

    /// Creates an HTTP-backed cache with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_defaults() -> FetchResult<Self> {
        Self::with_config(ResourceCacheConfig::default())
    }

    /// Creates an HTTP-backed cache with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_config(config: ResourceCacheConfig) -> FetchResult<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        Ok(Self::new(config, fetcher))
    }

    /// Polls for an image, scheduling its download on first sight of `url`.
    ///
    /// Never blocks; safe to call once per frame from a draw loop. A URL
    /// whose download failed keeps reporting [`ImagePoll::Failed`] until
    /// [`ResourceCache::clear`].
    #[must_use]
    pub fn query_image(&self, url: &str) -> ImagePoll {
        match self.lookup_or_schedule(url, ResourceKind::Image) {
            Lookup::Scheduled => ImagePoll::Begin,
            Lookup::Pending => ImagePoll::Downloading,
            Lookup::Ready(Payload::Image(image)) => {
                trace!(url = %url, "Image cache hit");
                ImagePoll::Ready(image)
            }
            // A text payload under this key can never become an image.
            Lookup::Ready(Payload::Text(_)) => ImagePoll::Downloading,
            Lookup::Failed => ImagePoll::Failed,
        }
    }

    /// Width of the cached image for `url`, or 0 while it is not ready.
    ///
    /// Shares the fetch-triggering side effect of
    /// [`ResourceCache::query_image`]: the first call for an unseen URL
    /// schedules the download.
    #[must_use]
    pub fn image_width(&self, url: &str) -> u32 {
        match self.query_image(url) {
            ImagePoll::Ready(image) => image.width(),
            _ => 0,
        }
    }

    /// Height of the cached image for `url`, or 0 while it is not ready.
    ///
    /// Same side effect as [`ResourceCache::image_width`].
    #[must_use]
    pub fn image_height(&self, url: &str) -> u32 {
        match self.query_image(url) {
            ImagePoll::Ready(image) => image.height(),
            _ => 0,
        }
    }

    /// Polls for a text document, scheduling its download on first sight of
    /// `url`.
    ///
    /// A failed download stabilizes as `Ready("")`.
    #[must_use]
    pub fn query_text(&self, url: &str) -> TextPoll {
        match self.lookup_or_schedule(url, ResourceKind::Text) {
            Lookup::Scheduled => TextPoll::Begin,
            Lookup::Pending => TextPoll::Downloading,
            Lookup::Ready(Payload::Text(text)) => {
                trace!(url = %url, "Text cache hit");
                TextPoll::Ready(text)
            }
            // An image payload under this key can never become text.
            Lookup::Ready(Payload::Image(_)) | Lookup::Failed => TextPoll::Downloading,
        }
    }

    /// Forgets every entry and starts a new generation.
    ///
    /// Queued-but-unstarted downloads are dropped. Downloads already in
    /// flight are not aborted; their results arrive carrying the old
    /// generation and are discarded.
    pub fn clear(&self) {
        let mut state = self.shared.state.lock();
        state.generation += 1;
        state.entries.clear();
        // Sent under the map lock so the drain cannot overtake a job
        // submitted for the new generation.
        if self.command_tx.send(FetchCommand::Drain).is_err() {
            error!("Dispatch worker is gone; nothing to drain");
        }
        debug!(generation = state.generation, "Cache cleared");
    }

    /// Returns hit/miss statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.shared.hits.load(Ordering::Relaxed);
        let misses = self.shared.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
        }
    }

    /// Number of entries whose download is still outstanding.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let state = self.shared.state.lock();
        state
            .entries
            .values()
            .filter(|entry| matches!(entry, CacheEntry::Pending))
            .count()
    }

    /// Number of tracked entries, pending ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    /// Returns true if no entry is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks `url` up, inserting `Pending` and submitting a download when
    /// unseen. The insert and the scheduling decision share one critical
    /// section, so concurrent first-queries produce exactly one download.
    fn lookup_or_schedule(&self, url: &str, kind: ResourceKind) -> Lookup {
        let mut state = self.shared.state.lock();

        if let Some(entry) = state.entries.get(url) {
            return match entry {
                CacheEntry::Pending => Lookup::Pending,
                CacheEntry::Ready(payload) => {
                    self.shared.hits.fetch_add(1, Ordering::Relaxed);
                    Lookup::Ready(payload.clone())
                }
                CacheEntry::Failed => {
                    self.shared.hits.fetch_add(1, Ordering::Relaxed);
                    Lookup::Failed
                }
            };
        }

        let job = FetchJob {
            url: url.to_owned(),
            kind,
            generation: state.generation,
        };
        state.entries.insert(url.to_owned(), CacheEntry::Pending);
        // Submitted under the map lock: the queue then sees jobs and drains
        // in generation order, so a drain issued by `clear` never drops a
        // job submitted after it.
        if self.command_tx.send(FetchCommand::Fetch(job)).is_err() {
            error!(url = %url, "Dispatch worker is gone; dropping fetch job");
        }
        drop(state);

        self.shared.misses.fetch_add(1, Ordering::Relaxed);
        debug!(url = %url, kind = %kind, "Scheduling download");
        Lookup::Scheduled
    }

    /// Dispatch loop: queues incoming jobs and spawns one fetch task per
    /// job as download permits free up. Exits when the cache is dropped.
    async fn run_worker_loop(
        shared: Arc<Shared>,
        semaphore: Arc<Semaphore>,
        mut command_rx: mpsc::UnboundedReceiver<FetchCommand>,
    ) {
        let mut queue: VecDeque<FetchJob> = VecDeque::new();

        loop {
            tokio::select! {
                // Commands take priority over dispatch so a drain lands
                // before any job it should have dropped gets spawned.
                biased;

                cmd = command_rx.recv() => {
                    match cmd {
                        // The entry map single-flights per URL, so every
                        // queued job is distinct.
                        Some(FetchCommand::Fetch(job)) => queue.push_back(job),
                        Some(FetchCommand::Drain) => queue.clear(),
                        None => break,
                    }
                }
                Ok(permit) = semaphore.clone().acquire_owned(), if !queue.is_empty() => {
                    if let Some(job) = queue.pop_front() {
                        let shared = Arc::clone(&shared);
                        tokio::spawn(async move {
                            Self::run_fetch(&shared, job).await;
                            drop(permit);
                        });
                    }
                }
            }
        }
    }

    async fn run_fetch(shared: &Shared, job: FetchJob) {
        let entry = match job.kind {
            ResourceKind::Image => {
                match Self::fetch_and_decode_image(&*shared.fetcher, &job.url).await {
                    Ok(image) => CacheEntry::Ready(Payload::Image(image)),
                    Err(err) => {
                        warn!(url = %job.url, error = %err, "Image download failed");
                        CacheEntry::Failed
                    }
                }
            }
            ResourceKind::Text => match shared.fetcher.fetch_text(&job.url).await {
                Ok(text) => CacheEntry::Ready(Payload::Text(Arc::from(text))),
                Err(err) => {
                    // A failed text download degrades to an empty string.
                    warn!(url = %job.url, error = %err, "Text download failed");
                    CacheEntry::Ready(Payload::Text(Arc::from("")))
                }
            },
        };

        Self::commit(shared, &job, entry);
    }

    async fn fetch_and_decode_image(fetcher: &dyn FetchPort, url: &str) -> FetchResult<SharedImage> {
        let bytes = fetcher.fetch_bytes(url).await?;

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| FetchError::Decode(format!("decode task panicked: {e}")))?
            .map_err(|e| FetchError::Decode(format!("failed to decode image: {e}")))?;

        Ok(Arc::new(image))
    }

    /// Writes a terminal entry unless the cache was cleared since the job
    /// was scheduled.
    fn commit(shared: &Shared, job: &FetchJob, entry: CacheEntry) {
        let mut state = shared.state.lock();
        if state.generation != job.generation {
            debug!(url = %job.url, "Discarding result from a cleared generation");
            return;
        }
        debug!(url = %job.url, kind = %job.kind, "Committing download result");
        state.entries.insert(job.url.clone(), entry);
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("config", &self.config)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Polls that observed a terminal entry.
    pub hits: u64,
    /// Polls that scheduled a download.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of tracked entries.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} entries, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}
