//! Bounded-concurrency download scheduler, grounded on the teacher's
//! `fetch_current_prices_with_progress` in `pricing/resolver.rs`
//! (`Arc<Semaphore>` + `JoinSet`, completion-order collection) and the
//! distilled spec's §4.4 component design.

use crate::domain::{DocumentFamily, DownloadJob, DownloadResult, YearRange};
use crate::error::IngestError;
use crate::governor::ResourceGovernor;
use crate::http_adapter::HttpAdapter;
use crate::retry::RetryPolicy;
use crate::validators::validate_destination;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const SIZE_TOLERANCE: f64 = 0.05;
const DEFAULT_MAX_WORKERS: usize = 8;

pub type ExtractorHook = Arc<dyn Fn(&Path) -> Result<(), IngestError> + Send + Sync>;

#[derive(Clone)]
pub struct SchedulerConfig {
    pub max_workers: usize,
    pub retry_policy: RetryPolicy,
    pub http_timeout: Duration,
    pub extractor_hook: Option<ExtractorHook>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            retry_policy: RetryPolicy::default(),
            http_timeout: Duration::from_secs(300),
            extractor_hook: Some(transcode_hook()),
        }
    }
}

impl SchedulerConfig {
    /// Build a scheduler config from the process-wide network settings
    /// (`DATAFIN_NETWORK_*`, §6/§4.13), keeping the default worker count
    /// and transcode hook. `max_retries` floors at 1 attempt: a configured
    /// `0` still means "try once", not "never try".
    pub fn from_network_config(network: &crate::config::NetworkConfig) -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            retry_policy: RetryPolicy {
                max_attempts: network.max_retries.max(1),
                multiplier: network.retry_backoff,
                ..RetryPolicy::default()
            },
            http_timeout: network.timeout,
            extractor_hook: Some(transcode_hook()),
        }
    }
}

/// The default post-download hook: transcode the freshly downloaded ZIP
/// into `.col` shards alongside it. Per spec §4.4, extractor errors are
/// recorded but never abort sibling jobs, so this only logs on failure.
fn transcode_hook() -> ExtractorHook {
    Arc::new(|path: &Path| -> Result<(), IngestError> {
        let is_zip = path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("zip")).unwrap_or(false);
        if !is_zip {
            return Ok(());
        }
        let destination_dir = path.parent().unwrap_or_else(|| Path::new("."));
        crate::transcoder::transcode(path, destination_dir).map(|_| ())
    })
}

/// Cooperative cancellation signal. Outstanding jobs observe it at await
/// points and terminate without leaving a partial artifact behind (the
/// HTTP adapter's `.partial` cleanup already guarantees the latter).
#[derive(Clone, Default)]
pub struct CancellationSignal(Arc<AtomicBool>);

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Download every CVM document family archive in `families` for each year
/// in `[initial_year, last_year]` into `destination`. Validates destination
/// safety synchronously before issuing any HTTP call, per spec §8 scenario
/// 5.
pub async fn download_cvm(
    destination: &Path,
    families: &[&str],
    initial_year: i32,
    last_year: i32,
) -> Result<DownloadResult, IngestError> {
    download_cvm_with_config(
        destination,
        families,
        initial_year,
        last_year,
        &SchedulerConfig::default(),
        &CancellationSignal::new(),
    )
    .await
}

pub async fn download_cvm_with_config(
    destination: &Path,
    families: &[&str],
    initial_year: i32,
    last_year: i32,
    config: &SchedulerConfig,
    cancel: &CancellationSignal,
) -> Result<DownloadResult, IngestError> {
    let destination = validate_destination(destination)?;

    let mut jobs = Vec::new();
    for raw_family in families {
        let family = DocumentFamily::parse(raw_family)?;
        if family.is_unpartitioned() {
            jobs.push(DownloadJob::new(family, None, &destination));
            continue;
        }

        let range = YearRange::new(initial_year, last_year, family.min_year_family())?;
        for year in range.years() {
            jobs.push(DownloadJob::new(family, Some(year), &destination));
        }
    }

    run_jobs(jobs, config, cancel).await
}

async fn run_jobs(
    jobs: Vec<DownloadJob>,
    config: &SchedulerConfig,
    cancel: &CancellationSignal,
) -> Result<DownloadResult, IngestError> {
    let governor = ResourceGovernor::global();
    let worker_count = governor.safe_worker_count(config.max_workers).max(1);
    let semaphore = Arc::new(Semaphore::new(worker_count));
    let adapter = Arc::new(HttpAdapter::new(config.http_timeout)?);

    let job_count = jobs.len();
    tracing::info!(worker_count, job_count, "starting download batch");

    let mut join_set = JoinSet::new();

    for job in jobs {
        let semaphore = semaphore.clone();
        let adapter = adapter.clone();
        let retry_policy = config.retry_policy;
        let extractor_hook = config.extractor_hook.clone();
        let cancel = cancel.clone();

        join_set.spawn(async move {
            let _permit = semaphore.acquire().await.unwrap();
            let identifier = job.identifier();

            if cancel.is_cancelled() {
                tracing::debug!(job = %identifier, "cancelled before start");
                return (identifier, Err(IngestError::NetworkError(
                    "cancelled before start".to_string(),
                )));
            }

            let outcome = run_single_job(&job, &adapter, &retry_policy, extractor_hook, &cancel).await;
            (identifier, outcome)
        });
    }

    let mut result = DownloadResult::new();
    while let Some(joined) = join_set.join_next().await {
        let (identifier, outcome) = joined.map_err(|e| IngestError::ExtractionError(e.to_string()))?;
        match outcome {
            Ok(path) => {
                tracing::info!(job = %identifier, path = %path.display(), "download succeeded");
                result.add_success(identifier, path)
            }
            Err(err) => {
                tracing::warn!(job = %identifier, error = %err, "download failed");
                result.add_error(identifier, err.to_string())
            }
        }
    }

    Ok(result)
}

async fn run_single_job(
    job: &DownloadJob,
    adapter: &HttpAdapter,
    retry_policy: &RetryPolicy,
    extractor_hook: Option<ExtractorHook>,
    cancel: &CancellationSignal,
) -> Result<PathBuf, IngestError> {
    let mut last_error = IngestError::NetworkError("no attempt made".to_string());

    for attempt in 0..retry_policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(IngestError::NetworkError("cancelled".to_string()));
        }

        match attempt_download(job, adapter).await {
            Ok(path) => {
                if let Some(hook) = &extractor_hook {
                    if let Err(err) = hook(&path) {
                        tracing::warn!(job = %job.identifier(), error = %err, "extractor hook failed");
                    }
                }
                return Ok(path);
            }
            Err(err) => {
                let retryable = retry_policy.is_retryable(&err);
                last_error = err;
                if !retryable || attempt + 1 == retry_policy.max_attempts {
                    break;
                }
                let backoff = retry_policy.backoff(attempt);
                tracing::debug!(
                    job = %job.identifier(),
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %last_error,
                    "retrying after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }

    Err(last_error)
}

/// HEAD the URL conditionally against whatever is already on disk at
/// `job.destination` and skip the GET entirely when the server reports
/// `304 Not Modified`, per SPEC_FULL §4.12. A destination that vanished or
/// was never downloaded has no `If-Modified-Since` to send, so this always
/// falls through to a full download on first run.
async fn attempt_download(job: &DownloadJob, adapter: &HttpAdapter) -> Result<PathBuf, IngestError> {
    let if_modified_since = existing_last_modified(&job.destination).await;
    let head = adapter.head(&job.url, if_modified_since.as_deref()).await?;

    if head.not_modified {
        return Ok(job.destination.clone());
    }

    let expected_size = head.content_length;

    adapter.stream_to_file(&job.url, &job.destination).await?;

    let actual_size = tokio::fs::metadata(&job.destination).await?.len();
    if let Some(expected) = expected_size {
        validate_size(actual_size, expected, &job.destination)?;
    }

    if job.destination.extension().and_then(|e| e.to_str()) == Some("zip") {
        validate_zip(&job.destination)?;
    }

    Ok(job.destination.clone())
}

/// `Last-Modified`-shaped timestamp of a destination already on disk, for
/// use as `If-Modified-Since` on the next HEAD. `None` when the file does
/// not yet exist or its mtime is unavailable on this platform.
async fn existing_last_modified(path: &Path) -> Option<String> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    let modified = metadata.modified().ok()?;
    Some(httpdate::fmt_http_date(modified))
}

fn validate_size(actual: u64, expected: u64, path: &Path) -> Result<(), IngestError> {
    if expected == 0 {
        return Ok(());
    }
    let delta = (actual as f64 - expected as f64).abs() / expected as f64;
    if delta > SIZE_TOLERANCE {
        let _ = std::fs::remove_file(path);
        return Err(IngestError::NetworkError(format!(
            "{}: downloaded size {} deviates more than {:.0}% from expected {}",
            path.display(),
            actual,
            SIZE_TOLERANCE * 100.0,
            expected
        )));
    }
    Ok(())
}

fn validate_zip(path: &Path) -> Result<(), IngestError> {
    match crate::zip_stream::ZipStreamer::open(path) {
        Ok(_) => Ok(()),
        Err(err) => {
            let _ = std::fs::remove_file(path);
            Err(IngestError::NetworkError(format!(
                "downloaded archive failed validation: {}",
                err
            )))
        }
    }
}
