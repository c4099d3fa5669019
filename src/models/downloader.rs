//! Streaming model download with manual redirect chasing and throttled
//! progress reporting.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::settings::SettingsStore;
use super::types::{ModelDescriptor, ModelState, ModelStatus};

/// Upper bound on redirect hops. Without a cap a redirect cycle would never
/// terminate.
const MAX_REDIRECT_HOPS: usize = 10;

/// Reports progress only when it advances a whole percentage point (or hits
/// 100), so callback frequency stays bounded regardless of chunk granularity.
pub(crate) struct ProgressThrottle {
    total: Option<u64>,
    last_reported: f32,
}

impl ProgressThrottle {
    pub(crate) fn new(total: Option<u64>) -> Self {
        Self {
            total,
            last_reported: 0.0,
        }
    }

    /// Percentage to report for this many downloaded bytes, if a report is due.
    /// Unknown or zero totals never report; the transfer still completes.
    pub(crate) fn update(&mut self, downloaded: u64) -> Option<f32> {
        let total = self.total.filter(|t| *t > 0)?;
        let percent = ((downloaded as f64 / total as f64) * 100.0).min(100.0) as f32;

        if percent - self.last_reported >= 1.0 || (percent >= 100.0 && self.last_reported < 100.0) {
            self.last_reported = percent;
            Some(percent)
        } else {
            None
        }
    }
}

/// Download `model` to `dest`, reporting throttled progress.
///
/// Status transitions are persisted as whole-record replacements:
/// `downloading` before any bytes move, then `ready` on success or `error`
/// after cleanup on any failure. The partial file is removed best-effort; the
/// caller always sees the original error.
pub(crate) async fn download_model<F>(
    client: &Client,
    settings: &dyn SettingsStore,
    model: &ModelDescriptor,
    dest: &Path,
    on_progress: F,
) -> Result<PathBuf>
where
    F: Fn(f32) + Send + Sync,
{
    settings.set_selected_model(ModelState::new(model, ModelStatus::Downloading));
    info!("Starting download of model {} from {}", model.id, model.url);
    on_progress(0.0);

    match stream_to_file(client, model, dest, &on_progress).await {
        Ok(()) => {
            settings.set_selected_model(ModelState::new(model, ModelStatus::Ready));
            info!("Download complete for model {}", model.id);
            Ok(dest.to_path_buf())
        }
        Err(err) => {
            if let Err(rm) = tokio::fs::remove_file(dest).await {
                debug!("Could not remove partial file {}: {}", dest.display(), rm);
            }
            settings.set_selected_model(ModelState::new(model, ModelStatus::Error));
            Err(err)
        }
    }
}

async fn stream_to_file<F>(
    client: &Client,
    model: &ModelDescriptor,
    dest: &Path,
    on_progress: &F,
) -> Result<()>
where
    F: Fn(f32) + Send + Sync,
{
    let mut file = tokio::fs::File::create(dest).await?;
    let response = chase_redirects(client, &model.url).await?;

    let total = response.content_length();
    match total {
        Some(bytes) => info!("Total file size: {} bytes", bytes),
        None => warn!("Could not determine content length for download"),
    }

    let mut throttle = ProgressThrottle::new(total);
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(percent) = throttle.update(downloaded) {
            debug!("Download progress: {:.2}%", percent);
            on_progress(percent);
        }
    }

    file.flush().await?;
    Ok(())
}

/// Follow 3xx responses by hand until a non-redirect response arrives.
///
/// The client is built with redirects disabled so every hop passes through
/// here and counts against `MAX_REDIRECT_HOPS`.
async fn chase_redirects(client: &Client, url: &str) -> Result<Response> {
    let mut target = url.to_string();
    let mut hops = 0;

    loop {
        debug!("Requesting URL: {}", target);
        let response = client.get(&target).send().await?;
        let status = response.status();

        if status.is_redirection() {
            hops += 1;
            if hops > MAX_REDIRECT_HOPS {
                return Err(Error::TooManyRedirects(MAX_REDIRECT_HOPS));
            }

            // A redirect without a usable Location is treated like any other
            // unexpected status.
            let location = match response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
            {
                Some(loc) => loc.to_string(),
                None => return Err(Error::HttpStatus(status)),
            };

            // Location may be relative; resolve against the URL just fetched.
            let next = match response.url().join(&location) {
                Ok(url) => url.to_string(),
                Err(_) => return Err(Error::HttpStatus(status)),
            };

            info!("Redirect ({}) to: {}", status.as_u16(), next);
            drop(response);
            target = next;
            continue;
        }

        if !status.is_success() {
            return Err(Error::HttpStatus(status));
        }

        return Ok(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_reports_quarter_chunks_of_known_total() {
        let mut throttle = ProgressThrottle::new(Some(1000));
        let reports: Vec<f32> = [250u64, 500, 750, 1000]
            .iter()
            .filter_map(|d| throttle.update(*d))
            .collect();
        assert_eq!(reports, vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn throttle_skips_sub_point_advances() {
        let mut throttle = ProgressThrottle::new(Some(100_000));
        assert_eq!(throttle.update(500), None);
        assert_eq!(throttle.update(999), None);
        assert_eq!(throttle.update(1_000), Some(1.0));
        assert_eq!(throttle.update(1_500), None);
        assert_eq!(throttle.update(2_000), Some(2.0));
    }

    #[test]
    fn throttle_is_monotonic_and_always_reaches_terminal() {
        let mut throttle = ProgressThrottle::new(Some(1000));
        let mut last = 0.0;
        for downloaded in (0..1000).step_by(7) {
            if let Some(percent) = throttle.update(downloaded) {
                assert!(percent >= last, "{} < {}", percent, last);
                last = percent;
            }
        }
        // The final flush always produces the terminal signal, even when the
        // last whole-point report was less than a point away.
        assert_eq!(throttle.update(1000), Some(100.0));
        assert_eq!(throttle.update(1000), None);
    }

    #[test]
    fn throttle_is_silent_when_total_is_unknown() {
        let mut throttle = ProgressThrottle::new(None);
        assert_eq!(throttle.update(10_000), None);

        let mut throttle = ProgressThrottle::new(Some(0));
        assert_eq!(throttle.update(10), None);
    }
}
