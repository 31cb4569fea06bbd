use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use scraper_core::safe_filename;

use crate::types::{JobId, LinkReport, LinkStatus};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("no valid content to archive")]
    NoContent,
    #[error("archive io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip write failed: {0}")]
    Zip(#[from] zip::result::ZipError),
}

struct ArchiveEntry {
    bytes: Arc<Vec<u8>>,
    created_at: Instant,
}

/// In-memory store of downloadable bundles, one per job.
///
/// Bundles are held behind `Arc` so a fetch racing an eviction either gets
/// the whole archive or a clean miss, never partial bytes. An entry past
/// its retention age is never served, even before the sweep runs.
pub struct ArchiveStore {
    retention: Duration,
    entries: Mutex<HashMap<JobId, ArchiveEntry>>,
}

impl ArchiveStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Bundles every succeeded link into a zip of markdown files, one per
    /// link, named by title + URL hash. Returns the file count.
    pub fn build(&self, job_id: JobId, reports: &[LinkReport]) -> Result<usize, ArchiveError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut file_count = 0;
        for report in reports {
            if report.status != LinkStatus::Succeeded {
                continue;
            }
            let Some(content) = report.content.as_deref() else {
                continue;
            };
            let filename = safe_filename(report.title.as_deref(), report.url.as_str());
            log::debug!("archiving {filename} for {}", report.url);
            zip.start_file(filename, options)?;
            zip.write_all(format!("# Original URL: {}\n\n{content}", report.url).as_bytes())?;
            file_count += 1;
        }

        if file_count == 0 {
            return Err(ArchiveError::NoContent);
        }

        let bytes = zip.finish()?.into_inner();
        log::info!(
            "archived {file_count} files ({} bytes) for job {job_id}",
            bytes.len()
        );
        let mut entries = self.entries.lock().expect("archive lock");
        entries.insert(
            job_id,
            ArchiveEntry {
                bytes: Arc::new(bytes),
                created_at: Instant::now(),
            },
        );
        Ok(file_count)
    }

    /// Returns the bundle bytes, or `None` if the job has no archive or its
    /// retention window has elapsed. Expired entries are dropped on sight
    /// so eviction is monotonic.
    pub fn fetch(&self, job_id: &JobId) -> Option<Arc<Vec<u8>>> {
        let mut entries = self.entries.lock().expect("archive lock");
        match entries.get(job_id) {
            Some(entry) if entry.created_at.elapsed() <= self.retention => {
                Some(Arc::clone(&entry.bytes))
            }
            Some(_) => {
                entries.remove(job_id);
                None
            }
            None => None,
        }
    }

    /// Evicts every bundle past the retention window. Returns how many
    /// were dropped. Safe to run concurrently with in-flight fetches.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().expect("archive lock");
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() <= self.retention);
        let evicted = before - entries.len();
        if evicted > 0 {
            log::info!("evicted {evicted} expired archives");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("archive lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
