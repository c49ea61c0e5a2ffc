use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fastdl_fs::AtomicWriteOptions;
use fastdl_whitelist::{NormalizedPath, WhitelistEntry};

use crate::error::{ManifestError, Result};
use crate::format::ManifestFormat;

/// When buffered records are published.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushPolicy {
    /// Publish once this many new lines are buffered.
    pub max_pending: usize,
    /// Publish on the next record once the last flush is this old.
    pub max_age: Duration,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self {
            max_pending: 64,
            max_age: Duration::from_secs(2),
        }
    }
}

impl FlushPolicy {
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending.max(1);
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
}

/// Buffers manifest lines and publishes them atomically at flush boundaries.
///
/// `record` is O(1) between boundaries. Every flush rewrites the full body
/// to a temp file, fsyncs it and renames it over the manifest, so readers
/// only ever see complete manifests.
#[derive(Debug)]
pub struct ManifestWriter {
    path: PathBuf,
    format: ManifestFormat,
    policy: FlushPolicy,
    body: String,
    listed: HashSet<NormalizedPath>,
    lines: usize,
    pending: usize,
    dirty: bool,
    last_flush: Instant,
}

impl ManifestWriter {
    /// No I/O happens until the first flush, which publishes the (possibly
    /// empty) manifest.
    pub fn new(path: impl Into<PathBuf>, format: ManifestFormat, policy: FlushPolicy) -> Self {
        Self {
            path: path.into(),
            format,
            policy,
            body: String::new(),
            listed: HashSet::new(),
            lines: 0,
            pending: 0,
            dirty: true,
            last_flush: Instant::now(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> ManifestFormat {
        self.format
    }

    /// Manifest body as it will be published on the next flush.
    pub fn contents(&self) -> &str {
        &self.body
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// True when buffered lines have not been published yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Buffer a newly accepted entry; publishes if a flush boundary is hit.
    ///
    /// An `Err` means only that the boundary flush failed: the entry is
    /// buffered regardless and goes out with the next successful flush.
    pub fn record(&mut self, entry: &WhitelistEntry) -> Result<()> {
        let fresh = match self.format {
            ManifestFormat::Plain => self.listed.insert(entry.path.clone()),
            ManifestFormat::Tagged => true,
        };
        if fresh {
            self.format.write_line(entry, &mut self.body);
            self.lines += 1;
            self.pending += 1;
            self.dirty = true;
        }

        if self.flush_due() { self.flush() } else { Ok(()) }
    }

    fn flush_due(&self) -> bool {
        self.dirty
            && (self.pending >= self.policy.max_pending
                || self.last_flush.elapsed() >= self.policy.max_age)
    }

    /// Publish the buffered body now.
    ///
    /// A failure keeps the body and resets the batch counters, so the hot
    /// path does not retry until the next boundary.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.pending = 0;
        self.last_flush = Instant::now();

        fastdl_fs::ensure_dir(&self.path)
            .and_then(|_| {
                let options = AtomicWriteOptions::new().sync(true);
                fastdl_fs::atomic_write(&self.path, self.body.as_bytes(), options)
            })
            .map_err(|source| ManifestError::WriteFailure {
                path: self.path.clone(),
                source,
            })?;

        self.dirty = false;
        tracing::debug!(path = %self.path.display(), lines = self.lines, "manifest published");
        Ok(())
    }

    /// Final flush. The writer is consumed either way; a failure here is
    /// not retried on drop.
    pub fn close(mut self) -> Result<()> {
        let result = self.flush();
        self.dirty = false;
        result
    }
}

impl Drop for ManifestWriter {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(err) = self.flush() {
                tracing::warn!(error = %err, "manifest dropped with unpublished lines");
            }
        }
    }
}
