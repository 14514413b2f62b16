//! Shared test utilities for the launcher crate.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use zip::write::SimpleFileOptions;

use crate::digest::digest_bytes;
use crate::extraction::{ArchiveExtractor, ExtractionError, ZipExtractor};
use crate::payload::{DELIVERY_DIR, EmbeddedPayload};
use crate::spawn::{LaunchRequest, LaunchedProcess, ProcessSpawner};

/// An in-memory payload archive and the digest of the executable inside.
#[derive(Debug, Clone)]
pub struct PayloadFixture {
    /// Zip archive bytes holding `Delivery/<executable>`.
    pub archive: Vec<u8>,
    /// Lowercase hex SHA-256 of the executable content.
    pub digest: String,
}

impl PayloadFixture {
    /// Borrow the fixture as an embedded payload.
    #[must_use]
    pub fn payload(&self) -> EmbeddedPayload<'_> {
        EmbeddedPayload::new(&self.archive, self.digest.as_bytes())
    }
}

/// Build a payload containing `Delivery/<executable_name>` with `content`.
///
/// # Panics
///
/// Panics if the archive cannot be written to memory.
#[must_use]
pub fn payload_fixture(executable_name: &str, content: &[u8]) -> PayloadFixture {
    let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
    writer
        .start_file(
            format!("{DELIVERY_DIR}/{executable_name}"),
            SimpleFileOptions::default().unix_permissions(0o755),
        )
        .expect("start payload entry");
    writer.write_all(content).expect("write payload entry");
    let archive = writer.finish().expect("finish payload archive").into_inner();
    PayloadFixture {
        archive,
        digest: digest_bytes(content).into_inner(),
    }
}

/// A [`ProcessSpawner`] that records requests instead of creating processes.
#[derive(Debug, Default)]
pub struct RecordingSpawner {
    requests: Mutex<Vec<LaunchRequest>>,
    failure: Option<io::ErrorKind>,
    next_pid: AtomicU32,
}

impl RecordingSpawner {
    /// A spawner whose every launch succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A spawner whose every launch fails with `kind`.
    #[must_use]
    pub fn failing(kind: io::ErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    /// Requests seen so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the request log mutex is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<LaunchRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

impl ProcessSpawner for RecordingSpawner {
    fn spawn(&self, request: &LaunchRequest) -> io::Result<LaunchedProcess> {
        self.requests.lock().expect("request log").push(request.clone());
        match self.failure {
            Some(kind) => Err(io::Error::from(kind)),
            None => Ok(LaunchedProcess::from_pid(
                self.next_pid.fetch_add(1, Ordering::Relaxed) + 1000,
            )),
        }
    }
}

/// An [`ArchiveExtractor`] that counts invocations of the wrapped extractor.
#[derive(Debug, Default)]
pub struct CountingExtractor<E = ZipExtractor> {
    inner: E,
    calls: AtomicUsize,
}

impl<E: ArchiveExtractor> CountingExtractor<E> {
    /// Wrap `inner`.
    pub const fn new(inner: E) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `extract` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<E: ArchiveExtractor> ArchiveExtractor for CountingExtractor<E> {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<String>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.extract(archive_path, dest_dir)
    }
}
