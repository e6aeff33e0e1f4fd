//! Extraction: the boundary to whatever produces the raw batch.
//!
//! An [`Extractor`] is a blocking call. [`CommandExtractor`] runs a shell
//! command that either writes the batch to the file named by
//! `$PASSBOARD_SNAPSHOT` or prints it as JSON on stdout. Stdout is only used
//! when the snapshot slot's watermark did not move while the command ran, so
//! progress chatter from a command that writes the slot itself is ignored.
//! Either way the batch ends up in the snapshot slot, whose mtime is the
//! watermark the orchestrator compares.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use passboard_core::config::SNAPSHOT_ENV;
use passboard_core::types::RawRecord;
use passboard_core::{RecordStore, ResolvedConfig};

use crate::error::{ExtractError, SyncError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Produces the current raw batch.
pub trait Extractor {
    fn extract(&mut self) -> Result<Vec<RawRecord>, ExtractError>;
}

impl<F> Extractor for F
where
    F: FnMut() -> Result<Vec<RawRecord>, ExtractError>,
{
    fn extract(&mut self) -> Result<Vec<RawRecord>, ExtractError> {
        self()
    }
}

// ---------------------------------------------------------------------------
// CommandExtractor
// ---------------------------------------------------------------------------

/// Runs `sh -c <command>` in the base directory.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    command: String,
    base_dir: PathBuf,
    store: RecordStore,
    timeout: Duration,
}

impl CommandExtractor {
    pub fn new(command: impl Into<String>, base_dir: impl Into<PathBuf>, store: RecordStore, timeout: Duration) -> Self {
        CommandExtractor {
            command: command.into(),
            base_dir: base_dir.into(),
            store,
            timeout,
        }
    }

    /// Build from configuration; fails when no command is configured.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, SyncError> {
        let command = config
            .extract_command
            .as_deref()
            .ok_or(SyncError::MissingExtractCommand)?;
        Ok(CommandExtractor::new(
            command,
            &config.base_dir,
            config.record_store(),
            config.extract_timeout,
        ))
    }

    fn spawn(&self) -> Result<Child, ExtractError> {
        Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.base_dir)
            .env(SNAPSHOT_ENV, self.store.snapshot_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExtractError::Spawn {
                command: self.command.clone(),
                source,
            })
    }
}

impl Extractor for CommandExtractor {
    fn extract(&mut self) -> Result<Vec<RawRecord>, ExtractError> {
        let started = Instant::now();
        tracing::info!("extracting: sh -c {:?}", self.command);

        let before = self.store.watermark();
        let mut child = self.spawn()?;
        // Drain both pipes concurrently so a chatty command cannot block on a
        // full pipe while we poll for exit.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    // Reader threads are detached; a grandchild may still hold
                    // the pipes open.
                    return Err(ExtractError::Timeout {
                        command: self.command.clone(),
                        secs: self.timeout.as_secs(),
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(ExtractError::Spawn {
                        command: self.command.clone(),
                        source,
                    });
                }
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        if !status.success() {
            return Err(ExtractError::Failed {
                command: self.command.clone(),
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            tracing::debug!("extract stderr: {}", stderr.trim());
        }

        if self.store.watermark().is_fresher_than(&before) {
            if !stdout.trim().is_empty() {
                tracing::debug!("snapshot written by command; stdout ignored: {}", stdout.trim());
            }
        } else if !stdout.trim().is_empty() {
            self.store.write_snapshot(&stdout)?;
        }
        let raw = self.store.load_snapshot()?;
        tracing::info!(
            "extraction finished: {} raw record(s) in {:.1}s",
            raw.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(raw)
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
