// src/watch.rs

use crate::config::WatchConfig;
use crate::pipeline::{self, Pipeline};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Size and mtime of a file still being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    len: u64,
    modified: Option<SystemTime>,
}

#[derive(Debug)]
struct Pending {
    last: Snapshot,
    stable_polls: u32,
}

/// Polls a directory for PDFs that appear after startup and reports each one
/// once its size and mtime have stopped changing.
#[derive(Debug)]
pub struct DropFolder {
    dir: PathBuf,
    settle_polls: u32,
    seen: HashSet<PathBuf>,
    pending: HashMap<PathBuf, Pending>,
}

impl DropFolder {
    /// Files already in `dir` are not reported unless removed and dropped again.
    pub fn open(dir: impl Into<PathBuf>, settle_polls: u32) -> io::Result<Self> {
        let dir = dir.into();
        let seen = list_pdfs(&dir)?.into_iter().collect::<HashSet<_>>();
        debug!(dir = %dir.display(), existing = seen.len(), "Ignoring files present at startup");
        Ok(Self {
            dir,
            settle_polls,
            seen,
            pending: HashMap::new(),
        })
    }

    /// One directory scan. Returns the documents that are ready, in name order.
    pub fn poll(&mut self) -> io::Result<Vec<PathBuf>> {
        let present = list_pdfs(&self.dir)?;
        let present_set: HashSet<&PathBuf> = present.iter().collect();

        // vanished before they settled
        self.pending.retain(|path, _| present_set.contains(path));
        // removed files count as new if they are dropped again
        self.seen.retain(|path| present_set.contains(path));

        let mut ready = Vec::new();
        for path in present {
            if self.seen.contains(&path) {
                continue;
            }
            let Some(now) = snapshot(&path) else {
                continue;
            };

            match self.pending.get_mut(&path) {
                None => {
                    debug!(file = %path.display(), "New document, waiting for it to settle");
                    self.pending.insert(
                        path,
                        Pending {
                            last: now,
                            stable_polls: 0,
                        },
                    );
                }
                Some(pending) => {
                    if pending.last == now {
                        pending.stable_polls += 1;
                    } else {
                        pending.last = now;
                        pending.stable_polls = 0;
                    }
                    if now.len > 0 && pending.stable_polls >= self.settle_polls {
                        self.pending.remove(&path);
                        self.seen.insert(path.clone());
                        ready.push(path);
                    }
                }
            }
        }

        Ok(ready)
    }
}

fn snapshot(path: &Path) -> Option<Snapshot> {
    let meta = fs::metadata(path).ok()?;
    Some(Snapshot {
        len: meta.len(),
        modified: meta.modified().ok(),
    })
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Regular `.pdf` files directly inside `dir`, sorted.
fn list_pdfs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_pdf(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Watches `input_dir` until Ctrl-C, processing one document at a time.
pub async fn run(
    pipeline: Arc<Pipeline>,
    input_dir: &Path,
    cfg: &WatchConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut folder = DropFolder::open(input_dir, cfg.settle_polls)?;
    let mut ticker = time::interval(cfg.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(input = %input_dir.display(), output = %pipeline.output_dir().display(), "Watching");
    info!("Drop a PDF into the input folder. Exit: Ctrl+C");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = &mut shutdown => {
                res?;
                info!("Stopping");
                return Ok(());
            }
            _ = ticker.tick() => {
                let ready = match folder.poll() {
                    Ok(ready) => ready,
                    Err(e) => {
                        warn!(error = %e, "Failed to scan input folder");
                        continue;
                    }
                };
                for path in ready {
                    // outcome is logged inside; one bad document never stops the loop
                    let _ = pipeline::run_document(Arc::clone(&pipeline), path).await;
                }
            }
        }
    }
}
