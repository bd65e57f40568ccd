// Copyright (c) 2025 Kodama Project. All rights reserved.
// Released under the GPL-3.0 license as described in the file LICENSE.
// Authors: Kokic (@kokic), Spore (@s-cerevisiae)

use std::{
    fs,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use sha2::{Digest, Sha256};
use tempfile::Builder;

use crate::error::RenderError;

/// Cached renders untouched for longer than this are swept.
pub const RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Content-addressed store of katex output.
///
/// Entries are `<digest>.html` files. Nothing is locked: identical inputs
/// always land on the same name, and entries only appear through a rename,
/// so several processes may share one directory.
#[derive(Debug, Clone)]
pub struct RenderCache {
    dir: PathBuf,
    retention: Duration,
}

impl RenderCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<RenderCache> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(RenderCache {
            dir,
            retention: RETENTION,
        })
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{}.html", digest))
    }

    /// Return the rendered `tex`, running `produce(input, output)` on a miss.
    ///
    /// `key_parts` are the command parts the output depends on. The sweep of
    /// stale entries runs afterwards whether or not rendering succeeded.
    pub fn render<F>(&self, tex: &str, key_parts: &[String], produce: F) -> Result<String, RenderError>
    where
        F: FnOnce(&Path, &Path) -> Result<(), RenderError>,
    {
        let result = self.lookup_or_produce(tex, key_parts, produce);
        self.sweep();
        result
    }

    fn lookup_or_produce<F>(&self, tex: &str, key_parts: &[String], produce: F) -> Result<String, RenderError>
    where
        F: FnOnce(&Path, &Path) -> Result<(), RenderError>,
    {
        let digest = cmd_digest(tex, key_parts);
        let entry = self.entry_path(&digest);

        match touch(&entry) {
            Ok(()) => match fs::read_to_string(&entry) {
                Ok(html) => return Ok(html.trim().to_string()),
                // swept by another process in between
                Err(err) if err.kind() == ErrorKind::NotFound => (),
                Err(err) => return Err(err.into()),
            },
            Err(err) if err.kind() == ErrorKind::NotFound => (),
            Err(err) => return Err(err.into()),
        }

        // temp files are removed on drop, whatever the outcome
        let mut input = Builder::new()
            .prefix(&digest)
            .suffix(".tex")
            .tempfile_in(&self.dir)?;
        input.write_all(tex.as_bytes())?;
        input.flush()?;
        let output = Builder::new()
            .prefix(&digest)
            .suffix(".html")
            .tempfile_in(&self.dir)?;

        produce(input.path(), output.path())?;
        let html = fs::read_to_string(output.path())?;
        output.persist(&entry).map_err(io::Error::from)?;

        Ok(html.trim().to_string())
    }

    /// Delete entries whose modification time is older than the retention window.
    ///
    /// Best effort: files that vanish or cannot be inspected are skipped.
    pub fn sweep(&self) {
        let Some(min_mtime) = SystemTime::now().checked_sub(self.retention) else {
            return;
        };
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            if metadata.modified().is_ok_and(|mtime| mtime < min_mtime) {
                let _ = fs::remove_file(entry.path());
            }
        }
    }
}

/// SHA-256 over the formula followed by every command part, as lowercase hex.
pub fn cmd_digest(tex: &str, cmd_parts: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tex.as_bytes());
    for part in cmd_parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Refresh the modification time so the sweep keeps the entry around.
fn touch(path: &Path) -> io::Result<()> {
    let file = fs::OpenOptions::new().append(true).open(path)?;
    file.set_modified(SystemTime::now())
}
