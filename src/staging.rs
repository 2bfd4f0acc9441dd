// ABOUTME: Theme asset staging for the present-plus server
// ABOUTME: Copies resolved theme folders into uniquely numbered, web-reachable directories

use crate::errors::Result;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

/// Source of staging directory indices.
///
/// Implementations must hand out each index at most once, even when called
/// from many request threads at the same time.
pub trait StagingSequence: Send + Sync {
    fn next_index(&self) -> u64;
}

/// Lock-free counter starting at zero.
#[derive(Debug, Default)]
pub struct AtomicSequence {
    next: AtomicU64,
}

impl AtomicSequence {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl StagingSequence for AtomicSequence {
    fn next_index(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// How staged copies are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StagingPolicy {
    /// Every resolution gets its own directory; nothing is reclaimed until
    /// the next process start.
    #[default]
    PerResolution,
    /// A theme folder is staged once per content signature and the copy is
    /// shared by later resolutions.
    Reuse,
}

/// Cheap fingerprint of a theme folder's direct children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ThemeSignature {
    files: usize,
    bytes: u64,
    newest: Option<SystemTime>,
}

impl ThemeSignature {
    fn of(theme_dir: &Path) -> io::Result<Self> {
        let mut signature = ThemeSignature {
            files: 0,
            bytes: 0,
            newest: None,
        };
        for entry in fs::read_dir(theme_dir)? {
            let meta = entry?.metadata()?;
            if !meta.is_file() {
                continue;
            }
            signature.files += 1;
            signature.bytes += meta.len();
            let modified = meta.modified().ok();
            if modified > signature.newest {
                signature.newest = modified;
            }
        }
        Ok(signature)
    }
}

#[derive(Debug, Clone)]
struct StagedCopy {
    dir: PathBuf,
    public: String,
}

/// Copies theme folders below a staging root served over HTTP.
pub struct AssetStager {
    root: PathBuf,
    public_prefix: String,
    sequence: Arc<dyn StagingSequence>,
    policy: StagingPolicy,
    staged: Mutex<HashMap<(PathBuf, ThemeSignature), StagedCopy>>,
}

impl AssetStager {
    /// `root` is the filesystem directory that is served as `public_prefix`.
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
            sequence: Arc::new(AtomicSequence::default()),
            policy: StagingPolicy::default(),
            staged: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_sequence(mut self, sequence: Arc<dyn StagingSequence>) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_policy(mut self, policy: StagingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove everything staged by a previous run.
    pub fn reset(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => info!("Cleared staging directory {:?}", self.root),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.staged.lock().clear();
        Ok(())
    }

    /// Stage `theme_dir` and return the public path of the copy.
    ///
    /// Fails only when the staging directory cannot be created or the theme
    /// folder cannot be read; individual files that fail to copy are logged
    /// and left out.
    pub fn stage(&self, theme_dir: &Path) -> Result<String> {
        if self.policy == StagingPolicy::PerResolution {
            return Ok(self.stage_fresh(theme_dir)?.public);
        }

        let key = match ThemeSignature::of(theme_dir) {
            Ok(signature) => (theme_dir.to_path_buf(), signature),
            Err(e) => {
                warn!("Could not fingerprint theme folder {:?}: {}", theme_dir, e);
                return Ok(self.stage_fresh(theme_dir)?.public);
            }
        };

        if let Some(copy) = self.staged.lock().get(&key) {
            if copy.dir.is_dir() {
                debug!("Reusing staged copy {} for {:?}", copy.public, theme_dir);
                return Ok(copy.public.clone());
            }
        }

        let copy = self.stage_fresh(theme_dir)?;
        let public = copy.public.clone();
        self.staged.lock().insert(key, copy);
        Ok(public)
    }

    fn stage_fresh(&self, theme_dir: &Path) -> Result<StagedCopy> {
        let index = self.sequence.next_index();
        let dir = self.root.join(index.to_string());
        fs::create_dir_all(&dir)?;

        let copied = copy_theme_files(theme_dir, &dir)?;
        debug!("Staged {} file(s) from {:?} into {:?}", copied, theme_dir, dir);

        Ok(StagedCopy {
            dir,
            public: format!("{}/{}", self.public_prefix, index),
        })
    }
}

/// Flat copy of the files directly inside `source`. `fs::copy` carries the
/// permission bits over.
fn copy_theme_files(source: &Path, target: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(source)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error reading theme directory {:?}: {}", source, e);
                continue;
            }
        };
        let name = entry.file_name();
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            debug!("Skipping nested folder {:?} in theme {:?}", name, source);
            continue;
        }
        match fs::copy(entry.path(), target.join(&name)) {
            Ok(_) => copied += 1,
            Err(e) => warn!(
                "Error copying theme file {:?} to staging directory: {}",
                name, e
            ),
        }
    }
    Ok(copied)
}
