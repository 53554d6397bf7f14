use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::tracking::TrackingState;

/// Durable home for per-account tracking state.
///
/// Both calls are best effort: a store that cannot read answers `None` and
/// tracking starts from zero, a store that cannot write logs and moves on.
pub trait StateStore: Send + Sync {
    fn load(&self, account: &str) -> Option<TrackingState>;
    fn save(&self, account: &str, state: &TrackingState);
}

impl<T: StateStore + ?Sized> StateStore for &T {
    fn load(&self, account: &str) -> Option<TrackingState> {
        (**self).load(account)
    }

    fn save(&self, account: &str, state: &TrackingState) {
        (**self).save(account, state)
    }
}

/// JSON files inside the store directory:
///   - mining_state_<account>.json: tracking state, one file per account
///   - last_user: account of the most recent session
#[derive(Clone, Debug)]
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    /// Construct using an explicit store directory.
    pub fn new<P: AsRef<Path>>(store_dir: P) -> Result<Self> {
        let root = store_dir.as_ref();
        fs::create_dir_all(root)
            .with_context(|| format!("creating store directory {}", root.display()))?;
        Ok(Self { root: root.to_path_buf() })
    }

    /// Accounts are case-insensitive upstream, so the key is lower-cased.
    /// Bytes outside `[a-z0-9_-]` are written as `%XX`, which keeps the name a
    /// single path component and distinct accounts in distinct files.
    pub fn state_path(&self, account: &str) -> PathBuf {
        let mut key = String::new();
        for b in account.trim().to_lowercase().bytes() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
                key.push(b as char);
            } else {
                key.push_str(&format!("%{b:02X}"));
            }
        }
        self.root.join(format!("mining_state_{key}.json"))
    }

    fn last_user_path(&self) -> PathBuf {
        self.root.join("last_user")
    }

    pub fn read_state(&self, account: &str) -> Result<Option<TrackingState>> {
        let path = self.state_path(account);
        if !path.exists() {
            return Ok(None);
        }
        let txt = fs::read_to_string(&path)?;
        let state = serde_json::from_str(&txt)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(state))
    }

    pub fn write_state(&self, account: &str, state: &TrackingState) -> Result<()> {
        let path = self.state_path(account);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(state)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Remember who logged in so the next start can skip the user argument.
    pub fn remember_user(&self, account: &str) -> Result<()> {
        fs::write(self.last_user_path(), account.trim())?;
        Ok(())
    }

    pub fn last_user(&self) -> Result<Option<String>> {
        let path = self.last_user_path();
        if !path.exists() {
            return Ok(None);
        }
        let user = fs::read_to_string(path)?.trim().to_string();
        Ok(if user.is_empty() { None } else { Some(user) })
    }

    /// Forget the remembered user. Tracking state files stay on disk.
    pub fn forget_user(&self) -> Result<()> {
        let path = self.last_user_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn load(&self, account: &str) -> Option<TrackingState> {
        match self.read_state(account) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Ignoring unreadable tracking state for {account}: {e:#}");
                None
            }
        }
    }

    fn save(&self, account: &str, state: &TrackingState) {
        if let Err(e) = self.write_state(account, state) {
            tracing::warn!("Could not persist tracking state for {account}: {e:#}");
        }
    }
}
