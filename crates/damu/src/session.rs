//! Agent identity gate.
//!
//! The agent's display name is kept in a small key/value store that lives as
//! long as the login session (the per-user runtime directory), so a restart
//! of the dashboard inside the same session stays logged in.

use crate::error::ValidationError;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Storage key holding the signed-in agent's name.
pub const AGENT_SESSION_KEY: &str = "agent-auth-token";

/// Minimal string key/value store backing the session.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

/// Process-local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    map: HashMap<String, String>,
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.map.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    map: HashMap<String, String>,
}

impl FileStorage {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn load(path: &Path) -> Self {
        let map = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            map,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.map)?;
        std::fs::write(&self.path, data)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.map.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        if self.map.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

/// Discover the default session file.
///
/// Checks `$DAMU_SESSION_FILE`, then falls back to
/// `$XDG_RUNTIME_DIR/damu/session.json` or `/tmp/damu-$UID/session.json`.
pub fn default_session_path() -> PathBuf {
    if let Ok(p) = std::env::var("DAMU_SESSION_FILE") {
        return PathBuf::from(p);
    }
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join("damu").join("session.json");
    }
    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/damu-{uid}/session.json"))
}

/// Admits an agent by name and remembers it in the injected storage.
#[derive(Debug)]
pub struct SessionGate<S> {
    storage: S,
    agent: Option<String>,
}

impl<S: SessionStorage> SessionGate<S> {
    /// Restore any agent already recorded in `storage`.
    pub fn new(storage: S) -> Self {
        let agent = storage
            .get(AGENT_SESSION_KEY)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Self { storage, agent }
    }

    /// Admit `name` (trimmed). A failing storage write is logged and the
    /// session proceeds in memory.
    pub fn login(&mut self, name: &str) -> Result<&str, ValidationError> {
        let name = crate::validation::agent_name(name)?;
        if let Err(e) = self.storage.set(AGENT_SESSION_KEY, &name) {
            tracing::warn!(error = %e, "could not persist agent session");
        }
        tracing::info!(agent = %name, "agent logged in");
        let agent = self.agent.insert(name);
        Ok(agent.as_str())
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.storage.remove(AGENT_SESSION_KEY) {
            tracing::warn!(error = %e, "could not clear agent session");
        }
        if let Some(agent) = self.agent.take() {
            tracing::info!(%agent, "agent logged out");
        }
    }

    pub fn current_agent(&self) -> Option<&str> {
        self.agent.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.agent.is_some()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct BrokenStorage;

    impl SessionStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&mut self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "quota exceeded"))
        }
        fn remove(&mut self, _key: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "quota exceeded"))
        }
    }

    #[test]
    fn login_trims_and_persists() {
        let mut gate = SessionGate::new(MemoryStorage::default());
        assert!(!gate.is_authenticated());
        assert_eq!(gate.login("  Wanjiru  ").unwrap(), "Wanjiru");
        assert_eq!(gate.current_agent(), Some("Wanjiru"));
        assert_eq!(
            gate.storage().get(AGENT_SESSION_KEY).as_deref(),
            Some("Wanjiru")
        );
    }

    #[test]
    fn blank_login_is_rejected() {
        let mut gate = SessionGate::new(MemoryStorage::default());
        assert!(gate.login("   ").is_err());
        assert!(!gate.is_authenticated());
        assert!(gate.storage().get(AGENT_SESSION_KEY).is_none());
    }

    #[test]
    fn logout_removes_key() {
        let mut gate = SessionGate::new(MemoryStorage::default());
        gate.login("Otieno").unwrap();
        gate.logout();
        assert_eq!(gate.current_agent(), None);
        assert!(gate.storage().get(AGENT_SESSION_KEY).is_none());
    }

    #[test]
    fn storage_failure_does_not_block_login() {
        let mut gate = SessionGate::new(BrokenStorage);
        assert_eq!(gate.login("Achieng").unwrap(), "Achieng");
        assert!(gate.is_authenticated());
        gate.logout();
        assert!(!gate.is_authenticated());
    }

    #[test]
    fn restores_agent_from_storage() {
        let mut storage = MemoryStorage::default();
        storage.set(AGENT_SESSION_KEY, "Kamau").unwrap();
        let gate = SessionGate::new(storage);
        assert_eq!(gate.current_agent(), Some("Kamau"));
    }

    #[test]
    fn file_storage_survives_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("session.json");
        let mut gate = SessionGate::new(FileStorage::load(&path));
        gate.login("Njeri").unwrap();

        let reopened = SessionGate::new(FileStorage::load(&path));
        assert_eq!(reopened.current_agent(), Some("Njeri"));
    }

    #[test]
    fn file_storage_logout_clears_file_entry() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        let mut gate = SessionGate::new(FileStorage::load(&path));
        gate.login("Njeri").unwrap();
        gate.logout();

        let reopened = FileStorage::load(&path);
        assert!(reopened.get(AGENT_SESSION_KEY).is_none());
        assert_eq!(reopened.path(), path);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let gate = SessionGate::new(FileStorage::load(&path));
        assert!(!gate.is_authenticated());
    }
}
