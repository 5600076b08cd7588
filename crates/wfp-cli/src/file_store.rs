//! On-disk session and contact store for the terminal shell.
//!
//! Layout under the state directory:
//! `sessions/<id>.cbor` holds one CBOR-encoded session, `contacts.json`
//! lists registered addresses.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wfp_app::{ContactStore, Session, SessionStore, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Contacts {
    #[serde(default)]
    registered: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.root
            .join("sessions")
            .join(format!("{}.cbor", file_stem(session_id)))
    }

    fn contacts_path(&self) -> PathBuf {
        self.root.join("contacts.json")
    }

    async fn read_contacts(&self) -> Result<Contacts, StoreError> {
        match read_optional(&self.contacts_path()).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| StoreError::Serialization(err.to_string())),
            None => Ok(Contacts::default()),
        }
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        match read_optional(&self.session_path(session_id)).await? {
            Some(bytes) => serde_cbor::from_slice(&bytes)
                .map(Some)
                .map_err(|err| StoreError::Serialization(err.to_string())),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let bytes = serde_cbor::to_vec(session)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        write_creating_dirs(&self.session_path(&session.id), &bytes).await
    }
}

#[async_trait]
impl ContactStore for FileStore {
    async fn is_registered(&self, user: &str) -> Result<bool, StoreError> {
        Ok(self.read_contacts().await?.registered.contains(user))
    }

    async fn mark_registered(&self, user: &str) -> Result<(), StoreError> {
        let mut contacts = self.read_contacts().await?;
        if contacts.registered.insert(user.to_string()) {
            let bytes = serde_json::to_vec_pretty(&contacts)
                .map_err(|err| StoreError::Serialization(err.to_string()))?;
            write_creating_dirs(&self.contacts_path(), &bytes).await?;
        }
        Ok(())
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

async fn write_creating_dirs(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Keeps session ids such as `+27123456789` usable as file names.
///
/// Bytes outside `[A-Za-z0-9+-]`, `_` included, become `_xx` in hex, so
/// distinct ids never share a file.
fn file_stem(session_id: &str) -> String {
    let mut stem = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'-') {
            stem.push(char::from(byte));
        } else {
            write!(stem, "_{byte:02x}").expect("writing to string cannot fail");
        }
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_spec::Answer;
    use tempfile::TempDir;

    #[test]
    fn file_stem_escapes_path_characters() {
        assert_eq!(file_stem("+27123456789"), "+27123456789");
        assert_eq!(file_stem("../etc/passwd"), "_2e_2e_2fetc_2fpasswd");
    }

    #[test]
    fn file_stem_keeps_distinct_ids_apart() {
        assert_eq!(file_stem("a.b"), "a_2eb");
        assert_eq!(file_stem("a_b"), "a_5fb");
        assert_ne!(file_stem("a_2eb"), file_stem("a.b"));
    }

    #[tokio::test]
    async fn similar_ids_get_separate_snapshots() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        let mut dotted = Session::new("a.b", "a.b");
        dotted.state = "states:register:emis".to_string();
        let mut underscored = Session::new("a_b", "a_b");
        underscored.state = "states:report:oil:used".to_string();

        store.save(&dotted).await.expect("save");
        store.save(&underscored).await.expect("save");

        assert_eq!(store.load("a.b").await.expect("load"), Some(dotted));
        assert_eq!(store.load("a_b").await.expect("load"), Some(underscored));
    }

    #[tokio::test]
    async fn session_survives_reopening_the_store() {
        let dir = TempDir::new().expect("temp dir");
        let mut session = Session::new("+27123456789", "+27123456789");
        session.state = "states:report:oil:used".to_string();
        session
            .answers
            .insert("states:report:oil:received".into(), Answer::Decimal(300.5));
        session
            .answers
            .insert("states:report:days_in_session".into(), Answer::Integer(30));

        FileStore::new(dir.path()).save(&session).await.expect("save");
        let loaded = FileStore::new(dir.path())
            .load("+27123456789")
            .await
            .expect("load");

        assert_eq!(loaded, Some(session));
    }

    #[tokio::test]
    async fn missing_files_mean_empty_state() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path().join("fresh"));
        assert_eq!(store.load("nobody").await.expect("load"), None);
        assert!(!store.is_registered("nobody").await.expect("lookup"));
    }

    #[tokio::test]
    async fn registration_is_written_to_contacts_file() {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        store.mark_registered("+100").await.expect("mark");

        let contents = std::fs::read_to_string(dir.path().join("contacts.json")).expect("read");
        assert!(contents.contains("+100"));
        assert!(FileStore::new(dir.path()).is_registered("+100").await.expect("lookup"));
    }
}
