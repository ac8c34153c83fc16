use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use defaults_core::{PreferenceStore, StoreError, StoredValue};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

const SUITE_EXTENSION: &str = "json";
const ENCODED_PREFIX: &str = "b64-";

type Document = BTreeMap<String, StoredValue>;

/// File-backed suite implementing the shared `PreferenceStore` contract.
/// The whole suite lives in `<root>/<suite>.json` and is re-read on every call,
/// so separate processes observe each other's completed writes.
pub struct FileStore {
    suite: String,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, suite: impl Into<String>) -> Self {
        let suite = suite.into();
        let path = root
            .into()
            .join(format!("{}.{SUITE_EXTENSION}", file_stem_for(&suite)));
        Self {
            suite,
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of every suite persisted under `root`, sorted.
    pub fn list_suites(root: impl AsRef<Path>) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(root.as_ref()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(storage_err(err)),
        };

        let mut suites = Vec::new();
        for entry in entries {
            let path = entry.map_err(storage_err)?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SUITE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match suite_for_file_stem(stem) {
                Some(suite) => suites.push(suite),
                None => debug!(?path, "skipping file with undecodable suite name"),
            }
        }
        suites.sort();
        Ok(suites)
    }

    fn modify<T>(&self, apply: impl FnOnce(&mut Document) -> T) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })?;
        let mut document = read_document(&self.path)?;
        let out = apply(&mut document);
        write_document(&self.path, &document)?;
        Ok(out)
    }
}

impl PreferenceStore for FileStore {
    #[instrument(skip_all, fields(suite = %self.suite, key = %key))]
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let mut document = read_document(&self.path)?;
        Ok(document.remove(key))
    }

    #[instrument(skip_all, fields(suite = %self.suite, key = %key))]
    fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        self.modify(|document| {
            document.insert(key.to_string(), value);
        })
    }

    #[instrument(skip_all, fields(suite = %self.suite, key = %key))]
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(|document| {
            document.remove(key);
        })
    }

    #[instrument(skip_all, fields(suite = %self.suite))]
    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(read_document(&self.path)?.into_keys().collect())
    }
}

fn read_document(path: &Path) -> Result<Document, StoreError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
        Err(err) => return Err(storage_err(err)),
    };

    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(storage_err)?;
    if buf.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::new());
    }
    serde_json::from_slice(&buf).map_err(serialization_err)
}

fn write_document(path: &Path, document: &Document) -> Result<(), StoreError> {
    let parent = path.parent().ok_or_else(|| StoreError::Storage {
        reason: "invalid storage path".to_string(),
    })?;
    fs::create_dir_all(parent).map_err(storage_err)?;

    let json = serde_json::to_vec_pretty(document).map_err(serialization_err)?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
    tmp.write_all(&json).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

/// Plain names are used as-is; anything that could escape the root or clash
/// with the encoded form is base64 encoded.
fn file_stem_for(suite: &str) -> String {
    let plain = !suite.is_empty()
        && !suite.starts_with('.')
        && !suite.starts_with(ENCODED_PREFIX)
        && suite
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if plain {
        suite.to_string()
    } else {
        format!("{ENCODED_PREFIX}{}", URL_SAFE_NO_PAD.encode(suite))
    }
}

fn suite_for_file_stem(stem: &str) -> Option<String> {
    match stem.strip_prefix(ENCODED_PREFIX) {
        Some(encoded) => {
            let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
            String::from_utf8(bytes).ok()
        }
        None => Some(stem.to_string()),
    }
}

fn storage_err<E: ToString>(err: E) -> StoreError {
    StoreError::Storage {
        reason: err.to_string(),
    }
}

fn serialization_err<E: ToString>(err: E) -> StoreError {
    StoreError::Serialization {
        reason: err.to_string(),
    }
}
