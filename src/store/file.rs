//! File-backed [`SessionStore`] that survives restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{SessionStore, StoreError, StoreFuture, StoreSlot},
};

/// Persists slots to a flat JSON object after each mutation.
///
/// Keys are the [`StoreSlot::key`] names, so the file stays readable and unknown keys written
/// by other tools are preserved.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<BTreeMap<String, String>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
		if !path.exists() {
			return Ok(BTreeMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(BTreeMap::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &BTreeMap<String, String>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl SessionStore for FileStore {
	fn get(&self, slot: StoreSlot) -> StoreFuture<'_, Option<String>> {
		Box::pin(async move { Ok(self.inner.read().get(slot.key()).cloned()) })
	}

	fn set(&self, slot: StoreSlot, value: String) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let key = slot.key();
			let previous = guard.insert(key.to_owned(), value);

			// Memory never gets ahead of the file.
			self.persist_locked(&guard).inspect_err(|_| match previous {
				Some(previous) => {
					guard.insert(key.to_owned(), previous);
				},
				None => {
					guard.remove(key);
				},
			})
		})
	}

	fn clear<'a>(&'a self, slots: &'a [StoreSlot]) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let removed = slots
				.iter()
				.filter_map(|slot| guard.remove_entry(slot.key()))
				.collect::<Vec<_>>();

			if removed.is_empty() {
				return Ok(());
			}

			self.persist_locked(&guard).inspect_err(|_| guard.extend(removed))
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"dealer_storefront_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn set_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.set(StoreSlot::CorrelationCode, "abc123".into()))
			.expect("Failed to save the correlation code.");
		rt.block_on(store.set(StoreSlot::BearerToken, "tok".into()))
			.expect("Failed to save the bearer token.");
		rt.block_on(store.clear(&[StoreSlot::BearerToken]))
			.expect("Failed to clear the bearer token.");
		drop(store);

		let raw = fs::read_to_string(&path).expect("Store file should exist after a write.");

		assert!(raw.contains("\"rcode\""));

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert_eq!(
			rt.block_on(reopened.get(StoreSlot::CorrelationCode))
				.expect("Failed to read the correlation code."),
			Some("abc123".into())
		);
		assert_eq!(
			rt.block_on(reopened.get(StoreSlot::BearerToken))
				.expect("Failed to read the bearer token."),
			None
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_persist_leaves_memory_untouched() {
		let dir = temp_path().with_extension("d");
		let path = dir.join("store.json");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.set(StoreSlot::CorrelationCode, "abc123".into()))
			.expect("Failed to save the correlation code.");
		fs::remove_dir_all(&dir).expect("Store directory should be removable.");
		// A plain file where the directory was makes every later write fail.
		fs::write(&dir, b"").expect("Blocking file should be written.");

		assert!(rt.block_on(store.set(StoreSlot::CorrelationCode, "xyz".into())).is_err());
		assert!(rt.block_on(store.set(StoreSlot::BearerToken, "tok".into())).is_err());
		assert!(rt.block_on(store.clear(&[StoreSlot::CorrelationCode])).is_err());
		assert_eq!(
			rt.block_on(store.get(StoreSlot::CorrelationCode))
				.expect("Failed to read the correlation code."),
			Some("abc123".into())
		);
		assert_eq!(
			rt.block_on(store.get(StoreSlot::BearerToken)).expect("Failed to read the bearer token."),
			None
		);

		fs::remove_file(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove blocking file {}: {e}", dir.display())
		});
	}

	#[test]
	fn corrupt_file_is_reported() {
		let path = temp_path();

		fs::write(&path, b"not json").expect("Fixture file should be written.");

		assert!(matches!(FileStore::open(&path), Err(StoreError::Serialization { .. })));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
