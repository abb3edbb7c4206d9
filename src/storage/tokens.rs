//! Token store: durable (user, item) -> encrypted access token mapping
//!
//! Access tokens are the subsystem's most sensitive payload. They are
//! encrypted before they reach this store's map and stay encrypted on disk;
//! callers receive decrypted plaintext only on demand, wrapped in
//! `SecureString`, and must not retain it beyond the scope of its use.
//!
//! Same persistence model as the user store: one lock, whole-file rewrite
//! per mutation with the write guard held across mutate and persist.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::warn;

use crate::crypto::{Cipher, EncryptedBlob, SecureString};
use crate::error::{VaultError, VaultResult};
use crate::models::{ItemId, UserId};

use super::file_io::{read_json, write_json_atomic};

/// On-disk shape: `{ userId: { itemId: "ivHex:cipherHex" } }`
type TokenTable = HashMap<UserId, BTreeMap<ItemId, EncryptedBlob>>;

/// Durable encrypted token store with an in-memory cache
pub struct TokenStore {
    path: PathBuf,
    cipher: Cipher,
    tokens: RwLock<TokenTable>,
}

impl TokenStore {
    /// Create a new token store backed by the given file
    pub fn new(path: PathBuf, cipher: Cipher) -> Self {
        Self {
            path,
            cipher,
            tokens: RwLock::new(TokenTable::new()),
        }
    }

    /// Load the token table from disk.
    ///
    /// An unreadable or corrupt file degrades to an empty store (cold start)
    /// with a warning. Note this covers structural corruption only; a blob
    /// that parses but no longer decrypts surfaces as a crypto error at read
    /// time instead.
    pub fn load(&self) -> VaultResult<()> {
        let table: TokenTable = match read_json(&self.path) {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, "Token table unreadable; starting with an empty store");
                TokenTable::default()
            }
        };

        let mut tokens = self.write_guard()?;
        *tokens = table;
        Ok(())
    }

    /// Encrypt and store an access token, overwriting any existing token for
    /// the same item. Persists before returning.
    pub fn store_token(&self, user_id: UserId, item_id: ItemId, raw_token: &str) -> VaultResult<()> {
        let blob = self.cipher.encrypt(raw_token)?;

        let mut tokens = self.write_guard()?;
        tokens.entry(user_id).or_default().insert(item_id, blob);
        self.persist(&tokens)
    }

    /// Decrypt and return the token for an item, or `None` if absent.
    ///
    /// A blob that fails to decrypt (key rotated without re-encrypting,
    /// tampering) propagates as a crypto error; it is never swallowed.
    pub fn get_token(&self, user_id: UserId, item_id: &ItemId) -> VaultResult<Option<SecureString>> {
        let blob = {
            let tokens = self.read_guard()?;
            tokens
                .get(&user_id)
                .and_then(|items| items.get(item_id))
                .cloned()
        };

        match blob {
            Some(blob) => Ok(Some(self.cipher.decrypt(&blob)?)),
            None => Ok(None),
        }
    }

    /// Decrypt every token a user owns, for bulk refresh flows
    pub fn get_all_tokens(&self, user_id: UserId) -> VaultResult<BTreeMap<ItemId, SecureString>> {
        let blobs = {
            let tokens = self.read_guard()?;
            tokens.get(&user_id).cloned().unwrap_or_default()
        };

        let mut decrypted = BTreeMap::new();
        for (item_id, blob) in blobs {
            decrypted.insert(item_id, self.cipher.decrypt(&blob)?);
        }
        Ok(decrypted)
    }

    /// Remove the token for an unlinked item. Persists when something was
    /// actually removed; returns whether it was.
    pub fn delete_token(&self, user_id: UserId, item_id: &ItemId) -> VaultResult<bool> {
        let mut tokens = self.write_guard()?;

        let removed = match tokens.get_mut(&user_id) {
            Some(items) => {
                let removed = items.remove(item_id).is_some();
                if items.is_empty() {
                    tokens.remove(&user_id);
                }
                removed
            }
            None => false,
        };

        if removed {
            self.persist(&tokens)?;
        }
        Ok(removed)
    }

    /// Number of stored tokens across all users
    pub fn count(&self) -> VaultResult<usize> {
        let tokens = self.read_guard()?;
        Ok(tokens.values().map(|items| items.len()).sum())
    }

    fn persist(&self, tokens: &TokenTable) -> VaultResult<()> {
        write_json_atomic(&self.path, tokens)
    }

    fn read_guard(&self) -> VaultResult<std::sync::RwLockReadGuard<'_, TokenTable>> {
        self.tokens
            .read()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_guard(&self) -> VaultResult<std::sync::RwLockWriteGuard<'_, TokenTable>> {
        self.tokens
            .write()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_cipher() -> Cipher {
        Cipher::new(&"ab".repeat(32)).unwrap()
    }

    fn create_test_store() -> (TempDir, TokenStore) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tokens.json");
        let store = TokenStore::new(path, test_cipher());
        store.load().unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, store) = create_test_store();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_token_lifecycle() {
        let (_temp_dir, store) = create_test_store();
        let user = UserId::new();
        let item = ItemId::new("item-1");

        store.store_token(user, item.clone(), "secret").unwrap();
        let token = store.get_token(user, &item).unwrap().unwrap();
        assert_eq!(token.as_str(), "secret");

        assert!(store.delete_token(user, &item).unwrap());
        assert!(store.get_token(user, &item).unwrap().is_none());
        assert!(!store.delete_token(user, &item).unwrap());
    }

    #[test]
    fn test_upsert_replaces_token() {
        let (_temp_dir, store) = create_test_store();
        let user = UserId::new();
        let item = ItemId::new("item-1");

        store.store_token(user, item.clone(), "old-cursor").unwrap();
        store.store_token(user, item.clone(), "new-cursor").unwrap();

        let token = store.get_token(user, &item).unwrap().unwrap();
        assert_eq!(token.as_str(), "new-cursor");
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_get_all_tokens() {
        let (_temp_dir, store) = create_test_store();
        let user = UserId::new();
        let other_user = UserId::new();

        store.store_token(user, ItemId::new("item-1"), "one").unwrap();
        store.store_token(user, ItemId::new("item-2"), "two").unwrap();
        store
            .store_token(other_user, ItemId::new("item-1"), "other")
            .unwrap();

        let all = store.get_all_tokens(user).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get(&ItemId::new("item-1")).unwrap().as_str(), "one");
        assert_eq!(all.get(&ItemId::new("item-2")).unwrap().as_str(), "two");
    }

    #[test]
    fn test_item_ids_are_per_user() {
        let (_temp_dir, store) = create_test_store();
        let user1 = UserId::new();
        let user2 = UserId::new();
        let item = ItemId::new("item-1");

        store.store_token(user1, item.clone(), "token-a").unwrap();
        store.store_token(user2, item.clone(), "token-b").unwrap();

        assert_eq!(store.get_token(user1, &item).unwrap().unwrap().as_str(), "token-a");
        assert_eq!(store.get_token(user2, &item).unwrap().unwrap().as_str(), "token-b");
    }

    #[test]
    fn test_persistence_across_reload() {
        let (temp_dir, store) = create_test_store();
        let user = UserId::new();
        let item = ItemId::new("item-1");

        store.store_token(user, item.clone(), "secret").unwrap();

        let store2 = TokenStore::new(temp_dir.path().join("tokens.json"), test_cipher());
        store2.load().unwrap();

        let token = store2.get_token(user, &item).unwrap().unwrap();
        assert_eq!(token.as_str(), "secret");
    }

    #[test]
    fn test_tokens_encrypted_on_disk() {
        let (temp_dir, store) = create_test_store();
        let user = UserId::new();

        store
            .store_token(user, ItemId::new("item-1"), "access-sandbox-xyz")
            .unwrap();

        let contents = std::fs::read_to_string(temp_dir.path().join("tokens.json")).unwrap();
        assert!(!contents.contains("access-sandbox-xyz"));
        // Blob delimiter visible in the stored value
        assert!(contents.contains(':'));
    }

    #[test]
    fn test_wrong_key_surfaces_crypto_error() {
        let (temp_dir, store) = create_test_store();
        let user = UserId::new();
        let item = ItemId::new("item-1");

        store.store_token(user, item.clone(), "secret").unwrap();

        // Reopen under a different key: decryption failure must propagate,
        // not be swallowed as "not found"
        let rotated = Cipher::new(&"cd".repeat(32)).unwrap();
        let store2 = TokenStore::new(temp_dir.path().join("tokens.json"), rotated);
        store2.load().unwrap();

        let result = store2.get_token(user, &item);
        assert!(matches!(result, Err(VaultError::Crypto(_))));
    }

    #[test]
    fn test_concurrent_writers_no_lost_update() {
        let (temp_dir, store) = create_test_store();
        let store = Arc::new(store);
        let user = UserId::new();

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .store_token(user, ItemId::new(format!("item-{}", i)), "secret")
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Both items must survive in the durable file, not just in memory
        let store2 = TokenStore::new(temp_dir.path().join("tokens.json"), test_cipher());
        store2.load().unwrap();
        assert!(store2.get_token(user, &ItemId::new("item-0")).unwrap().is_some());
        assert!(store2.get_token(user, &ItemId::new("item-1")).unwrap().is_some());
    }
}
