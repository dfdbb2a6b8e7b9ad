pub mod cache;

use std::collections::HashMap;
use std::sync::Arc;

use ethereum_types::{Address, H256};

use crate::account::Account;

/// Capability contract for the pluggable world-state. Implementations are
/// synchronous; the one fallible world-state operation (`move_ether`) is
/// layered on top of this trait in `utils`, not part of it.
pub trait Database {
    fn get_account(&self, address: Address) -> Option<Account>;
    fn account_storage(&self, address: Address, key: H256) -> H256;
}

/// A trivial in-memory `Database`, good enough to run and test the engine
/// without a real trie-backed store. Production embedders supply their own.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    pub accounts: HashMap<Address, Account>,
}

impl Database for InMemoryDatabase {
    fn get_account(&self, address: Address) -> Option<Account> {
        self.accounts.get(&address).cloned()
    }

    fn account_storage(&self, address: Address, key: H256) -> H256 {
        self.accounts
            .get(&address)
            .and_then(|account| account.storage.get(&key))
            .copied()
            .unwrap_or_default()
    }
}

/// Overlay cache sitting in front of a `Database`; the only thing the VM
/// actually mutates during a transaction.
#[derive(Debug, Clone, Default)]
pub struct CacheDB {
    pub accounts: HashMap<Address, Account>,
}

#[derive(Clone)]
pub struct GeneralizedDatabase {
    pub store: Arc<dyn Database + Send + Sync>,
    pub cache: CacheDB,
}

impl GeneralizedDatabase {
    pub fn new(store: Arc<dyn Database + Send + Sync>) -> Self {
        Self {
            store,
            cache: CacheDB::default(),
        }
    }

    pub fn get_account(&self, address: Address) -> Account {
        if let Some(account) = self.cache.accounts.get(&address) {
            return account.clone();
        }
        self.store.get_account(address).unwrap_or_default()
    }

    pub fn get_account_mut(&mut self, address: Address) -> &mut Account {
        if !self.cache.accounts.contains_key(&address) {
            let account = self.store.get_account(address).unwrap_or_default();
            self.cache.accounts.insert(address, account);
        }
        #[allow(clippy::expect_used)]
        self.cache
            .accounts
            .get_mut(&address)
            .expect("just inserted above")
    }

    pub fn account_exists(&self, address: Address) -> bool {
        self.cache.accounts.contains_key(&address) || self.store.get_account(address).is_some()
    }

    pub fn get_storage(&self, address: Address, key: H256) -> H256 {
        if let Some(account) = self.cache.accounts.get(&address) {
            if let Some(value) = account.storage.get(&key) {
                return *value;
            }
        }
        self.store.account_storage(address, key)
    }

    pub fn set_storage(&mut self, address: Address, key: H256, value: H256) {
        self.get_account_mut(address).storage.insert(key, value);
    }
}
