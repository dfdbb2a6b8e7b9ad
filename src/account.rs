use std::collections::HashMap;

use bytes::Bytes;
use ethereum_types::{H256, U256};

pub type Storage = HashMap<H256, H256>;

/// On-chain attributes of an account, excluding its storage trie.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountInfo {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
}

impl AccountInfo {
    /// "Account alive": exists and is not the distinguished empty account.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    pub info: AccountInfo,
    pub storage: Storage,
}

impl Account {
    pub fn new(balance: U256, code: Bytes, nonce: u64, storage: Storage) -> Self {
        Self {
            info: AccountInfo {
                balance,
                nonce,
                code,
            },
            storage,
        }
    }

    pub fn has_code_or_nonce(&self) -> bool {
        !self.info.code.is_empty() || self.info.nonce != 0
    }

    pub fn has_storage(&self) -> bool {
        !self.storage.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }
}
