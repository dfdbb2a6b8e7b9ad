use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

use crate::fork::Fork;

/// Read-only block context.
#[derive(Debug, Clone)]
pub struct BlockEnvironment {
    pub chain_id: u64,
    pub gas_limit: u64,
    /// Ascending window of recent block hashes, keyed by block number.
    pub block_hashes: HashMap<u64, H256>,
    pub coinbase: Address,
    pub number: u64,
    pub base_fee_per_gas: U256,
    pub timestamp: U256,
    pub prev_randao: Option<H256>,
    pub excess_blob_gas: Option<u64>,
    pub parent_beacon_block_root: Option<H256>,
    pub fork: Fork,
}

impl Default for BlockEnvironment {
    fn default() -> Self {
        Self {
            chain_id: 1,
            gas_limit: 30_000_000,
            block_hashes: HashMap::new(),
            coinbase: Address::zero(),
            number: 1,
            base_fee_per_gas: U256::zero(),
            timestamp: U256::zero(),
            prev_randao: None,
            excess_blob_gas: None,
            parent_beacon_block_root: None,
            fork: Fork::default(),
        }
    }
}

impl BlockEnvironment {
    /// BLOCKHASH: only the most recent 256 blocks are available.
    pub fn block_hash(&self, number: u64) -> Option<H256> {
        if number >= self.number || self.number.saturating_sub(number) > 256 {
            return None;
        }
        self.block_hashes.get(&number).copied()
    }
}

/// EIP-7702 authorization tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub chain_id: u64,
    pub address: Address,
    pub nonce: u64,
    pub y_parity: u8,
    pub r: U256,
    pub s: U256,
}

/// Read-only transaction context.
#[derive(Debug, Clone, Default)]
pub struct TransactionEnvironment {
    pub origin: Address,
    pub gas_price: U256,
    pub initial_gas: u64,
    pub access_list_addresses: HashSet<Address>,
    pub access_list_storage_keys: HashSet<(Address, H256)>,
    pub blob_versioned_hashes: Vec<H256>,
    pub authorizations: Vec<Authorization>,
    pub index_in_block: Option<u64>,
    pub tx_hash: Option<H256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Call(Address),
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessListEntry {
    pub address: Address,
    pub storage_keys: Vec<H256>,
}
