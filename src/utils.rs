//! Free helper functions shared by the opcode handlers and the call/create
//! machinery: account access bookkeeping (warm/cold per EIP-2929), balance
//! transfers, and the small address/word conversions the bytecode operates
//! on as raw `U256`.

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

use crate::account::Account;
use crate::constants::{SET_CODE_DELEGATION_LEN, SET_CODE_DELEGATION_PREFIX};
use crate::db::{cache, GeneralizedDatabase};
use crate::errors::{ExceptionalHalt, InternalError, VMError};
use crate::vm::Substate;

/// Converts a stack word to a `usize`, as every offset/size argument popped
/// off the stack by memory- and calldata-touching opcodes needs.
pub fn u256_to_usize(value: U256) -> Result<usize, VMError> {
    if value.bits() > 64 {
        return Err(ExceptionalHalt::VeryLargeNumber.into());
    }
    usize::try_from(value.as_u64()).map_err(|_| ExceptionalHalt::VeryLargeNumber.into())
}

/// The low 160 bits of `word`, as ADDRESS-family opcodes extract it off the stack.
pub fn word_to_address(word: U256) -> Address {
    let mut bytes = [0u8; 32];
    word.to_big_endian(&mut bytes);
    #[allow(clippy::indexing_slicing)]
    Address::from_slice(&bytes[12..32])
}

/// Left-zero-padded 256-bit view of an address, as CREATE2/ADDRESS push it.
pub fn address_to_word(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

/// A stack word as a storage key, as SLOAD/SSTORE/TLOAD/TSTORE need to index
/// `Account::storage`/`Substate::transient_storage` (both keyed by `H256`).
pub fn u256_to_h256(value: U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256::from(bytes)
}

/// A storage key as the stack word SLOAD/TLOAD push.
pub fn h256_to_u256(value: H256) -> U256 {
    U256::from_big_endian(value.as_bytes())
}

/// Fetches `address`'s account, marking it warm. Returns whether it was
/// already warm (cold accesses are charged the higher EIP-2929 cost by the
/// caller's gas calculator).
pub fn access_account(
    db: &mut GeneralizedDatabase,
    substate: &mut Substate,
    address: Address,
) -> (Account, bool) {
    let was_warm = !substate.accessed_addresses.insert(address);
    (db.get_account(address), was_warm)
}

pub fn account_exists(db: &GeneralizedDatabase, address: Address) -> bool {
    db.account_exists(address)
}

pub fn get_account(db: &mut GeneralizedDatabase, address: Address) -> Account {
    db.get_account(address)
}

pub fn increment_account_nonce(
    db: &mut GeneralizedDatabase,
    address: Address,
) -> Result<u64, VMError> {
    let account = db.get_account_mut(address);
    account.info.nonce = account
        .info
        .nonce
        .checked_add(1)
        .ok_or(InternalError::ArithmeticOperationOverflow)?;
    Ok(account.info.nonce)
}

pub fn increase_account_balance(
    db: &mut GeneralizedDatabase,
    address: Address,
    increase: U256,
) -> Result<(), VMError> {
    let account = db.get_account_mut(address);
    account.info.balance = account
        .info
        .balance
        .checked_add(increase)
        .ok_or(ExceptionalHalt::BalanceOverflow)?;
    Ok(())
}

pub fn decrease_account_balance(
    db: &mut GeneralizedDatabase,
    address: Address,
    decrease: U256,
) -> Result<(), VMError> {
    let account = db.get_account_mut(address);
    account.info.balance = account
        .info
        .balance
        .checked_sub(decrease)
        .ok_or(ExceptionalHalt::BalanceUnderflow)?;
    Ok(())
}

/// Moves `amount` from `from` to `to`, rolling back the debit if the credit
/// would overflow so callers never observe a partially applied transfer.
pub fn move_ether(
    db: &mut GeneralizedDatabase,
    from: Address,
    to: Address,
    amount: U256,
) -> Result<(), VMError> {
    if amount.is_zero() {
        return Ok(());
    }
    decrease_account_balance(db, from, amount)?;
    if let Err(err) = increase_account_balance(db, to, amount) {
        increase_account_balance(db, from, amount)
            .map_err(|_| InternalError::Custom("ether transfer rollback failed".into()))?;
        return Err(err);
    }
    Ok(())
}

/// Wipes `address`'s storage, as SELFDESTRUCT does for accounts created and
/// destroyed within the same transaction (EIP-6780).
pub fn destroy_storage(db: &mut GeneralizedDatabase, address: Address) {
    db.get_account_mut(address).storage.clear();
}

pub fn set_code(db: &mut GeneralizedDatabase, address: Address, code: Bytes) {
    db.get_account_mut(address).info.code = code;
}

/// Overwrites `address`'s whole cached `Account`, used by CREATE/CREATE2 to
/// install a freshly minted account and by CALL to fetch-then-replace.
pub fn insert_account(db: &mut GeneralizedDatabase, address: Address, account: Account) {
    cache::insert_account(&mut db.cache, address, account);
}

pub fn remove_account(db: &mut GeneralizedDatabase, address: Address) {
    cache::remove_account(&mut db.cache, &address);
}

/// True when `code` is an EIP-7702 delegation designator (`0xef0100 || addr20`).
pub fn is_delegation_designator(code: &[u8]) -> bool {
    code.len() == SET_CODE_DELEGATION_LEN && code.starts_with(&SET_CODE_DELEGATION_PREFIX)
}

pub fn delegation_target(code: &[u8]) -> Option<Address> {
    if !is_delegation_designator(code) {
        return None;
    }
    code.get(3..23).map(Address::from_slice)
}

/// Resolves the code that should actually execute for `address`, following
/// one level of EIP-7702 delegation. Returns the address whose code is
/// running (for warm/cold accounting of the delegation target) and the code
/// itself.
pub fn eip7702_get_code(
    db: &mut GeneralizedDatabase,
    substate: &mut Substate,
    address: Address,
) -> (Address, Bytes) {
    let account = db.get_account(address);
    match delegation_target(&account.info.code) {
        Some(target) => {
            let (delegated, _) = access_account(db, substate, target);
            (target, delegated.info.code)
        }
        None => (address, account.info.code),
    }
}
