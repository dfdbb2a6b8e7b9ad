use ethereum_types::Address;

use crate::account::Account;

use super::CacheDB;

pub fn get_account<'a>(cache: &'a CacheDB, address: &Address) -> Option<&'a Account> {
    cache.accounts.get(address)
}

pub fn insert_account(cache: &mut CacheDB, address: Address, account: Account) {
    cache.accounts.insert(address, account);
}

pub fn remove_account(cache: &mut CacheDB, address: &Address) {
    cache.accounts.remove(address);
}
