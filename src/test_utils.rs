//! Test-only harness for building a ready-to-run [`VM`] from raw bytecode or
//! an [`Operation`] program, with a funded sender and a deployed target
//! account. Grounded on the teacher's `utils.rs` (`new_vm_with_ops` and
//! friends), generalized to this crate's `GeneralizedDatabase`/`VM::new`
//! shape.

use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::account::Account;
use crate::db::{GeneralizedDatabase, InMemoryDatabase};
use crate::environment::{BlockEnvironment, TransactionEnvironment, TxKind};
use crate::errors::VMError;
use crate::operations::Operation;
use crate::trace::NullTraceSink;
use crate::vm::VM;

/// Plenty of gas for any single-frame test; individual tests override this
/// via `new_vm_with_bytecode_and_gas` when they need to watch it run out.
pub const TEST_INITIAL_GAS: u64 = 1_000_000_000;

/// The account whose code runs in `new_vm_with_ops` and friends.
pub fn test_contract_address() -> Address {
    Address::from_low_u64_be(42)
}

/// The account that sends the top-level transaction in `new_vm_with_ops`.
pub fn test_sender_address() -> Address {
    Address::from_low_u64_be(100)
}

pub fn ops_to_bytecode(operations: &[Operation]) -> Bytes {
    Bytes::from(Operation::assemble(operations))
}

pub fn new_vm_with_ops(operations: &[Operation]) -> Result<VM, VMError> {
    new_vm_with_bytecode(ops_to_bytecode(operations))
}

pub fn new_vm_with_bytecode(bytecode: Bytes) -> Result<VM, VMError> {
    new_vm_with_bytecode_and_gas(bytecode, TEST_INITIAL_GAS)
}

pub fn new_vm_with_ops_and_gas(operations: &[Operation], gas: u64) -> Result<VM, VMError> {
    new_vm_with_bytecode_and_gas(ops_to_bytecode(operations), gas)
}

pub fn new_vm_with_bytecode_and_gas(bytecode: Bytes, gas: u64) -> Result<VM, VMError> {
    new_vm_with_ops_addr_bal_db(
        bytecode,
        test_sender_address(),
        U256::MAX,
        gas,
        InMemoryDatabase::default(),
    )
}

/// The fully general constructor every other helper in this module funnels
/// through: seeds `db` with the contract account (code = `contract_bytecode`,
/// max balance so BALANCE/value-transfer opcodes in tests never underflow
/// unexpectedly) and the sender account (`sender_balance`), then builds a
/// `TxKind::Call` transaction against the contract address with `gas` as the
/// initial gas.
pub fn new_vm_with_ops_addr_bal_db(
    contract_bytecode: Bytes,
    sender_address: Address,
    sender_balance: U256,
    gas: u64,
    mut db: InMemoryDatabase,
) -> Result<VM, VMError> {
    let contract_address = test_contract_address();
    db.accounts.insert(
        contract_address,
        Account::new(U256::MAX, contract_bytecode, 0, Default::default()),
    );
    db.accounts.insert(
        sender_address,
        Account::new(sender_balance, Bytes::new(), 0, Default::default()),
    );

    let block = BlockEnvironment::default();
    let tx = TransactionEnvironment {
        origin: sender_address,
        initial_gas: gas,
        ..Default::default()
    };

    VM::new(
        GeneralizedDatabase::new(Arc::new(db)),
        block,
        tx,
        TxKind::Call(contract_address),
        U256::zero(),
        Bytes::new(),
        Box::new(NullTraceSink),
    )
}

/// A top-level `TxKind::Create` transaction running `init_code` as the
/// initial frame's code, the same shape `VM::new` builds for a creation
/// transaction: `calldata` doubles as the init code, value 0.
pub fn new_create_vm_with_init_code(init_code: Bytes, gas: u64) -> Result<VM, VMError> {
    let sender_address = test_sender_address();
    let mut db = InMemoryDatabase::default();
    db.accounts.insert(
        sender_address,
        Account::new(U256::MAX, Bytes::new(), 0, Default::default()),
    );

    let block = BlockEnvironment::default();
    let tx = TransactionEnvironment {
        origin: sender_address,
        initial_gas: gas,
        ..Default::default()
    };

    VM::new(
        GeneralizedDatabase::new(Arc::new(db)),
        block,
        tx,
        TxKind::Create,
        U256::zero(),
        init_code,
        Box::new(NullTraceSink),
    )
}
