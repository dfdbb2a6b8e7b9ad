//! Scenario-level tests for the interpreter loop and the call/create
//! engine. Grounded on the style of the teacher's `tests/tests.rs`
//! (`Operation` DSL, `new_vm_with_ops*`, direct `stack`/`ExecutionReport`
//! assertions), covering this crate's own Osaka/Prague semantics.

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

use levm_osaka::account::Account;
use levm_osaka::constants::*;
use levm_osaka::db::InMemoryDatabase;
use levm_osaka::errors::{ExceptionalHalt, OutOfGasError, TxResult, VMError};
use levm_osaka::fork::Fork;
use levm_osaka::operations::Operation;
use levm_osaka::precompiles::{execute_precompile, ECADD_ADDRESS, ECMUL_ADDRESS};
use levm_osaka::test_utils::{
    new_create_vm_with_init_code, new_vm_with_bytecode, new_vm_with_ops,
    new_vm_with_ops_addr_bal_db, new_vm_with_ops_and_gas, ops_to_bytecode, test_contract_address,
    test_sender_address, TEST_INITIAL_GAS,
};
use levm_osaka::vm::{calculate_create2_address, calculate_create_address, word_to_address};

fn init_tracing() {
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

// --- §8 scenario 1: pure arithmetic ---

#[test]
fn pure_arithmetic_gas_accounting() {
    init_tracing();
    let mut vm = new_vm_with_ops_and_gas(
        &[
            Operation::push(3u64),
            Operation::push(5u64),
            Operation::Add,
            Operation::Stop,
        ],
        100,
    )
    .unwrap();

    let report = vm.transact().unwrap();
    assert!(report.is_success());
    assert_eq!(report.gas_used, 9); // 3 + 3 + 3
    assert!(report.output.is_empty());
    assert!(report.logs.is_empty());
}

// --- §8 scenario 2: REVERT preserves gas and output ---

#[test]
fn revert_preserves_output_and_gas() {
    let reason: [u8; 32] = std::array::from_fn(|i| u8::try_from(i).unwrap() + 1);
    let mut vm = new_vm_with_ops(&[
        Operation::Push(reason.to_vec()),
        Operation::push(0u64),
        Operation::MStore,
        Operation::push(32u64),
        Operation::push(0u64),
        Operation::Revert,
    ])
    .unwrap();

    let report = vm.transact().unwrap();
    assert_eq!(
        report.result,
        TxResult::Revert(VMError::RevertOpcode(Bytes::copy_from_slice(&reason)))
    );
    assert_eq!(report.output.as_ref(), &reason[..]);
    assert_eq!(report.gas_used, 18); // push32 + push1 + mstore(6) + push1 + push1 + revert(0)
    assert_eq!(report.gas_refunded, 0);
}

// --- §8 scenario 3: CREATE collision via pre-existing storage ---

#[test]
fn create_soft_collision_on_existing_storage() {
    let contract = test_contract_address();
    let colliding_address = calculate_create_address(contract, 0);

    let mut db = InMemoryDatabase::default();
    let mut storage = std::collections::HashMap::new();
    storage.insert(H256::zero(), H256::from_low_u64_be(1));
    db.accounts.insert(
        colliding_address,
        Account::new(U256::zero(), Bytes::new(), 0, storage),
    );

    let ops = [
        Operation::push(0u64), // size
        Operation::push(0u64), // offset
        Operation::push(0u64), // value
        Operation::Create,
        Operation::Stop,
    ];
    let mut vm = new_vm_with_ops_addr_bal_db(
        ops_to_bytecode(&ops),
        test_sender_address(),
        U256::MAX,
        1_000_000,
        db,
    )
    .unwrap();

    let mut frame = vm.call_frames.pop().unwrap();
    vm.execute_code(&mut frame).unwrap();

    assert_eq!(frame.stack.pop().unwrap(), U256::zero());
    assert_eq!(vm.db.get_account(contract).info.nonce, 1);
}

// --- §8 scenario 4: STATICCALL forbids SSTORE ---

#[test]
fn staticcall_forbids_sstore() {
    let callee_code = ops_to_bytecode(&[
        Operation::push(1u64),
        Operation::push(0u64),
        Operation::SStore,
        Operation::Stop,
    ]);
    let callee_address = Address::from_low_u64_be(0x1000);

    let caller_ops = [
        Operation::push(0u64),         // ret size
        Operation::push(0u64),         // ret offset
        Operation::push(0u64),         // args size
        Operation::push(0u64),         // args offset
        Operation::push(U256::from(0x1000u64)), // callee address
        Operation::push(1_000_000u64), // gas
        Operation::StaticCall,
        Operation::Stop,
    ];

    let mut db = InMemoryDatabase::default();
    db.accounts.insert(
        callee_address,
        Account::new(U256::zero(), callee_code, 0, Default::default()),
    );

    let mut vm = new_vm_with_ops_addr_bal_db(
        ops_to_bytecode(&caller_ops),
        test_sender_address(),
        U256::MAX,
        1_000_000,
        db,
    )
    .unwrap();

    let report = vm.transact().unwrap();
    assert!(report.is_success());
}

// --- §8 scenario 5: SELFDESTRUCT / EIP-6780 ---

#[test]
fn selfdestruct_preexisting_account_is_not_deleted() {
    let beneficiary = Address::from_low_u64_be(0xb0b);
    let mut vm = new_vm_with_ops(&[
        Operation::push(U256::from(0xb0bu64)),
        Operation::SelfDestruct,
    ])
    .unwrap();

    let contract = test_contract_address();
    vm.db.get_account_mut(contract).info.balance = U256::from(1000);

    let mut frame = vm.call_frames.pop().unwrap();
    vm.execute_code(&mut frame).unwrap();

    assert!(!vm.substate.accounts_to_delete.contains(&contract));
    assert_eq!(vm.db.get_account(beneficiary).info.balance, U256::from(1000));
}

#[test]
fn selfdestruct_same_tx_creation_is_deleted() {
    // Runtime code: PUSH<addr> 0xcafe, SELFDESTRUCT.
    let runtime_code = ops_to_bytecode(&[
        Operation::push(U256::from(0xcafeu64)),
        Operation::SelfDestruct,
    ]);
    let len = u64::try_from(runtime_code.len()).unwrap();

    // Constructor: stores the runtime code right-aligned in a memory word
    // and returns exactly its bytes.
    let init_code = ops_to_bytecode(&[
        Operation::Push(runtime_code.to_vec()),
        Operation::push(0u64),
        Operation::MStore,
        Operation::push(len),
        Operation::push(32 - len),
        Operation::Return,
    ]);

    let mut vm = new_vm_with_ops(&[Operation::Stop]).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    frame.memory.store_range(U256::zero(), &init_code).unwrap();

    vm.generic_create(&mut frame, U256::zero(), U256::zero(), init_code.len(), None)
        .unwrap();
    let new_address = word_to_address(frame.stack.pop().unwrap());
    assert_ne!(new_address, Address::zero());
    assert!(vm.substate.created_accounts.contains(&new_address));

    let deployed_code = vm.db.get_account(new_address).info.code;
    let creator = frame.to;
    vm.generic_call(
        &mut frame,
        0,
        1_000_000,
        U256::zero(),
        creator,
        new_address,
        new_address,
        deployed_code,
        true,
        true,
        false,
        false,
        U256::zero(),
        0,
        U256::zero(),
        0,
    )
    .unwrap();

    assert!(vm.substate.accounts_to_delete.contains(&new_address));
}

// --- §8 scenario 6: DELEGATECALL preserves caller context ---

#[test]
fn delegatecall_preserves_context() {
    // Callee writes CALLER into memory and returns it.
    let callee_code = ops_to_bytecode(&[
        Operation::Caller,
        Operation::push(0u64),
        Operation::MStore,
        Operation::push(32u64),
        Operation::push(0u64),
        Operation::Return,
    ]);
    let callee_address = Address::from_low_u64_be(0x2000);

    let caller_ops = [
        Operation::push(32u64),        // ret size
        Operation::push(0u64),         // ret offset
        Operation::push(0u64),         // args size
        Operation::push(0u64),         // args offset
        Operation::push(U256::from(0x2000u64)), // callee address
        Operation::push(1_000_000u64), // gas
        Operation::DelegateCall,
        Operation::push(0u64),
        Operation::MLoad,
        Operation::Stop,
    ];

    let mut db = InMemoryDatabase::default();
    db.accounts.insert(
        callee_address,
        Account::new(U256::zero(), callee_code, 0, Default::default()),
    );

    let mut vm = new_vm_with_ops_addr_bal_db(
        ops_to_bytecode(&caller_ops),
        test_sender_address(),
        U256::MAX,
        1_000_000,
        db,
    )
    .unwrap();

    let mut frame = vm.call_frames.pop().unwrap();
    vm.execute_code(&mut frame).unwrap();

    // CALLER as seen by the delegatecall-ed code is the outer caller (the tx
    // sender), not the contract that issued DELEGATECALL.
    let caller_word = frame.stack.peek().unwrap();
    assert_eq!(
        caller_word,
        U256::from_big_endian(test_sender_address().as_bytes())
    );
}

// --- Stack / memory / pc invariants ---

#[test]
fn push32_zero_pads_past_end_of_code() {
    // A PUSH32 with only 2 bytes of immediate left in the code buffer; the
    // missing (least-significant) bytes read as zero, and the loop then
    // synthesizes STOP once `pc` runs past the end of `code`.
    let mut vm = new_vm_with_bytecode(Bytes::from(vec![0x7f, 0xaa, 0xbb])).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    vm.execute_code(&mut frame).unwrap();

    let mut expected = [0u8; 32];
    expected[0] = 0xaa;
    expected[1] = 0xbb;
    assert_eq!(frame.stack.pop().unwrap(), U256::from_big_endian(&expected));
}

#[test]
fn stack_overflow_is_trapped() {
    let ops: Vec<Operation> = (0..=STACK_LIMIT).map(|_| Operation::push(1u64)).collect();
    let mut vm = new_vm_with_ops(&ops).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    let err = vm.execute_code(&mut frame).unwrap_err();
    assert_eq!(err, ExceptionalHalt::StackOverflow.into());
}

#[test]
fn stack_underflow_is_trapped_before_any_effect() {
    let mut vm = new_vm_with_ops(&[Operation::Add]).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    let err = vm.execute_code(&mut frame).unwrap_err();
    assert_eq!(err, ExceptionalHalt::StackUnderflow.into());
}

#[test]
fn memory_is_zero_initialized_on_first_read() {
    let mut vm = new_vm_with_ops(&[Operation::push(0u64), Operation::MLoad, Operation::Stop]).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    vm.execute_code(&mut frame).unwrap();
    assert_eq!(frame.stack.pop().unwrap(), U256::zero());
    assert_eq!(frame.memory.len(), 32);
}

#[test]
fn invalid_jump_destination_halts() {
    let mut vm = new_vm_with_ops(&[Operation::push(10u64), Operation::Jump]).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    let err = vm.execute_code(&mut frame).unwrap_err();
    assert_eq!(err, ExceptionalHalt::InvalidJump.into());
}

#[test]
fn jump_to_jumpdest_advances_pc() {
    let ops = [
        Operation::push(4u64), // pc 0..1
        Operation::Jump,       // pc 2
        Operation::Invalid,    // pc 3, never reached
        Operation::JumpDest,   // pc 4
        Operation::Stop,       // pc 5
    ];
    let mut vm = new_vm_with_ops(&ops).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    vm.execute_code(&mut frame).unwrap();
}

#[test]
fn out_of_gas_is_reported_as_full_gas_used() {
    let mut vm = new_vm_with_ops_and_gas(&[Operation::push(1u64), Operation::push(1u64)], 5).unwrap();
    let report = vm.transact().unwrap();
    assert!(!report.is_success());
    assert_eq!(report.gas_used, 5);
    assert!(report.output.is_empty());
}

#[test]
fn undefined_opcode_is_invalid() {
    let mut vm = new_vm_with_bytecode(Bytes::from(vec![0x0c])).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    let err = vm.execute_code(&mut frame).unwrap_err();
    assert_eq!(err, ExceptionalHalt::InvalidOpcode.into());
}

// --- Warm/cold access accounting ---

#[test]
fn second_balance_access_is_warm() {
    let ops = [
        Operation::push(U256::from(0x7777u64)),
        Operation::Balance,
        Operation::push(U256::from(0x7777u64)),
        Operation::Balance,
        Operation::Stop,
    ];
    let mut vm = new_vm_with_ops(&ops).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    vm.execute_code(&mut frame).unwrap();
    assert_eq!(
        frame.gas_used,
        2 * GAS_VERY_LOW + GAS_COLD_ACCOUNT_ACCESS + GAS_WARM_ACCESS
    );
}

// --- CREATE deploys the init code's return value as the new account's code ---

#[test]
fn create_deploys_returned_code() {
    let value_to_transfer = 10u64;
    let offset = 19u64;
    let size = 13u64;
    let sender_balance = U256::from(25);
    let sender_addr = Address::from_low_u64_be(40);

    // PUSH4 0xFFFFFFFF PUSH1 0 MSTORE PUSH1 4 PUSH1 0x1C RETURN: returns the
    // 4 bytes 0xFFFFFFFF from memory.
    let initialization_code = hex::decode("63FFFFFFFF6000526004601CF3").unwrap();

    let ops = [
        Operation::Push(initialization_code),
        Operation::Push0,
        Operation::MStore,
        Operation::push(size),
        Operation::push(offset),
        Operation::push(value_to_transfer),
        Operation::Create,
        Operation::Stop,
    ];
    let mut vm = new_vm_with_ops_addr_bal_db(
        ops_to_bytecode(&ops),
        sender_addr,
        sender_balance,
        1_000_000,
        InMemoryDatabase::default(),
    )
    .unwrap();

    let mut frame = vm.call_frames.pop().unwrap();
    vm.execute_code(&mut frame).unwrap();

    let new_address = calculate_create_address(test_contract_address(), 0);
    let deployed = vm.db.get_account(new_address);
    assert_eq!(deployed.info.code.as_ref(), &[0xff, 0xff, 0xff, 0xff]);
    assert_eq!(deployed.info.balance, U256::from(value_to_transfer));
}

// --- CREATE2 determinism ---

#[test]
fn create2_address_is_deterministic() {
    let sender = Address::from_low_u64_be(0x55);
    let init_code = vec![0x60, 0x00, 0x60, 0x00, 0xf3]; // PUSH1 0 PUSH1 0 RETURN
    let salt = U256::from(7);
    let a1 = calculate_create2_address(sender, &init_code, salt);
    let a2 = calculate_create2_address(sender, &init_code, salt);
    assert_eq!(a1, a2);
}

// --- CALL depth limit: soft failure, not exceptional halt ---

#[test]
fn call_at_max_depth_pushes_zero_instead_of_recursing() {
    let mut vm = new_vm_with_ops(&[Operation::Stop]).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    frame.depth = STACK_DEPTH_LIMIT;
    let sender = frame.to;

    vm.generic_call(
        &mut frame,
        0,
        0,
        U256::zero(),
        sender,
        Address::from_low_u64_be(1),
        Address::from_low_u64_be(1),
        Bytes::new(),
        true,
        true,
        false,
        false,
        U256::zero(),
        0,
        U256::zero(),
        0,
    )
    .unwrap();

    assert_eq!(frame.stack.pop().unwrap(), U256::zero());
}

#[test]
fn call_below_max_depth_recurses_successfully() {
    let mut vm = new_vm_with_ops(&[Operation::Stop]).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();
    frame.depth = STACK_DEPTH_LIMIT - 1;
    let sender = frame.to;

    vm.generic_call(
        &mut frame,
        0,
        1_000_000,
        U256::zero(),
        sender,
        Address::from_low_u64_be(1),
        Address::from_low_u64_be(1),
        Bytes::new(),
        true,
        true,
        false,
        false,
        U256::zero(),
        0,
        U256::zero(),
        0,
    )
    .unwrap();

    // The child frame ran one level past the parent's depth (1024, the
    // limit itself) and still completed normally instead of being turned
    // away, unlike the depth-1024 parent in the test above.
    assert_eq!(frame.stack.pop().unwrap(), U256::from(SUCCESS_FOR_CALL));
}

// --- EIP-170: deployed contract code size boundary ---

#[test]
fn deployed_code_at_max_size_succeeds() {
    // Returns exactly MAX_CODE_SIZE bytes of (zero-initialized) memory.
    let init_code = ops_to_bytecode(&[
        Operation::push(U256::from(MAX_CODE_SIZE as u64)),
        Operation::push(0u64),
        Operation::Return,
    ]);

    let mut vm = new_create_vm_with_init_code(init_code, TEST_INITIAL_GAS).unwrap();
    let report = vm.transact().unwrap();

    assert!(report.is_success());
    let new_address = calculate_create_address(test_sender_address(), 0);
    assert_eq!(vm.db.get_account(new_address).info.code.len(), MAX_CODE_SIZE);
}

#[test]
fn deployed_code_over_max_size_is_out_of_gas() {
    // One byte over MAX_CODE_SIZE.
    let init_code = ops_to_bytecode(&[
        Operation::push(U256::from(MAX_CODE_SIZE as u64 + 1)),
        Operation::push(0u64),
        Operation::Return,
    ]);

    let mut vm = new_create_vm_with_init_code(init_code, TEST_INITIAL_GAS).unwrap();
    let report = vm.transact().unwrap();

    assert!(!report.is_success());
    assert_eq!(
        report.result,
        TxResult::Revert(ExceptionalHalt::OutOfGas(OutOfGasError::GasCostOverflow).into())
    );
}

// --- EIP-3860: CREATE/CREATE2 init code size boundary ---

#[test]
fn init_code_at_max_size_succeeds() {
    let mut vm = new_vm_with_ops(&[Operation::Stop]).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();

    vm.generic_create(&mut frame, U256::zero(), U256::zero(), MAX_INIT_CODE_SIZE, None)
        .unwrap();

    let new_address = word_to_address(frame.stack.pop().unwrap());
    assert_ne!(new_address, Address::zero());
}

#[test]
fn init_code_over_max_size_is_rejected() {
    let mut vm = new_vm_with_ops(&[Operation::Stop]).unwrap();
    let mut frame = vm.call_frames.pop().unwrap();

    let err = vm
        .generic_create(
            &mut frame,
            U256::zero(),
            U256::zero(),
            MAX_INIT_CODE_SIZE + 1,
            None,
        )
        .unwrap_err();
    assert_eq!(err, ExceptionalHalt::InitcodeSizeExceeded.into());
}

// --- Precompiles: alt_bn128 ECADD/ECMUL on non-identity points ---

// Generator (1, 2) added to / multiplied by itself, a well known BN254 test
// vector: 2*(1,2) = (0x30644e72e131a029b85045b68181585d97816a916871ca8d3c208c16d87cfd3,
//                     0x15ed738c0e0a7c92e7845f96b2ae9c0a68a6a449e3538fc7ff3ebf7a5a18a2c4).
fn expected_doubled_generator() -> Vec<u8> {
    hex::decode(
        "030644e72e131a029b85045b68181585d97816a916871ca8d3c208c16d87cfd3\
         15ed738c0e0a7c92e7845f96b2ae9c0a68a6a449e3538fc7ff3ebf7a5a18a2c4",
    )
    .unwrap()
}

#[test]
fn ecadd_doubles_generator_point() {
    let calldata = hex::decode(
        "0000000000000000000000000000000000000000000000000000000000000001\
         0000000000000000000000000000000000000000000000000000000000000002\
         0000000000000000000000000000000000000000000000000000000000000001\
         0000000000000000000000000000000000000000000000000000000000000002",
    )
    .unwrap();

    let (output, cost) = execute_precompile(
        Address::from_low_u64_be(ECADD_ADDRESS),
        &calldata,
        100_000,
        Fork::LATEST,
    )
    .unwrap();

    assert_eq!(output.as_ref(), expected_doubled_generator().as_slice());
    assert_eq!(cost, ECADD_COST);
}

#[test]
fn ecmul_by_two_doubles_generator_point() {
    let calldata = hex::decode(
        "0000000000000000000000000000000000000000000000000000000000000001\
         0000000000000000000000000000000000000000000000000000000000000002\
         0000000000000000000000000000000000000000000000000000000000000002",
    )
    .unwrap();

    let (output, cost) = execute_precompile(
        Address::from_low_u64_be(ECMUL_ADDRESS),
        &calldata,
        100_000,
        Fork::LATEST,
    )
    .unwrap();

    assert_eq!(output.as_ref(), expected_doubled_generator().as_slice());
    assert_eq!(cost, ECMUL_COST);
}
