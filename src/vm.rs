//! The interpreter loop and the recursive call/create engine: everything
//! that turns a `CallFrame` plus a `GeneralizedDatabase` into an
//! [`ExecutionReport`]. Child frames are run through plain native recursion
//! (a CALL/CREATE handler calls back into [`VM::execute_code`] for the
//! spawned frame before returning) bounded by [`STACK_DEPTH_LIMIT`]; the
//! `call_frames` field only ever holds the single frame waiting to be
//! popped and run by [`VM::transact`].

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use rlp::RlpStream;

use crate::account::Account;
use crate::call_frame::CallFrame;
use crate::constants::*;
use crate::db::GeneralizedDatabase;
use crate::environment::{Authorization, BlockEnvironment, TransactionEnvironment, TxKind};
use crate::errors::{
    ExceptionalHalt, ExecutionReport, InternalError, OpcodeResult, OutOfGasError, TxResult, VMError,
};
use crate::fork::Fork;
use crate::gas_cost;
use crate::memory;
use crate::opcodes::Opcode;
use crate::precompiles;
use crate::trace::{TraceEvent, TraceSink};
use crate::utils;
use tracing::{debug, trace};

pub use crate::utils::{address_to_word, word_to_address};

/// Everything accrued across a transaction besides the world-state cache
/// itself: warm/cold access sets (EIP-2929), the set of accounts created
/// this transaction (for EIP-6780 SELFDESTRUCT gating), accounts pending
/// deletion, transient storage (EIP-1153), and the signed refund counter.
///
/// A fresh [`StateBackup`] clones this whole struct around every CALL/CREATE;
/// rolling one back on failure restores the pre-call access sets too, which
/// is how this engine implements "a reverted child does not leave its warm
/// accesses behind" without bespoke merge bookkeeping for every field.
#[derive(Debug, Clone, Default)]
pub struct Substate {
    pub accessed_addresses: HashSet<Address>,
    pub accessed_storage_keys: HashSet<(Address, H256)>,
    /// Addresses whose code has been read this transaction (EIP-7702
    /// delegation targets and CALL-family code addresses), warmed
    /// separately from `accessed_addresses` since a delegation target can
    /// become warm for code access without the delegating address itself
    /// being touched again.
    pub warm_code_addresses: HashSet<Address>,
    pub created_accounts: HashSet<Address>,
    pub accounts_to_delete: HashSet<Address>,
    pub transient_storage: HashMap<(Address, H256), U256>,
    pub refund_counter: i64,
}

/// A snapshot of the cache and substate taken before a frame starts running,
/// so its effects can be discarded wholesale on revert.
#[derive(Debug, Clone)]
struct StateBackup {
    cache: crate::db::CacheDB,
    substate: Substate,
}

pub struct VM {
    pub call_frames: Vec<CallFrame>,
    backups: Vec<StateBackup>,
    pub substate: Substate,
    pub db: GeneralizedDatabase,
    pub block: BlockEnvironment,
    pub tx: TransactionEnvironment,
    pub tx_kind: TxKind,
    /// Set only for `TxKind::Create`: the deterministically derived address
    /// the top-level frame is deploying into.
    created_address: Option<Address>,
    pub tracer: Box<dyn TraceSink>,
}

impl VM {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mut db: GeneralizedDatabase,
        block: BlockEnvironment,
        tx: TransactionEnvironment,
        tx_kind: TxKind,
        value: U256,
        calldata: Bytes,
        tracer: Box<dyn TraceSink>,
    ) -> Result<Self, VMError> {
        let mut substate = Substate::default();
        substate.accessed_addresses.insert(tx.origin);
        substate.accessed_addresses.insert(block.coinbase);
        for address in gas_cost::precompile_addresses(block.fork) {
            substate.accessed_addresses.insert(address);
        }
        for address in &tx.access_list_addresses {
            substate.accessed_addresses.insert(*address);
        }
        for key in &tx.access_list_storage_keys {
            substate.accessed_storage_keys.insert(*key);
        }

        if tx_kind != TxKind::Create {
            apply_authorizations(&mut db, &mut substate, block.chain_id, &tx.authorizations);
        }

        let mut created_address = None;
        let initial_frame = match tx_kind {
            TxKind::Call(to) => {
                substate.accessed_addresses.insert(to);
                let (_, code) = utils::eip7702_get_code(&mut db, &mut substate, to);
                CallFrame::new(
                    tx.origin,
                    to,
                    to,
                    code,
                    value,
                    calldata,
                    false,
                    tx.initial_gas,
                    0,
                    0,
                    false,
                )
            }
            TxKind::Create => {
                let nonce = db.get_account(tx.origin).info.nonce;
                let new_address = calculate_create_address(tx.origin, nonce);
                let existing = db.get_account(new_address);
                if existing.has_code_or_nonce() || existing.has_storage() {
                    return Err(ExceptionalHalt::AddressAlreadyOccupied.into());
                }
                substate.accessed_addresses.insert(new_address);
                substate.created_accounts.insert(new_address);
                utils::insert_account(
                    &mut db,
                    new_address,
                    Account::new(U256::zero(), Bytes::new(), 1, Default::default()),
                );
                utils::move_ether(&mut db, tx.origin, new_address, value)?;
                created_address = Some(new_address);
                CallFrame::new(
                    tx.origin,
                    new_address,
                    new_address,
                    calldata,
                    value,
                    Bytes::new(),
                    false,
                    tx.initial_gas,
                    0,
                    0,
                    true,
                )
            }
        };

        Ok(Self {
            call_frames: vec![initial_frame],
            backups: Vec::new(),
            substate,
            db,
            block,
            tx,
            tx_kind,
            created_address,
            tracer,
        })
    }

    fn push_backup(&mut self) {
        self.backups.push(StateBackup {
            cache: self.db.cache.clone(),
            substate: self.substate.clone(),
        });
    }

    fn commit_backup(&mut self) {
        self.backups.pop();
    }

    fn rollback_backup(&mut self) -> Result<(), VMError> {
        let backup = self
            .backups
            .pop()
            .ok_or(InternalError::CouldNotAccessBackup)?;
        self.db.cache = backup.cache;
        self.substate = backup.substate;
        Ok(())
    }

    /// Runs the whole transaction: pops the frame `new` prepared, executes
    /// it to completion, deploys the resulting code for a creation
    /// transaction, and folds the outcome into an [`ExecutionReport`].
    pub fn transact(&mut self) -> Result<ExecutionReport, VMError> {
        let mut frame = self
            .call_frames
            .pop()
            .ok_or(InternalError::CouldNotPopCallframe)?;
        debug!(target: "levm", kind = ?self.tx_kind, gas = frame.gas_limit, "starting transaction");
        self.push_backup();

        let result = self.execute_code(&mut frame);
        let result = if self.tx_kind == TxKind::Create {
            result.and_then(|()| self.finalize_deployed_code(&mut frame))
        } else {
            result
        };

        self.finalize(result, frame)
    }

    fn finalize_deployed_code(&mut self, frame: &mut CallFrame) -> Result<(), VMError> {
        let Some(new_address) = self.created_address else {
            return Ok(());
        };
        let code = frame.output.clone();
        if code.first() == Some(&0xef) {
            return Err(ExceptionalHalt::InvalidContractPrefix.into());
        }
        if code.len() > MAX_CODE_SIZE {
            return Err(OutOfGasError::GasCostOverflow.into());
        }
        let deposit_cost = u64::try_from(code.len())
            .map_err(|_| ExceptionalHalt::VeryLargeNumber)?
            .checked_mul(GAS_CODE_DEPOSIT)
            .ok_or(OutOfGasError::GasCostOverflow)?;
        frame.increase_consumed_gas(deposit_cost)?;
        utils::set_code(&mut self.db, new_address, code);
        Ok(())
    }

    fn finalize(
        &mut self,
        result: Result<(), VMError>,
        frame: CallFrame,
    ) -> Result<ExecutionReport, VMError> {
        match result {
            Ok(()) => {
                self.commit_backup();
                let gas_used = frame.gas_used;
                let gas_refunded = self.clamp_refund(gas_used);
                debug!(target: "levm", gas_used, gas_refunded, "transaction succeeded");
                self.tracer.record(TraceEvent::TransactionEnd {
                    gas_used,
                    success: true,
                });
                Ok(ExecutionReport {
                    result: TxResult::Success,
                    gas_used,
                    gas_refunded,
                    output: frame.output,
                    logs: frame.logs,
                })
            }
            Err(VMError::RevertOpcode(reason)) => {
                self.rollback_backup()?;
                trace!(target: "levm", reason_len = reason.len(), "transaction reverted");
                self.tracer.record(TraceEvent::TransactionEnd {
                    gas_used: frame.gas_used,
                    success: false,
                });
                Ok(ExecutionReport {
                    result: TxResult::Revert(VMError::RevertOpcode(reason.clone())),
                    gas_used: frame.gas_used,
                    gas_refunded: 0,
                    output: reason,
                    logs: Vec::new(),
                })
            }
            Err(err) => {
                self.rollback_backup()?;
                debug!(target: "levm", error = %err, "transaction halted exceptionally");
                self.tracer.record(TraceEvent::TransactionEnd {
                    gas_used: frame.gas_limit,
                    success: false,
                });
                Ok(ExecutionReport {
                    result: TxResult::Revert(err),
                    gas_used: frame.gas_limit,
                    gas_refunded: 0,
                    output: Bytes::new(),
                    logs: Vec::new(),
                })
            }
        }
    }

    /// EIP-3529: the refund counter never goes negative and is capped at
    /// one fifth of the gas actually used.
    fn clamp_refund(&self, gas_used: u64) -> u64 {
        let refund = u64::try_from(self.substate.refund_counter.max(0)).unwrap_or(0);
        refund.min(gas_used / 5)
    }

    pub fn current_call_frame_mut(&mut self) -> Result<&mut CallFrame, VMError> {
        self.call_frames
            .last_mut()
            .ok_or(InternalError::CouldNotPopCallframe.into())
    }

    /// Runs `frame` from its current `pc` until it halts (STOP/RETURN
    /// normally, REVERT, or an exceptional halt).
    pub fn execute_code(&mut self, frame: &mut CallFrame) -> Result<(), VMError> {
        loop {
            let pc = frame.pc;
            let opcode_byte = frame.next_opcode();
            self.tracer.record(TraceEvent::OpStart {
                pc,
                opcode: opcode_byte,
                depth: frame.depth,
                gas_remaining: frame.gas_remaining(),
                stack: frame.stack.as_slice().to_vec(),
            });

            let opcode = Opcode::from_byte(opcode_byte);
            match self.dispatch(frame, opcode) {
                Ok(OpcodeResult::Continue { pc_increment }) => {
                    frame.pc = frame.pc.saturating_add(pc_increment);
                    self.tracer.record(TraceEvent::OpEnd {
                        pc,
                        gas_used: frame.gas_used,
                    });
                }
                Ok(OpcodeResult::Halt) => {
                    self.tracer.record(TraceEvent::EvmStop { depth: frame.depth });
                    return Ok(());
                }
                Err(err) => {
                    self.tracer.record(TraceEvent::OpException {
                        pc,
                        error: err.clone(),
                    });
                    return Err(err);
                }
            }
        }
    }

    fn dispatch(&mut self, frame: &mut CallFrame, opcode: Opcode) -> Result<OpcodeResult, VMError> {
        let byte = opcode.to_byte();
        match byte {
            0x00 => self.op_stop(frame),
            0x01 => self.op_add(frame),
            0x02 => self.op_mul(frame),
            0x03 => self.op_sub(frame),
            0x04 => self.op_div(frame),
            0x05 => self.op_sdiv(frame),
            0x06 => self.op_mod(frame),
            0x07 => self.op_smod(frame),
            0x08 => self.op_addmod(frame),
            0x09 => self.op_mulmod(frame),
            0x0a => self.op_exp(frame),
            0x0b => self.op_signextend(frame),

            0x10 => self.op_lt(frame),
            0x11 => self.op_gt(frame),
            0x12 => self.op_slt(frame),
            0x13 => self.op_sgt(frame),
            0x14 => self.op_eq(frame),
            0x15 => self.op_iszero(frame),
            0x16 => self.op_and(frame),
            0x17 => self.op_or(frame),
            0x18 => self.op_xor(frame),
            0x19 => self.op_not(frame),
            0x1a => self.op_byte(frame),
            0x1b => self.op_shl(frame),
            0x1c => self.op_shr(frame),
            0x1d => self.op_sar(frame),

            0x20 => self.op_keccak256(frame),

            0x30 => self.op_address(frame),
            0x31 => self.op_balance(frame),
            0x32 => self.op_origin(frame),
            0x33 => self.op_caller(frame),
            0x34 => self.op_callvalue(frame),
            0x35 => self.op_calldataload(frame),
            0x36 => self.op_calldatasize(frame),
            0x37 => self.op_calldatacopy(frame),
            0x38 => self.op_codesize(frame),
            0x39 => self.op_codecopy(frame),
            0x3a => self.op_gasprice(frame),
            0x3b => self.op_extcodesize(frame),
            0x3c => self.op_extcodecopy(frame),
            0x3d => self.op_returndatasize(frame),
            0x3e => self.op_returndatacopy(frame),
            0x3f => self.op_extcodehash(frame),

            0x40 => self.op_blockhash(frame),
            0x41 => self.op_coinbase(frame),
            0x42 => self.op_timestamp(frame),
            0x43 => self.op_number(frame),
            0x44 => self.op_prevrandao(frame),
            0x45 => self.op_gaslimit(frame),
            0x46 => self.op_chainid(frame),
            0x47 => self.op_selfbalance(frame),
            0x48 => self.op_basefee(frame),
            0x49 => self.op_blobhash(frame),
            0x4a => self.op_blobbasefee(frame),

            0x50 => self.op_pop(frame),
            0x51 => self.op_mload(frame),
            0x52 => self.op_mstore(frame),
            0x53 => self.op_mstore8(frame),
            0x54 => self.op_sload(frame),
            0x55 => self.op_sstore(frame),
            0x56 => self.op_jump(frame),
            0x57 => self.op_jumpi(frame),
            0x58 => self.op_pc(frame),
            0x59 => self.op_msize(frame),
            0x5a => self.op_gas(frame),
            0x5b => self.op_jumpdest(frame),
            0x5c => self.op_tload(frame),
            0x5d => self.op_tstore(frame),
            0x5e => self.op_mcopy(frame),

            0x5f => self.op_push0(frame),
            0x60..=0x7f => self.op_push(frame, opcode.push_size()),

            0x80..=0x8f => self.op_dup(frame, byte.saturating_sub(0x80).saturating_add(1)),
            0x90..=0x9f => self.op_swap(frame, byte.saturating_sub(0x90).saturating_add(1)),
            0xa0..=0xa4 => self.op_log(frame, byte.saturating_sub(0xa0)),

            0xf0 => self.op_create(frame),
            0xf1 => self.op_call(frame),
            0xf2 => self.op_callcode(frame),
            0xf3 => self.op_return(frame),
            0xf4 => self.op_delegatecall(frame),
            0xf5 => self.op_create2(frame),
            0xfa => self.op_staticcall(frame),
            0xfd => self.op_revert(frame),
            0xff => self.op_selfdestruct(frame),
            _ => Err(ExceptionalHalt::InvalidOpcode.into()),
        }
    }

    /// The shared engine behind CALL/CALLCODE/DELEGATECALL/STATICCALL.
    /// `code` is the already EIP-7702-resolved bytecode to run; `to` is the
    /// account whose storage/balance the new frame operates against.
    /// `gas_cost` is what this frame pays (the EIP-150-capped forwarded
    /// amount, excluding any EIP-2300 stipend); `gas_limit` is the budget
    /// handed to the child/precompile, which does include the stipend for
    /// value-bearing CALL/CALLCODE. `check_balance` gates the sender-balance
    /// check, true only for CALL/CALLCODE — DELEGATECALL forwards the
    /// parent's own `value` without moving funds or checking anyone's
    /// balance against it. `disable_precompiles` is set by the caller when
    /// `code_address` was only reached by following an EIP-7702 delegation
    /// designator: a designator that happens to point at a precompile
    /// address must not invoke it (the precompile only runs for a direct
    /// call). This does not propagate past the one hop it is computed for.
    #[allow(clippy::too_many_arguments)]
    pub fn generic_call(
        &mut self,
        frame: &mut CallFrame,
        gas_cost: u64,
        gas_limit: u64,
        value: U256,
        msg_sender: Address,
        to: Address,
        code_address: Address,
        code: Bytes,
        should_transfer_value: bool,
        check_balance: bool,
        is_static: bool,
        disable_precompiles: bool,
        args_offset: U256,
        args_size: usize,
        ret_offset: U256,
        ret_size: usize,
    ) -> Result<(), VMError> {
        if frame.depth >= STACK_DEPTH_LIMIT {
            frame.stack.push(U256::from(REVERT_FOR_CALL))?;
            return Ok(());
        }
        if check_balance && !value.is_zero() {
            let sender_account = self.db.get_account(msg_sender);
            if sender_account.info.balance < value {
                frame.stack.push(U256::from(REVERT_FOR_CALL))?;
                return Ok(());
            }
        }

        let calldata = Bytes::from(memory::load_range(&mut frame.memory, args_offset, args_size)?);

        // Only the forwarded-without-stipend portion is charged to this
        // frame; handle_return_* credits back whatever the child/precompile
        // didn't spend out of its own (possibly stipend-inflated) budget.
        frame.increase_consumed_gas(gas_cost)?;

        self.push_backup();
        if should_transfer_value {
            if let Err(err) = utils::move_ether(&mut self.db, msg_sender, to, value) {
                self.rollback_backup()?;
                return Err(err);
            }
        }

        if precompiles::is_precompile(&code_address, self.block.fork) && !disable_precompiles {
            let result =
                precompiles::execute_precompile(code_address, &calldata, gas_limit, self.block.fork);
            return self.handle_return_precompile(frame, result, gas_limit, ret_offset, ret_size);
        }

        trace!(target: "levm", depth = frame.depth + 1, to = ?to, code_address = ?code_address, gas_limit, "spawning call frame");
        let mut child = CallFrame::new(
            msg_sender,
            to,
            code_address,
            code,
            value,
            calldata,
            is_static,
            gas_limit,
            0,
            frame.depth.saturating_add(1),
            false,
        );
        let result = self.execute_code(&mut child);
        self.handle_return_call(frame, &mut child, result, ret_offset, ret_size)
    }

    fn handle_return_call(
        &mut self,
        frame: &mut CallFrame,
        child: &mut CallFrame,
        result: Result<(), VMError>,
        ret_offset: U256,
        ret_size: usize,
    ) -> Result<(), VMError> {
        match result {
            Ok(()) => {
                self.commit_backup();
                frame.gas_used = frame.gas_used.saturating_sub(child.gas_remaining());
                frame.sub_return_data = child.output.clone();
                memory::try_store_range(&mut frame.memory, ret_offset, ret_size, &child.output)?;
                frame.logs.append(&mut child.logs);
                frame.stack.push(U256::from(SUCCESS_FOR_CALL))?;
                Ok(())
            }
            Err(VMError::RevertOpcode(reason)) => {
                self.rollback_backup()?;
                frame.gas_used = frame.gas_used.saturating_sub(child.gas_remaining());
                frame.sub_return_data = reason.clone();
                memory::try_store_range(&mut frame.memory, ret_offset, ret_size, &reason)?;
                frame.stack.push(U256::from(REVERT_FOR_CALL))?;
                Ok(())
            }
            Err(_) => {
                self.rollback_backup()?;
                frame.sub_return_data = Bytes::new();
                frame.stack.push(U256::from(REVERT_FOR_CALL))?;
                Ok(())
            }
        }
    }

    fn handle_return_precompile(
        &mut self,
        frame: &mut CallFrame,
        result: Result<(Bytes, u64), VMError>,
        gas_limit: u64,
        ret_offset: U256,
        ret_size: usize,
    ) -> Result<(), VMError> {
        self.tracer.record(TraceEvent::PrecompileStart {
            address: frame.code_address,
            gas_limit,
        });
        match result {
            Ok((output, gas_used)) => {
                self.commit_backup();
                frame.gas_used = frame
                    .gas_used
                    .saturating_sub(gas_limit.saturating_sub(gas_used));
                self.tracer.record(TraceEvent::PrecompileEnd {
                    output: output.clone(),
                    gas_used,
                });
                frame.sub_return_data = output.clone();
                memory::try_store_range(&mut frame.memory, ret_offset, ret_size, &output)?;
                frame.stack.push(U256::from(SUCCESS_FOR_CALL))?;
                Ok(())
            }
            Err(_) => {
                self.rollback_backup()?;
                frame.sub_return_data = Bytes::new();
                frame.stack.push(U256::from(REVERT_FOR_CALL))?;
                Ok(())
            }
        }
    }

    /// The shared engine behind CREATE/CREATE2.
    pub fn generic_create(
        &mut self,
        frame: &mut CallFrame,
        value: U256,
        code_offset: U256,
        code_size: usize,
        salt: Option<U256>,
    ) -> Result<OpcodeResult, VMError> {
        if frame.is_static {
            return Err(ExceptionalHalt::OpcodeNotAllowedInStaticContext.into());
        }
        if code_size > MAX_INIT_CODE_SIZE {
            return Err(ExceptionalHalt::InitcodeSizeExceeded.into());
        }

        let init_code = memory::load_range(&mut frame.memory, code_offset, code_size)?;

        let sender_account = self.db.get_account(frame.to);
        if sender_account.info.balance < value
            || frame.depth >= STACK_DEPTH_LIMIT
            || sender_account.info.nonce == u64::MAX
        {
            frame.stack.push(U256::from(CREATE_DEPLOYMENT_FAIL))?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }

        let nonce = sender_account.info.nonce;
        let new_address = match salt {
            Some(salt) => calculate_create2_address(frame.to, &init_code, salt),
            None => calculate_create_address(frame.to, nonce),
        };
        utils::increment_account_nonce(&mut self.db, frame.to)?;

        let existing = self.db.get_account(new_address);
        if self.substate.created_accounts.contains(&new_address)
            || existing.has_code_or_nonce()
            || existing.has_storage()
        {
            frame.stack.push(U256::from(CREATE_DEPLOYMENT_FAIL))?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }

        let forwarded_gas = gas_cost::max_message_call_gas(frame.gas_remaining());
        frame.increase_consumed_gas(forwarded_gas)?;

        self.push_backup();
        self.substate.accessed_addresses.insert(new_address);
        self.substate.created_accounts.insert(new_address);
        utils::insert_account(
            &mut self.db,
            new_address,
            Account::new(U256::zero(), Bytes::new(), 1, Default::default()),
        );
        if let Err(err) = utils::move_ether(&mut self.db, frame.to, new_address, value) {
            self.rollback_backup()?;
            return Err(err);
        }

        trace!(target: "levm", depth = frame.depth + 1, new_address = ?new_address, forwarded_gas, "spawning create frame");
        let mut child = CallFrame::new(
            frame.to,
            new_address,
            new_address,
            Bytes::from(init_code),
            value,
            Bytes::new(),
            false,
            forwarded_gas,
            0,
            frame.depth.saturating_add(1),
            true,
        );
        let result = self.execute_code(&mut child);
        self.handle_return_create(frame, &mut child, result, new_address)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    fn handle_return_create(
        &mut self,
        frame: &mut CallFrame,
        child: &mut CallFrame,
        result: Result<(), VMError>,
        new_address: Address,
    ) -> Result<(), VMError> {
        match result {
            Ok(()) => {
                let code = child.output.clone();
                let valid_prefix = code.first() != Some(&0xef);
                let valid_size = code.len() <= MAX_CODE_SIZE;
                if !valid_prefix || !valid_size {
                    self.rollback_backup()?;
                    frame.stack.push(U256::from(CREATE_DEPLOYMENT_FAIL))?;
                    return Ok(());
                }
                let Ok(deposit_cost) = u64::try_from(code.len())
                    .map_err(|_| ())
                    .and_then(|len| len.checked_mul(GAS_CODE_DEPOSIT).ok_or(()))
                else {
                    self.rollback_backup()?;
                    frame.stack.push(U256::from(CREATE_DEPLOYMENT_FAIL))?;
                    return Ok(());
                };
                if child.increase_consumed_gas(deposit_cost).is_err() {
                    self.rollback_backup()?;
                    frame.stack.push(U256::from(CREATE_DEPLOYMENT_FAIL))?;
                    return Ok(());
                }
                utils::set_code(&mut self.db, new_address, code);
                self.commit_backup();
                frame.gas_used = frame.gas_used.saturating_sub(child.gas_remaining());
                frame.logs.append(&mut child.logs);
                frame.stack.push(utils::address_to_word(new_address))?;
                Ok(())
            }
            Err(VMError::RevertOpcode(reason)) => {
                self.rollback_backup()?;
                frame.gas_used = frame.gas_used.saturating_sub(child.gas_remaining());
                frame.sub_return_data = reason;
                frame.stack.push(U256::from(CREATE_DEPLOYMENT_FAIL))?;
                Ok(())
            }
            Err(_) => {
                self.rollback_backup()?;
                frame.stack.push(U256::from(CREATE_DEPLOYMENT_FAIL))?;
                Ok(())
            }
        }
    }
}

/// CREATE address: `keccak256(rlp([sender, nonce]))[12..]`.
pub fn calculate_create_address(sender: Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender.as_bytes());
    stream.append(&nonce);
    let hash = keccak_hash::keccak(stream.out());
    Address::from_slice(&hash.as_bytes()[12..32])
}

/// CREATE2 address: `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]`.
pub fn calculate_create2_address(sender: Address, init_code: &[u8], salt: U256) -> Address {
    let mut salt_bytes = [0u8; 32];
    salt.to_big_endian(&mut salt_bytes);
    let init_code_hash = keccak_hash::keccak(init_code);

    let mut buf = Vec::with_capacity(1 + 20 + 32 + 32);
    buf.push(0xff);
    buf.extend_from_slice(sender.as_bytes());
    buf.extend_from_slice(&salt_bytes);
    buf.extend_from_slice(init_code_hash.as_bytes());

    let hash = keccak_hash::keccak(buf);
    Address::from_slice(&hash.as_bytes()[12..32])
}

/// True once a fork has activated EIP-1153 transient storage (Cancun on).
pub fn transient_storage_active(fork: Fork) -> bool {
    fork >= Fork::Cancun
}

/// EIP-7702 magic byte prefixed to the RLP-encoded `(chain_id, address,
/// nonce)` tuple before hashing, to domain-separate authorization signatures
/// from any other signed message.
const SET_CODE_MAGIC: u8 = 0x05;

/// Applies every EIP-7702 authorization tuple carried by the transaction,
/// installing a delegation designator (or clearing one) on each authority
/// whose signature recovers and whose chain id / nonce match. Tuples that
/// fail any check are skipped silently — EIP-7702 defines no partial-tuple
/// failure mode for the transaction as a whole.
fn apply_authorizations(
    db: &mut GeneralizedDatabase,
    substate: &mut Substate,
    chain_id: u64,
    authorizations: &[Authorization],
) {
    for auth in authorizations {
        if auth.chain_id != 0 && auth.chain_id != chain_id {
            continue;
        }
        let Some(authority) = recover_authority(auth) else {
            continue;
        };
        substate.accessed_addresses.insert(authority);

        let account = db.get_account(authority);
        if account.has_code_or_nonce() && !utils::is_delegation_designator(&account.info.code) {
            continue;
        }
        if account.info.nonce != auth.nonce || account.info.nonce == u64::MAX {
            continue;
        }

        let code = if auth.address.is_zero() {
            Bytes::new()
        } else {
            let mut designator = Vec::with_capacity(SET_CODE_DELEGATION_LEN);
            designator.extend_from_slice(&SET_CODE_DELEGATION_PREFIX);
            designator.extend_from_slice(auth.address.as_bytes());
            Bytes::from(designator)
        };
        utils::set_code(db, authority, code);
        let _ = utils::increment_account_nonce(db, authority);
    }
}

/// Recovers the authority address from an authorization tuple's signature
/// over `keccak256(MAGIC || rlp([chain_id, address, nonce]))`.
fn recover_authority(auth: &Authorization) -> Option<Address> {
    let mut stream = RlpStream::new_list(3);
    stream.append(&auth.chain_id);
    stream.append(&auth.address.as_bytes());
    stream.append(&auth.nonce);
    let encoded = stream.out();

    let mut preimage = Vec::with_capacity(1 + encoded.len());
    preimage.push(SET_CODE_MAGIC);
    preimage.extend_from_slice(&encoded);
    let digest = keccak_hash::keccak(&preimage);

    let recovery_id = libsecp256k1::RecoveryId::parse(auth.y_parity).ok()?;
    let mut sig_bytes = [0u8; 64];
    auth.r.to_big_endian(&mut sig_bytes[..32]);
    auth.s.to_big_endian(&mut sig_bytes[32..]);
    let signature = libsecp256k1::Signature::parse_standard(&sig_bytes).ok()?;
    let message = libsecp256k1::Message::parse_slice(digest.as_bytes()).ok()?;
    let public_key = libsecp256k1::recover(&message, &signature, &recovery_id).ok()?;

    let serialized = public_key.serialize();
    let address_hash = keccak_hash::keccak(&serialized[1..]);
    Some(Address::from_slice(&address_hash.as_bytes()[12..32]))
}
