//! Opcodes 0x00, 0xf0-0xf5, 0xfa, 0xfd, 0xff: STOP, CREATE, CALL, CALLCODE,
//! RETURN, DELEGATECALL, CREATE2, STATICCALL, REVERT, SELFDESTRUCT.

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::call_frame::CallFrame;
use crate::constants::CALL_POSITIVE_VALUE_STIPEND;
use crate::db::GeneralizedDatabase;
use crate::errors::{ExceptionalHalt, OpcodeResult, VMError};
use crate::gas_cost;
use crate::memory;
use crate::utils;
use crate::vm::{Substate, VM};

impl VM {
    pub fn op_stop(&mut self, _frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        Ok(OpcodeResult::Halt)
    }

    pub fn op_return(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;
        let cost = gas_cost::exit_opcode(size, offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;
        let data = memory::load_range(&mut frame.memory, offset, size)?;
        frame.output = Bytes::from(data);
        Ok(OpcodeResult::Halt)
    }

    pub fn op_revert(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;
        let cost = gas_cost::exit_opcode(size, offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;
        let data = memory::load_range(&mut frame.memory, offset, size)?;
        Err(VMError::RevertOpcode(Bytes::from(data)))
    }

    pub fn op_selfdestruct(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        if frame.is_static {
            return Err(ExceptionalHalt::OpcodeNotAllowedInStaticContext.into());
        }
        let beneficiary = utils::word_to_address(frame.stack.pop()?);
        let (beneficiary_account, was_warm) =
            utils::access_account(&mut self.db, &mut self.substate, beneficiary);
        let balance = self.db.get_account(frame.to).info.balance;
        let cost = gas_cost::selfdestruct(
            !was_warm,
            beneficiary_account.info.is_empty(),
            balance.is_zero(),
            self.block.fork,
        )?;
        frame.increase_consumed_gas(cost)?;

        if !balance.is_zero() {
            if beneficiary == frame.to {
                utils::decrease_account_balance(&mut self.db, frame.to, balance)?;
            } else {
                utils::move_ether(&mut self.db, frame.to, beneficiary, balance)?;
            }
        }

        // EIP-6780: only an account created earlier in this same transaction
        // is actually removed at the end of it.
        if self.substate.created_accounts.contains(&frame.to) {
            self.substate.accounts_to_delete.insert(frame.to);
        }

        Ok(OpcodeResult::Halt)
    }

    pub fn op_create(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        if frame.is_static {
            return Err(ExceptionalHalt::OpcodeNotAllowedInStaticContext.into());
        }
        let value = frame.stack.pop()?;
        let offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;

        let cost = gas_cost::create(size, offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;

        self.generic_create(frame, value, offset, size, None)
    }

    pub fn op_create2(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        if frame.is_static {
            return Err(ExceptionalHalt::OpcodeNotAllowedInStaticContext.into());
        }
        let value = frame.stack.pop()?;
        let offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;
        let salt = frame.stack.pop()?;

        let cost = gas_cost::create_2(size, offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;

        self.generic_create(frame, value, offset, size, Some(salt))
    }

    pub fn op_call(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let gas_requested = frame.stack.pop()?;
        let address = utils::word_to_address(frame.stack.pop()?);
        let value = frame.stack.pop()?;
        let args_offset = frame.stack.pop()?;
        let args_size = utils::u256_to_usize(frame.stack.pop()?)?;
        let ret_offset = frame.stack.pop()?;
        let ret_size = utils::u256_to_usize(frame.stack.pop()?)?;

        if frame.is_static && !value.is_zero() {
            return Err(ExceptionalHalt::OpcodeNotAllowedInStaticContext.into());
        }

        let target = resolve_call_target(&mut self.db, &mut self.substate, address);
        let account_is_empty = self.db.get_account(address).info.is_empty();

        let static_cost = gas_cost::call(!target.is_warm, value.is_zero(), account_is_empty, true)?;
        let memory_cost = call_memory_cost(args_offset, args_size, ret_offset, ret_size, frame.memory.len())?;
        frame.increase_consumed_gas(
            static_cost
                .saturating_add(target.code_access_cost)
                .saturating_add(target.delegation_access_cost)
                .saturating_add(memory_cost),
        )?;

        let gas_limit = gas_cost::calculate_cost_and_gas_limit_call(gas_requested, frame.gas_remaining(), value.is_zero())?;
        let gas_cost_charged = gas_limit_without_stipend(gas_limit, value.is_zero());
        let caller = frame.to;
        let is_static = frame.is_static;

        self.generic_call(
            frame,
            gas_cost_charged,
            gas_limit,
            value,
            caller,
            address,
            target.code_address,
            target.code,
            true,
            true,
            is_static,
            target.disable_precompiles,
            args_offset,
            args_size,
            ret_offset,
            ret_size,
        )?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_callcode(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let gas_requested = frame.stack.pop()?;
        let address = utils::word_to_address(frame.stack.pop()?);
        let value = frame.stack.pop()?;
        let args_offset = frame.stack.pop()?;
        let args_size = utils::u256_to_usize(frame.stack.pop()?)?;
        let ret_offset = frame.stack.pop()?;
        let ret_size = utils::u256_to_usize(frame.stack.pop()?)?;

        let target = resolve_call_target(&mut self.db, &mut self.substate, address);

        let static_cost = gas_cost::callcode(!target.is_warm, value.is_zero())?;
        let memory_cost = call_memory_cost(args_offset, args_size, ret_offset, ret_size, frame.memory.len())?;
        frame.increase_consumed_gas(
            static_cost
                .saturating_add(target.code_access_cost)
                .saturating_add(target.delegation_access_cost)
                .saturating_add(memory_cost),
        )?;

        let gas_limit = gas_cost::calculate_cost_and_gas_limit_call(gas_requested, frame.gas_remaining(), value.is_zero())?;
        let gas_cost_charged = gas_limit_without_stipend(gas_limit, value.is_zero());
        let caller = frame.to;
        let is_static = frame.is_static;

        self.generic_call(
            frame,
            gas_cost_charged,
            gas_limit,
            value,
            caller,
            caller,
            target.code_address,
            target.code,
            false,
            true,
            is_static,
            target.disable_precompiles,
            args_offset,
            args_size,
            ret_offset,
            ret_size,
        )?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_delegatecall(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let gas_requested = frame.stack.pop()?;
        let address = utils::word_to_address(frame.stack.pop()?);
        let args_offset = frame.stack.pop()?;
        let args_size = utils::u256_to_usize(frame.stack.pop()?)?;
        let ret_offset = frame.stack.pop()?;
        let ret_size = utils::u256_to_usize(frame.stack.pop()?)?;

        let target = resolve_call_target(&mut self.db, &mut self.substate, address);

        let static_cost = gas_cost::delegatecall(!target.is_warm);
        let memory_cost = call_memory_cost(args_offset, args_size, ret_offset, ret_size, frame.memory.len())?;
        frame.increase_consumed_gas(
            static_cost
                .saturating_add(target.code_access_cost)
                .saturating_add(target.delegation_access_cost)
                .saturating_add(memory_cost),
        )?;

        let gas_limit = gas_cost::calculate_cost_and_gas_limit_call(gas_requested, frame.gas_remaining(), true)?;
        let parent_value = frame.value;
        let parent_msg_sender = frame.msg_sender;
        let parent_to = frame.to;
        let is_static = frame.is_static;

        self.generic_call(
            frame,
            gas_limit,
            gas_limit,
            parent_value,
            parent_msg_sender,
            parent_to,
            target.code_address,
            target.code,
            false,
            false,
            is_static,
            target.disable_precompiles,
            args_offset,
            args_size,
            ret_offset,
            ret_size,
        )?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_staticcall(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let gas_requested = frame.stack.pop()?;
        let address = utils::word_to_address(frame.stack.pop()?);
        let args_offset = frame.stack.pop()?;
        let args_size = utils::u256_to_usize(frame.stack.pop()?)?;
        let ret_offset = frame.stack.pop()?;
        let ret_size = utils::u256_to_usize(frame.stack.pop()?)?;

        let target = resolve_call_target(&mut self.db, &mut self.substate, address);

        let static_cost = gas_cost::staticcall(!target.is_warm);
        let memory_cost = call_memory_cost(args_offset, args_size, ret_offset, ret_size, frame.memory.len())?;
        frame.increase_consumed_gas(
            static_cost
                .saturating_add(target.code_access_cost)
                .saturating_add(target.delegation_access_cost)
                .saturating_add(memory_cost),
        )?;

        let gas_limit = gas_cost::calculate_cost_and_gas_limit_call(gas_requested, frame.gas_remaining(), true)?;

        self.generic_call(
            frame,
            gas_limit,
            gas_limit,
            U256::zero(),
            frame.to,
            address,
            target.code_address,
            target.code,
            false,
            false,
            true,
            target.disable_precompiles,
            args_offset,
            args_size,
            ret_offset,
            ret_size,
        )?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// The forwarded-without-stipend amount this frame is actually charged; the
/// stipend (if any) is handed to the child for free via `gas_limit`.
fn gas_limit_without_stipend(gas_limit: u64, value_is_zero: bool) -> u64 {
    if value_is_zero {
        gas_limit
    } else {
        gas_limit.saturating_sub(CALL_POSITIVE_VALUE_STIPEND)
    }
}

/// `max(expansion_cost(args window), expansion_cost(ret window))`, which
/// equals the cost of expanding memory once to cover whichever window is
/// larger (expansion cost is monotonic in the target size).
fn call_memory_cost(
    args_offset: U256,
    args_size: usize,
    ret_offset: U256,
    ret_size: usize,
    current_memory_size: usize,
) -> Result<u64, VMError> {
    let args_cost = gas_cost::memory_expansion(args_offset, args_size, current_memory_size)?;
    let ret_cost = gas_cost::memory_expansion(ret_offset, ret_size, current_memory_size)?;
    Ok(args_cost.max(ret_cost))
}

/// Resolved CALL-family target: the address whose code actually runs (after
/// following at most one EIP-7702 delegation), that code, whether the
/// *directly addressed* account was already warm (for the opcode's own
/// EIP-2929 access cost), the code-access fee for the directly addressed
/// account (charged once per frame regardless of delegation), the extra
/// cold/warm address-access fee for a freshly touched delegation target, and
/// whether the target was reached only by following a delegation (gating
/// precompile dispatch).
struct CallTarget {
    code_address: Address,
    code: Bytes,
    is_warm: bool,
    code_access_cost: u64,
    delegation_access_cost: u64,
    disable_precompiles: bool,
}

fn resolve_call_target(db: &mut GeneralizedDatabase, substate: &mut Substate, address: Address) -> CallTarget {
    let was_warm = !substate.accessed_addresses.insert(address);
    let account = db.get_account(address);
    let code = account.info.code;

    let was_code_warm = !substate.warm_code_addresses.insert(address);
    let code_access_cost = if was_code_warm {
        0
    } else {
        gas_cost::code_access_cost(code.len()).unwrap_or(0)
    };

    match utils::delegation_target(&code) {
        Some(delegate) => {
            let was_delegate_warm = !substate.accessed_addresses.insert(delegate);
            let delegation_access_cost = gas_cost::address_access_cost(
                !was_delegate_warm,
                crate::constants::GAS_COLD_ACCOUNT_ACCESS,
                crate::constants::GAS_WARM_ACCESS,
            );
            let delegated_account = db.get_account(delegate);
            CallTarget {
                code_address: delegate,
                code: delegated_account.info.code,
                is_warm: was_warm,
                code_access_cost,
                delegation_access_cost,
                disable_precompiles: true,
            }
        }
        None => CallTarget {
            code_address: address,
            code,
            is_warm: was_warm,
            code_access_cost,
            delegation_access_cost: 0,
            disable_precompiles: false,
        },
    }
}
