//! Opcodes 0x50-0x5e: POP, MLOAD, MSTORE, MSTORE8, SLOAD, SSTORE, JUMP,
//! JUMPI, PC, MSIZE, GAS, JUMPDEST, TLOAD, TSTORE, MCOPY.

use ethereum_types::U256;

use crate::call_frame::CallFrame;
use crate::constants::{GAS_BASE, GAS_HIGH, GAS_JUMPDEST, GAS_MID, GAS_WARM_ACCESS};
use crate::errors::{ExceptionalHalt, OpcodeResult, VMError};
use crate::gas_cost;
use crate::utils;
use crate::vm::VM;

impl VM {
    pub fn op_pop(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.pop()?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_mload(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let offset = frame.stack.pop()?;
        let cost = gas_cost::mload(offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;
        let value = frame.memory.load_word(offset)?;
        frame.stack.push(value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_mstore(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let offset = frame.stack.pop()?;
        let value = frame.stack.pop()?;
        let cost = gas_cost::mstore(offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;
        frame.memory.store_word(offset, value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_mstore8(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let offset = frame.stack.pop()?;
        let value = frame.stack.pop()?;
        let cost = gas_cost::mstore8(offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;
        frame.memory.store_byte(offset, value.byte(0))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_sload(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let key = utils::u256_to_h256(frame.stack.pop()?);
        let was_warm = !self.substate.accessed_storage_keys.insert((frame.to, key));
        frame.increase_consumed_gas(gas_cost::sload(!was_warm))?;
        let value = self.db.get_storage(frame.to, key);
        frame.stack.push(utils::h256_to_u256(value))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_sstore(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        if frame.is_static {
            return Err(ExceptionalHalt::OpcodeNotAllowedInStaticContext.into());
        }
        let key = utils::u256_to_h256(frame.stack.pop()?);
        let new_value = utils::u256_to_h256(frame.stack.pop()?);

        let was_warm = !self.substate.accessed_storage_keys.insert((frame.to, key));
        let current_value = self.db.get_storage(frame.to, key);
        let original_value = self.db.store.account_storage(frame.to, key);

        let (cost, refund_delta) =
            gas_cost::sstore(current_value, new_value, original_value, !was_warm, frame.gas_remaining())?;
        frame.increase_consumed_gas(cost)?;
        self.substate.refund_counter = self.substate.refund_counter.saturating_add(refund_delta);
        self.db.set_storage(frame.to, key, new_value);

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_jump(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_MID)?;
        let destination = utils::u256_to_usize(frame.stack.pop()?)?;
        if !frame.is_valid_jump_destination(destination) {
            return Err(ExceptionalHalt::InvalidJump.into());
        }
        frame.pc = destination;
        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_jumpi(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_HIGH)?;
        let destination = utils::u256_to_usize(frame.stack.pop()?)?;
        let condition = frame.stack.pop()?;
        if condition.is_zero() {
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }
        if !frame.is_valid_jump_destination(destination) {
            return Err(ExceptionalHalt::InvalidJump.into());
        }
        frame.pc = destination;
        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }

    pub fn op_pc(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::from(frame.pc))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_msize(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::from(frame.memory.len()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_gas(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::from(frame.gas_remaining()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_jumpdest(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_JUMPDEST)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_tload(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_WARM_ACCESS)?;
        let key = utils::u256_to_h256(frame.stack.pop()?);
        let value = self
            .substate
            .transient_storage
            .get(&(frame.to, key))
            .copied()
            .unwrap_or_default();
        frame.stack.push(value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_tstore(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        if frame.is_static {
            return Err(ExceptionalHalt::OpcodeNotAllowedInStaticContext.into());
        }
        frame.increase_consumed_gas(GAS_WARM_ACCESS)?;
        let key = utils::u256_to_h256(frame.stack.pop()?);
        let value = frame.stack.pop()?;
        self.substate.transient_storage.insert((frame.to, key), value);
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_mcopy(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let dest_offset = frame.stack.pop()?;
        let src_offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;

        let cost = gas_cost::mcopy(size, dest_offset, src_offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;

        frame.memory.copy_within(dest_offset, src_offset, size)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
