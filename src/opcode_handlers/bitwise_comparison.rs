//! Opcodes 0x10-0x1d: LT, GT, SLT, SGT, EQ, ISZERO, AND, OR, XOR, NOT, BYTE, SHL, SHR, SAR.

use ethereum_types::U256;

use crate::call_frame::CallFrame;
use crate::constants::{GAS_VERY_LOW, WORD_SIZE};
use crate::errors::{OpcodeResult, VMError};
use crate::vm::VM;

impl VM {
    pub fn op_lt(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let lho = frame.stack.pop()?;
        let rho = frame.stack.pop()?;
        frame.stack.push(U256::from(u8::from(lho < rho)))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_gt(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let lho = frame.stack.pop()?;
        let rho = frame.stack.pop()?;
        frame.stack.push(U256::from(u8::from(lho > rho)))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_slt(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let lho = frame.stack.pop()?;
        let rho = frame.stack.pop()?;
        let result = signed_cmp(lho, rho).is_lt();
        frame.stack.push(U256::from(u8::from(result)))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_sgt(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let lho = frame.stack.pop()?;
        let rho = frame.stack.pop()?;
        let result = signed_cmp(lho, rho).is_gt();
        frame.stack.push(U256::from(u8::from(result)))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_eq(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let lho = frame.stack.pop()?;
        let rho = frame.stack.pop()?;
        frame.stack.push(U256::from(u8::from(lho == rho)))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_iszero(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let operand = frame.stack.pop()?;
        frame.stack.push(U256::from(u8::from(operand.is_zero())))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_and(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let a = frame.stack.pop()?;
        let b = frame.stack.pop()?;
        frame.stack.push(a & b)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_or(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let a = frame.stack.pop()?;
        let b = frame.stack.pop()?;
        frame.stack.push(a | b)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_xor(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let a = frame.stack.pop()?;
        let b = frame.stack.pop()?;
        frame.stack.push(a ^ b)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_not(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let a = frame.stack.pop()?;
        frame.stack.push(!a)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_byte(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let index = frame.stack.pop()?;
        let value = frame.stack.pop()?;
        let byte_index: usize = index.try_into().unwrap_or(usize::MAX);
        if byte_index < WORD_SIZE {
            frame
                .stack
                .push(U256::from(value.byte(WORD_SIZE.saturating_sub(1).saturating_sub(byte_index))))?;
        } else {
            frame.stack.push(U256::zero())?;
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_shl(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let shift = frame.stack.pop()?;
        let value = frame.stack.pop()?;
        if shift < U256::from(256) {
            frame.stack.push(value << shift)?;
        } else {
            frame.stack.push(U256::zero())?;
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_shr(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let shift = frame.stack.pop()?;
        let value = frame.stack.pop()?;
        if shift < U256::from(256) {
            frame.stack.push(value >> shift)?;
        } else {
            frame.stack.push(U256::zero())?;
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_sar(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let shift = frame.stack.pop()?;
        let value = frame.stack.pop()?;
        let result = if shift >= U256::from(256) {
            if value.bit(255) {
                U256::MAX
            } else {
                U256::zero()
            }
        } else {
            arithmetic_shift_right(value, shift)
        };
        frame.stack.push(result)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

fn signed_cmp(lho: U256, rho: U256) -> std::cmp::Ordering {
    let lho_negative = lho.bit(255);
    let rho_negative = rho.bit(255);
    if lho_negative == rho_negative {
        lho.cmp(&rho)
    } else if lho_negative {
        std::cmp::Ordering::Less
    } else {
        std::cmp::Ordering::Greater
    }
}

/// Sign-preserving right shift: fills vacated high bits with the sign bit.
fn arithmetic_shift_right(value: U256, shift: U256) -> U256 {
    let shift_usize: usize = shift.try_into().unwrap_or(256);
    if shift_usize == 0 {
        return value;
    }
    if value.bit(255) {
        let shifted = value >> shift_usize;
        let mask = U256::MAX << (256usize.saturating_sub(shift_usize));
        shifted | mask
    } else {
        value >> shift_usize
    }
}
