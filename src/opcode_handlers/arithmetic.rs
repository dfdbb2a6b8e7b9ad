//! Opcodes 0x01-0x0b: ADD, MUL, SUB, DIV, SDIV, MOD, SMOD, ADDMOD, MULMOD, EXP, SIGNEXTEND.

use ethereum_types::U256;

use crate::call_frame::CallFrame;
use crate::constants::{GAS_LOW, GAS_MID, GAS_VERY_LOW};
use crate::errors::{InternalError, OpcodeResult, VMError};
use crate::gas_cost;
use crate::vm::VM;

impl VM {
    pub fn op_add(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let augend = frame.stack.pop()?;
        let addend = frame.stack.pop()?;
        frame.stack.push(augend.overflowing_add(addend).0)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_sub(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let minuend = frame.stack.pop()?;
        let subtrahend = frame.stack.pop()?;
        frame.stack.push(minuend.overflowing_sub(subtrahend).0)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_mul(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_LOW)?;
        let multiplicand = frame.stack.pop()?;
        let multiplier = frame.stack.pop()?;
        frame.stack.push(multiplicand.overflowing_mul(multiplier).0)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_div(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_LOW)?;
        let dividend = frame.stack.pop()?;
        let divisor = frame.stack.pop()?;
        frame.stack.push(dividend.checked_div(divisor).unwrap_or_default())?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_sdiv(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_LOW)?;
        let dividend = frame.stack.pop()?;
        let divisor = frame.stack.pop()?;
        if divisor.is_zero() || dividend.is_zero() {
            frame.stack.push(U256::zero())?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }
        let negative_result = is_negative(dividend) != is_negative(divisor);
        let quotient = abs(dividend).checked_div(abs(divisor)).unwrap_or_default();
        let result = if negative_result { negate(quotient) } else { quotient };
        frame.stack.push(result)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_mod(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_LOW)?;
        let dividend = frame.stack.pop()?;
        let divisor = frame.stack.pop()?;
        frame.stack.push(dividend.checked_rem(divisor).unwrap_or_default())?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_smod(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_LOW)?;
        let dividend = frame.stack.pop()?;
        let divisor = frame.stack.pop()?;
        if divisor.is_zero() || dividend.is_zero() {
            frame.stack.push(U256::zero())?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }
        let remainder = abs(dividend).checked_rem(abs(divisor)).unwrap_or_default();
        let result = if is_negative(dividend) { negate(remainder) } else { remainder };
        frame.stack.push(result)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_addmod(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_MID)?;
        let augend = frame.stack.pop()?;
        let addend = frame.stack.pop()?;
        let modulus = frame.stack.pop()?;
        if modulus.is_zero() {
            frame.stack.push(U256::zero())?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }
        let a = augend.checked_rem(modulus).unwrap_or_default();
        let b = addend.checked_rem(modulus).unwrap_or_default();
        let sum = a.overflowing_add(b).0;
        frame.stack.push(sum.checked_rem(modulus).unwrap_or_default())?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_mulmod(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_MID)?;
        let multiplicand = frame.stack.pop()?;
        let multiplier = frame.stack.pop()?;
        let modulus = frame.stack.pop()?;
        if modulus.is_zero() {
            frame.stack.push(U256::zero())?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }
        let a = multiplicand.checked_rem(modulus).unwrap_or_default();
        let b = multiplier.checked_rem(modulus).unwrap_or_default();
        let product = a.overflowing_mul(b).0;
        frame.stack.push(product.checked_rem(modulus).unwrap_or_default())?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_exp(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let base = frame.stack.pop()?;
        let exponent = frame.stack.pop()?;
        let cost = gas_cost::exp(exponent, self.block.fork)?;
        frame.increase_consumed_gas(cost)?;
        frame.stack.push(base.overflowing_pow(exponent).0)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_signextend(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_LOW)?;
        let byte_size = frame.stack.pop()?;
        let value = frame.stack.pop()?;
        if byte_size >= U256::from(31) {
            frame.stack.push(value)?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }
        let sign_bit_index = byte_size
            .checked_mul(U256::from(8))
            .and_then(|bits| bits.checked_add(U256::from(7)))
            .ok_or(InternalError::ArithmeticOperationOverflow)?
            .as_usize();

        if !value.bit(sign_bit_index) {
            frame.stack.push(value)?;
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }

        let sign_bit_mask = (U256::one() << sign_bit_index).saturating_sub(U256::one());
        frame.stack.push(value | !sign_bit_mask)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

fn is_negative(value: U256) -> bool {
    value.bit(255)
}

fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

fn abs(value: U256) -> U256 {
    if is_negative(value) {
        negate(value)
    } else {
        value
    }
}
