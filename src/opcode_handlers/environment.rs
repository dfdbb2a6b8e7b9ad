//! Opcodes 0x30-0x3f: ADDRESS, BALANCE, ORIGIN, CALLER, CALLVALUE,
//! CALLDATALOAD, CALLDATASIZE, CALLDATACOPY, CODESIZE, CODECOPY, GASPRICE,
//! EXTCODESIZE, EXTCODECOPY, RETURNDATASIZE, RETURNDATACOPY, EXTCODEHASH.

use std::str::FromStr;

use ethereum_types::{H256, U256};
use sha3::{Digest, Keccak256};

use crate::call_frame::CallFrame;
use crate::constants::{EMPTY_CODE_HASH_STR, GAS_BASE};
use crate::errors::{ExceptionalHalt, OpcodeResult, VMError};
use crate::gas_cost;
use crate::memory;
use crate::utils;
use crate::vm::VM;

impl VM {
    pub fn op_address(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(utils::address_to_word(frame.to))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_balance(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let address = utils::word_to_address(frame.stack.pop()?);
        let (account, was_warm) = utils::access_account(&mut self.db, &mut self.substate, address);
        frame.increase_consumed_gas(gas_cost::balance(!was_warm))?;
        frame.stack.push(account.info.balance)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_origin(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(utils::address_to_word(self.tx.origin))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_caller(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(utils::address_to_word(frame.msg_sender))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_callvalue(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(frame.value)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_calldataload(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        let offset = utils::u256_to_usize(frame.stack.pop()?).unwrap_or(usize::MAX);
        let mut word = [0u8; 32];
        for (i, byte) in word.iter_mut().enumerate() {
            if let Some(&b) = offset
                .checked_add(i)
                .and_then(|index| frame.calldata.get(index))
            {
                *byte = b;
            }
        }
        frame.stack.push(U256::from_big_endian(&word))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_calldatasize(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::from(frame.calldata.len()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_calldatacopy(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let dest_offset = frame.stack.pop()?;
        let src_offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;

        let cost = gas_cost::calldatacopy(size, dest_offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;

        let src_offset = utils::u256_to_usize(src_offset).unwrap_or(usize::MAX);
        let data: Vec<u8> = (0..size)
            .map(|i| {
                src_offset
                    .checked_add(i)
                    .and_then(|index| frame.calldata.get(index))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        memory::try_store_range(&mut frame.memory, dest_offset, size, &data)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_codesize(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::from(frame.code.len()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_codecopy(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let dest_offset = frame.stack.pop()?;
        let src_offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;

        let cost = gas_cost::codecopy(size, dest_offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;

        let src_offset = utils::u256_to_usize(src_offset).unwrap_or(usize::MAX);
        let code = frame.code.clone();
        let data: Vec<u8> = (0..size)
            .map(|i| {
                src_offset
                    .checked_add(i)
                    .and_then(|index| code.get(index))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        memory::try_store_range(&mut frame.memory, dest_offset, size, &data)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_gasprice(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(self.tx.gas_price)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_extcodesize(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let address = utils::word_to_address(frame.stack.pop()?);
        let (account, was_warm) = utils::access_account(&mut self.db, &mut self.substate, address);
        frame.increase_consumed_gas(gas_cost::extcodesize(!was_warm))?;
        frame.stack.push(U256::from(account.info.code.len()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_extcodecopy(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let address = utils::word_to_address(frame.stack.pop()?);
        let dest_offset = frame.stack.pop()?;
        let src_offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;

        let (_, was_warm) = utils::access_account(&mut self.db, &mut self.substate, address);
        let cost = gas_cost::extcodecopy(size, dest_offset, frame.memory.len(), !was_warm)?;
        frame.increase_consumed_gas(cost)?;

        let code = self.db.get_account(address).info.code;
        let src_offset = utils::u256_to_usize(src_offset).unwrap_or(usize::MAX);
        let data: Vec<u8> = (0..size)
            .map(|i| {
                src_offset
                    .checked_add(i)
                    .and_then(|index| code.get(index))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        memory::try_store_range(&mut frame.memory, dest_offset, size, &data)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_returndatasize(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::from(frame.sub_return_data.len()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_returndatacopy(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let dest_offset = frame.stack.pop()?;
        let src_offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;

        let src_offset_usize = utils::u256_to_usize(src_offset)?;
        let end = src_offset_usize
            .checked_add(size)
            .ok_or(ExceptionalHalt::VeryLargeNumber)?;
        if end > frame.sub_return_data.len() {
            return Err(ExceptionalHalt::OutOfBoundsRead.into());
        }

        let cost = gas_cost::returndatacopy(size, dest_offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;

        #[allow(clippy::indexing_slicing)]
        let data = frame.sub_return_data[src_offset_usize..end].to_vec();
        memory::try_store_range(&mut frame.memory, dest_offset, size, &data)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_extcodehash(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        let address = utils::word_to_address(frame.stack.pop()?);
        let (account, was_warm) = utils::access_account(&mut self.db, &mut self.substate, address);
        frame.increase_consumed_gas(gas_cost::extcodehash(!was_warm))?;

        if account.info.is_empty() {
            frame.stack.push(U256::zero())?;
        } else if account.info.code.is_empty() {
            let empty_hash = H256::from_str(EMPTY_CODE_HASH_STR).map_err(|_| {
                crate::errors::InternalError::Custom("malformed empty code hash constant".into())
            })?;
            frame.stack.push(U256::from_big_endian(empty_hash.as_bytes()))?;
        } else {
            let hash = Keccak256::digest(&account.info.code);
            frame.stack.push(U256::from_big_endian(&hash))?;
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
