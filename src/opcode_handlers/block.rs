//! Opcodes 0x40-0x4a: BLOCKHASH, COINBASE, TIMESTAMP, NUMBER, PREVRANDAO,
//! GASLIMIT, CHAINID, SELFBALANCE, BASEFEE, BLOBHASH, BLOBBASEFEE.

use ethereum_types::U256;

use crate::call_frame::CallFrame;
use crate::constants::{GAS_BASE, GAS_BLOCKHASH, GAS_FAST_STEP, GAS_VERY_LOW};
use crate::errors::{OpcodeResult, VMError};
use crate::gas_cost;
use crate::utils;
use crate::vm::VM;

impl VM {
    pub fn op_blockhash(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BLOCKHASH)?;
        let number = frame.stack.pop()?;
        let hash = u64::try_from(number)
            .ok()
            .and_then(|n| self.block.block_hash(n));
        match hash {
            Some(hash) => frame.stack.push(U256::from_big_endian(hash.as_bytes()))?,
            None => frame.stack.push(U256::zero())?,
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_coinbase(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(utils::address_to_word(self.block.coinbase))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_timestamp(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(self.block.timestamp)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_number(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::from(self.block.number))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_prevrandao(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        let randao = self.block.prev_randao.unwrap_or_default();
        frame.stack.push(U256::from_big_endian(randao.as_bytes()))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_gaslimit(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::from(self.block.gas_limit))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_chainid(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(U256::from(self.block.chain_id))?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_selfbalance(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_FAST_STEP)?;
        let balance = self.db.get_account(frame.to).info.balance;
        frame.stack.push(balance)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_basefee(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        frame.stack.push(self.block.base_fee_per_gas)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_blobhash(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_VERY_LOW)?;
        let index = frame.stack.pop()?;
        let hash = usize::try_from(index)
            .ok()
            .and_then(|i| self.tx.blob_versioned_hashes.get(i));
        match hash {
            Some(hash) => frame.stack.push(U256::from_big_endian(hash.as_bytes()))?,
            None => frame.stack.push(U256::zero())?,
        }
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }

    pub fn op_blobbasefee(&mut self, frame: &mut CallFrame) -> Result<OpcodeResult, VMError> {
        frame.increase_consumed_gas(GAS_BASE)?;
        let excess_blob_gas = self.block.excess_blob_gas.unwrap_or(0);
        let fee = gas_cost::blob_base_fee(excess_blob_gas);
        frame.stack.push(fee)?;
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
