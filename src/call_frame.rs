use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::constants::STACK_LIMIT;
use crate::environment::Log;
use crate::errors::{ExceptionalHalt, VMError};
use crate::memory::Memory;

/// The EVM operand stack: at most 1024 256-bit words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    pub fn push(&mut self, value: impl Into<U256>) -> Result<(), VMError> {
        if self.data.len() >= STACK_LIMIT {
            return Err(ExceptionalHalt::StackOverflow.into());
        }
        self.data.push(value.into());
        Ok(())
    }

    pub fn pop(&mut self) -> Result<U256, VMError> {
        self.data.pop().ok_or(ExceptionalHalt::StackUnderflow.into())
    }

    pub fn peek(&self) -> Result<U256, VMError> {
        self.data
            .last()
            .copied()
            .ok_or(ExceptionalHalt::StackUnderflow.into())
    }

    /// 1-indexed from the top, as DUPn/SWAPn address it.
    pub fn get_from_top(&self, index: usize) -> Result<U256, VMError> {
        let len = self.data.len();
        let pos = len
            .checked_sub(index)
            .ok_or(ExceptionalHalt::StackUnderflow)?;
        self.data
            .get(pos)
            .copied()
            .ok_or(ExceptionalHalt::StackUnderflow.into())
    }

    pub fn swap(&mut self, index: usize) -> Result<(), VMError> {
        let len = self.data.len();
        let pos = len
            .checked_sub(index.checked_add(1).ok_or(ExceptionalHalt::StackUnderflow)?)
            .ok_or(ExceptionalHalt::StackUnderflow)?;
        if pos >= len {
            return Err(ExceptionalHalt::StackUnderflow.into());
        }
        let top = len - 1;
        self.data.swap(top, pos);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Bottom-to-top view of the stack, for trace events.
    pub fn as_slice(&self) -> &[U256] {
        &self.data
    }
}

/// A materialized `Evm` frame together with the owning `Message` fields
/// flattened in. Stored in `VM::call_frames`.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub msg_sender: Address,
    /// The account whose context this frame executes in (`ADDRESS`).
    pub to: Address,
    /// The account whose code this frame runs (differs from `to` for
    /// CALLCODE/DELEGATECALL).
    pub code_address: Address,
    pub code: Bytes,
    pub value: U256,
    pub calldata: Bytes,
    pub is_static: bool,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub depth: usize,
    pub is_create: bool,

    pub pc: usize,
    pub stack: Stack,
    pub memory: Memory,
    pub output: Bytes,
    pub sub_return_data: Bytes,
    pub logs: Vec<Log>,
    pub valid_jump_destinations: std::collections::HashSet<usize>,
}

impl CallFrame {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        msg_sender: Address,
        to: Address,
        code_address: Address,
        code: Bytes,
        value: U256,
        calldata: Bytes,
        is_static: bool,
        gas_limit: u64,
        gas_used: u64,
        depth: usize,
        is_create: bool,
    ) -> Self {
        let valid_jump_destinations = compute_valid_jump_destinations(&code);
        Self {
            msg_sender,
            to,
            code_address,
            code,
            value,
            calldata,
            is_static,
            gas_limit,
            gas_used,
            depth,
            is_create,
            pc: 0,
            stack: Stack::default(),
            memory: Memory::default(),
            output: Bytes::new(),
            sub_return_data: Bytes::new(),
            logs: Vec::new(),
            valid_jump_destinations,
        }
    }

    pub fn gas_remaining(&self) -> u64 {
        self.gas_limit.saturating_sub(self.gas_used)
    }

    pub fn increase_consumed_gas(&mut self, gas: u64) -> Result<(), VMError> {
        let new_gas_used = self
            .gas_used
            .checked_add(gas)
            .ok_or(crate::errors::OutOfGasError::GasCostOverflow)?;
        if new_gas_used > self.gas_limit {
            return Err(crate::errors::OutOfGasError::ConsumedGasOverflow.into());
        }
        self.gas_used = new_gas_used;
        Ok(())
    }

    pub fn next_opcode(&self) -> u8 {
        self.code.get(self.pc).copied().unwrap_or(0x00)
    }

    pub fn is_valid_jump_destination(&self, pc: usize) -> bool {
        self.valid_jump_destinations.contains(&pc)
    }
}

/// Single linear scan of `code`: every `JUMPDEST` (0x5B) not inside a
/// PUSH1..PUSH32 immediate is a valid jump target.
fn compute_valid_jump_destinations(code: &[u8]) -> std::collections::HashSet<usize> {
    let mut set = std::collections::HashSet::new();
    let mut i = 0usize;
    while i < code.len() {
        let op = code[i];
        if op == 0x5b {
            set.insert(i);
            i += 1;
        } else if (0x60..=0x7f).contains(&op) {
            let push_len = (op - 0x5f) as usize;
            i = i.saturating_add(push_len).saturating_add(1);
        } else {
            i += 1;
        }
    }
    set
}
