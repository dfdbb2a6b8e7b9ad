//! Opcodes 0xa0-0xa4: LOG0-LOG4.

use bytes::Bytes;

use crate::call_frame::CallFrame;
use crate::environment::Log;
use crate::errors::{ExceptionalHalt, OpcodeResult, VMError};
use crate::gas_cost;
use crate::memory;
use crate::utils;
use crate::vm::VM;

impl VM {
    pub fn op_log(&mut self, frame: &mut CallFrame, topic_count: u8) -> Result<OpcodeResult, VMError> {
        if frame.is_static {
            return Err(ExceptionalHalt::OpcodeNotAllowedInStaticContext.into());
        }

        let offset = frame.stack.pop()?;
        let size = utils::u256_to_usize(frame.stack.pop()?)?;

        let mut topics = Vec::with_capacity(usize::from(topic_count));
        for _ in 0..topic_count {
            topics.push(utils::u256_to_h256(frame.stack.pop()?));
        }

        let cost = gas_cost::log(size, u64::from(topic_count), offset, frame.memory.len())?;
        frame.increase_consumed_gas(cost)?;

        let data = memory::load_range(&mut frame.memory, offset, size)?;
        frame.logs.push(Log {
            address: frame.to,
            topics,
            data: Bytes::from(data),
        });

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
