//! Execution tracing. Distinct from the ambient `tracing` crate logs: a
//! `TraceSink` receives structured per-opcode events a debugger or EVM
//! tracer (e.g. a `debug_traceTransaction`-style consumer) would want,
//! while `tracing` logs are for operators watching the engine run.

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::errors::VMError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    OpStart {
        pc: usize,
        opcode: u8,
        depth: usize,
        gas_remaining: u64,
        stack: Vec<U256>,
    },
    OpEnd {
        pc: usize,
        gas_used: u64,
    },
    OpException {
        pc: usize,
        error: VMError,
    },
    PrecompileStart {
        address: Address,
        gas_limit: u64,
    },
    PrecompileEnd {
        output: Bytes,
        gas_used: u64,
    },
    EvmStop {
        depth: usize,
    },
    TransactionEnd {
        gas_used: u64,
        success: bool,
    },
}

/// Sink for [`TraceEvent`]s. The default no-op impl keeps tracing out of
/// the hot path when nobody is listening.
pub trait TraceSink {
    fn record(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn record(&mut self, _event: TraceEvent) {}
}

/// Collects every event in order, for tests and offline inspection.
#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl TraceSink for VecTraceSink {
    fn record(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}
