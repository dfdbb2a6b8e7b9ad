use bytes::Bytes;
use thiserror::Error;

/// Errors that halt execution of the current frame, consuming all its
/// remaining gas and reverting its state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExceptionalHalt {
    #[error("out of gas")]
    OutOfGas(OutOfGasError),
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("invalid opcode")]
    InvalidOpcode,
    #[error("invalid jump destination")]
    InvalidJump,
    #[error("attempted read out of bounds")]
    OutOfBoundsRead,
    #[error("opcode not allowed in static context")]
    OpcodeNotAllowedInStaticContext,
    #[error("contract code may not begin with 0xef (EIP-3541)")]
    InvalidContractPrefix,
    #[error("call depth exceeded stack depth limit")]
    StackDepthLimitError,
    #[error("value too large to fit the required integer width")]
    VeryLargeNumber,
    #[error("address already occupied")]
    AddressAlreadyOccupied,
    #[error("balance overflowed")]
    BalanceOverflow,
    #[error("balance underflowed")]
    BalanceUnderflow,
    #[error("init code exceeds the max init code size (EIP-3860)")]
    InitcodeSizeExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutOfGasError {
    #[error("not enough gas to pay for the operation")]
    ConsumedGasOverflow,
    #[error("max gas limit exceeded")]
    MaxGasLimitExceeded,
    #[error("arithmetic overflow while accounting for gas")]
    GasCostOverflow,
}

impl From<OutOfGasError> for ExceptionalHalt {
    fn from(value: OutOfGasError) -> Self {
        ExceptionalHalt::OutOfGas(value)
    }
}

impl From<OutOfGasError> for VMError {
    fn from(value: OutOfGasError) -> Self {
        VMError::ExceptionalHalt(ExceptionalHalt::OutOfGas(value))
    }
}

/// Transaction-level validation failures, checked once before the first frame runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxValidationError {
    #[error("sender account does not exist")]
    SenderAccountDoesNotExist,
    #[error("sender account should not have bytecode")]
    SenderAccountShouldNotHaveBytecode,
    #[error("sender balance does not cover the transferred value")]
    SenderBalanceShouldContainTransferValue,
    #[error("gas price is lower than the block's base fee")]
    GasPriceIsLowerThanBaseFee,
    #[error("priority fee is greater than the max fee per gas")]
    PriorityGreaterThanMaxFeePerGas,
    #[error("nonce mismatch")]
    NonceMismatch,
    #[error("initial gas is lower than the intrinsic gas cost")]
    IntrinsicGasTooLow,
    #[error("gas limit exceeds the block's gas limit")]
    GasLimitIsTooHigh,
    #[error("insufficient account funds for max gas fee")]
    InsufficientAccountFunds,
    #[error("init code exceeds the max init code size")]
    InitCodeTooBig,
    #[error("invalid EIP-7702 authorization")]
    InvalidAuthorization,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrecompileError {
    #[error("could not parse precompile input")]
    ParsingInputError,
    #[error("precompile not implemented")]
    NotImplemented,
    #[error("invalid EC point")]
    InvalidEcPoint,
    #[error("invalid BLS12-381 point")]
    InvalidBLS12381Point,
    #[error("default precompile error")]
    DefaultError,
}

/// Internal invariant violations — indicate a bug in the engine, not a
/// condition a contract triggered. Never silently swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("arithmetic operation overflowed")]
    ArithmeticOperationOverflow,
    #[error("arithmetic operation underflowed")]
    Underflow,
    #[error("arithmetic operation overflowed")]
    Overflow,
    #[error("gas accounting overflowed")]
    GasOverflow,
    #[error("could not pop a call frame off an empty stack")]
    CouldNotPopCallframe,
    #[error("could not access backup entry")]
    CouldNotAccessBackup,
    #[error("type conversion failed")]
    TypeConversion,
    #[error("slice indexing failed")]
    Slicing,
    #[error("account not found")]
    AccountNotFound,
    #[error("invalid fork for this operation")]
    InvalidFork,
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    #[error(transparent)]
    ExceptionalHalt(#[from] ExceptionalHalt),
    #[error("execution reverted")]
    RevertOpcode(Bytes),
    #[error(transparent)]
    TxValidation(#[from] TxValidationError),
    #[error(transparent)]
    Precompile(#[from] PrecompileError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl VMError {
    /// True for conditions that consume all remaining gas and wipe output,
    /// as opposed to `RevertOpcode`, which preserves both.
    pub fn is_exceptional_halt(&self) -> bool {
        matches!(self, VMError::ExceptionalHalt(_))
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, VMError::RevertOpcode(_))
    }
}

/// The tagged result a handler returns: either it advances pc and the loop
/// continues, or the frame halts (STOP/RETURN/SELFDESTRUCT).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpcodeResult {
    Continue { pc_increment: usize },
    Halt,
}

/// Outcome of running a whole frame to completion (success, revert, or halt).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxResult {
    Success,
    Revert(VMError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub result: TxResult,
    pub gas_used: u64,
    pub gas_refunded: u64,
    pub output: Bytes,
    pub logs: Vec<crate::environment::Log>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        matches!(self.result, TxResult::Success)
    }
}
