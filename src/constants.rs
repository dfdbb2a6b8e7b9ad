//! Gas and size constants for the Osaka/Prague revision.

pub const WORD_SIZE: usize = 32;
pub const WORD_SIZE_IN_BYTES_U64: u64 = 32;

pub const STACK_DEPTH_LIMIT: usize = 1024;
pub const STACK_LIMIT: usize = 1024;

pub const MAX_CODE_SIZE: usize = 0x6000; // 24576, EIP-170
pub const MAX_INIT_CODE_SIZE: usize = 2 * MAX_CODE_SIZE; // 49152, EIP-3860

pub const GAS_CODE_DEPOSIT: u64 = 200;
pub const GAS_BASE: u64 = 2;
pub const GAS_VERY_LOW: u64 = 3;
pub const GAS_LOW: u64 = 5;
pub const GAS_FAST_STEP: u64 = 5;
pub const GAS_MID: u64 = 8;
pub const GAS_HIGH: u64 = 10;
pub const GAS_JUMPDEST: u64 = 1;
pub const GAS_BLOCKHASH: u64 = 20;

pub const GAS_CALL_VALUE: u64 = 9000;
pub const GAS_NEW_ACCOUNT: u64 = 25000;
pub const GAS_CALL_STIPEND: u64 = 2300;

pub const GAS_CREATE: u64 = 32000;
pub const CREATE_BASE_COST: u64 = GAS_CREATE;
pub const INIT_CODE_WORD_COST: u64 = 2;

pub const GAS_SELF_DESTRUCT: u64 = 5000;
pub const SELFDESTRUCT_STATIC: u64 = GAS_SELF_DESTRUCT;
pub const GAS_SELF_DESTRUCT_NEW_ACCOUNT: u64 = 25000;
pub const SELFDESTRUCT_DYNAMIC: u64 = GAS_SELF_DESTRUCT_NEW_ACCOUNT;
/// Pre-London SELFDESTRUCT refund (EIP-3529 removed this).
pub const SELFDESTRUCT_REFUND: u64 = 24000;

pub const GAS_WARM_ACCESS: u64 = 100;
pub const GAS_COLD_ACCOUNT_ACCESS: u64 = 2600;
pub const GAS_COLD_SLOAD: u64 = 2100;
pub const GAS_WARM_SLOAD: u64 = GAS_WARM_ACCESS;
pub const COLD_ADDRESS_ACCESS_COST: u64 = GAS_COLD_ACCOUNT_ACCESS;

pub const BALANCE_COLD_DYNAMIC: u64 = GAS_COLD_ACCOUNT_ACCESS;
pub const BALANCE_WARM_DYNAMIC: u64 = GAS_WARM_ACCESS;
pub const EXTCODESIZE_COLD_DYNAMIC: u64 = GAS_COLD_ACCOUNT_ACCESS;
pub const EXTCODESIZE_WARM_DYNAMIC: u64 = GAS_WARM_ACCESS;
pub const EXTCODEHASH_COLD_DYNAMIC: u64 = GAS_COLD_ACCOUNT_ACCESS;
pub const EXTCODEHASH_WARM_DYNAMIC: u64 = GAS_WARM_ACCESS;
pub const EXTCODECOPY_COLD_DYNAMIC: u64 = GAS_COLD_ACCOUNT_ACCESS;
pub const EXTCODECOPY_WARM_DYNAMIC: u64 = GAS_WARM_ACCESS;
pub const EXTCODECOPY_DYNAMIC_BASE: u64 = 3;

pub const CALL_COLD_DYNAMIC: u64 = GAS_COLD_ACCOUNT_ACCESS;
pub const CALL_WARM_DYNAMIC: u64 = GAS_WARM_ACCESS;
pub const CALL_POSITIVE_VALUE: u64 = GAS_CALL_VALUE;
pub const CALL_TO_EMPTY_ACCOUNT: u64 = GAS_NEW_ACCOUNT;
pub const CALL_POSITIVE_VALUE_STIPEND: u64 = GAS_CALL_STIPEND;
pub const CALLCODE_POSITIVE_VALUE: u64 = GAS_CALL_VALUE;
pub const CALLCODE_POSITIVE_VALUE_STIPEND: u64 = GAS_CALL_STIPEND;
pub const DELEGATECALL_COLD_DYNAMIC: u64 = GAS_COLD_ACCOUNT_ACCESS;
pub const DELEGATECALL_WARM_DYNAMIC: u64 = GAS_WARM_ACCESS;
pub const STATICCALL_COLD_DYNAMIC: u64 = GAS_COLD_ACCOUNT_ACCESS;
pub const STATICCALL_WARM_DYNAMIC: u64 = GAS_WARM_ACCESS;

pub const CALLDATACOPY_DYNAMIC_BASE: u64 = 3;
pub const CODECOPY_DYNAMIC_BASE: u64 = 3;
pub const RETURNDATACOPY_DYNAMIC_BASE: u64 = 3;
pub const KECCAK25_DYNAMIC_BASE: u64 = 6;
pub const MCOPY_DYNAMIC_BASE: u64 = 3;

pub const LOGN_DYNAMIC_BASE: u64 = 375;
pub const LOGN_DYNAMIC_BYTE_BASE: u64 = 8;

pub const SSTORE_DEFAULT_DYNAMIC: u64 = 100;
pub const SSTORE_STORAGE_CREATION: u64 = 20000;
pub const SSTORE_STORAGE_MODIFICATION: u64 = 2900;
pub const SSTORE_COLD_DYNAMIC: u64 = GAS_COLD_SLOAD;
pub const SSTORE_STIPEND: u64 = 2300;

pub const EXP_DYNAMIC_BASE: u64 = 50;

pub const CODE_ACCESS_COST_WORD: u64 = 2;

pub const CALLDATA_COST_ZERO_BYTE: u64 = 4;
pub const CALLDATA_COST_NON_ZERO_BYTE: u64 = 16;

pub const SHA2_256_STATIC_COST: u64 = 60;
pub const SHA2_256_DYNAMIC_BASE: u64 = 12;
pub const RIPEMD_160_STATIC_COST: u64 = 600;
pub const RIPEMD_160_DYNAMIC_BASE: u64 = 120;
pub const IDENTITY_STATIC_COST: u64 = 15;
pub const IDENTITY_DYNAMIC_BASE: u64 = 3;
pub const ECRECOVER_COST: u64 = 3000;
pub const ECADD_COST: u64 = 150;
pub const ECMUL_COST: u64 = 6000;
pub const ECPAIRING_BASE_COST: u64 = 45000;
pub const ECPAIRING_GROUP_COST: u64 = 34000;
pub const BLAKE2F_ROUND_COST: u64 = 1;
pub const POINT_EVALUATION_COST: u64 = 50000;

pub const MODEXP_STATIC_COST: u64 = 200;
pub const MODEXP_STATIC_COST_OSAKA: u64 = 500;
pub const MODEXP_DYNAMIC_QUOTIENT: u64 = 3;
pub const MODEXP_DYNAMIC_QUOTIENT_OSAKA: u64 = 1;
pub const MODEXP_EXPONENT_FACTOR: u64 = 8;
pub const MODEXP_EXPONENT_FACTOR_OSAKA: u64 = 16;

pub const BLS12_381_MSM_MULTIPLIER: u64 = 1000;
pub const BLS12_PAIRING_CHECK_MUL_COST: u64 = 32600;
pub const BLS12_PAIRING_CHECK_FIXED_COST: u64 = 37700;

/// EIP-7702 delegation designator: 0xEF0100 || address(20).
pub const SET_CODE_DELEGATION_PREFIX: [u8; 3] = [0xef, 0x01, 0x00];
pub const SET_CODE_DELEGATION_LEN: usize = 23;
/// Per-empty-account-refresh cost used to compute the EIP-7702 refund.
pub const PER_EMPTY_ACCOUNT_COST: u64 = 25000;
pub const PER_AUTH_BASE_COST: u64 = 2500;

/// EIP-4844 blob constants.
pub const MIN_BLOB_BASE_FEE: u64 = 1;
pub const BLOB_BASE_FEE_UPDATE_FRACTION: u64 = 3_338_477;

/// Stack values pushed by CALL-family / CREATE-family helpers on failure/success.
pub const SUCCESS_FOR_CALL: u8 = 1;
pub const REVERT_FOR_CALL: u8 = 0;
pub const CREATE_DEPLOYMENT_FAIL: u8 = 0;

pub const EMPTY_CODE_HASH_STR: &str =
    "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470";
