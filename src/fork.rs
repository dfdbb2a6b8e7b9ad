/// Protocol revision gating which EIPs are active.
///
/// Ordered: comparisons (`fork >= Fork::Shanghai`) are how gas costs and
/// opcode availability branch on hardfork throughout this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Fork {
    Frontier,
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    Cancun,
    Prague,
    #[default]
    Osaka,
}

impl Fork {
    pub const LATEST: Fork = Fork::Osaka;
}
