//! Calldata module - turns bridge call templates into per-account calldata
//!
//! This module provides:
//! - Template parsing and address injection
//! - Per-leg call variants with load-time tag validation

pub mod builder;
pub mod template;

pub use builder::CalldataBuilder;
pub use template::AddressCodec;

#[cfg(test)]
pub(crate) mod fixtures {
    /// OP Sepolia -> Unichain Sepolia, 1 ETH
    pub(crate) const OP_TEMPLATE: &str = "0x56591d59756e6974000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000{address}0000000000000000000000000000000000000000000000000de0a4e796a5670c000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000de0b6b3a7640000";

    /// Unichain Sepolia -> OP Sepolia, 1 ETH
    pub(crate) const UNI_TEMPLATE: &str = "0x56591d596f707374000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000{address}0000000000000000000000000000000000000000000000000de0a4eff22975f6000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000de0b6b3a7640000";
}
