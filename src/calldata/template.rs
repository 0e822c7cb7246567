//! Calldata templates and address injection
//!
//! A template is the hex calldata of a bridge call with the account address
//! replaced by a `{address}` placeholder:
//!
//! ```text
//! 0x | selector (4) | words ... | 000..0 {address} | words ... | amount (32)
//! ```
//!
//! The bytes on both sides of the placeholder are fixed. Only the 20 address
//! bytes change from one account to the next.

use crate::error::{BridgeError, BridgeResult};

use ethers::types::{Address, Bytes, U256};

/// Placeholder token marking the address segment
pub const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Byte length of an account address
pub const ADDRESS_LEN: usize = 20;

const SELECTOR_LEN: usize = 4;
const WORD_LEN: usize = 32;

/// Parsed calldata template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalldataTemplate {
    /// Fixed bytes before the address (selector included)
    prefix: Vec<u8>,
    /// Fixed bytes after the address
    suffix: Vec<u8>,
}

impl CalldataTemplate {
    /// Parse a `0x`-prefixed hex template holding exactly one placeholder
    pub fn parse(input: &str) -> BridgeResult<Self> {
        let input = input.trim();
        let body = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);

        let mut parts = body.split(ADDRESS_PLACEHOLDER);
        let (prefix_hex, suffix_hex) = match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => (prefix, suffix),
            (_, None, _) => {
                return Err(BridgeError::Template(format!(
                    "template has no {} placeholder",
                    ADDRESS_PLACEHOLDER
                )))
            }
            _ => {
                return Err(BridgeError::Template(format!(
                    "template has more than one {} placeholder",
                    ADDRESS_PLACEHOLDER
                )))
            }
        };

        let prefix = decode_segment(prefix_hex, "before")?;
        let suffix = decode_segment(suffix_hex, "after")?;

        if prefix.len() < SELECTOR_LEN {
            return Err(BridgeError::Template(format!(
                "template needs a {}-byte selector before the address, found {} bytes",
                SELECTOR_LEN,
                prefix.len()
            )));
        }

        Ok(Self { prefix, suffix })
    }

    /// 4-byte method selector
    pub fn selector(&self) -> [u8; SELECTOR_LEN] {
        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(&self.prefix[..SELECTOR_LEN]);
        selector
    }

    /// Byte offset of the address inside encoded calldata
    pub fn address_offset(&self) -> usize {
        self.prefix.len()
    }

    /// Length of calldata produced from this template
    pub fn encoded_len(&self) -> usize {
        self.prefix.len() + ADDRESS_LEN + self.suffix.len()
    }

    /// Last 32-byte word of the template, where the bridge call carries the amount
    pub fn trailing_word(&self) -> Option<U256> {
        if self.suffix.len() < WORD_LEN {
            return None;
        }
        Some(U256::from_big_endian(
            &self.suffix[self.suffix.len() - WORD_LEN..],
        ))
    }

    /// Offset in encoded calldata of the single occurrence of `needle`.
    ///
    /// Only the fixed bytes are searched, so a match never depends on the
    /// account address.
    pub fn find_unique(&self, needle: &[u8]) -> BridgeResult<usize> {
        if needle.is_empty() {
            return Err(BridgeError::Template("empty search pattern".to_string()));
        }

        let suffix_base = self.prefix.len() + ADDRESS_LEN;
        let matches: Vec<usize> = occurrences(&self.prefix, needle)
            .chain(occurrences(&self.suffix, needle).map(|i| suffix_base + i))
            .collect();

        match matches.as_slice() {
            [offset] => Ok(*offset),
            [] => Err(BridgeError::Template(format!(
                "tag 0x{} not found in template",
                hex::encode(needle)
            ))),
            _ => Err(BridgeError::Template(format!(
                "tag 0x{} occurs {} times in template, expected exactly once",
                hex::encode(needle),
                matches.len()
            ))),
        }
    }
}

fn decode_segment(segment: &str, side: &str) -> BridgeResult<Vec<u8>> {
    hex::decode(segment).map_err(|e| {
        BridgeError::Template(format!(
            "invalid hex {} the address placeholder: {}",
            side, e
        ))
    })
}

fn occurrences<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(move |(_, window)| *window == needle)
        .map(|(i, _)| i)
}

/// Injects an account address into a calldata template
pub struct AddressCodec;

impl AddressCodec {
    /// Resolve the placeholder with `address_hex` (40 hex chars, no `0x`)
    pub fn encode(template: &CalldataTemplate, address_hex: &str) -> BridgeResult<Bytes> {
        if address_hex.len() != ADDRESS_LEN * 2 {
            return Err(BridgeError::Template(format!(
                "address must be {} hex characters without prefix, got {:?}",
                ADDRESS_LEN * 2,
                address_hex
            )));
        }

        let address = hex::decode(address_hex).map_err(|e| {
            BridgeError::Template(format!("invalid address hex {:?}: {}", address_hex, e))
        })?;

        let mut data = Vec::with_capacity(template.encoded_len());
        data.extend_from_slice(&template.prefix);
        data.extend_from_slice(&address);
        data.extend_from_slice(&template.suffix);

        Ok(Bytes::from(data))
    }

    /// Lowercase hex form of an address, as `encode` expects it
    pub fn address_hex(address: &Address) -> String {
        hex::encode(address.as_bytes())
    }
}
