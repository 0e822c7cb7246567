//! Per-leg calldata derivation
//!
//! Each leg sends one of two call variants:
//! - `Template`: the template with the account address injected
//! - `Retagged`: the same, then the embedded destination tag swapped for
//!   another one, selecting the other route of the same contract interface
//!
//! Tag offsets are resolved against the template when the builder is
//! constructed. A tag that is missing or ambiguous is a startup error.

use super::template::{AddressCodec, CalldataTemplate};
use crate::config::{ChainConfig, Settings};
use crate::error::{BridgeError, BridgeResult};

use ethers::types::{Bytes, U256};
use std::ops::Range;
use tracing::debug;

/// A tag swap validated against a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPatch {
    offset: usize,
    from: Vec<u8>,
    to: Vec<u8>,
}

impl TagPatch {
    pub fn new(template: &CalldataTemplate, from: &[u8], to: &[u8]) -> BridgeResult<Self> {
        if from.len() != to.len() {
            return Err(BridgeError::Template(format!(
                "tag swap must keep the length: 0x{} is {} bytes, 0x{} is {} bytes",
                hex::encode(from),
                from.len(),
                hex::encode(to),
                to.len()
            )));
        }

        let offset = template.find_unique(from)?;

        Ok(Self {
            offset,
            from: from.to_vec(),
            to: to.to_vec(),
        })
    }

    /// Byte range rewritten by the patch
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.to.len()
    }

    fn apply(&self, data: &mut [u8]) {
        let range = self.range();
        debug_assert_eq!(&data[range.clone()], self.from.as_slice());
        data[range].copy_from_slice(&self.to);
    }
}

/// Call variant sent by a leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallVariant {
    Template,
    Retagged(TagPatch),
}

/// Template plus the variant one leg sends
#[derive(Debug, Clone)]
pub struct LegCalldata {
    template: CalldataTemplate,
    variant: CallVariant,
}

impl LegCalldata {
    pub fn new(template: CalldataTemplate) -> Self {
        Self {
            template,
            variant: CallVariant::Template,
        }
    }

    pub fn retagged(template: CalldataTemplate, from: &[u8], to: &[u8]) -> BridgeResult<Self> {
        let patch = TagPatch::new(&template, from, to)?;
        Ok(Self {
            template,
            variant: CallVariant::Retagged(patch),
        })
    }

    pub fn from_config(chain: &ChainConfig) -> BridgeResult<Self> {
        let template = CalldataTemplate::parse(&chain.calldata_template).map_err(|e| {
            BridgeError::Template(format!("{} template: {}", chain.name, e))
        })?;

        match &chain.retag {
            Some(retag) => {
                let from = decode_tag(&retag.from)?;
                let to = decode_tag(&retag.to)?;
                Self::retagged(template, &from, &to).map_err(|e| {
                    BridgeError::Template(format!("{} template: {}", chain.name, e))
                })
            }
            None => Ok(Self::new(template)),
        }
    }

    pub fn variant(&self) -> &CallVariant {
        &self.variant
    }

    /// Address injection only, ignoring the variant
    pub fn encode_plain(&self, address_hex: &str) -> BridgeResult<Bytes> {
        AddressCodec::encode(&self.template, address_hex)
    }

    /// Calldata for this leg's variant
    pub fn encode(&self, address_hex: &str) -> BridgeResult<Bytes> {
        let data = self.encode_plain(address_hex)?;
        match &self.variant {
            CallVariant::Template => Ok(data),
            CallVariant::Retagged(patch) => {
                let mut data = data.to_vec();
                patch.apply(&mut data);
                Ok(Bytes::from(data))
            }
        }
    }

    /// The trailing amount word must match the value sent with the call
    pub fn verify_amount(&self, value_wei: U256) -> BridgeResult<()> {
        match self.template.trailing_word() {
            Some(amount) if amount == value_wei => Ok(()),
            Some(amount) => Err(BridgeError::Template(format!(
                "template amount {} wei does not match configured amount {} wei",
                amount, value_wei
            ))),
            None => Err(BridgeError::Template(
                "template is too short to carry an amount word".to_string(),
            )),
        }
    }
}

fn decode_tag(tag: &str) -> BridgeResult<Vec<u8>> {
    hex::decode(tag.trim_start_matches("0x"))
        .map_err(|e| BridgeError::Template(format!("invalid tag hex {:?}: {}", tag, e)))
}

/// Calldata for a whole run, resolved for one account
#[derive(Debug, Clone, PartialEq)]
pub struct CalldataSet {
    /// What the outbound leg actually sends
    pub outbound: Bytes,
    /// What the return leg sends
    pub return_data: Bytes,
}

/// Builds both legs' calldata from their templates
#[derive(Debug, Clone)]
pub struct CalldataBuilder {
    outbound: LegCalldata,
    return_leg: LegCalldata,
}

impl CalldataBuilder {
    pub fn new(outbound: LegCalldata, return_leg: LegCalldata) -> Self {
        Self {
            outbound,
            return_leg,
        }
    }

    /// Parse and validate both templates against the configured amount
    pub fn from_settings(settings: &Settings) -> BridgeResult<Self> {
        let value_wei = settings.value_wei()?;

        let outbound = LegCalldata::from_config(&settings.outbound)?;
        outbound.verify_amount(value_wei).map_err(|e| {
            BridgeError::Template(format!("{} template: {}", settings.outbound.name, e))
        })?;

        let return_leg = LegCalldata::from_config(&settings.return_leg)?;
        return_leg.verify_amount(value_wei).map_err(|e| {
            BridgeError::Template(format!("{} template: {}", settings.return_leg.name, e))
        })?;

        Ok(Self::new(outbound, return_leg))
    }

    pub fn build(&self, address_hex: &str) -> BridgeResult<CalldataSet> {
        let set = CalldataSet {
            outbound: self.outbound.encode(address_hex)?,
            return_data: self.return_leg.encode(address_hex)?,
        };

        let legs = [
            (&self.outbound, &set.outbound),
            (&self.return_leg, &set.return_data),
        ];
        for (leg, data) in legs {
            debug!(
                "Built calldata: selector 0x{}, {} bytes, address at byte {} ({:?})",
                hex::encode(leg.template.selector()),
                data.len(),
                leg.template.address_offset(),
                leg.variant()
            );
        }

        Ok(set)
    }
}
