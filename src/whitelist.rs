//! Registry of assets eligible for deposit
//!
//! Append-only: an asset added twice shows up twice in `all()`.
//! Decimals are recorded on the first add and never change afterwards.

use odra::casper_types::account::AccountHash;
use odra::prelude::*;
use alloc::vec::Vec;

/// The all-zero account address, treated as "no address"
pub fn null_address() -> Address {
    Address::Account(AccountHash::new([0u8; 32]))
}

#[odra::module]
pub struct Whitelist {
    eligible: Mapping<Address, bool>,
    decimals: Mapping<Address, u8>,
    assets: List<Address>,
}

#[odra::module]
impl Whitelist {
    /// Caller checks the asset is not the null address
    pub fn add(&mut self, asset: Address, decimals: u8) {
        if self.decimals.get(&asset).is_none() {
            self.decimals.set(&asset, decimals);
        }
        self.eligible.set(&asset, true);
        self.assets.push(asset);
    }

    pub fn contains(&self, asset: Address) -> bool {
        self.eligible.get(&asset).unwrap_or_default()
    }

    /// Precision recorded when the asset was first whitelisted
    pub fn decimals(&self, asset: Address) -> Option<u8> {
        self.decimals.get(&asset)
    }

    /// Every whitelisted asset in insertion order
    pub fn all(&self) -> Vec<Address> {
        let mut out = Vec::with_capacity(self.assets.len() as usize);
        for index in 0..self.assets.len() {
            if let Some(asset) = self.assets.get(index) {
                out.push(asset);
            }
        }
        out
    }
}
