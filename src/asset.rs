//! Deposit Asset External Contract Interface
//!
//! The ledger only needs three things from a deposited asset: its decimals,
//! pulling units from a holder and paying units out. Any CEP-18 token
//! exposes these entry points with matching names and arguments.

use odra::prelude::*;
use odra::casper_types::U256;

/// Capability interface of a whitelisted asset
#[odra::external_contract]
pub trait DepositAsset {
    /// Native precision of the asset
    fn decimals(&self) -> u8;

    /// Pay `amount` from the caller's balance to `recipient`
    fn transfer(&mut self, recipient: Address, amount: U256);

    /// Move `amount` from `owner` to `recipient` using the caller's allowance
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
}
