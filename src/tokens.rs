//! Deposit asset implementations used by tests and livenet demos
//!
//! - TestAsset: CEP-18 token with faucet mint and configurable decimals
//! - FaultyAsset: rejects transfers and changes its decimals on demand
//! - ReentrantAsset: calls back into the ledger while being transferred

use alloc::string::String;
use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;
use odra_modules::cep18::events::{
    Burn, DecreaseAllowance, IncreaseAllowance, Mint, SetAllowance, Transfer, TransferFrom,
};
use odra_modules::cep18_token::Cep18;

use crate::ledger::PointsLedgerContractRef;

/// Errors for the misbehaving assets
#[odra::odra_error]
pub enum TokenError {
    TransferRejected = 60001,
    LedgerNotSet = 60002,
}

/// TestAsset: CEP-18 token anyone can mint from
#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        IncreaseAllowance,
        DecreaseAllowance,
        Transfer,
        TransferFrom
    ]
)]
pub struct TestAsset {
    token: SubModule<Cep18>,
}

#[odra::module]
impl TestAsset {
    /// Initialize the token with the given precision
    pub fn init(&mut self, symbol: String, name: String, decimals: u8) {
        self.token.init(symbol, name, decimals, U256::zero());
    }

    /// Token name
    pub fn name(&self) -> String {
        self.token.name()
    }

    /// Token symbol
    pub fn symbol(&self) -> String {
        self.token.symbol()
    }

    /// Token decimals
    pub fn decimals(&self) -> u8 {
        self.token.decimals()
    }

    /// Total supply
    pub fn total_supply(&self) -> U256 {
        self.token.total_supply()
    }

    /// Balance of an address
    pub fn balance_of(&self, owner: Address) -> U256 {
        self.token.balance_of(&owner)
    }

    /// Allowance granted by owner to spender
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.token.allowance(&owner, &spender)
    }

    /// Transfer tokens
    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        self.token.transfer(&recipient, &amount);
    }

    /// Approve spender
    pub fn approve(&mut self, spender: Address, amount: U256) {
        self.token.approve(&spender, &amount);
    }

    /// Transfer from (requires allowance)
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        self.token.transfer_from(&owner, &recipient, &amount);
    }

    /// Faucet mint - anyone can call to get test tokens
    pub fn faucet_mint(&mut self, to: Address, amount: U256) {
        self.token.raw_mint(&to, &amount);
    }
}

/// FaultyAsset: moves no funds and rejects transfers on demand.
/// After init both directions are rejected.
#[odra::module(errors = TokenError)]
pub struct FaultyAsset {
    decimals: Var<u8>,
    reject_pull: Var<bool>,
    reject_payout: Var<bool>,
}

#[odra::module]
impl FaultyAsset {
    pub fn init(&mut self, decimals: u8) {
        self.decimals.set(decimals);
        self.reject_pull.set(true);
        self.reject_payout.set(true);
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    /// Report a different precision from now on
    pub fn set_decimals(&mut self, decimals: u8) {
        self.decimals.set(decimals);
    }

    pub fn set_rejecting(&mut self, pull: bool, payout: bool) {
        self.reject_pull.set(pull);
        self.reject_payout.set(payout);
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        let _ = (recipient, amount);
        if self.reject_payout.get_or_default() {
            self.env().revert(TokenError::TransferRejected);
        }
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        let _ = (owner, recipient, amount);
        if self.reject_pull.get_or_default() {
            self.env().revert(TokenError::TransferRejected);
        }
    }
}

/// ReentrantAsset: re-enters the ledger from inside a transfer.
/// Moves no funds; each direction re-enters only while armed.
#[odra::module(errors = TokenError)]
pub struct ReentrantAsset {
    ledger: Var<Address>,
    on_pull: Var<bool>,
    on_payout: Var<bool>,
}

#[odra::module]
impl ReentrantAsset {
    pub fn init(&mut self, ledger: Address) {
        self.ledger.set(ledger);
        self.on_pull.set(true);
        self.on_payout.set(true);
    }

    pub fn decimals(&self) -> u8 {
        18
    }

    pub fn set_reentry(&mut self, on_pull: bool, on_payout: bool) {
        self.on_pull.set(on_pull);
        self.on_payout.set(on_payout);
    }

    /// Deposits into the ledger again while the ledger is pulling funds
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        let _ = (owner, recipient);
        if self.on_pull.get_or_default() {
            let mut ledger = self.ledger_ref();
            ledger.deposit(self.env().self_address(), amount);
        }
    }

    /// Withdraws from the ledger again while the ledger is paying out
    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        let _ = recipient;
        if self.on_payout.get_or_default() {
            let mut ledger = self.ledger_ref();
            ledger.withdraw(self.env().self_address(), amount);
        }
    }

    fn ledger_ref(&self) -> PointsLedgerContractRef {
        let ledger = self
            .ledger
            .get()
            .unwrap_or_else(|| self.env().revert(TokenError::LedgerNotSet));
        PointsLedgerContractRef::new(self.env(), ledger)
    }
}
