//! Points Ledger x Casper: Deposit & Points Accrual (Odra)
//!
//! This crate implements a points-accrual ledger on Casper using Odra framework.
//! - Points: fixed-point accrual math (18 decimals, per hour)
//! - Phase: deposit period / exit period derived from block time
//! - Whitelist: registry of depositable assets
//! - PointsLedger: deposits, withdrawals and claim-manager exit flow
//! - Test assets: CEP-18 faucet token plus misbehaving assets for tests

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod points;
pub mod phase;
pub mod asset;
pub mod whitelist;
pub mod ledger;
pub mod tokens;
