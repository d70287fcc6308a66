//! Livenet deploy and demo binary for the Points Ledger.
//!
//! Run with:
//! - Deploy only:           POINTS_LIVENET_MODE=deploy cargo run --bin points_ledger_livenet --features=livenet
//! - Deploy + demo:         POINTS_LIVENET_MODE=deploy_and_demo cargo run --bin points_ledger_livenet --features=livenet
//! - Query existing:        POINTS_LIVENET_MODE=query POINTS_EXISTING_LEDGER=... POINTS_EXISTING_ASSET=... cargo run ...
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS        (base URL; Odra appends "/rpc")
//! - ODRA_CASPER_LIVENET_EVENTS_URL
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Optional:
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_ASSET    (motes)
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS_LEDGER   (motes)
//! - ODRA_CASPER_LIVENET_CALL_GAS            (motes)
//! - POINTS_EXISTING_ASSET                   (64-hex or formatted "hash-..."/"contract-package-...")
//! - POINTS_EXISTING_LEDGER                  (64-hex or formatted "hash-..."/"contract-package-...")
//! - POINTS_ASSET_DECIMALS                   (default: 18)
//! - POINTS_DEMO_DEPOSIT                     (whole asset units, default: 100)

use odra::host::{Deployer, HostRef, HostRefLoader};
use odra::prelude::*;
use odra::casper_types::U256;

use points_ledger_casper::ledger::{PointsLedger, PointsLedgerHostRef, PointsLedgerInitArgs};
use points_ledger_casper::tokens::{TestAsset, TestAssetHostRef, TestAssetInitArgs};

const MOTES_PER_CSPR: u64 = 1_000_000_000;

const DEFAULT_DEPLOY_GAS_ASSET_MOTES: u64 = 450_000_000_000; // 450 CSPR
const DEFAULT_DEPLOY_GAS_LEDGER_MOTES: u64 = 600_000_000_000; // 600 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

fn main() {
    println!("============================================");
    println!("  Points Ledger - Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();

    let mode = std::env::var("POINTS_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string());
    let should_deploy = mode == "deploy" || mode == "deploy_and_demo";
    let should_demo = mode == "deploy_and_demo";
    let should_query = mode == "query";

    let deploy_gas_asset = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_ASSET", DEFAULT_DEPLOY_GAS_ASSET_MOTES);
    let deploy_gas_ledger = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS_LEDGER", DEFAULT_DEPLOY_GAS_LEDGER_MOTES);
    let call_gas = read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES);

    let decimals = read_u64_env("POINTS_ASSET_DECIMALS", 18).min(u8::MAX as u64) as u8;
    let deposit_units = read_u64_env("POINTS_DEMO_DEPOSIT", 100);
    let deposit_amount = U256::from(deposit_units) * U256::from(10u64).pow(U256::from(decimals));

    println!("[INFO] Mode: {}", mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!(
        "[INFO] Gas (motes): deploy_asset={} ({} CSPR), deploy_ledger={} ({} CSPR), calls={} ({} CSPR)",
        deploy_gas_asset,
        deploy_gas_asset / MOTES_PER_CSPR,
        deploy_gas_ledger,
        deploy_gas_ledger / MOTES_PER_CSPR,
        call_gas,
        call_gas / MOTES_PER_CSPR
    );
    println!("[INFO] Demo params: decimals={}, deposit={} units", decimals, deposit_units);
    println!();

    // ==========================================
    // Step 1: Deploy (or reuse) the test asset
    // ==========================================
    let mut asset = if should_deploy {
        println!("[STEP 1] Deploying test asset...");
        env.set_gas(deploy_gas_asset);
        let asset = TestAsset::deploy(
            &env,
            TestAssetInitArgs {
                symbol: "tPTS".to_string(),
                name: "Points Test Asset".to_string(),
                decimals,
            },
        );
        println!("[OK] Asset deployed at: {:?}", asset.address());
        println!("     Symbol: {}", asset.symbol());
        println!("     Decimals: {}", asset.decimals());
        println!();
        asset
    } else {
        println!("[STEP 1] Reusing existing asset...");
        let raw = std::env::var("POINTS_EXISTING_ASSET")
            .unwrap_or_else(|_| panic!("POINTS_EXISTING_ASSET must be set for mode={}", mode));
        let addr = parse_contract_address(&raw);
        println!("[OK] Asset: {:?}", addr);
        println!();
        TestAsset::load(&env, addr)
    };
    let asset_addr = asset.address();

    // ==========================================
    // Step 2: Deploy (or reuse) the ledger
    // ==========================================
    let mut ledger = if should_deploy {
        println!("[STEP 2] Deploying Points Ledger...");
        env.set_gas(deploy_gas_ledger);
        let ledger = PointsLedger::deploy(
            &env,
            PointsLedgerInitArgs {
                whitelisted_assets: vec![asset_addr],
            },
        );
        println!("[OK] Ledger deployed at: {:?}", ledger.address());
        println!("     Owner: {:?}", ledger.owner());
        println!("     Whitelist: {:?}", ledger.get_all_whitelisted());
        println!();
        ledger
    } else {
        println!("[STEP 2] Reusing existing ledger...");
        let raw = std::env::var("POINTS_EXISTING_LEDGER")
            .unwrap_or_else(|_| panic!("POINTS_EXISTING_LEDGER must be set for mode={}", mode));
        let addr = parse_contract_address(&raw);
        println!("[OK] Ledger: {:?}", addr);
        println!();
        PointsLedger::load(&env, addr)
    };
    let ledger_addr = ledger.address();
    let caller = env.caller();

    // ==========================================
    // Demo: faucet -> approve -> deposit
    // ==========================================
    if should_demo {
        println!("[DEMO 1] Minting {} units from faucet...", deposit_units);
        env.set_gas(call_gas);
        asset.faucet_mint(caller, deposit_amount);
        println!("[OK] Balance: {}", asset.balance_of(caller));

        println!("[DEMO 2] Approving ledger...");
        env.set_gas(call_gas);
        asset.approve(ledger_addr, deposit_amount);
        println!("[OK] Allowance: {}", asset.allowance(caller, ledger_addr));

        println!("[DEMO 3] Depositing {} units...", deposit_units);
        env.set_gas(call_gas);
        ledger.deposit(asset_addr, deposit_amount);
        println!("[OK] Deposit complete.");
        print_account_info(&ledger, caller, asset_addr);
    }

    // ==========================================
    // Query mode: Output account as JSON
    // ==========================================
    if should_query {
        let info = ledger.get_user_info(caller);
        println!(
            "POINTS_ACCOUNT_JSON={{\"accrual_rate\":\"{}\",\"last_settled\":{},\"settled_points\":\"{}\",\"preview_points\":\"{}\",\"balance\":\"{}\",\"phase\":{},\"user\":\"{:?}\"}}",
            info.accrual_rate,
            info.last_settled,
            info.settled_points,
            ledger.preview_points(caller),
            ledger.get_balance(caller, asset_addr),
            ledger.current_phase(),
            caller
        );
        return;
    }

    output_deploy_json(asset_addr, ledger_addr);
}

fn print_account_info(ledger: &PointsLedgerHostRef, user: Address, asset: Address) {
    let info = ledger.get_user_info(user);
    let phase_str = match ledger.current_phase() {
        0 => "Accepting",
        1 => "ExitScheduled",
        2 => "Exited",
        _ => "Unknown",
    };
    println!("     balance: {}", ledger.get_balance(user, asset));
    println!("     accrual_rate: {} wad/hour", info.accrual_rate);
    println!("     settled_points: {} wad", info.settled_points);
    println!("     preview_points: {} wad", ledger.preview_points(user));
    println!("     last_settled: {}", info.last_settled);
    println!("     total_deposited: {}", ledger.total_deposited(asset));
    println!("     phase: {}", phase_str);
    println!("     exit_start_time: {:?}", ledger.exit_start_time());
    println!();
}

fn read_u64_env(name: &str, default_value: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => {
            let cleaned = raw.trim().replace('_', "");
            cleaned.parse::<u64>().unwrap_or(default_value)
        }
        Err(_) => default_value,
    }
}

fn output_deploy_json(asset_addr: Address, ledger_addr: Address) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());

    println!(
        r#"POINTS_DEPLOY_JSON={{"chain_name":"{}","node_url":"{}","asset_contract_hash":"{}","ledger_contract_hash":"{}","deployed_at":"{}"}}"#,
        chain_name,
        node_url,
        format_address_hash(&asset_addr),
        format_address_hash(&ledger_addr),
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
}

fn format_address_hash(addr: &Address) -> String {
    let debug_str = format!("{:?}", addr);
    let (Some(start), Some(end)) = (debug_str.find('['), debug_str.rfind(']')) else {
        return debug_str;
    };
    debug_str[start + 1..end]
        .split(", ")
        .filter_map(|part| part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")))
        .collect()
}

fn parse_contract_address(raw: &str) -> Address {
    use odra::casper_types::account::AccountHash;
    use odra::casper_types::contracts::ContractPackageHash;

    fn decode_hex_32(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            panic!("Invalid address hash (expected 64 hex): {}", s);
        }
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .unwrap_or_else(|_| panic!("Invalid hex in address: {}", s));
        }
        out
    }

    let trimmed = raw.trim();
    if let Some(hex) = trimmed.strip_prefix("account-hash-") {
        return Address::Account(AccountHash::new(decode_hex_32(hex)));
    }
    for prefix in ["contract-package-", "package-", "hash-"] {
        if let Some(hex) = trimmed.strip_prefix(prefix) {
            return Address::Contract(ContractPackageHash::new(decode_hex_32(hex)));
        }
    }
    if trimmed.len() == 64 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Address::Contract(ContractPackageHash::new(decode_hex_32(trimmed)));
    }

    panic!("Invalid address format: {}", trimmed);
}
