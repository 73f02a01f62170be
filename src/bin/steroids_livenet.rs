//! Livenet deploy and demo binary for the Steroids lock ledger.
//!
//! Run with:
//! - Deploy only:      STEROIDS_LIVENET_MODE=deploy cargo run --bin steroids_livenet --features=livenet
//! - Deploy + demo:    STEROIDS_LIVENET_MODE=deploy_and_demo cargo run --bin steroids_livenet --features=livenet
//! - Demo on existing: STEROIDS_LIVENET_MODE=demo STEROIDS_EXISTING_LEDGER=... STEROIDS_EXISTING_PAIR=... cargo run ...
//! - Query locks:      STEROIDS_LIVENET_MODE=query STEROIDS_EXISTING_LEDGER=... STEROIDS_EXISTING_PAIR=... cargo run ...
//!
//! Required environment variables (Odra livenet):
//! - ODRA_CASPER_LIVENET_SECRET_KEY_PATH
//! - ODRA_CASPER_LIVENET_NODE_ADDRESS        (base URL; Odra appends "/rpc")
//! - ODRA_CASPER_LIVENET_EVENTS_URL
//! - ODRA_CASPER_LIVENET_CHAIN_NAME
//!
//! Optional:
//! - ODRA_CASPER_LIVENET_DEPLOY_GAS          (motes, per contract deploy)
//! - ODRA_CASPER_LIVENET_CALL_GAS            (motes)
//! - STEROIDS_EXISTING_LEDGER                (64-hex or formatted "hash-..."/"contract-package-...")
//! - STEROIDS_EXISTING_PAIR                  (same formats)
//! - STEROIDS_MIN_LOCK_TIME                  (seconds, default: 604800)
//! - STEROIDS_MAX_LOCKS                      (default: 20)
//! - STEROIDS_DEMO_LIQUIDITY                 (reserve units added to the test pair, default: 1000000)
//! - STEROIDS_DEMO_STAKE                     (pair shares to stake, default: 10000)

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef, HostRefLoader, NoArgs};
use odra::prelude::*;

use steroids_casper::pair::{LiquidityPair, LiquidityPairHostRef, LiquidityPairInitArgs};
use steroids_casper::permissions::{Action, Permissions};
use steroids_casper::steroids::{Steroids, SteroidsHostRef, SteroidsInitArgs};
use steroids_casper::tokens::{WrappedToken, WrappedTokenInitArgs};
use steroids_casper::vault::{Vault, VaultInitArgs};

const MOTES_PER_CSPR: u64 = 1_000_000_000;
const ONE_WEEK_SECONDS: u64 = 7 * 24 * 60 * 60;

const DEFAULT_DEPLOY_GAS_MOTES: u64 = 450_000_000_000; // 450 CSPR
const DEFAULT_CALL_GAS_MOTES: u64 = 50_000_000_000; // 50 CSPR

fn main() {
    println!("============================================");
    println!("  Steroids Lock Ledger - Livenet");
    println!("============================================\n");

    let env = odra_casper_livenet_env::env();

    let mode = std::env::var("STEROIDS_LIVENET_MODE").unwrap_or_else(|_| "deploy".to_string());
    let plan = RunPlan::from_mode(&mode);

    let deploy_gas = read_u64_env("ODRA_CASPER_LIVENET_DEPLOY_GAS", DEFAULT_DEPLOY_GAS_MOTES);
    let call_gas = read_u64_env("ODRA_CASPER_LIVENET_CALL_GAS", DEFAULT_CALL_GAS_MOTES);
    let min_lock_time = read_u64_env("STEROIDS_MIN_LOCK_TIME", ONE_WEEK_SECONDS);
    let max_locks = read_u32_env("STEROIDS_MAX_LOCKS", 20);
    let demo_liquidity = read_u64_env("STEROIDS_DEMO_LIQUIDITY", 1_000_000);
    let demo_stake = read_u64_env("STEROIDS_DEMO_STAKE", 10_000);

    println!("[INFO] Mode: {}", mode);
    println!("[INFO] Caller: {:?}", env.caller());
    println!(
        "[INFO] Gas (motes): deploy={} ({} CSPR), calls={} ({} CSPR)",
        deploy_gas,
        deploy_gas / MOTES_PER_CSPR,
        call_gas,
        call_gas / MOTES_PER_CSPR
    );
    println!(
        "[INFO] Policy: min_lock_time={}s, max_locks={}",
        min_lock_time, max_locks
    );
    println!();

    let (mut pair, mut ledger) = if plan.deploy {
        let owner = env.caller();

        println!("[STEP 1] Deploying Permissions...");
        env.set_gas(deploy_gas);
        let mut permissions = Permissions::deploy(&env, NoArgs);
        println!("[OK] Permissions deployed at: {:?}", permissions.address());

        println!("[STEP 2] Deploying test LiquidityPair...");
        env.set_gas(deploy_gas);
        let pair = LiquidityPair::deploy(
            &env,
            LiquidityPairInitArgs {
                symbol: "SLP".to_string(),
                name: "Steroids Liquidity Pair".to_string(),
            },
        );
        println!("[OK] LiquidityPair deployed at: {:?}", pair.address());

        println!("[STEP 3] Deploying WrappedToken...");
        env.set_gas(deploy_gas);
        let mut wrapped = WrappedToken::deploy(
            &env,
            WrappedTokenInitArgs {
                symbol: "wSLP".to_string(),
                name: "Wrapped Steroids Liquidity".to_string(),
                minter: owner,
                transferable: false,
            },
        );
        println!("[OK] WrappedToken deployed at: {:?}", wrapped.address());

        println!("[STEP 4] Deploying Vault...");
        env.set_gas(deploy_gas);
        let mut vault = Vault::deploy(&env, VaultInitArgs { operator: owner });
        println!("[OK] Vault deployed at: {:?}", vault.address());

        println!("[STEP 5] Deploying Steroids ledger...");
        env.set_gas(deploy_gas);
        let ledger = Steroids::deploy(
            &env,
            SteroidsInitArgs {
                wrapped_token: wrapped.address(),
                vault: vault.address(),
                deposit_token: pair.address(),
                permissions: permissions.address(),
                min_lock_time,
                max_locks,
            },
        );
        println!("[OK] Steroids deployed at: {:?}", ledger.address());

        println!("[STEP 6] Handing minter/operator rights to the ledger...");
        env.set_gas(call_gas);
        wrapped.set_minter(ledger.address());
        env.set_gas(call_gas);
        vault.set_operator(ledger.address());
        println!("[OK] Minter: {:?}", wrapped.minter());
        println!("[OK] Operator: {:?}", vault.operator());

        println!("[STEP 7] Granting privileged actions to the caller...");
        for action in [
            Action::ChangeLockTime,
            Action::ChangeMaxLocks,
            Action::ChangeVault,
            Action::AdjustBalance,
        ] {
            env.set_gas(call_gas);
            permissions.grant(action, owner);
        }
        println!("[OK] Actions granted.");
        println!();

        (pair, ledger)
    } else {
        println!("[STEP 1] Reusing existing contracts...");
        let ledger_raw = std::env::var("STEROIDS_EXISTING_LEDGER")
            .unwrap_or_else(|_| panic!("STEROIDS_EXISTING_LEDGER must be set for mode={}", mode));
        let pair_raw = std::env::var("STEROIDS_EXISTING_PAIR")
            .unwrap_or_else(|_| panic!("STEROIDS_EXISTING_PAIR must be set for mode={}", mode));
        let ledger = Steroids::load(&env, parse_contract_address(&ledger_raw));
        let pair = LiquidityPair::load(&env, parse_contract_address(&pair_raw));
        println!("[OK] Steroids: {:?}", ledger.address());
        println!("[OK] LiquidityPair: {:?}", pair.address());
        println!();
        (pair, ledger)
    };

    if plan.demo {
        let caller = env.caller();
        let stake_amount = U256::from(demo_stake);

        println!("[DEMO 1] Adding {} reserve units of liquidity...", demo_liquidity);
        env.set_gas(call_gas);
        pair.add_liquidity(caller, U256::from(demo_liquidity));
        println!("[OK] Pair shares: {}", pair.balance_of(caller));

        println!("[DEMO 2] Approving {} shares to the ledger...", demo_stake);
        env.set_gas(call_gas);
        pair.approve(ledger.address(), stake_amount);

        println!("[DEMO 3] Staking {} shares for {}s...", demo_stake, ledger.min_lock_time());
        println!("     Preview: {} wrapped", ledger.preview_wrapped(stake_amount));
        env.set_gas(call_gas);
        let duration = ledger.min_lock_time();
        ledger.stake(stake_amount, duration, caller);
        println!("[OK] Stake complete.");
        print_account_info(&ledger, &pair, caller);
        println!("[INFO] Unstake becomes possible once the lock expires.");
    }

    if plan.query {
        let query_user = env.caller();
        let locks = ledger.get_locks(query_user);
        let slots: Vec<String> = locks
            .iter()
            .map(|slot| match slot {
                Some(lock) => format!(
                    r#"{{"lock_start":{},"duration":{},"deposit_amount":"{}","wrapped_amount":"{}"}}"#,
                    lock.lock_start, lock.duration, lock.deposit_amount, lock.wrapped_amount
                ),
                None => "null".to_string(),
            })
            .collect();

        println!(
            r#"STEROIDS_LOCKS_JSON={{"user":"{:?}","staked":"{}","unlocked":"{}","locked":"{}","wrapped":"{}","slots":[{}]}}"#,
            query_user,
            ledger.staked_amount_of(query_user),
            ledger.unlocked_amount_of(query_user),
            ledger.locked_amount_of(query_user),
            ledger.wrapped_amount_of(query_user),
            slots.join(",")
        );
        return;
    }

    if plan.reports_deployment() {
        output_deploy_json(pair.address(), ledger.address());
    }
}

/// Which phases a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunPlan {
    deploy: bool,
    demo: bool,
    query: bool,
}

impl RunPlan {
    fn from_mode(mode: &str) -> Self {
        Self {
            deploy: mode == "deploy" || mode == "deploy_and_demo",
            demo: mode == "demo" || mode == "deploy_and_demo",
            query: mode == "query",
        }
    }

    /// Fresh contracts are always reported, with or without a demo
    fn reports_deployment(&self) -> bool {
        self.deploy
    }
}

fn print_account_info(ledger: &SteroidsHostRef, pair: &LiquidityPairHostRef, user: Address) {
    println!("     staked: {}", ledger.staked_amount_of(user));
    println!("     locked: {}", ledger.locked_amount_of(user));
    println!("     unlocked: {}", ledger.unlocked_amount_of(user));
    println!("     wrapped (recorded): {}", ledger.wrapped_amount_of(user));
    println!("     occupied slots: {}", ledger.get_locks(user).iter().filter(|slot| slot.is_some()).count());
    println!("     pair reserve: {}", pair.reserve());
    println!("     pair total supply: {}", pair.total_supply());
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

/// Like `read_u64_env`, falling back to the default when the value does not fit
fn read_u32_env(name: &str, default_value: u32) -> u32 {
    u32::try_from(read_u64_env(name, u64::from(default_value))).unwrap_or(default_value)
}

fn output_deploy_json(pair_addr: Address, ledger_addr: Address) {
    let chain_name =
        std::env::var("ODRA_CASPER_LIVENET_CHAIN_NAME").unwrap_or_else(|_| "casper-test".to_string());
    let node_url = std::env::var("ODRA_CASPER_LIVENET_NODE_ADDRESS")
        .unwrap_or_else(|_| "https://node.testnet.casper.network".to_string());

    println!(
        r#"STEROIDS_DEPLOY_JSON={{"chain_name":"{}","node_url":"{}","pair_contract_hash":"{}","ledger_contract_hash":"{}","deployed_at":"{}"}}"#,
        chain_name,
        node_url,
        format_address_hash(&pair_addr),
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
    let package_hex = ["contract-package-", "package-", "hash-"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    Address::Contract(ContractPackageHash::new(decode_hex_32(package_hex)))
}
