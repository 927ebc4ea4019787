//! Deploy contracts to Casper livenet/testnet using Odra livenet environment.
//!
//! Usage:
//!   cargo run --bin deploy_livenet --release
//!
//! Requires .env file with:
//!   ODRA_CASPER_LIVENET_SECRET_KEY_PATH=/path/to/secret_key.pem
//!   ODRA_CASPER_LIVENET_NODE_ADDRESS=https://node.testnet.casper.network
//!   ODRA_CASPER_LIVENET_CHAIN_NAME=casper-test
//!   ODRA_CASPER_LIVENET_PAYMENT_AMOUNT=200000000000

use odra::casper_types::U256;
use odra::host::Deployer;
use odra::prelude::*;

use cspr_paylater_contracts::asset_token::{AssetToken, AssetTokenInitArgs};
use cspr_paylater_contracts::collateral_ledger::{CollateralLedger, CollateralLedgerInitArgs};
use cspr_paylater_contracts::debt_ledger::{DebtLedger, DebtLedgerInitArgs};
use cspr_paylater_contracts::mock_venue::{
    MockRewardDistributor, MockRewardDistributorInitArgs, MockYieldVault, MockYieldVaultInitArgs,
};
use cspr_paylater_contracts::yield_strategy::{YieldStrategy, YieldStrategyInitArgs};

fn main() {
    // Load environment from .env file
    dotenv::dotenv().ok();

    println!("=== CSPR-PayLater Livenet Deployment ===");
    println!();

    // Initialize Odra livenet environment
    let env = odra_casper_livenet_env::env();

    // Configure payment amount for deployments/calls (required for Casper 2.0 txs)
    let payment_amount: u64 = std::env::var("ODRA_CASPER_LIVENET_PAYMENT_AMOUNT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(200_000_000_000);
    env.set_gas(payment_amount);

    // Get deployer address
    let deployer = env.caller();
    println!("Deployer: {:?}", deployer);
    println!();

    // Protocol parameters
    let collateral_ratio_bps: u32 = 15_000; // 150%
    let fee_bps: u32 = 250; // 2.5%
    let penalty_bps: u32 = 1_000; // 10%
    let min_period: u64 = 86_400; // 1 day
    let max_period: u64 = 30 * 86_400; // 30 days
    let initial_liquidity = U256::from(100_000u64) * U256::from(10u64).pow(U256::from(9u64));

    // ==================== Phase 1: Asset & Venue ====================
    println!("=== Phase 1: Deploying Asset and Venue Stand-ins ===");
    println!();

    println!("Deploying AssetToken...");
    let mut asset_token = AssetToken::deploy(
        &env,
        AssetTokenInitArgs {
            name: String::from("PayLater USD"),
            symbol: String::from("plUSD"),
            decimals: 9,
            admin: deployer,
        },
    );
    let asset_address = asset_token.address().clone();
    println!("AssetToken deployed at: {:?}", asset_address);

    println!("Deploying MockYieldVault...");
    let vault = MockYieldVault::deploy(
        &env,
        MockYieldVaultInitArgs {
            asset: asset_address,
        },
    );
    let vault_address = vault.address().clone();
    println!("MockYieldVault deployed at: {:?}", vault_address);

    println!("Deploying MockRewardDistributor...");
    let distributor = MockRewardDistributor::deploy(
        &env,
        MockRewardDistributorInitArgs { admin: deployer },
    );
    let distributor_address = distributor.address().clone();
    println!("MockRewardDistributor deployed at: {:?}", distributor_address);

    // ==================== Phase 2: Core Ledgers ====================
    println!();
    println!("=== Phase 2: Deploying Core Ledgers ===");
    println!();

    println!("Deploying YieldStrategy...");
    let mut strategy = YieldStrategy::deploy(
        &env,
        YieldStrategyInitArgs {
            admin: deployer,
            asset: asset_address,
            vault: vault_address,
        },
    );
    let strategy_address = strategy.address().clone();
    println!("YieldStrategy deployed at: {:?}", strategy_address);

    println!("Deploying CollateralLedger...");
    let mut collateral_ledger = CollateralLedger::deploy(
        &env,
        CollateralLedgerInitArgs {
            admin: deployer,
            collateral_ratio_bps,
        },
    );
    let collateral_ledger_address = collateral_ledger.address().clone();
    println!("CollateralLedger deployed at: {:?}", collateral_ledger_address);

    println!("Deploying DebtLedger...");
    let mut debt_ledger = DebtLedger::deploy(
        &env,
        DebtLedgerInitArgs {
            admin: deployer,
            collateral_ledger: collateral_ledger_address,
            fee_bps,
            penalty_bps,
            min_period,
            max_period,
        },
    );
    let debt_ledger_address = debt_ledger.address().clone();
    println!("DebtLedger deployed at: {:?}", debt_ledger_address);

    // ==================== Phase 3: Wiring ====================
    println!();
    println!("=== Phase 3: Wiring Contracts ===");
    println!();

    println!("Registering supported asset...");
    collateral_ledger.add_supported_asset(asset_address);

    println!("Registering DebtLedger with CollateralLedger...");
    collateral_ledger.set_debt_ledger(debt_ledger_address);

    println!("Registering YieldStrategy with CollateralLedger...");
    collateral_ledger.set_strategy(strategy_address);

    println!("Authorizing CollateralLedger on YieldStrategy...");
    strategy.add_authorized_caller(collateral_ledger_address);

    println!("Setting reward distributor...");
    strategy.set_distributor(distributor_address);

    // ==================== Phase 4: Initial Liquidity ====================
    println!();
    println!("=== Phase 4: Funding Lending Float ===");
    println!();

    println!("Minting initial liquidity to deployer...");
    asset_token.mint(deployer, initial_liquidity);

    println!("Approving and depositing liquidity...");
    asset_token.approve(debt_ledger_address, initial_liquidity);
    debt_ledger.deposit_liquidity(asset_address, initial_liquidity);

    println!();
    println!("=== Deployment Complete ===");
    println!("AssetToken:            {:?}", asset_address);
    println!("MockYieldVault:        {:?}", vault_address);
    println!("MockRewardDistributor: {:?}", distributor_address);
    println!("YieldStrategy:         {:?}", strategy_address);
    println!("CollateralLedger:      {:?}", collateral_ledger_address);
    println!("DebtLedger:            {:?}", debt_ledger_address);
}
