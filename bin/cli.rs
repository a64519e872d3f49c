//! CLI tool for deploying and operating the unified lending contracts.

use odra::host::{Deployer, HostEnv};
use odra::prelude::{Address, Addressable};
use odra::schema::casper_contract_schema::NamedCLType;
use odra_cli::{
    deploy::DeployScript,
    scenario::{Args, Error, Scenario, ScenarioMetadata},
    CommandArg, ContractProvider, DeployedContractsContainer, DeployerExt,
    OdraCli,
};
use unified_lending::lending::{
    CollateralVault, ExchangeRateToken, LiquidityLedger, OracleSwapVenue, PriceOracle,
};
use unified_lending::lending::vault::CollateralVaultHostRef;
use unified_lending::token::FaucetToken;

// Rate curve for newly registered vaults, in bps
const BASE_RATE_BPS: u32 = 1000;
const MULTIPLIER_BPS: u32 = 2000;
const JUMP_MULTIPLIER_BPS: u32 = 5000;
const KINK_BPS: u32 = 8000;

// Interest split
const LENDER_SHARE_BPS: u32 = 7000;
const VAULT_FEE_BPS: u32 = 1000;
const PROTOCOL_FEE_BPS: u32 = 2000;

// Vault risk parameters
const MAX_LTV_BPS: u32 = 7000;
const LIQUIDATION_THRESHOLD_BPS: u32 = 7500;
const LIQUIDATION_PENALTY_BPS: u32 = 500;
const SLIPPAGE_BPS: u32 = 100;
const LIQUIDATION_VAULT_SHARE_BPS: u32 = 4000;
const LIQUIDATION_PROTOCOL_SHARE_BPS: u32 = 2000;
const LIQUIDATION_LENDER_SHARE_BPS: u32 = 4000;

/// Deploys the base asset, receipt token and liquidity ledger, then wires them.
pub struct LedgerDeployScript;

impl DeployScript for LedgerDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use unified_lending::lending::ledger::LiquidityLedgerInitArgs;
        use unified_lending::lending::receipt_token::ExchangeRateTokenInitArgs;
        use unified_lending::token::FaucetTokenInitArgs;

        let base_asset = FaucetToken::load_or_deploy(
            &env,
            FaucetTokenInitArgs {
                name: String::from("USD Coin"),
                symbol: String::from("USDC"),
                decimals: 6,
            },
            container,
            300_000_000_000
        )?;

        let mut receipt = ExchangeRateToken::load_or_deploy(
            &env,
            ExchangeRateTokenInitArgs {
                name: String::from("Unified Lending USDC"),
                symbol: String::from("ulUSDC"),
                redemption_fee_bps: 0,
            },
            container,
            400_000_000_000
        )?;

        let ledger = LiquidityLedger::load_or_deploy(
            &env,
            LiquidityLedgerInitArgs {
                base_asset: base_asset.address().clone(),
                receipt_token: receipt.address().clone(),
                // Launch can be activated as soon as it is deployed
                launch_timestamp: 0,
                max_utilization_on_withdraw_bps: 9500,
            },
            container,
            600_000_000_000
        )?;

        if receipt.get_ledger().is_none() {
            env.set_gas(50_000_000_000);
            receipt.set_ledger(ledger.address().clone());
        }

        Ok(())
    }
}

/// Deploys the price oracle and the oracle-priced swap venue.
pub struct MarketDeployScript;

impl DeployScript for MarketDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        use unified_lending::lending::price_oracle::PriceOracleInitArgs;
        use unified_lending::lending::swap_venue::OracleSwapVenueInitArgs;

        let oracle = PriceOracle::load_or_deploy(
            &env,
            PriceOracleInitArgs {
                // One hour
                max_staleness: 3_600_000,
            },
            container,
            300_000_000_000
        )?;

        let _venue = OracleSwapVenue::load_or_deploy(
            &env,
            OracleSwapVenueInitArgs {
                oracle: oracle.address().clone(),
                haircut_bps: 50,
            },
            container,
            300_000_000_000
        )?;

        Ok(())
    }
}

/// Deploys the complete shared infrastructure.
pub struct ProtocolDeployScript;

impl DeployScript for ProtocolDeployScript {
    fn deploy(
        &self,
        env: &HostEnv,
        container: &mut DeployedContractsContainer
    ) -> Result<(), odra_cli::deploy::Error> {
        LedgerDeployScript.deploy(env, container)?;
        MarketDeployScript.deploy(env, container)?;
        Ok(())
    }
}

/// Deploys a collateral vault for one asset and registers it with the ledger.
pub struct AddVaultScenario;

impl Scenario for AddVaultScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![CommandArg::new(
            "collateral_asset",
            "Address of the CEP-18 collateral token",
            NamedCLType::Key,
        )]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        use unified_lending::lending::vault::CollateralVaultInitArgs;

        let mut ledger = container.contract_ref::<LiquidityLedger>(env)?;
        let oracle = container.contract_ref::<PriceOracle>(env)?;
        let venue = container.contract_ref::<OracleSwapVenue>(env)?;
        let base_asset = container.contract_ref::<FaucetToken>(env)?;
        let collateral_asset = args.get_single::<Address>("collateral_asset")?;

        env.set_gas(800_000_000_000);
        let vault = CollateralVault::try_deploy(
            env,
            CollateralVaultInitArgs {
                ledger: ledger.address().clone(),
                oracle: oracle.address().clone(),
                swap_venue: venue.address().clone(),
                base_asset: base_asset.address().clone(),
                collateral_asset,
                max_ltv_bps: MAX_LTV_BPS,
                liquidation_threshold_bps: LIQUIDATION_THRESHOLD_BPS,
                liquidation_penalty_bps: LIQUIDATION_PENALTY_BPS,
                slippage_bps: SLIPPAGE_BPS,
                liquidation_vault_share_bps: LIQUIDATION_VAULT_SHARE_BPS,
                liquidation_protocol_share_bps: LIQUIDATION_PROTOCOL_SHARE_BPS,
                liquidation_lender_share_bps: LIQUIDATION_LENDER_SHARE_BPS,
            },
        )?;

        env.set_gas(100_000_000_000);
        ledger.try_register_vault(
            vault.address().clone(),
            BASE_RATE_BPS,
            MULTIPLIER_BPS,
            JUMP_MULTIPLIER_BPS,
            KINK_BPS,
            LENDER_SHARE_BPS,
            VAULT_FEE_BPS,
            PROTOCOL_FEE_BPS,
        )?;

        println!("Vault deployed and registered: {:?}", vault.address());
        Ok(())
    }
}

impl ScenarioMetadata for AddVaultScenario {
    const NAME: &'static str = "add-vault";
    const DESCRIPTION: &'static str = "Deploys a collateral vault and registers it with the ledger";
}

/// Opens the pool once the launch timestamp has passed.
pub struct ActivateLaunchScenario;

impl Scenario for ActivateLaunchScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        _args: Args
    ) -> Result<(), Error> {
        let mut ledger = container.contract_ref::<LiquidityLedger>(env)?;

        env.set_gas(50_000_000_000);
        ledger.try_activate_launch()?;

        println!("Launch activated");
        Ok(())
    }
}

impl ScenarioMetadata for ActivateLaunchScenario {
    const NAME: &'static str = "activate-launch";
    const DESCRIPTION: &'static str = "Activates the launch of the liquidity ledger";
}

/// Converts queued pre-launch deposits into receipt tokens.
pub struct ProcessPreLaunchScenario;

impl Scenario for ProcessPreLaunchScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![CommandArg::new(
            "max_entries",
            "Maximum number of queue entries to process",
            NamedCLType::U32,
        )]
    }

    fn run(
        &self,
        env: &HostEnv,
        container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let mut ledger = container.contract_ref::<LiquidityLedger>(env)?;
        let max_entries = args.get_single::<u32>("max_entries")?;

        env.set_gas(400_000_000_000);
        let processed = ledger.try_process_pre_launch_deposits(max_entries)?;

        println!(
            "Processed {} entries, {} remaining",
            processed,
            ledger.get_unprocessed_pre_launch_deposits().len()
        );
        Ok(())
    }
}

impl ScenarioMetadata for ProcessPreLaunchScenario {
    const NAME: &'static str = "process-pre-launch";
    const DESCRIPTION: &'static str = "Processes a batch of queued pre-launch deposits";
}

/// Keeper run: liquidates the first unhealthy position of a vault.
pub struct LiquidateFirstScenario;

impl Scenario for LiquidateFirstScenario {
    fn args(&self) -> Vec<CommandArg> {
        vec![CommandArg::new(
            "vault",
            "Address of the collateral vault",
            NamedCLType::Key,
        )]
    }

    fn run(
        &self,
        env: &HostEnv,
        _container: &DeployedContractsContainer,
        args: Args
    ) -> Result<(), Error> {
        let vault_address = args.get_single::<Address>("vault")?;
        let mut vault =
            <CollateralVaultHostRef as odra::host::HostRef>::new(vault_address, env.clone());

        let Some(borrower) = vault.get_first_liquidatable_position() else {
            println!("No liquidatable positions");
            return Ok(());
        };

        env.set_gas(500_000_000_000);
        let plan = vault.try_liquidate(borrower)?;

        println!(
            "Liquidated {:?}: proceeds {}, shortfall {}, refund {}",
            borrower, plan.proceeds, plan.shortfall, plan.borrower_refund
        );
        Ok(())
    }
}

impl ScenarioMetadata for LiquidateFirstScenario {
    const NAME: &'static str = "liquidate-first";
    const DESCRIPTION: &'static str = "Liquidates the first liquidatable position of a vault";
}

/// Main function to run the CLI tool.
pub fn main() {
    OdraCli::new()
        .about("CLI tool for the unified lending contracts")
        // Deploy scripts
        .deploy(LedgerDeployScript)
        .deploy(MarketDeployScript)
        .deploy(ProtocolDeployScript)
        // Contract references
        .contract::<FaucetToken>()
        .contract::<ExchangeRateToken>()
        .contract::<LiquidityLedger>()
        .contract::<PriceOracle>()
        .contract::<OracleSwapVenue>()
        // Scenarios
        .scenario(AddVaultScenario)
        .scenario(ActivateLaunchScenario)
        .scenario(ProcessPreLaunchScenario)
        .scenario(LiquidateFirstScenario)
        .build()
        .run();
}
