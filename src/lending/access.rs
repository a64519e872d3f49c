//! Owner and pause-flag configuration shared by the ledger and the vaults.
//!
//! Each contract stores one `AdminConfig` record; every owner-gated setter and
//! every flag check goes through the methods below.

use odra::prelude::*;
use super::errors::LendingError;

/// Owner plus the operational switches core operations must respect
#[odra::odra_type]
pub struct AdminConfig {
    /// Account allowed to change configuration
    pub owner: Address,
    /// Blocks new borrows
    pub borrowing_paused: bool,
    /// Blocks liquidations
    pub liquidations_paused: bool,
    /// Blocks everything except repayments and withdrawals of own funds
    pub emergency_mode: bool,
}

impl AdminConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            borrowing_paused: false,
            liquidations_paused: false,
            emergency_mode: false,
        }
    }

    pub fn ensure_owner(&self, caller: Address) -> Result<(), LendingError> {
        if caller != self.owner {
            return Err(LendingError::Unauthorized);
        }
        Ok(())
    }

    pub fn ensure_not_emergency(&self) -> Result<(), LendingError> {
        if self.emergency_mode {
            return Err(LendingError::EmergencyMode);
        }
        Ok(())
    }

    /// Emergency mode wins over the borrowing pause
    pub fn ensure_borrowing_allowed(&self) -> Result<(), LendingError> {
        self.ensure_not_emergency()?;
        if self.borrowing_paused {
            return Err(LendingError::Paused);
        }
        Ok(())
    }

    pub fn ensure_liquidations_allowed(&self) -> Result<(), LendingError> {
        self.ensure_not_emergency()?;
        if self.liquidations_paused {
            return Err(LendingError::LiquidationsPaused);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odra::host::HostEnv;

    fn accounts() -> (HostEnv, Address, Address) {
        let env = odra_test::env();
        let owner = env.get_account(0);
        let other = env.get_account(1);
        (env, owner, other)
    }

    #[test]
    fn test_owner_check() {
        let (_, owner, other) = accounts();
        let config = AdminConfig::new(owner);
        assert!(config.ensure_owner(owner).is_ok());
        assert!(matches!(config.ensure_owner(other), Err(LendingError::Unauthorized)));
    }

    #[test]
    fn test_flag_precedence() {
        let (_, owner, _) = accounts();
        let mut config = AdminConfig::new(owner);
        assert!(config.ensure_borrowing_allowed().is_ok());
        assert!(config.ensure_liquidations_allowed().is_ok());

        config.borrowing_paused = true;
        assert!(matches!(config.ensure_borrowing_allowed(), Err(LendingError::Paused)));
        assert!(config.ensure_liquidations_allowed().is_ok());

        config.liquidations_paused = true;
        assert!(matches!(
            config.ensure_liquidations_allowed(),
            Err(LendingError::LiquidationsPaused)
        ));

        config.emergency_mode = true;
        assert!(matches!(config.ensure_borrowing_allowed(), Err(LendingError::EmergencyMode)));
        assert!(matches!(
            config.ensure_liquidations_allowed(),
            Err(LendingError::EmergencyMode)
        ));
    }
}
