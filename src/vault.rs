//! Custodial vault for deposit tokens
//!
//! Tokens are transferred in first and then recorded with `deposit`, which
//! refuses to record more than the vault actually holds. Only the operator (the
//! ledger) can move tokens out.

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

use crate::external::DepositTokenServiceContractRef;
use crate::tokens::same_principal;

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct VaultDeposit {
        pub token: Address,
        pub amount: U256,
        pub new_balance: U256,
    }

    #[odra::event]
    pub struct VaultWithdrawal {
        pub token: Address,
        pub amount: U256,
        pub to: Address,
        pub new_balance: U256,
    }

    #[odra::event]
    pub struct OperatorSet {
        pub old_operator: Option<Address>,
        pub new_operator: Address,
    }
}

#[odra::odra_error]
pub enum VaultError {
    ZeroAmount = 63001,
    UnbackedDeposit = 63002,
    InsufficientVaultBalance = 63003,
    Unauthorized = 63004,
}

#[odra::module(
    events = [events::VaultDeposit, events::VaultWithdrawal, events::OperatorSet],
    errors = VaultError
)]
pub struct Vault {
    operator: Var<Address>,
    balances: Mapping<Address, U256>,
}

#[odra::module]
impl Vault {
    pub fn init(&mut self, operator: Address) {
        self.operator.set(operator);
        self.env().emit_event(events::OperatorSet {
            old_operator: None,
            new_operator: operator,
        });
    }

    /// Record `amount` of `token` already transferred to the vault
    pub fn deposit(&mut self, token: Address, amount: U256) {
        if amount.is_zero() {
            self.env().revert(VaultError::ZeroAmount);
        }
        let recorded = self.balances.get(&token).unwrap_or_default();
        let new_balance = recorded + amount;

        let held = DepositTokenServiceContractRef::new(self.env().clone(), token)
            .balance_of(self.env().self_address());
        if held < new_balance {
            self.env().revert(VaultError::UnbackedDeposit);
        }

        self.balances.set(&token, new_balance);
        self.env().emit_event(events::VaultDeposit {
            token,
            amount,
            new_balance,
        });
    }

    /// Send `amount` of `token` to `to` (operator only)
    pub fn withdraw(&mut self, token: Address, amount: U256, to: Address) {
        self.require_operator();
        let recorded = self.balances.get(&token).unwrap_or_default();
        if recorded < amount {
            self.env().revert(VaultError::InsufficientVaultBalance);
        }
        let new_balance = recorded - amount;
        self.balances.set(&token, new_balance);

        if !amount.is_zero() {
            let mut deposit_token = DepositTokenServiceContractRef::new(self.env().clone(), token);
            deposit_token.transfer(to, amount);
        }

        self.env().emit_event(events::VaultWithdrawal {
            token,
            amount,
            to,
            new_balance,
        });
    }

    /// Recorded balance of `token`
    pub fn balance(&self, token: Address) -> U256 {
        self.balances.get(&token).unwrap_or_default()
    }

    pub fn operator(&self) -> Option<Address> {
        self.operator.get()
    }

    /// Hand withdrawal rights to `new_operator` (current operator only)
    pub fn set_operator(&mut self, new_operator: Address) {
        let caller = self.env().caller();
        let current_operator = self.operator.get();
        if current_operator != Some(caller) {
            self.env().revert(VaultError::Unauthorized);
        }
        self.operator.set(new_operator);
        self.env().emit_event(events::OperatorSet {
            old_operator: current_operator,
            new_operator,
        });
    }

    fn require_operator(&self) {
        let caller = self.env().caller();
        let authorized = match self.operator.get() {
            Some(operator) => same_principal(&operator, &caller),
            None => false,
        };
        if !authorized {
            self.env().revert(VaultError::Unauthorized);
        }
    }
}
