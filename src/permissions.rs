//! Capability registry consulted by the ledger before privileged mutations

use odra::prelude::*;

/// Privileged ledger actions
#[odra::odra_type]
pub enum Action {
    ChangeLockTime = 0,
    ChangeMaxLocks = 1,
    ChangeVault = 2,
    AdjustBalance = 3,
}

pub mod events {
    use super::Action;
    use odra::prelude::*;

    #[odra::event]
    pub struct ActionGranted {
        pub action: Action,
        pub account: Address,
    }

    #[odra::event]
    pub struct ActionRevoked {
        pub action: Action,
        pub account: Address,
    }

    #[odra::event]
    pub struct OwnershipTransferred {
        pub previous_owner: Address,
        pub new_owner: Address,
    }
}

#[odra::odra_error]
pub enum PermissionError {
    NotOwner = 62001,
}

/// Owner-managed grants of [`Action`]s to accounts
#[odra::module(
    events = [events::ActionGranted, events::ActionRevoked, events::OwnershipTransferred],
    errors = PermissionError
)]
pub struct Permissions {
    owner: Var<Address>,
    grants: Mapping<(Action, Address), bool>,
}

#[odra::module]
impl Permissions {
    /// The deployer becomes the owner
    pub fn init(&mut self) {
        self.owner.set(self.env().caller());
    }

    pub fn grant(&mut self, action: Action, account: Address) {
        self.require_owner();
        self.grants.set(&(action.clone(), account), true);
        self.env().emit_event(events::ActionGranted { action, account });
    }

    pub fn revoke(&mut self, action: Action, account: Address) {
        self.require_owner();
        self.grants.set(&(action.clone(), account), false);
        self.env().emit_event(events::ActionRevoked { action, account });
    }

    /// Whether `caller` may perform `action`
    pub fn authorize(&self, caller: Address, action: Action) -> bool {
        self.grants.get(&(action, caller)).unwrap_or_default()
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.require_owner();
        let previous_owner = self.env().caller();
        self.owner.set(new_owner);
        self.env().emit_event(events::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner.get()
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(PermissionError::NotOwner);
        }
    }
}
