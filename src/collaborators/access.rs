// Role-based access policies

use std::collections::HashMap;

use super::traits::AccessPolicy;
use crate::workflows::types::{Actor, BranchId, Role, WorkflowAction};

/// Permits everything. For tests and local scenarios.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn permits(&self, _actor: &Actor, _action: WorkflowAction, _branch: &BranchId) -> bool {
        true
    }
}

/// Permission matrix by role, combined with the actor's branch scope
#[derive(Debug, Clone)]
pub struct RoleTable {
    grants: HashMap<Role, Vec<WorkflowAction>>,
}

impl Default for RoleTable {
    fn default() -> Self {
        use WorkflowAction::*;

        let mut grants = HashMap::new();
        grants.insert(
            Role::BranchStaff,
            vec![SubmitRequisition, RequestRelease, RequestDisposal],
        );
        grants.insert(
            Role::BranchManager,
            vec![
                SubmitRequisition,
                RequestRelease,
                RequestDisposal,
                DispatchTransfer,
                CancelTransfer,
            ],
        );
        grants.insert(
            Role::CentralAdmin,
            vec![
                SubmitRequisition,
                DecideRequisition,
                DispatchTransfer,
                CancelTransfer,
                RequestRelease,
                AuthorizeRelease,
                RequestDisposal,
                AuthorizeDisposal,
            ],
        );
        grants.insert(Role::Keeper, vec![ConfirmKeeperReceipt]);
        grants.insert(Role::Controller, vec![ConfirmControllerVerification]);
        Self { grants }
    }
}

impl RoleTable {
    pub fn empty() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    pub fn grant(mut self, role: Role, action: WorkflowAction) -> Self {
        let actions = self.grants.entry(role).or_default();
        if !actions.contains(&action) {
            actions.push(action);
        }
        self
    }

    pub fn allows(&self, role: Role, action: WorkflowAction) -> bool {
        self.grants
            .get(&role)
            .map(|actions| actions.contains(&action))
            .unwrap_or(false)
    }
}

impl AccessPolicy for RoleTable {
    fn permits(&self, actor: &Actor, action: WorkflowAction, branch: &BranchId) -> bool {
        self.allows(actor.role, action) && actor.scope.covers(branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeper_limited_to_own_branch() {
        let policy = RoleTable::default();
        let keeper = Actor::at_branch("sam", Role::Keeper, "BR001");

        assert!(policy.permits(&keeper, WorkflowAction::ConfirmKeeperReceipt, &BranchId::new("BR001")));
        assert!(!policy.permits(&keeper, WorkflowAction::ConfirmKeeperReceipt, &BranchId::new("BR002")));
        assert!(!policy.permits(
            &keeper,
            WorkflowAction::ConfirmControllerVerification,
            &BranchId::new("BR001")
        ));
    }

    #[test]
    fn test_only_central_admin_decides() {
        let policy = RoleTable::default();
        let manager = Actor::central("lee", Role::BranchManager);
        let admin = Actor::central("hq-admin", Role::CentralAdmin);
        let branch = BranchId::new("BR001");

        assert!(!policy.permits(&manager, WorkflowAction::DecideRequisition, &branch));
        assert!(policy.permits(&admin, WorkflowAction::DecideRequisition, &branch));
        assert!(policy.permits(&admin, WorkflowAction::AuthorizeDisposal, &branch));
    }

    #[test]
    fn test_custom_grant() {
        let policy = RoleTable::empty().grant(Role::BranchStaff, WorkflowAction::RequestRelease);
        assert!(policy.allows(Role::BranchStaff, WorkflowAction::RequestRelease));
        assert!(!policy.allows(Role::BranchStaff, WorkflowAction::RequestDisposal));
    }
}
