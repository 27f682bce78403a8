//! Built-in system roles seeded into every new tenant.

use crate::permissions::{Action, Permission, resources};
use crate::role::{ADMIN_ROLE, NewRole};

pub const MANAGER_ROLE: &str = "manager";
pub const USER_ROLE: &str = "user";
pub const VIEWER_ROLE: &str = "viewer";

fn grants(resources: &[&'static str], actions: &[Action]) -> Vec<Permission> {
    resources
        .iter()
        .flat_map(|r| actions.iter().map(move |a| Permission::new(*r, *a)))
        .collect()
}

/// Definitions for `admin`, `manager`, `user` and `viewer`.
pub fn system_roles() -> Vec<NewRole> {
    let mut manager = grants(
        resources::BUSINESS,
        &[Action::Create, Action::Read, Action::Update, Action::Export],
    );
    manager.extend(grants(&[resources::USERS, resources::ROLES], &[Action::Read]));

    vec![
        NewRole {
            name: ADMIN_ROLE.to_string(),
            description: Some("Full access to every resource in the tenant".to_string()),
            permissions: vec![Permission::all()],
        },
        NewRole {
            name: MANAGER_ROLE.to_string(),
            description: Some("Manage business records and read team membership".to_string()),
            permissions: manager,
        },
        NewRole {
            name: USER_ROLE.to_string(),
            description: Some("Day-to-day data entry".to_string()),
            permissions: grants(
                resources::BUSINESS,
                &[Action::Create, Action::Read, Action::Update],
            ),
        },
        NewRole {
            name: VIEWER_ROLE.to_string(),
            description: Some("Read-only access".to_string()),
            permissions: grants(resources::BUSINESS, &[Action::Read]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_cannot_write() {
        let roles = system_roles();
        let viewer = roles.iter().find(|r| r.name == VIEWER_ROLE).unwrap();
        let update = Permission::new(resources::INVOICES, Action::Update);
        assert!(!viewer.permissions.iter().any(|p| p.grants(&update)));
    }

    #[test]
    fn manager_cannot_manage_users() {
        let roles = system_roles();
        let manager = roles.iter().find(|r| r.name == MANAGER_ROLE).unwrap();
        let create_user = Permission::new(resources::USERS, Action::Create);
        let read_user = Permission::new(resources::USERS, Action::Read);
        assert!(!manager.permissions.iter().any(|p| p.grants(&create_user)));
        assert!(manager.permissions.iter().any(|p| p.grants(&read_user)));
    }
}
