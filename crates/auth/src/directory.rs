//! Per-tenant identity state: users, roles and who holds which role.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use tallyforge_core::{
    DomainError, DomainResult, Page, PageRequest, RoleId, Table, TenantId, UserId,
};

use crate::defaults::system_roles;
use crate::events::{IdentityEvent, UserCreated, UserDeleted, UserUpdated};
use crate::permissions::Permission;
use crate::principal::Principal;
use crate::role::{NewRole, Role, RoleUpdate, validate_role_name};
use crate::user::{NewUser, User, UserFilter, UserUpdate, normalize_email};

#[derive(Debug, Clone)]
pub struct Directory {
    tenant_id: TenantId,
    users: Table<User>,
    roles: Table<Role>,
    assignments: BTreeSet<(UserId, RoleId)>,
    events: Vec<IdentityEvent>,
}

impl Directory {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            users: Table::new(),
            roles: Table::new(),
            assignments: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Drain events raised since the last call.
    pub fn take_events(&mut self) -> Vec<IdentityEvent> {
        std::mem::take(&mut self.events)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_user(&mut self, new: NewUser, now: DateTime<Utc>) -> DomainResult<User> {
        let email = normalize_email(&new.email)?;
        if self.user_by_email(&email).is_some() {
            return Err(DomainError::conflict(format!(
                "user with email {email} already exists"
            )));
        }

        let user = User::new(self.tenant_id, new, now)?;
        self.events.push(IdentityEvent::UserCreated(UserCreated {
            user_id: user.id,
            email: user.email.clone(),
            occurred_at: now,
        }));
        self.users.insert(user.clone());
        Ok(user)
    }

    /// Live (not soft-deleted) user by id.
    pub fn user(&self, id: UserId) -> DomainResult<&User> {
        match self.users.get(id) {
            Some(user) if !user.is_deleted() => Ok(user),
            _ => Err(DomainError::not_found("user", id)),
        }
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim().to_lowercase();
        self.users
            .iter()
            .find(|u| !u.is_deleted() && u.email == email)
    }

    pub fn update_user(
        &mut self,
        id: UserId,
        update: UserUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<User> {
        self.user(id)?;
        let user = self.users.require_mut(id)?;
        user.apply_update(update, now)?;
        let user = user.clone();
        self.events.push(IdentityEvent::UserUpdated(UserUpdated {
            user_id: id,
            is_active: user.is_active,
            occurred_at: now,
        }));
        Ok(user)
    }

    pub fn delete_user(&mut self, id: UserId, by: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        self.user(id)?;
        self.users.require_mut(id)?.soft_delete(by, now)?;
        self.assignments.retain(|(user_id, _)| *user_id != id);
        info!(tenant_id = %self.tenant_id, user_id = %id, deleted_by = %by, "user deleted");
        self.events.push(IdentityEvent::UserDeleted(UserDeleted {
            user_id: id,
            deleted_by: by,
            occurred_at: now,
        }));
        Ok(())
    }

    pub fn record_login(&mut self, id: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        self.user(id)?;
        self.users.require_mut(id)?.last_login_at = Some(now);
        Ok(())
    }

    /// Newest first, excluding soft-deleted users.
    pub fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Page<User> {
        let rows = self
            .users
            .select(|u| u.matches(filter), |a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        page.paginate(rows.into_iter().cloned().collect())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────

    /// Insert the built-in roles. Existing roles with the same name are kept.
    pub fn seed_system_roles(&mut self, now: DateTime<Utc>) -> DomainResult<Vec<RoleId>> {
        let mut ids = Vec::new();
        for definition in system_roles() {
            if let Some(existing) = self.role_by_name(&definition.name) {
                ids.push(existing.id);
                continue;
            }
            let role = Role::new(self.tenant_id, definition, true, now)?;
            ids.push(role.id);
            self.roles.insert(role);
        }
        Ok(ids)
    }

    pub fn create_role(&mut self, new: NewRole, now: DateTime<Utc>) -> DomainResult<Role> {
        let name = validate_role_name(&new.name)?;
        if self.role_by_name(&name).is_some() {
            return Err(DomainError::conflict(format!("role '{name}' already exists")));
        }
        let role = Role::new(self.tenant_id, new, false, now)?;
        self.roles.insert(role.clone());
        Ok(role)
    }

    pub fn role(&self, id: RoleId) -> DomainResult<&Role> {
        self.roles.require(id)
    }

    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn list_roles(&self) -> Vec<&Role> {
        self.roles.select(|_| true, |a, b| a.name.cmp(&b.name))
    }

    pub fn update_role(
        &mut self,
        id: RoleId,
        update: RoleUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<Role> {
        let current = self.roles.require(id)?;
        let rename = match update.name {
            Some(name) => {
                let name = validate_role_name(&name)?;
                if name == current.name {
                    None
                } else if current.is_system {
                    return Err(DomainError::forbidden("system roles cannot be renamed"));
                } else if self.role_by_name(&name).is_some() {
                    return Err(DomainError::conflict(format!("role '{name}' already exists")));
                } else {
                    Some(name)
                }
            }
            None => None,
        };

        let role = self.roles.require_mut(id)?;
        if let Some(name) = rename {
            role.name = name;
        }
        if update.description.is_some() {
            role.description = update.description;
        }
        if let Some(permissions) = update.permissions {
            role.permissions = permissions.into_iter().collect();
        }
        role.updated_at = now;
        Ok(role.clone())
    }

    pub fn delete_role(&mut self, id: RoleId) -> DomainResult<()> {
        if self.roles.require(id)?.is_system {
            return Err(DomainError::forbidden("system roles cannot be deleted"));
        }
        if let Some(role) = self.roles.remove(id) {
            info!(tenant_id = %self.tenant_id, role = %role.name, "role deleted");
        }
        self.assignments.retain(|(_, role_id)| *role_id != id);
        Ok(())
    }

    pub fn grant_permission(
        &mut self,
        role_id: RoleId,
        permission: Permission,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.roles.require_mut(role_id)?.grant(permission, now)
    }

    pub fn revoke_permission(
        &mut self,
        role_id: RoleId,
        permission: &Permission,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.roles.require_mut(role_id)?.revoke(permission, now)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Assignments
    // ─────────────────────────────────────────────────────────────────────

    /// Assign a role to a user on behalf of `actor`.
    ///
    /// Non-admin actors may only hand out roles they hold themselves.
    pub fn assign_role(
        &mut self,
        actor: &Principal,
        user_id: UserId,
        role_id: RoleId,
    ) -> DomainResult<()> {
        if actor.tenant_id != self.tenant_id {
            return Err(DomainError::Unauthorized);
        }
        let user = self.user(user_id)?;
        if !user.is_active {
            return Err(DomainError::conflict("cannot assign roles to an inactive user"));
        }
        let role = self.roles.require(role_id)?;
        if !actor.is_admin() && !actor.has_role(&role.name) {
            warn!(
                tenant_id = %self.tenant_id,
                actor = %actor.user_id,
                role = %role.name,
                "role assignment refused: actor does not hold the role"
            );
            return Err(DomainError::forbidden(format!(
                "privilege escalation: cannot assign role '{}' you do not hold",
                role.name
            )));
        }
        if !self.assignments.insert((user_id, role_id)) {
            return Err(DomainError::conflict(format!(
                "user already has role '{}'",
                role.name
            )));
        }
        info!(
            tenant_id = %self.tenant_id,
            user_id = %user_id,
            role = %role.name,
            "role assigned"
        );
        Ok(())
    }

    pub fn revoke_role(&mut self, user_id: UserId, role_id: RoleId) -> DomainResult<()> {
        if !self.assignments.remove(&(user_id, role_id)) {
            return Err(DomainError::not_found("role assignment", role_id));
        }
        Ok(())
    }

    pub fn roles_of(&self, user_id: UserId) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self
            .assignments
            .range((user_id, RoleId::from_uuid(uuid::Uuid::nil()))..)
            .take_while(|(u, _)| *u == user_id)
            .filter_map(|(_, role_id)| self.roles.get(*role_id))
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// Resolve the acting user into a [`Principal`].
    ///
    /// Unknown, deleted and deactivated users are `Unauthorized`.
    pub fn principal_for(&self, user_id: UserId) -> DomainResult<Principal> {
        let user = match self.users.get(user_id) {
            Some(user) if user.can_act() => user,
            _ => return Err(DomainError::Unauthorized),
        };
        let roles = self.roles_of(user_id);
        let mut permissions: BTreeSet<Permission> = BTreeSet::new();
        for role in &roles {
            permissions.extend(role.permissions.iter().cloned());
        }
        Ok(Principal {
            user_id,
            tenant_id: self.tenant_id,
            is_superuser: user.is_superuser,
            roles: roles.iter().map(|r| r.name.clone()).collect(),
            permissions: permissions.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{MANAGER_ROLE, VIEWER_ROLE};
    use crate::permissions::{Action, resources};
    use crate::role::ADMIN_ROLE;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn seeded() -> Directory {
        let mut dir = Directory::new(TenantId::new());
        dir.seed_system_roles(now()).unwrap();
        dir
    }

    fn add_user(dir: &mut Directory, email: &str) -> UserId {
        dir.create_user(
            NewUser {
                email: email.to_string(),
                ..Default::default()
            },
            now(),
        )
        .unwrap()
        .id
    }

    fn role_id(dir: &Directory, name: &str) -> RoleId {
        dir.role_by_name(name).unwrap().id
    }

    fn admin_principal(dir: &mut Directory) -> Principal {
        let admin = add_user(dir, "admin@example.com");
        let admin_role = role_id(dir, ADMIN_ROLE);
        dir.assignments.insert((admin, admin_role));
        dir.principal_for(admin).unwrap()
    }

    #[test]
    fn duplicate_email_conflicts_case_insensitively() {
        let mut dir = seeded();
        add_user(&mut dir, "ops@example.com");
        let err = dir
            .create_user(
                NewUser {
                    email: "OPS@example.com".to_string(),
                    ..Default::default()
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn create_user_raises_event() {
        let mut dir = seeded();
        let id = add_user(&mut dir, "ops@example.com");
        let events = dir.take_events();
        let IdentityEvent::UserCreated(e) = &events[0] else {
            panic!("expected UserCreated, got {:?}", events[0]);
        };
        assert_eq!(e.user_id, id);
        assert!(dir.take_events().is_empty());
    }

    #[test]
    fn deleted_users_disappear_and_lose_access() {
        let mut dir = seeded();
        let admin = admin_principal(&mut dir);
        let victim = add_user(&mut dir, "gone@example.com");
        dir.assign_role(&admin, victim, role_id(&dir, VIEWER_ROLE)).unwrap();

        dir.delete_user(victim, admin.user_id, now()).unwrap();

        assert!(dir.user(victim).is_err());
        assert_eq!(dir.principal_for(victim), Err(DomainError::Unauthorized));
        assert!(dir.roles_of(victim).is_empty());
        assert_eq!(dir.list_users(&UserFilter::default(), PageRequest::default()).total, 1);
    }

    #[test]
    fn list_users_is_newest_first_and_paginated() {
        let mut dir = seeded();
        let start = now();
        for i in 0..25 {
            let new = NewUser {
                email: format!("u{i}@example.com"),
                ..Default::default()
            };
            dir.create_user(new, start + chrono::Duration::seconds(i)).unwrap();
        }
        let page = dir.list_users(&UserFilter::default(), PageRequest::new(2, 20));
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 2);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items.last().unwrap().email, "u0@example.com");
    }

    #[test]
    fn system_roles_cannot_be_deleted_or_renamed() {
        let mut dir = seeded();
        let viewer = role_id(&dir, VIEWER_ROLE);
        assert!(matches!(dir.delete_role(viewer), Err(DomainError::Forbidden(_))));
        let rename = RoleUpdate {
            name: Some("readers".to_string()),
            ..Default::default()
        };
        assert!(matches!(dir.update_role(viewer, rename, now()), Err(DomainError::Forbidden(_))));
    }

    #[test]
    fn custom_role_can_be_deleted_and_drops_assignments() {
        let mut dir = seeded();
        let admin = admin_principal(&mut dir);
        let clerk = dir
            .create_role(
                NewRole {
                    name: "clerk".to_string(),
                    description: None,
                    permissions: vec![Permission::new(resources::INVOICES, Action::Create)],
                },
                now(),
            )
            .unwrap();
        let user = add_user(&mut dir, "clerk@example.com");
        dir.assign_role(&admin, user, clerk.id).unwrap();

        dir.delete_role(clerk.id).unwrap();

        assert!(dir.roles_of(user).is_empty());
    }

    #[test]
    fn non_admin_cannot_assign_roles_they_lack() {
        let mut dir = seeded();
        let admin = admin_principal(&mut dir);
        let manager_user = add_user(&mut dir, "mgr@example.com");
        dir.assign_role(&admin, manager_user, role_id(&dir, MANAGER_ROLE)).unwrap();
        let manager = dir.principal_for(manager_user).unwrap();

        let target = add_user(&mut dir, "new@example.com");
        let err = dir
            .assign_role(&manager, target, role_id(&dir, ADMIN_ROLE))
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        dir.assign_role(&manager, target, role_id(&dir, MANAGER_ROLE)).unwrap();
    }

    #[test]
    fn assigning_twice_conflicts() {
        let mut dir = seeded();
        let admin = admin_principal(&mut dir);
        let user = add_user(&mut dir, "twice@example.com");
        let viewer = role_id(&dir, VIEWER_ROLE);
        dir.assign_role(&admin, user, viewer).unwrap();
        assert!(matches!(
            dir.assign_role(&admin, user, viewer),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn principal_unions_role_permissions() {
        let mut dir = seeded();
        let admin = admin_principal(&mut dir);
        let user = add_user(&mut dir, "multi@example.com");
        dir.assign_role(&admin, user, role_id(&dir, VIEWER_ROLE)).unwrap();
        let p = dir.principal_for(user).unwrap();

        assert!(p.has_permission(&Permission::new(resources::INVOICES, Action::Read)));
        assert!(!p.has_permission(&Permission::new(resources::INVOICES, Action::Create)));
        assert_eq!(p.roles, vec![VIEWER_ROLE.to_string()]);
    }

    #[test]
    fn grant_then_revoke_permission() {
        let mut dir = seeded();
        let viewer = role_id(&dir, VIEWER_ROLE);
        let export = Permission::new(resources::REPORTS, Action::Export);
        dir.grant_permission(viewer, export.clone(), now()).unwrap();
        assert!(matches!(
            dir.grant_permission(viewer, export.clone(), now()),
            Err(DomainError::Conflict(_))
        ));
        dir.revoke_permission(viewer, &export, now()).unwrap();
        assert!(!dir.role(viewer).unwrap().grants(&export));
    }
}
