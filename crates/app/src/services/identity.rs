//! Users, roles and permissions.

use tallyforge_auth::{
    Action, NewRole, NewUser, Permission, Role, RoleUpdate, User, UserFilter, UserUpdate, resources,
};
use tallyforge_core::{Page, RoleId, UserId};
use tallyforge_events::{EventBus, EventEnvelope};

use crate::app::{App, Required, needs};
use crate::context::RequestContext;
use crate::errors::AppResult;

impl<B> App<B>
where
    B: EventBus<EventEnvelope>,
{
    // ─────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_user(&self, ctx: &RequestContext, new: NewUser) -> AppResult<User> {
        self.execute(ctx, needs(resources::USERS, Action::Create), |books, _| {
            Ok(books.directory.create_user(new, ctx.now)?)
        })
    }

    pub fn get_user(&self, ctx: &RequestContext, id: UserId) -> AppResult<User> {
        self.query(ctx, needs(resources::USERS, Action::Read), |books| {
            Ok(books.directory.user(id)?.clone())
        })
    }

    pub fn update_user(&self, ctx: &RequestContext, id: UserId, update: UserUpdate) -> AppResult<User> {
        self.execute(ctx, needs(resources::USERS, Action::Update), |books, _| {
            Ok(books.directory.update_user(id, update, ctx.now)?)
        })
    }

    pub fn delete_user(&self, ctx: &RequestContext, id: UserId) -> AppResult<()> {
        self.execute(ctx, needs(resources::USERS, Action::Delete), |books, principal| {
            Ok(books.directory.delete_user(id, principal.user_id, ctx.now)?)
        })
    }

    /// `page_size` falls back to the configured default and is capped at
    /// the configured maximum.
    pub fn list_users(
        &self,
        ctx: &RequestContext,
        filter: &UserFilter,
        page: u32,
        page_size: Option<u32>,
    ) -> AppResult<Page<User>> {
        let request = self.settings().page_request(page, page_size);
        self.query(ctx, needs(resources::USERS, Action::Read), |books| {
            Ok(books.directory.list_users(filter, request))
        })
    }

    /// Stamp a successful sign-in for the acting user.
    pub fn record_login(&self, ctx: &RequestContext) -> AppResult<()> {
        self.execute(ctx, Required::Member, |books, principal| {
            Ok(books.directory.record_login(principal.user_id, ctx.now)?)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_role(&self, ctx: &RequestContext, new: NewRole) -> AppResult<Role> {
        self.execute(ctx, Required::Admin, |books, _| {
            Ok(books.directory.create_role(new, ctx.now)?)
        })
    }

    pub fn get_role(&self, ctx: &RequestContext, id: RoleId) -> AppResult<Role> {
        self.query(ctx, needs(resources::ROLES, Action::Read), |books| {
            Ok(books.directory.role(id)?.clone())
        })
    }

    pub fn list_roles(&self, ctx: &RequestContext) -> AppResult<Vec<Role>> {
        self.query(ctx, needs(resources::ROLES, Action::Read), |books| {
            Ok(books.directory.list_roles().into_iter().cloned().collect())
        })
    }

    pub fn update_role(&self, ctx: &RequestContext, id: RoleId, update: RoleUpdate) -> AppResult<Role> {
        self.execute(ctx, Required::Admin, |books, _| {
            Ok(books.directory.update_role(id, update, ctx.now)?)
        })
    }

    pub fn delete_role(&self, ctx: &RequestContext, id: RoleId) -> AppResult<()> {
        self.execute(ctx, Required::Admin, |books, _| Ok(books.directory.delete_role(id)?))
    }

    pub fn grant_permission(
        &self,
        ctx: &RequestContext,
        role_id: RoleId,
        permission: Permission,
    ) -> AppResult<Role> {
        self.execute(ctx, Required::Admin, |books, _| {
            books.directory.grant_permission(role_id, permission, ctx.now)?;
            Ok(books.directory.role(role_id)?.clone())
        })
    }

    pub fn revoke_permission(
        &self,
        ctx: &RequestContext,
        role_id: RoleId,
        permission: &Permission,
    ) -> AppResult<Role> {
        self.execute(ctx, Required::Admin, |books, _| {
            books.directory.revoke_permission(role_id, permission, ctx.now)?;
            Ok(books.directory.role(role_id)?.clone())
        })
    }

    pub fn assign_role(&self, ctx: &RequestContext, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.execute(ctx, Required::Admin, |books, principal| {
            Ok(books.directory.assign_role(principal, user_id, role_id)?)
        })
    }

    pub fn revoke_role(&self, ctx: &RequestContext, user_id: UserId, role_id: RoleId) -> AppResult<()> {
        self.execute(ctx, Required::Admin, |books, _| {
            Ok(books.directory.revoke_role(user_id, role_id)?)
        })
    }

    pub fn roles_of(&self, ctx: &RequestContext, user_id: UserId) -> AppResult<Vec<Role>> {
        self.query(ctx, needs(resources::ROLES, Action::Read), |books| {
            books.directory.user(user_id)?;
            Ok(books.directory.roles_of(user_id).into_iter().cloned().collect())
        })
    }
}
