//! Nullable authorization sink — record role changes without applying them.

use std::collections::HashMap;
use std::sync::Mutex;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use siglink_gateway::{AuthorizationSink, SinkError};
use siglink_types::{IdentityId, RoleId};

#[derive(Default)]
struct Inner {
    roles: HashMap<IdentityId, Vec<RoleId>>,
    grants: Vec<(IdentityId, RoleId)>,
    revokes: Vec<(IdentityId, RoleId)>,
    notices: Vec<(IdentityId, String)>,
    down: Option<String>,
}

/// A test sink that tracks held roles in memory and records every call.
pub struct NullSink {
    inner: Mutex<Inner>,
}

impl NullSink {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seed the roles an identity already holds.
    pub fn seed_roles(&self, identity: IdentityId, roles: Vec<RoleId>) {
        self.inner.lock().unwrap().roles.insert(identity, roles);
    }

    /// Make every call fail.
    pub fn go_down(&self, message: &str) {
        self.inner.lock().unwrap().down = Some(message.to_string());
    }

    pub fn grants(&self) -> Vec<(IdentityId, RoleId)> {
        self.inner.lock().unwrap().grants.clone()
    }

    pub fn revokes(&self) -> Vec<(IdentityId, RoleId)> {
        self.inner.lock().unwrap().revokes.clone()
    }

    pub fn notices(&self) -> Vec<(IdentityId, String)> {
        self.inner.lock().unwrap().notices.clone()
    }

    /// Roles the identity holds after all recorded grants and revokes.
    pub fn held_roles(&self, identity: &IdentityId) -> Vec<RoleId> {
        self.inner
            .lock()
            .unwrap()
            .roles
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthorizationSink for NullSink {
    fn roles_of<'a>(
        &'a self,
        identity: &'a IdentityId,
    ) -> BoxFuture<'a, Result<Vec<RoleId>, SinkError>> {
        let result = {
            let inner = self.inner.lock().unwrap();
            match &inner.down {
                Some(message) => Err(SinkError::Unavailable(message.clone())),
                None => Ok(inner.roles.get(identity).cloned().unwrap_or_default()),
            }
        };
        async move { result }.boxed()
    }

    fn grant_role<'a>(
        &'a self,
        identity: &'a IdentityId,
        role: &'a RoleId,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        let result = {
            let mut inner = self.inner.lock().unwrap();
            match &inner.down {
                Some(message) => Err(SinkError::Unavailable(message.clone())),
                None => {
                    let held = inner.roles.entry(identity.clone()).or_default();
                    if !held.contains(role) {
                        held.push(role.clone());
                    }
                    inner.grants.push((identity.clone(), role.clone()));
                    Ok(())
                }
            }
        };
        async move { result }.boxed()
    }

    fn revoke_role<'a>(
        &'a self,
        identity: &'a IdentityId,
        role: &'a RoleId,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        let result = {
            let mut inner = self.inner.lock().unwrap();
            match &inner.down {
                Some(message) => Err(SinkError::Unavailable(message.clone())),
                None => {
                    if let Some(held) = inner.roles.get_mut(identity) {
                        held.retain(|r| r != role);
                    }
                    inner.revokes.push((identity.clone(), role.clone()));
                    Ok(())
                }
            }
        };
        async move { result }.boxed()
    }

    fn notify<'a>(
        &'a self,
        identity: &'a IdentityId,
        message: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        let result = {
            let mut inner = self.inner.lock().unwrap();
            match &inner.down {
                Some(msg) => Err(SinkError::Unavailable(msg.clone())),
                None => {
                    inner
                        .notices
                        .push((identity.clone(), message.to_string()));
                    Ok(())
                }
            }
        };
        async move { result }.boxed()
    }
}
