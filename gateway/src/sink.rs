//! The downstream authorization seam.
//!
//! Role grants, revocations, and user notifications all flow through
//! one trait so the sync engine never knows what platform sits behind it.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use siglink_types::{IdentityId, RoleId};

use crate::error::SinkError;

/// Applies tier-role changes and delivers notices to identities.
pub trait AuthorizationSink: Send + Sync {
    /// Tier roles the identity currently holds downstream.
    fn roles_of<'a>(
        &'a self,
        identity: &'a IdentityId,
    ) -> BoxFuture<'a, Result<Vec<RoleId>, SinkError>>;

    fn grant_role<'a>(
        &'a self,
        identity: &'a IdentityId,
        role: &'a RoleId,
    ) -> BoxFuture<'a, Result<(), SinkError>>;

    fn revoke_role<'a>(
        &'a self,
        identity: &'a IdentityId,
        role: &'a RoleId,
    ) -> BoxFuture<'a, Result<(), SinkError>>;

    /// Best-effort user-facing notice. Failures are logged by callers,
    /// never treated as fatal.
    fn notify<'a>(
        &'a self,
        identity: &'a IdentityId,
        message: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>>;
}

/// Sink that records nothing and grants nothing, only logs.
///
/// Useful when running the service without a downstream platform
/// attached, and as the default wiring in development.
pub struct LogSink;

impl AuthorizationSink for LogSink {
    fn roles_of<'a>(
        &'a self,
        _identity: &'a IdentityId,
    ) -> BoxFuture<'a, Result<Vec<RoleId>, SinkError>> {
        async { Ok(Vec::new()) }.boxed()
    }

    fn grant_role<'a>(
        &'a self,
        identity: &'a IdentityId,
        role: &'a RoleId,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        async move {
            tracing::info!(identity = %identity, role = role.as_str(), "role granted");
            Ok(())
        }
        .boxed()
    }

    fn revoke_role<'a>(
        &'a self,
        identity: &'a IdentityId,
        role: &'a RoleId,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        async move {
            tracing::info!(identity = %identity, role = role.as_str(), "role revoked");
            Ok(())
        }
        .boxed()
    }

    fn notify<'a>(
        &'a self,
        identity: &'a IdentityId,
        message: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        async move {
            tracing::info!(identity = %identity, message, "notice");
            Ok(())
        }
        .boxed()
    }
}
