//! Caller identity
//!
//! Certificates are verified by the authenticating front-end, which forwards
//! the caller's DN and login in request headers. The middleware here turns
//! those headers into a [`UserIdentity`] stored in the request extensions.
//!
//! The front-end also forwards one `cms-authz-<role>: group:<g> site:<s>`
//! header per role the caller holds. When `authz_defaults` names a role,
//! group or site, a matching role header is required.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use gridflow_core::UserIdentity;

use crate::api::errors::ApiError;
use crate::config::AuthzDefaults;
use crate::error::ServerError;
use crate::server::WorkflowServer;

/// Middleware that rejects requests without a caller identity
pub async fn require_identity(
    State(server): State<Arc<WorkflowServer>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = identity_from_headers(
        request.headers(),
        &server.config.dn_header,
        &server.config.login_header,
    )?;
    check_authz_defaults(request.headers(), &server.config.authz_defaults).map_err(|err| {
        warn!(login = %identity.login, "Caller lacks the required role");
        err
    })?;

    debug!(login = %identity.login, "Caller identified");
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Read the caller identity from the front-end headers
pub fn identity_from_headers(
    headers: &HeaderMap,
    dn_header: &str,
    login_header: &str,
) -> Result<UserIdentity, ServerError> {
    let read = |name: &str| -> Result<String, ServerError> {
        let value = headers
            .get(name)
            .ok_or_else(|| ServerError::MissingPrincipal(format!("Missing '{}' header", name)))?;
        let value = value
            .to_str()
            .map_err(|_| ServerError::MissingPrincipal(format!("Malformed '{}' header", name)))?
            .trim();
        if value.is_empty() {
            return Err(ServerError::MissingPrincipal(format!("Empty '{}' header", name)));
        }
        Ok(value.to_string())
    };

    Ok(UserIdentity::new(read(dn_header)?, read(login_header)?))
}

/// Prefix of the role headers set by the front-end
pub const AUTHZ_HEADER_PREFIX: &str = "cms-authz-";

/// Require a role header satisfying every attribute set in `required`
///
/// Nothing is checked when no attribute is set.
pub fn check_authz_defaults(headers: &HeaderMap, required: &AuthzDefaults) -> Result<(), ServerError> {
    if required.role.is_none() && required.group.is_none() && required.site.is_none() {
        return Ok(());
    }

    let granted = headers.iter().any(|(name, value)| {
        let role = match name.as_str().strip_prefix(AUTHZ_HEADER_PREFIX) {
            Some(role) => role,
            None => return false,
        };
        if required.role.as_deref().is_some_and(|r| !r.eq_ignore_ascii_case(role)) {
            return false;
        }

        let scopes: Vec<&str> = value
            .to_str()
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default();
        let holds = |kind: &str, wanted: &Option<String>| match wanted {
            Some(wanted) => scopes
                .iter()
                .any(|scope| scope.strip_prefix(kind) == Some(wanted.as_str())),
            None => true,
        };

        holds("group:", &required.group) && holds("site:", &required.site)
    });

    if granted {
        Ok(())
    } else {
        Err(ServerError::Forbidden(
            "You are not allowed to access this resource".to_string(),
        ))
    }
}

/// Extractor for the identity injected by [`require_identity`]
#[derive(Debug, Clone)]
pub struct Caller(pub UserIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserIdentity>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| ApiError(ServerError::MissingPrincipal("No authenticated user".to_string())))
    }
}
