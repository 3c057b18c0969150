//! Permission check over verified claims.
//!
//! A token missing the `permissions` claim entirely points at a
//! misconfigured token or provider (RBAC not enabled, wrong API), which is
//! why it surfaces as 400 instead of the 403 used for a plain denial.

use tracing::warn;

use super::error::AuthError;
use super::verify::Claims;

/// Confirm that `claims` grants `required`.
///
/// Exact, case-sensitive membership; no wildcard or prefix matching.
pub fn check(claims: &Claims, required: &str) -> Result<(), AuthError> {
    let permissions = claims
        .permissions
        .as_ref()
        .ok_or(AuthError::PermissionsClaimMissing)?;

    if !permissions.iter().any(|permission| permission == required) {
        warn!(required, "token lacks required permission");
        return Err(AuthError::PermissionDenied);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_with(permissions: Option<Vec<&str>>) -> Claims {
        let payload = match permissions {
            Some(permissions) => {
                serde_json::json!({"exp": 4_000_000_000u64, "permissions": permissions})
            }
            None => serde_json::json!({"exp": 4_000_000_000u64}),
        };
        serde_json::from_value(payload).unwrap()
    }

    #[test]
    fn absent_claim_is_a_configuration_problem() {
        assert_eq!(
            check(&claims_with(None), "get:drinks-detail"),
            Err(AuthError::PermissionsClaimMissing)
        );
    }

    #[test]
    fn missing_permission_is_denied() {
        let claims = claims_with(Some(vec!["get:drinks-detail"]));
        assert_eq!(
            check(&claims, "delete:drinks"),
            Err(AuthError::PermissionDenied)
        );
    }

    #[test]
    fn matching_permission_passes() {
        let claims = claims_with(Some(vec!["get:drinks-detail", "post:drinks"]));
        assert_eq!(check(&claims, "post:drinks"), Ok(()));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let claims = claims_with(Some(vec!["get:drinks-detail"]));
        assert_eq!(
            check(&claims, "GET:drinks-detail"),
            Err(AuthError::PermissionDenied)
        );
    }

    #[test]
    fn empty_list_is_denied_not_missing() {
        let claims = claims_with(Some(vec![]));
        assert_eq!(
            check(&claims, "post:drinks"),
            Err(AuthError::PermissionDenied)
        );
    }
}
