//! Ownership checks
//!
//! Only the owner of a workflow may modify or abort it.

use gridflow_core::{UserIdentity, WorkflowManager};
use tracing::warn;

use crate::error::{ServerError, ServerResult};

/// Require that every workflow in `workflows` exists and belongs to `caller`
///
/// Ownership is decided on the login name. Nothing is checked for an empty
/// list.
pub async fn authz_owner_match(
    manager: &dyn WorkflowManager,
    workflows: &[String],
    caller: &UserIdentity,
) -> ServerResult<()> {
    if workflows.is_empty() {
        return Ok(());
    }

    let owners = manager.owners(workflows).await?;

    for workflow in workflows {
        match owners.get(workflow) {
            None => {
                return Err(ServerError::MissingObject(format!(
                    "Workflow '{}' not found",
                    workflow
                )));
            }
            Some(owner) if owner.login != caller.login => {
                warn!(%workflow, owner = %owner.login, caller = %caller.login, "Ownership check failed");
                return Err(ServerError::Forbidden(
                    "You are not allowed to access this resource".to_string(),
                ));
            }
            Some(_) => {}
        }
    }

    Ok(())
}
