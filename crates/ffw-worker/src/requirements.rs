//! Job requirement checks.

use ffw_models::Requirements;
use tokio::fs;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

/// Succeeds when every required path exists.
pub async fn check_requirements(requirements: &Requirements) -> WorkerResult<()> {
    let mut missing = Vec::new();
    for path in &requirements.paths {
        if !fs::try_exists(path).await.unwrap_or(false) {
            debug!("Required file does not exist: {}", path);
            missing.push(path.clone());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(WorkerError::RequirementNotMet(missing))
    }
}
