//! Exit code logic for the harvester process.
//!
//! Single responsibility: map a run outcome to the process exit status.

use std::process::ExitCode;

use harvester_core::HarvestError;

/// Process-level outcome of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
    Configuration,
    Auth,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Configuration => ExitCode::from(2),
            ProcessExit::Auth => ExitCode::from(3),
        }
    }
}

/// Determines the exit outcome for an error that aborted the run.
pub(crate) fn determine_exit_outcome(error: &anyhow::Error) -> ProcessExit {
    match error.downcast_ref::<HarvestError>() {
        Some(e) if e.is_configuration() => ProcessExit::Configuration,
        Some(e) if e.is_auth() => ProcessExit::Auth,
        _ => ProcessExit::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_core::StorageError;

    #[test]
    fn test_exit_outcome_configuration_for_missing_client() {
        let error = anyhow::Error::new(HarvestError::missing_client());
        assert_eq!(determine_exit_outcome(&error), ProcessExit::Configuration);
    }

    #[test]
    fn test_exit_outcome_auth_for_rejected_credential() {
        let source = StorageError::auth_rejected("2/files/list_folder", 401, "expired_access_token");
        let error = anyhow::Error::new(HarvestError::listing("/", source));
        assert_eq!(determine_exit_outcome(&error), ProcessExit::Auth);
    }

    #[test]
    fn test_exit_outcome_failure_for_enumeration_error() {
        let source = StorageError::api("2/files/list_folder", 409, "path/not_found/");
        let error = anyhow::Error::new(HarvestError::listing("/missing", source));
        assert_eq!(determine_exit_outcome(&error), ProcessExit::Failure);
    }

    #[test]
    fn test_exit_outcome_failure_for_other_errors() {
        let error = anyhow::anyhow!("config parse failure");
        assert_eq!(determine_exit_outcome(&error), ProcessExit::Failure);
    }
}
