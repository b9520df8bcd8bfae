//! Launching through a tracker.

use async_trait::async_trait;
use dbsetup_core::{DbSetup, DbSetupResult, DbSetupTracker};

/// Launch a setup through a [`DbSetupTracker`]: `setup.launch_with(&mut tracker)`
#[async_trait]
pub trait LaunchWith {
    /// Launch unless the tracker says the last identical launch can be reused
    async fn launch_with(&self, tracker: &mut DbSetupTracker) -> DbSetupResult<()>;
}

#[async_trait]
impl LaunchWith for DbSetup {
    async fn launch_with(&self, tracker: &mut DbSetupTracker) -> DbSetupResult<()> {
        tracker.launch_if_necessary(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_setup;
    use dbsetup_core::stub::RecordingDestination;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_launch_with_delegates_to_tracker() {
        let destination = Arc::new(RecordingDestination::new());
        let setup = db_setup(&destination, |s| {
            s.truncate("user");
        })
        .unwrap();
        let mut tracker = DbSetupTracker::new();

        setup.launch_with(&mut tracker).await.unwrap();
        tracker.ignore_next_launch();
        setup.launch_with(&mut tracker).await.unwrap();

        assert_eq!(destination.connections_opened(), 1);
        assert_eq!(
            destination.connection_handle().statements(),
            vec!["truncate table user"]
        );
    }
}
