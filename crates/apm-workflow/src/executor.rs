// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single dispatch point for every workflow.

use std::time::Instant;

use apm_core::ApmError;
use tracing::{debug, debug_span};

use crate::Workflow;

/// Runs workflows and records their timing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Executor;

impl Executor {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, workflow: Workflow<'_>) -> Result<(), ApmError> {
        let name = workflow.name();
        let _span = debug_span!("workflow", name).entered();
        let started = Instant::now();
        debug!("started");

        let result = workflow.execute();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => debug!(elapsed_ms, "finished"),
            Err(e) => debug!(elapsed_ms, error = %e, "failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use apm_core::SourceInfo;
    use apm_storage::Storage;
    use tracing_test::traced_test;

    use super::*;
    use crate::AddRepository;
    use crate::testing::Fixture;

    #[test]
    #[traced_test]
    fn executes_and_propagates() {
        let fx = Fixture::new();
        let sources = fx.namespaces.sources();
        let add = |alias: &'static str| {
            fx.executor.execute(Workflow::AddRepository(AddRepository {
                sources: &sources as &dyn Storage<SourceInfo>,
                alias,
                url: "https://example.com/x.git",
                branch: "main",
            }))
        };

        add("acme/plugins").unwrap();
        assert!(matches!(add("acme/plugins"), Err(ApmError::AlreadyExists { .. })));
        assert!(logs_contain("add-repository"));
        assert!(logs_contain("elapsed_ms"));
    }
}
