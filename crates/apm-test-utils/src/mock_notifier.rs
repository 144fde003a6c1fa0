// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin API stand-in.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use apm_core::{AdminNotifier, ApmError};

/// How the mock node answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotifierMode {
    #[default]
    Online,
    /// Every call fails with `NotifierUnavailable`.
    Offline,
    /// Every call fails with a non-recoverable notifier error.
    Failing,
}

#[derive(Default)]
struct State {
    mode: NotifierMode,
    reloads: usize,
    subnets: Vec<String>,
}

#[derive(Clone, Default)]
pub struct MockNotifier {
    state: Arc<Mutex<State>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: NotifierMode) -> Self {
        let notifier = Self::new();
        notifier.set_mode(mode);
        notifier
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_mode(&self, mode: NotifierMode) {
        self.state().mode = mode;
    }

    pub fn reloads(&self) -> usize {
        self.state().reloads
    }

    pub fn registered_subnets(&self) -> Vec<String> {
        self.state().subnets.clone()
    }

    fn check(&self) -> Result<(), ApmError> {
        match self.state().mode {
            NotifierMode::Online => Ok(()),
            NotifierMode::Offline => Err(ApmError::NotifierUnavailable {
                endpoint: "127.0.0.1:9650".into(),
            }),
            NotifierMode::Failing => Err(ApmError::Notifier {
                message: "rpc error -32000: subnet not whitelisted".into(),
                source: None,
            }),
        }
    }
}

impl AdminNotifier for MockNotifier {
    fn reload_plugins(&self) -> Result<(), ApmError> {
        self.check()?;
        self.state().reloads += 1;
        Ok(())
    }

    fn register_subnet(&self, subnet_id: &str) -> Result<(), ApmError> {
        self.check()?;
        self.state().subnets.push(subnet_id.to_string());
        Ok(())
    }
}
