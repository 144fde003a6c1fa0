// SPDX-FileCopyrightText: 2026 Apm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host admin API contract.

use crate::error::ApmError;

/// Notifies a running node about plugin changes.
///
/// Implementations return [`ApmError::NotifierUnavailable`] when the node
/// cannot be reached, so callers can downgrade that case to a warning.
pub trait AdminNotifier {
    fn reload_plugins(&self) -> Result<(), ApmError>;

    fn register_subnet(&self, subnet_id: &str) -> Result<(), ApmError>;
}
