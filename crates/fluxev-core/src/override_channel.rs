// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxEV.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Single-slot mailbox for external mode changes
//!
//! Producers overwrite the pending code, the control loop takes it once per
//! cycle. At most one request is pending at any time: last write wins.

use crate::error::{ControlError, Result};
use crate::traits::CommandSource;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

pub const MAX_OVERRIDE_CODE: i64 = 99;

/// Consumer side, owned by the control loop
#[derive(Debug, Clone, Default)]
pub struct OverrideSlot {
    pending: Arc<Mutex<Option<u8>>>,
}

impl OverrideSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer handle sharing this slot
    pub fn sender(&self) -> OverrideSender {
        OverrideSender {
            pending: Arc::clone(&self.pending),
        }
    }

    /// Read and clear the pending code atomically
    pub fn take(&self) -> Option<u8> {
        self.pending.lock().take()
    }

    /// Look at the pending code without consuming it
    pub fn peek(&self) -> Option<u8> {
        *self.pending.lock()
    }
}

/// Producer side, cloned into every command listener
#[derive(Debug, Clone)]
pub struct OverrideSender {
    pending: Arc<Mutex<Option<u8>>>,
}

impl OverrideSender {
    /// Validate and store a code, replacing any unapplied one
    ///
    /// Out-of-range codes leave the slot untouched.
    pub fn submit(&self, code: i64) -> Result<()> {
        let code = u8::try_from(code)
            .ok()
            .filter(|c| i64::from(*c) <= MAX_OVERRIDE_CODE)
            .ok_or(ControlError::InvalidOverride(code))?;

        let replaced = self.pending.lock().replace(code);
        if let Some(previous) = replaced {
            info!("Override {previous} superseded by {code} before it was applied");
        }
        Ok(())
    }
}

/// Drain a command source into the override slot until the source closes
pub async fn run_override_listener<S>(mut source: S, sender: OverrideSender)
where
    S: CommandSource,
{
    info!("📨 Listening for mode changes from {}", source.name());

    while let Some(code) = source.next_code().await {
        match sender.submit(code) {
            Ok(()) => info!("📨 Mode change {code} queued for next cycle"),
            Err(e) => warn!("⚠️ Dropping mode change from {}: {e}", source.name()),
        }
    }

    info!("Command source {} closed", source.name());
}
