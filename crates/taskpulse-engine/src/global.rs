//! Process-wide slot manager.
//!
//! The server installs its manager once at startup so code without access to
//! the router state can still record activity. Tests construct independent
//! managers and never touch this cell.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use taskpulse_core::error::AppError;
use taskpulse_core::result::AppResult;

use crate::slot_manager::SlotManager;

static SLOT_MANAGER: OnceCell<Arc<SlotManager>> = OnceCell::new();

/// Install `manager` as the process-wide instance. Fails if one is already set.
pub fn install(manager: Arc<SlotManager>) -> AppResult<Arc<SlotManager>> {
    SLOT_MANAGER
        .set(Arc::clone(&manager))
        .map_err(|_| AppError::internal("Active-task slot manager already installed"))?;
    Ok(manager)
}

/// The process-wide instance, if installed.
pub fn slot_manager() -> Option<Arc<SlotManager>> {
    SLOT_MANAGER.get().cloned()
}
