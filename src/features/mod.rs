//! User-facing features
//!
//! Each feature collects its input, calls the [`AiGateway`] where it needs
//! the AI service and writes the typed result into the state store.

pub mod avatar;
pub mod checkin;
pub mod clinic;
pub mod dashboard;
pub mod pharmacy;
pub mod plan;
pub mod providers;
pub mod wellness;

use crate::gateway::AiGateway;
use crate::store::SharedStateStore;
use crate::Result;
use std::path::{Path, PathBuf};

/// Points awarded for a daily check-in
pub const CHECK_IN_POINTS: u32 = 10;

/// Points awarded for a finished consultation
pub const CONSULTATION_POINTS: u32 = 50;

/// Store and gateway bundled for the features
#[derive(Clone)]
pub struct Companion {
    store: SharedStateStore,
    gateway: AiGateway,
    export_dir: PathBuf,
}

impl Companion {
    pub fn new(store: SharedStateStore, gateway: AiGateway) -> Self {
        Self {
            store,
            gateway,
            export_dir: PathBuf::from("."),
        }
    }

    /// Directory receiving exported text files
    pub fn with_export_dir(mut self, export_dir: impl Into<PathBuf>) -> Self {
        self.export_dir = export_dir.into();
        self
    }

    pub fn store(&self) -> &SharedStateStore {
        &self.store
    }

    pub fn gateway(&self) -> &AiGateway {
        &self.gateway
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Write `text` to a freshly named export file of the given kind
    pub(crate) fn export(&self, kind: &str, text: &str) -> Result<PathBuf> {
        crate::export::download_as_file(
            &self.export_dir,
            &crate::export::export_file_name(kind),
            text,
        )
    }
}
