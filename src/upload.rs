//! Coordinates CSV dataset uploads.
//!
//! Validates the selected file locally, tracks the in-flight flag and the
//! inline error shown next to the upload control, and hands successful
//! confirmations to the session controller. Upload failures never enter the
//! conversation timeline.

use crate::api::{TransportError, UploadSummary};

pub const BAD_EXTENSION: &str = "Por favor selecciona un archivo CSV";
pub const UPLOAD_FALLBACK: &str = "Error al cargar el archivo";

pub struct UploadCoordinator {
    uploading: bool,
    error: Option<String>,
}

impl UploadCoordinator {
    pub fn new() -> Self {
        Self {
            uploading: false,
            error: None,
        }
    }

    pub fn uploading(&self) -> bool {
        self.uploading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Local validation gate. Returns `true` when the caller should dispatch
    /// the upload; a bad extension is rejected here without touching the
    /// network. Accepting clears any previous inline error.
    pub fn accept(&mut self, filename: &str) -> bool {
        if self.uploading {
            return false;
        }
        if !filename.ends_with(".csv") {
            self.error = Some(BAD_EXTENSION.to_string());
            return false;
        }

        self.error = None;
        self.uploading = true;
        true
    }

    /// Apply the upload outcome. Returns the confirmation to merge into the
    /// timeline on success; on failure stores the inline error (remote
    /// detail when present, generic fallback otherwise). Releases
    /// `uploading` on every path, so a new selection always works — the
    /// picked file is never retained, and re-selecting the identical file
    /// starts a fresh attempt.
    pub fn settle(
        &mut self,
        result: Result<UploadSummary, TransportError>,
    ) -> Option<UploadSummary> {
        let outcome = match result {
            Ok(summary) => Some(summary),
            Err(error) => {
                self.error = Some(error.detail().unwrap_or(UPLOAD_FALLBACK).to_string());
                None
            }
        };
        self.uploading = false;
        outcome
    }
}

impl Default for UploadCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
