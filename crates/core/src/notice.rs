//! User-facing notices for each step of the staged upload workflow.
//!
//! Operations return typed results; the UI turns them into notices with the
//! helpers here and decides how to show them (toast, inline banner, ...).

use serde::Serialize;

use crate::assets::policy::BYTES_PER_MB;
use crate::assets::{CandidateFile, RemoveOutcome, Rejection, SlotError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// A file was accepted into a slot.
    pub fn file_selected(file: &CandidateFile) -> Self {
        let what = if file.is_image() { "Imagen seleccionada" } else { "Archivo seleccionado" };
        Self::success(format!("{what}: {}", file.name))
    }

    pub fn rejected(rejection: &Rejection) -> Self {
        match rejection {
            Rejection::UnsupportedType { mime_type } => {
                Self::error(format!("Tipo de archivo no permitido ({mime_type})"))
            }
            Rejection::TooLarge { max_bytes, .. } => Self::error(format!(
                "El archivo supera el tamaño máximo de {}",
                format_megabytes(*max_bytes)
            )),
        }
    }

    pub fn slot_error(error: &SlotError) -> Self {
        match error {
            SlotError::Rejected(rejection) => Self::rejected(rejection),
            SlotError::Preview(_) => Self::error("No se pudo leer el archivo seleccionado"),
        }
    }

    /// `None` when the removal had no visible effect.
    pub fn removed(outcome: RemoveOutcome) -> Option<Self> {
        match outcome {
            RemoveOutcome::DiscardedStaged => Some(Self::info("Selección descartada")),
            RemoveOutcome::MarkedForDeletion => Some(Self::info(
                "El archivo se eliminará al guardar los cambios",
            )),
            RemoveOutcome::Nothing => None,
        }
    }

    pub fn deletion_cancelled() -> Self {
        Self::info("Eliminación cancelada")
    }
}

/// Render a byte count as whole or fractional megabytes, e.g. `20 MB`.
pub fn format_megabytes(bytes: u64) -> String {
    let mb = bytes as f64 / BYTES_PER_MB as f64;
    if mb.fract() == 0.0 {
        format!("{mb:.0} MB")
    } else {
        format!("{mb:.1} MB")
    }
}
