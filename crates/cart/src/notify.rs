//! User-facing notifications for cart operations.
//!
//! Every operation reports its outcome as a [`Notice`]. The texts are the
//! storefront's fixed Portuguese toast messages.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Outcome reported to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    ProductAdded,
    ProductRemoved,
    AddFailed,
    RemoveFailed,
    UpdateFailed,
    OutOfStock,
}

/// Toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Error,
}

impl Notice {
    #[must_use]
    pub const fn level(self) -> NoticeLevel {
        match self {
            Self::ProductAdded | Self::ProductRemoved => NoticeLevel::Success,
            Self::AddFailed | Self::RemoveFailed | Self::UpdateFailed | Self::OutOfStock => {
                NoticeLevel::Error
            }
        }
    }

    /// Message text shown to the shopper.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ProductAdded => "Produto adicionado com sucesso!",
            Self::ProductRemoved => "Produto removido com sucesso!",
            Self::AddFailed => "Erro na adição do produto",
            Self::RemoveFailed => "Erro na remoção do produto",
            Self::UpdateFailed => "Erro na alteração de quantidade do produto",
            Self::OutOfStock => "Quantidade solicitada fora de estoque",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Receives notices from the cart store.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Emits notices as log events: successes at `info`, failures at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level() {
            NoticeLevel::Success => tracing::info!(notice = ?notice, "{notice}"),
            NoticeLevel::Error => tracing::warn!(notice = ?notice, "{notice}"),
        }
    }
}

/// Keeps every notice in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices received so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain recorded notices.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
