//! User-facing notices for rejected or failed cart operations.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Which notice is being raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Adding one more unit would exceed stock.
    AddStockExceeded,
    /// Requested amount is more than stock.
    UpdateStockExceeded,
    /// Adding failed for any other reason.
    AddFailed,
    /// Product was not in the cart, or the change could not be saved.
    RemoveFailed,
    /// Updating failed for any reason other than stock.
    UpdateFailed,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::AddStockExceeded => "add_stock_exceeded",
            NoticeKind::UpdateStockExceeded => "update_stock_exceeded",
            NoticeKind::AddFailed => "add_failed",
            NoticeKind::RemoveFailed => "remove_failed",
            NoticeKind::UpdateFailed => "update_failed",
        }
    }

    /// Whether this notice is about stock rather than a failure.
    pub fn is_stock(&self) -> bool {
        matches!(
            self,
            NoticeKind::AddStockExceeded | NoticeKind::UpdateStockExceeded
        )
    }
}

/// A message for the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Notice texts shown to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Shown when add or update asks for more than is in stock.
    pub stock_exceeded: String,
    pub add_failed: String,
    pub remove_failed: String,
    pub update_failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            stock_exceeded: "Requested quantity is out of stock".to_string(),
            add_failed: "Could not add product to cart".to_string(),
            remove_failed: "Could not remove product from cart".to_string(),
            update_failed: "Could not change product quantity".to_string(),
        }
    }
}

impl Messages {
    /// Brazilian Portuguese texts.
    pub fn pt_br() -> Self {
        Self {
            stock_exceeded: "Quantidade solicitada fora de estoque".to_string(),
            add_failed: "Erro na adição do produto".to_string(),
            remove_failed: "Erro na remoção do produto".to_string(),
            update_failed: "Erro na alteração de quantidade do produto".to_string(),
        }
    }

    /// Text for a notice kind.
    pub fn message_for(&self, kind: NoticeKind) -> &str {
        match kind {
            NoticeKind::AddStockExceeded | NoticeKind::UpdateStockExceeded => &self.stock_exceeded,
            NoticeKind::AddFailed => &self.add_failed,
            NoticeKind::RemoveFailed => &self.remove_failed,
            NoticeKind::UpdateFailed => &self.update_failed,
        }
    }

    pub fn notice(&self, kind: NoticeKind) -> Notice {
        Notice::new(kind, self.message_for(kind))
    }
}

/// Sink for user-facing notices (a toast in a browser UI).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }
}

/// Notifier that logs notices at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        tracing::warn!(kind = notice.kind.as_str(), "{}", notice.message);
    }
}

/// Notifier that records notices (for tests and headless callers).
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices received so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Kinds of the notices received so far.
    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices().into_iter().map(|n| n.kind).collect()
    }

    /// Drain recorded notices.
    pub fn take(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}
