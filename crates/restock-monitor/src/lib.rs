pub mod error;
pub mod message;
pub mod notify;
pub mod run;
pub mod state;

pub use error::{NotifyError, StateError};
pub use notify::{notifier_from_settings, LogNotifier, Notifier, TelegramNotifier};
pub use run::{RunController, RunReport};
pub use state::{PersistedState, StateSnapshot, StateStore};
