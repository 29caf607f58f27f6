//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! State is split by domain (`session`, `entries`, `submission`, etc.) so
//! each concern has exactly one owning controller. Every controller keeps
//! its observable state in a [`store::Store`]; other components read and
//! subscribe, but only the owner writes.

pub mod accessibility;
pub mod entries;
pub mod session;
pub mod shell;
pub mod store;
pub mod submission;

pub use accessibility::{AccessibilitySettings, AccessibilityState, MemoryPreferences, PreferenceStore, TextSize};
pub use entries::{EntriesState, EntryRepository};
pub use session::{Session, SessionStatus, SessionStore};
pub use shell::{AppShell, Page, ShellError, View};
pub use store::Store;
pub use submission::{SubmissionController, SubmissionError, SubmissionState, ValidationError};
