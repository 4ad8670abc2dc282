//! Display surface: the named sinks the controller writes results to
//!
//! The UI is opaque. The controller only sets text on named fields, toggles
//! the loading indicator and the results panel, and raises notifications.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ErrorClass, FloodError};

/// Named text sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayField {
    LocationResult,
    ResultCity,
    ResultYear,
    ResultPercentage,
    ResultFlooded,
    HistoricalNote,
    DetectionStatus,
}

impl DisplayField {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayField::LocationResult => "Location",
            DisplayField::ResultCity => "City",
            DisplayField::ResultYear => "Year",
            DisplayField::ResultPercentage => "Flooded area (%)",
            DisplayField::ResultFlooded => "Flooded",
            DisplayField::HistoricalNote => "Note",
            DisplayField::DetectionStatus => "Change detection",
        }
    }
}

/// A user-visible notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub class: ErrorClass,
    pub message: String,
}

impl Notice {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }
}

pub trait DisplaySurface: Send + Sync {
    fn set_text(&self, field: DisplayField, text: &str);

    fn set_loading(&self, visible: bool);

    fn set_results_visible(&self, visible: bool);

    fn notify(&self, notice: &Notice);
}

/// Loading indicator shared by every in-flight action.
///
/// The indicator is visible while at least one guard is alive; the last
/// guard to drop hides it, on every exit path including unwinding.
#[derive(Clone)]
pub struct LoadingIndicator {
    display: Arc<dyn DisplaySurface>,
    active: Arc<AtomicUsize>,
}

impl LoadingIndicator {
    pub fn new(display: Arc<dyn DisplaySurface>) -> Self {
        Self {
            display,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn acquire(&self) -> LoadingGuard {
        if self.active.fetch_add(1, Ordering::SeqCst) == 0 {
            self.display.set_loading(true);
        }
        LoadingGuard {
            display: self.display.clone(),
            active: self.active.clone(),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[must_use = "the indicator is hidden as soon as the guard is dropped"]
pub struct LoadingGuard {
    display: Arc<dyn DisplaySurface>,
    active: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.display.set_loading(false);
        }
    }
}

/// Display for the command-line binary: fields go to stdout, notices to stderr
#[derive(Default)]
pub struct ConsoleDisplay;

impl DisplaySurface for ConsoleDisplay {
    fn set_text(&self, field: DisplayField, text: &str) {
        println!("{:>18}: {}", field.label(), text);
    }

    fn set_loading(&self, _visible: bool) {}

    fn set_results_visible(&self, _visible: bool) {}

    /// The controller already logged the failure; this only prints it
    fn notify(&self, notice: &Notice) {
        eprintln!("{}", notice.message);
    }
}

/// Build the notification shown when an action fails
pub(crate) fn failure_notice(prefix: &str, err: &FloodError) -> Notice {
    Notice::new(err.class(), format!("{prefix}: {err}"))
}
