//! Diagnostics for the scanning layer.
//!
//! [`Notifier`] wraps `env_logger` (text logs) and `indicatif` (a live spinner) under a
//! single verbosity switch:
//! - [`VerbosityLevel::Quiet`] → warnings only; `info` messages drive a spinner instead.
//! - [`VerbosityLevel::Info`]/[`VerbosityLevel::Debug`]/[`VerbosityLevel::Trace`] → text logs.
//!
//! Extraction, hashing and classification never log. Callers that walk layers hand a
//! `&Notifier` to whatever needs to report skipped paths or progress.

use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Record};
use std::cell::RefCell;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerbosityLevel {
    Quiet = 0, // Spinner, warnings only
    Info = 1,
    Debug = 2,
    Trace = 3,
}

impl From<u8> for VerbosityLevel {
    fn from(level: u8) -> Self {
        match level {
            0 => VerbosityLevel::Quiet,
            1 => VerbosityLevel::Info,
            2 => VerbosityLevel::Debug,
            _ => VerbosityLevel::Trace,
        }
    }
}

impl VerbosityLevel {
    fn to_log_level(self) -> LevelFilter {
        match self {
            VerbosityLevel::Quiet => LevelFilter::Warn,
            VerbosityLevel::Info => LevelFilter::Info,
            VerbosityLevel::Debug => LevelFilter::Debug,
            VerbosityLevel::Trace => LevelFilter::Trace,
        }
    }
}

pub struct Notifier {
    verbosity: VerbosityLevel,
    logger: env_logger::Logger,
    spinner: RefCell<Option<ProgressBar>>,
}

impl Notifier {
    pub fn new(verbosity_level: u8) -> Self {
        let verbosity = VerbosityLevel::from(verbosity_level);

        let logger = env_logger::Builder::from_env(Env::default())
            .filter_level(verbosity.to_log_level())
            .build();

        Self {
            verbosity,
            logger,
            spinner: RefCell::new(None),
        }
    }

    fn emit(&self, level: Level, message: &str) {
        self.logger.log(
            &Record::builder()
                .args(format_args!("{}", message))
                .level(level)
                .target(module_path!())
                .build(),
        );
    }

    pub fn info(&self, message: &str) {
        match self.verbosity {
            VerbosityLevel::Quiet => {
                // Lazily start the spinner on the first info message
                let mut spinner = self.spinner.borrow_mut();
                let spinner = spinner.get_or_insert_with(|| {
                    let bar = ProgressBar::new_spinner();
                    if let Ok(style) =
                        ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
                    {
                        bar.set_style(style);
                    }
                    bar.enable_steady_tick(Duration::from_millis(100));
                    bar
                });
                spinner.set_message(message.to_string());
            }
            _ => self.emit(Level::Info, message),
        }
    }

    pub fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }

    pub fn trace(&self, message: &str) {
        self.emit(Level::Trace, message);
    }

    /// Warnings are shown at every verbosity, above the spinner when one is running.
    pub fn warn(&self, message: &str) {
        match self.spinner.borrow().as_ref() {
            Some(spinner) => spinner.suspend(|| self.emit(Level::Warn, message)),
            None => self.emit(Level::Warn, message),
        }
    }

    /// Periodic progress: every 1000 entries in text modes, every entry on the spinner.
    pub fn progress(&self, current: u64, message: &str) {
        match self.verbosity {
            VerbosityLevel::Quiet => self.info(&format!("{}: {}", message, current)),
            _ if current % 1000 == 0 => self.info(&format!("{}: {}", message, current)),
            _ => {}
        }
    }

    /// Stops the spinner, if any, leaving the terminal clean.
    pub fn finish(&self) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }
    }

    pub fn verbosity_level(&self) -> VerbosityLevel {
        self.verbosity
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.finish();
    }
}
