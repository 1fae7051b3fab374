//! Test harness utilities for the bootstrap behavioural suite.

use std::ffi::OsString;
use std::sync::{Arc, Mutex, PoisonError};

use ortho_config::{OrthoConfig as _, OrthoError};

use taels_config::Config;

use crate::bootstrap::{
    Bootstrap, BootstrapError, ConfigLoader, StaticConfigLoader, bootstrap_with,
};
use crate::health::HealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    bootstrap: Option<Bootstrap>,
    bootstrap_error: Option<BootstrapError>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    pub fn new() -> Self {
        Self {
            loader: Box::new(StaticConfigLoader::new(Config::default())),
            reporter: Arc::new(RecordingHealthReporter::default()),
            bootstrap: None,
            bootstrap_error: None,
        }
    }

    /// Installs a loader that serves `config`.
    pub fn use_config(&mut self, config: Config) {
        self.loader = Box::new(StaticConfigLoader::new(config));
        self.reset_results();
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.reset_results();
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.bootstrap.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.clone()) {
            Ok(bootstrap) => self.bootstrap = Some(bootstrap),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// The bootstrap error, if any.
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// The successful bootstrap, if any.
    pub fn bootstrapped(&self) -> Option<&Bootstrap> {
        self.bootstrap.as_ref()
    }

    fn reset_results(&mut self) {
        self.bootstrap = None;
        self.bootstrap_error = None;
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Loader that fails by passing an unknown log format on the command line.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("taels"),
            OsString::from("--log-format"),
            OsString::from("yaml"),
        ];
        Config::load_from_iter(args)
    }
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded {
            view_prefix: config.view_prefix().to_owned(),
        });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }
}

/// Health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed with the given view prefix.
    BootstrapSucceeded {
        /// Configured view prefix.
        view_prefix: String,
    },
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
}

/// Default test world fixture.
pub fn world() -> std::cell::RefCell<TestWorld> {
    std::cell::RefCell::new(TestWorld::new())
}
