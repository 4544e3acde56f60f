//! Best-effort registration of tool, resource and prompt modules.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{lib::errors::RegistrationError, server::config::Settings};

/// Registration entry point of one module; returns how many items it added.
pub type RegisterFn<R> = fn(&mut R, &Settings) -> Result<usize, RegistrationError>;

/// Outcome of running a loader list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub modules_loaded: usize,
    pub modules_failed: usize,
    pub items: usize,
}

/// Call every registration function in order, skipping failures.
///
/// A module that fails mid-way keeps whatever it registered before the
/// failing item.
pub fn run_loaders<R>(
    kind: &'static str,
    registry: &mut R,
    settings: &Settings,
    modules: &[(&'static str, RegisterFn<R>)],
) -> LoadReport {
    let mut report = LoadReport::default();
    for (module, register) in modules {
        match register(registry, settings) {
            Ok(count) => {
                debug!(
                    target: "mcp_template::loader",
                    kind,
                    module,
                    count,
                    "Registered module"
                );
                report.modules_loaded += 1;
                report.items += count;
            }
            Err(err) => {
                warn!(
                    target: "mcp_template::loader",
                    kind,
                    module,
                    error = %err,
                    "Failed to register module; skipping"
                );
                report.modules_failed += 1;
            }
        }
    }
    info!(
        target: "mcp_template::loader",
        kind,
        modules_loaded = report.modules_loaded,
        modules_failed = report.modules_failed,
        items = report.items,
        "Loaded {kind}"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_two(registry: &mut Vec<&'static str>, _: &Settings) -> Result<usize, RegistrationError> {
        registry.extend(["a", "b"]);
        Ok(2)
    }

    fn broken(_: &mut Vec<&'static str>, _: &Settings) -> Result<usize, RegistrationError> {
        Err(RegistrationError::Duplicate { name: "a".into() })
    }

    fn ok_one(registry: &mut Vec<&'static str>, _: &Settings) -> Result<usize, RegistrationError> {
        registry.push("c");
        Ok(1)
    }

    #[test]
    fn failures_are_skipped_and_counted() {
        let mut registry = Vec::new();
        let modules: &[(&'static str, RegisterFn<Vec<&'static str>>)] =
            &[("first", ok_two), ("second", broken), ("third", ok_one)];
        let report = run_loaders("things", &mut registry, &Settings::default(), modules);

        assert_eq!(
            report,
            LoadReport {
                modules_loaded: 2,
                modules_failed: 1,
                items: 3,
            }
        );
        assert_eq!(registry, vec!["a", "b", "c"]);
    }
}
