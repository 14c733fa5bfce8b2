//! Simulation configuration loading.
//!
//! Every field is optional in the YAML file; missing values fall back to the
//! defaults below.  The expected YAML structure is:
//! ```yaml
//! simulation:
//!   tick_us: 10000             # one tick = 10 ms
//!   max_duration_us: 60000000  # hard cap on the stop time (1 min)
//!   max_tasks: 12
//!   report_path: "simulator_tasks_out_data.txt"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Length of one simulated tick, in microseconds.
pub const DEFAULT_TICK_US: u64 = 10_000;

/// Upper bound on the simulated run, in microseconds (1 minute).
pub const DEFAULT_MAX_DURATION_US: u64 = 60_000_000;

/// Maximum number of task classes read from the task set.
pub const DEFAULT_MAX_TASKS: usize = 12;

/// File the completed-task report is appended to.
pub const DEFAULT_REPORT_PATH: &str = "simulator_tasks_out_data.txt";

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct SimConfigFile {
    #[serde(default)]
    simulation: SimConfigEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SimConfigEntry {
    tick_us: Option<u64>,
    max_duration_us: Option<u64>,
    max_tasks: Option<usize>,
    report_path: Option<PathBuf>,
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Microseconds per tick.  Periods and computations are given in ticks.
    pub tick_us: u64,

    /// The stop time is clamped to this value, in microseconds.
    pub max_duration_us: u64,

    /// Maximum number of task classes accepted from the task set.
    pub max_tasks: usize,

    /// Destination of the completed-task report (appended, never truncated).
    pub report_path: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_us: DEFAULT_TICK_US,
            max_duration_us: DEFAULT_MAX_DURATION_US,
            max_tasks: DEFAULT_MAX_TASKS,
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
        }
    }
}

impl SimConfig {
    /// Parse `path` and overlay its values on the defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// carries a value rejected by [`validate`](Self::validate).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading simulation configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let file: SimConfigFile = if content.trim().is_empty() {
            SimConfigFile::default()
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?
        };

        let entry = file.simulation;
        let defaults = Self::default();
        let config = Self {
            tick_us: entry.tick_us.unwrap_or(defaults.tick_us),
            max_duration_us: entry.max_duration_us.unwrap_or(defaults.max_duration_us),
            max_tasks: entry.max_tasks.unwrap_or(defaults.max_tasks),
            report_path: entry.report_path.unwrap_or(defaults.report_path),
        };

        config.validate()?;
        debug!(?config, "simulation configuration loaded");
        Ok(config)
    }

    /// Reject values that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.tick_us == 0 {
            bail!("tick_us must be positive");
        }
        if self.max_duration_us == 0 {
            bail!("max_duration_us must be positive");
        }
        if self.max_tasks == 0 {
            bail!("max_tasks must be positive");
        }
        Ok(())
    }

    /// Convert a microsecond instant to (fractional) ticks.
    pub fn ticks(&self, us: u64) -> f64 {
        us as f64 / self.tick_us as f64
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_match_classic_simulator_constants() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.tick_us, 10_000);
        assert_eq!(cfg.max_duration_us, 60_000_000);
        assert_eq!(cfg.max_tasks, 12);
        assert_eq!(cfg.report_path, PathBuf::from("simulator_tasks_out_data.txt"));
    }

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
simulation:
  tick_us: 1000
  max_duration_us: 5000000
  max_tasks: 4
  report_path: "/tmp/report.tsv"
"#;
        let f = yaml_tempfile(yaml);
        let cfg = SimConfig::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.tick_us, 1_000);
        assert_eq!(cfg.max_duration_us, 5_000_000);
        assert_eq!(cfg.max_tasks, 4);
        assert_eq!(cfg.report_path, PathBuf::from("/tmp/report.tsv"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let f = yaml_tempfile("simulation:\n  tick_us: 500\n");
        let cfg = SimConfig::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.tick_us, 500);
        assert_eq!(cfg.max_duration_us, DEFAULT_MAX_DURATION_US);
        assert_eq!(cfg.max_tasks, DEFAULT_MAX_TASKS);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let f = yaml_tempfile("");
        assert_eq!(SimConfig::load_from_file(f.path()).unwrap(), SimConfig::default());
    }

    #[test]
    fn zero_tick_is_rejected() {
        let f = yaml_tempfile("simulation:\n  tick_us: 0\n");
        assert!(SimConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let f = yaml_tempfile("simulation:\n  tick_ms: 10\n");
        assert!(SimConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        assert!(SimConfig::load_from_file(Path::new("/nonexistent/sim.yaml")).is_err());
    }

    #[test]
    fn ticks_converts_microseconds() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.ticks(750_000), 75.0);
        assert_eq!(cfg.ticks(5_000), 0.5);
    }
}
