//! Layered configuration: built-in defaults, then an optional TOML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use numlpa_analysis::diffraction::DiffractionSettings;
use numlpa_analysis::energy::EnergySettings;
use numlpa_analysis::fit::FitSettings;
use numlpa_sample::distributions::ParameterSets;
use numlpa_sample::serializer::Format;
use serde::Deserialize;

/// Defaults shipped with the binary.
pub const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Batch defaults of `draw`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrawSettings {
    /// Number of samples in the batch.
    pub size: usize,
    /// Base seed of the batch.
    pub seed: u64,
    /// On-disk format.
    pub format: Format,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            size: 1,
            seed: 0,
            format: Format::Json,
        }
    }
}

/// Defaults of `fit`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FitDefaults {
    /// Harmonic to fit.
    pub harmonic: u32,
    /// Number of leading Fourier variables kept.
    pub limit: Option<usize>,
    /// Simplex convergence tolerance.
    pub tolerance: f64,
    /// Simplex iteration budget.
    pub max_iterations: usize,
}

impl Default for FitDefaults {
    fn default() -> Self {
        let settings = FitSettings::default();
        Self {
            harmonic: 1,
            limit: None,
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
        }
    }
}

impl FitDefaults {
    /// Stopping rules for the fit harness.
    pub fn settings(&self) -> FitSettings {
        FitSettings {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
        }
    }
}

/// Defaults of `bootstrap`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BootstrapDefaults {
    /// Significance level.
    pub alpha: f64,
}

impl Default for BootstrapDefaults {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `[draw]`
    pub draw: DrawSettings,
    /// `[distributions.<name>]`
    pub distributions: ParameterSets,
    /// `[diffract]`
    pub diffract: DiffractionSettings,
    /// `[evaluate]`
    pub evaluate: EnergySettings,
    /// `[fit]`
    pub fit: FitDefaults,
    /// `[bootstrap]`
    pub bootstrap: BootstrapDefaults,
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for these settings.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse configuration")
    }

    /// Loads `path` when given, otherwise the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::from_toml(&text)
                    .with_context(|| format!("Invalid configuration in {}", path.display()))
            }
            None => Self::from_toml(DEFAULT_CONFIG),
        }
    }
}
