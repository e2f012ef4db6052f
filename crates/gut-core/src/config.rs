//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::{AttackKind, Label, Perturbation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Reference number of subpopulation types:
/// 0 empty, 1 F. prausnitzii, 2 B. fragilis, 3 other commensal, 4 C. difficile.
pub const REFERENCE_SUBPOP_COUNT: usize = 5;

/// Label of the pathogen (C. difficile) in the reference configuration
pub const REFERENCE_PATHOGEN: Label = Label(4);

/// How a growth pass reads the cells it is rewriting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthMode {
    /// Row-major scan mutating in place; a daughter placed earlier in the
    /// pass is itself a source once the scan reaches it.
    #[default]
    InPlace,
    /// Sources are read from the grid as it was before the pass; the first
    /// claim on an empty cell in row-major order wins.
    Synchronous,
}

/// Tissue patch and subpopulation tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TissueConfig {
    /// Side length of the square patch; each cell fits one bacterium
    pub size: usize,
    /// Number of subpopulation types, including the empty type 0
    pub subpop_count: usize,
    /// Probability a cell is seeded during initialization or transplant
    pub occupancy: f64,
    /// Cumulative initialization thresholds, one per type
    pub init_thresholds: Vec<f64>,
    /// Per-neighbor division probability, one per type
    pub growth_probs: Vec<f64>,
    /// Per-step death probability, one per type
    pub death_probs: Vec<f64>,
    /// Label placed by an infection
    pub pathogen: Label,
    #[serde(default)]
    pub growth_mode: GrowthMode,
}

impl Default for TissueConfig {
    fn default() -> Self {
        let k = REFERENCE_SUBPOP_COUNT;
        let mut growth_probs = vec![0.05; k];
        growth_probs[0] = 0.0;
        let mut death_probs = vec![0.02; k];
        death_probs[0] = 0.0;

        Self {
            size: 5,
            subpop_count: k,
            occupancy: 0.5,
            // probabilities 0, .1, .1, .8, 0
            init_thresholds: vec![0.0, 0.1, 0.2, 1.0, 0.0],
            growth_probs,
            death_probs,
            pathogen: REFERENCE_PATHOGEN,
            growth_mode: GrowthMode::InPlace,
        }
    }
}

/// Perturbation efficacies, applied uniformly to every cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerturbationConfig {
    /// Wide-range antibiotic; targets commensal and pathogenic bacteria alike
    pub antibiotic_efficacy: f64,
    /// Hypersensitive immune system
    pub immune_efficacy: f64,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            antibiotic_efficacy: 0.4,
            immune_efficacy: 0.2,
        }
    }
}

/// A perturbation bound to a run-loop step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPerturbation {
    pub step: u64,
    pub perturbation: Perturbation,
}

/// Run loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of steps to run
    pub time_steps: u64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Perturbations applied at the start of the given steps
    #[serde(default)]
    pub schedule: Vec<ScheduledPerturbation>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            time_steps: 1000,
            seed: 0,
            schedule: Vec::new(),
        }
    }
}

impl RunConfig {
    fn validate(&self) -> Result<()> {
        for entry in &self.schedule {
            if entry.step >= self.time_steps {
                return Err(Error::Config(format!(
                    "{} scheduled at step {} but the run only has {} steps",
                    entry.perturbation, entry.step, self.time_steps
                )));
            }
        }
        Ok(())
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    pub tissue: TissueConfig,
    pub perturbation: PerturbationConfig,
    pub run: RunConfig,
}

impl SimConfig {
    /// Validate everything and produce the immutable model parameters
    pub fn validate(&self) -> Result<ModelParams> {
        self.run.validate()?;
        ModelParams::new(&self.tissue, &self.perturbation)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// One row of the subpopulation type table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubpopulationType {
    pub growth_prob: f64,
    pub death_prob: f64,
    pub init_threshold: f64,
}

/// Validated, immutable per-type table
#[derive(Debug, Clone, Serialize)]
pub struct SubpopulationTable {
    types: Vec<SubpopulationType>,
}

impl SubpopulationTable {
    fn new(config: &TissueConfig) -> Result<Self> {
        let k = config.subpop_count;
        if k == 0 || k > u8::MAX as usize + 1 {
            return Err(Error::Config(format!(
                "subpop_count must be between 1 and 256, got {}",
                k
            )));
        }

        check_len("init_thresholds", &config.init_thresholds, k)?;
        check_len("growth_probs", &config.growth_probs, k)?;
        check_len("death_probs", &config.death_probs, k)?;

        let mut types = Vec::with_capacity(k);
        for i in 0..k {
            let growth_prob = check_probability(&format!("growth_probs[{}]", i), config.growth_probs[i])?;
            let death_prob = check_probability(&format!("death_probs[{}]", i), config.death_probs[i])?;
            let init_threshold = config.init_thresholds[i];
            if !init_threshold.is_finite() || init_threshold < 0.0 {
                return Err(Error::Config(format!(
                    "init_thresholds[{}] must be finite and non-negative, got {}",
                    i, init_threshold
                )));
            }
            types.push(SubpopulationType {
                growth_prob,
                death_prob,
                init_threshold,
            });
        }

        Ok(Self { types })
    }

    /// Number of types, including empty
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, label: Label) -> Option<&SubpopulationType> {
        self.types.get(label.index())
    }

    /// Growth probability for `label`; unknown labels never grow
    pub fn growth_prob(&self, label: Label) -> f64 {
        self.get(label).map_or(0.0, |t| t.growth_prob)
    }

    /// Death probability for `label`; unknown labels never die
    pub fn death_prob(&self, label: Label) -> f64 {
        self.get(label).map_or(0.0, |t| t.death_prob)
    }

    /// Cumulative initialization thresholds in type order
    pub fn thresholds(&self) -> impl Iterator<Item = f64> + '_ {
        self.types.iter().map(|t| t.init_threshold)
    }

    pub fn contains(&self, label: Label) -> bool {
        label.index() < self.types.len()
    }
}

/// Model parameters validated once at construction
#[derive(Debug, Clone, Serialize)]
pub struct ModelParams {
    size: usize,
    occupancy: f64,
    table: SubpopulationTable,
    pathogen: Label,
    growth_mode: GrowthMode,
    antibiotic_efficacy: f64,
    immune_efficacy: f64,
}

impl ModelParams {
    pub fn new(tissue: &TissueConfig, perturbation: &PerturbationConfig) -> Result<Self> {
        if tissue.size == 0 {
            return Err(Error::Config("size must be at least 1".to_string()));
        }
        if tissue.size.checked_mul(tissue.size).is_none() {
            return Err(Error::Config(format!(
                "size {} is too large: the cell count overflows",
                tissue.size
            )));
        }

        let occupancy = check_probability("occupancy", tissue.occupancy)?;
        let table = SubpopulationTable::new(tissue)?;

        if tissue.pathogen.is_empty() || !table.contains(tissue.pathogen) {
            return Err(Error::Config(format!(
                "pathogen label {} is outside 1..{}",
                tissue.pathogen,
                table.len()
            )));
        }

        let antibiotic_efficacy =
            check_probability("antibiotic_efficacy", perturbation.antibiotic_efficacy)?;
        let immune_efficacy = check_probability("immune_efficacy", perturbation.immune_efficacy)?;

        debug!(
            size = tissue.size,
            subpop_count = table.len(),
            occupancy,
            growth_mode = ?tissue.growth_mode,
            "Validated model parameters"
        );

        Ok(Self {
            size: tissue.size,
            occupancy,
            table,
            pathogen: tissue.pathogen,
            growth_mode: tissue.growth_mode,
            antibiotic_efficacy,
            immune_efficacy,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn occupancy(&self) -> f64 {
        self.occupancy
    }

    pub fn table(&self) -> &SubpopulationTable {
        &self.table
    }

    pub fn subpop_count(&self) -> usize {
        self.table.len()
    }

    pub fn pathogen(&self) -> Label {
        self.pathogen
    }

    pub fn growth_mode(&self) -> GrowthMode {
        self.growth_mode
    }

    pub fn efficacy(&self, attack: AttackKind) -> f64 {
        match attack {
            AttackKind::Antibiotic => self.antibiotic_efficacy,
            AttackKind::Immune => self.immune_efficacy,
        }
    }
}

fn check_len(name: &str, table: &[f64], expected: usize) -> Result<()> {
    if table.len() != expected {
        return Err(Error::Config(format!(
            "{} has {} entries, expected one per subpopulation type ({})",
            name,
            table.len(),
            expected
        )));
    }
    Ok(())
}

fn check_probability(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::Config(format!(
            "{} must be a probability in [0, 1], got {}",
            name, value
        )))
    }
}
