//! Run loop over a single tissue patch.

use crate::engine::TransitionEngine;
use crate::grid::{GridSnapshot, TissueGrid};
use gut_core::{AttackKind, Census, Label, Perturbation, Result, RunConfig, SimConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, event, info, instrument, Level};

/// Population metrics are logged every this many steps
const METRICS_INTERVAL: u64 = 100;

pub struct Simulation {
    engine: TransitionEngine,
    grid: TissueGrid,
    config: RunConfig,
    rng: ChaCha8Rng,
    step: u64,
    initial_census: Census,
    timeline: Vec<Census>,
}

impl Simulation {
    /// Validate `config`, seed the generator and initialize the patch
    pub fn new(config: SimConfig) -> Result<Self> {
        let engine = TransitionEngine::from_config(&config)?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.run.seed);
        let grid = engine.initialize(&mut rng);
        let initial_census = engine.census(&grid);

        info!(
            seed = config.run.seed,
            size = grid.size(),
            occupied = grid.occupied_count(),
            "Simulation initialized"
        );

        Ok(Self {
            engine,
            grid,
            config: config.run,
            rng,
            step: 0,
            initial_census,
            timeline: Vec::new(),
        })
    }

    /// Run every configured step
    #[instrument(skip(self), fields(time_steps = self.config.time_steps, seed = self.config.seed))]
    pub fn run(&mut self) -> SimulationResult {
        info!("Starting simulation for {} steps", self.config.time_steps);

        while self.step < self.config.time_steps {
            self.step();

            if self.step % METRICS_INTERVAL == 0 {
                self.emit_population_metrics();
            }
        }

        self.emit_run_summary();
        self.collect_results()
    }

    /// Advance one step: scheduled perturbations, then growth, then death
    pub fn step(&mut self) {
        let due: Vec<Perturbation> = self
            .config
            .schedule
            .iter()
            .filter(|entry| entry.step == self.step)
            .map(|entry| entry.perturbation)
            .collect();

        for perturbation in due {
            info!(step = self.step, %perturbation, "Applying scheduled perturbation");
            self.apply(perturbation);
        }

        self.divide();
        self.die();

        self.timeline.push(self.census());
        self.step += 1;
    }

    pub fn divide(&mut self) {
        self.engine.divide(&mut self.grid, &mut self.rng);
    }

    pub fn die(&mut self) {
        self.engine.die(&mut self.grid, &mut self.rng);
    }

    pub fn attack(&mut self, attack: AttackKind) {
        self.engine.attack(&mut self.grid, attack, &mut self.rng);
    }

    pub fn infect(&mut self) {
        self.engine.infect(&mut self.grid);
    }

    pub fn transplant(&mut self) {
        self.engine.transplant(&mut self.grid, &mut self.rng);
    }

    pub fn apply(&mut self, perturbation: Perturbation) {
        self.engine.perturb(&mut self.grid, perturbation, &mut self.rng);
    }

    pub fn grid(&self) -> &TissueGrid {
        &self.grid
    }

    pub fn census(&self) -> Census {
        self.engine.census(&self.grid)
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn current_step(&self) -> u64 {
        self.step
    }

    /// Census after each completed step, in step order
    pub fn timeline(&self) -> &[Census] {
        &self.timeline
    }

    fn emit_population_metrics(&self) {
        let census = self.census();
        let pathogen = self.engine.params().pathogen();

        info!(
            event = "population_metrics",
            step = self.step,
            occupied = census.occupied(),
            empty = census.get(Label::EMPTY),
            pathogen = census.get(pathogen),
            "Population metrics snapshot"
        );

        for (label, count) in census.iter().filter(|(label, _)| label.is_occupied()) {
            event!(
                Level::DEBUG,
                gauge_name = "subpopulation_count",
                gauge_value = count,
                label = label.0,
                step = self.step,
                "Subpopulation gauge"
            );
        }
    }

    fn emit_run_summary(&self) {
        let census = self.census();
        let peak_occupied = self
            .timeline
            .iter()
            .map(Census::occupied)
            .max()
            .unwrap_or(0);
        let extinct_at = self.timeline.iter().position(|c| c.occupied() == 0);

        info!(
            event = "run_summary",
            total_steps = self.step,
            initial_occupied = self.initial_census.occupied(),
            final_occupied = census.occupied(),
            peak_occupied,
            pathogen_final = census.get(self.engine.params().pathogen()),
            "Run complete"
        );

        if let Some(step) = extinct_at {
            debug!(step, "Patch first emptied completely");
        }

        event!(
            Level::INFO,
            gauge_name = "final_occupied",
            gauge_value = census.occupied(),
            "Final occupancy gauge"
        );
    }

    fn collect_results(&self) -> SimulationResult {
        SimulationResult {
            initial_census: self.initial_census.clone(),
            timeline: self.timeline.clone(),
            final_grid: self.grid.snapshot(),
            total_steps: self.step,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub initial_census: Census,
    pub timeline: Vec<Census>,
    pub final_grid: GridSnapshot,
    pub total_steps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gut_core::{Position, ScheduledPerturbation};

    fn short_config(seed: u64, time_steps: u64) -> SimConfig {
        let mut config = SimConfig::default();
        config.run.seed = seed;
        config.run.time_steps = time_steps;
        config
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::new(short_config(42, 10));
        assert!(sim.is_ok());
        let sim = sim.unwrap();
        assert_eq!(sim.current_step(), 0);
        assert!(sim.grid().is_well_formed(5));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = short_config(42, 10);
        config.tissue.growth_probs.truncate(3);
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn test_run_records_every_step() {
        let mut sim = Simulation::new(short_config(7, 25)).unwrap();
        let result = sim.run();

        assert_eq!(result.total_steps, 25);
        assert_eq!(result.timeline.len(), 25);
        assert_eq!(result.final_grid.size, 5);
        assert!(result.timeline.iter().all(|c| c.total() == 25));
    }

    #[test]
    fn test_determinism_same_seed() {
        let mut a = Simulation::new(short_config(12345, 200)).unwrap();
        let mut b = Simulation::new(short_config(12345, 200)).unwrap();

        for _ in 0..200 {
            a.step();
            b.step();
            let json_a = serde_json::to_string(a.grid()).unwrap();
            let json_b = serde_json::to_string(b.grid()).unwrap();
            assert_eq!(json_a, json_b, "Grids diverged with same seed");
        }
    }

    #[test]
    fn test_scheduled_infection_applied() {
        let mut config = short_config(3, 5);
        config.tissue.death_probs = vec![0.0; 5];
        config.run.schedule.push(ScheduledPerturbation {
            step: 2,
            perturbation: Perturbation::Infect,
        });
        let mut sim = Simulation::new(config).unwrap();

        sim.step();
        sim.step();
        sim.step();
        // Nothing dies, so the pathogen placed at step 2 survives
        assert_eq!(sim.grid().get(Position::new(2, 2)), Some(Label(4)));
        assert!(sim.timeline()[2].get(Label(4)) >= 1);
    }

    #[test]
    fn test_scheduled_antibiotic_clears_patch() {
        let mut config = short_config(3, 2);
        config.perturbation.antibiotic_efficacy = 1.0;
        config.tissue.growth_probs = vec![0.0; 5];
        config.run.schedule.push(ScheduledPerturbation {
            step: 1,
            perturbation: Perturbation::Attack {
                attack: AttackKind::Antibiotic,
            },
        });
        let mut sim = Simulation::new(config).unwrap();
        let result = sim.run();

        assert_eq!(result.timeline[1].occupied(), 0);
    }

    #[test]
    fn test_manual_sequence() {
        let mut sim = Simulation::new(short_config(1, 1)).unwrap();
        sim.divide();
        sim.die();
        sim.infect();
        sim.attack(AttackKind::Immune);
        sim.transplant();
        assert!(sim.grid().is_well_formed(5));
        assert_eq!(sim.census().total(), 25);
    }
}
