//! Transition rules that advance the tissue patch.
//!
//! Every rule is a whole-grid pass over a grid owned by the caller. Rules
//! draw from the supplied generator in row-major cell order, so a fixed
//! generator stream reproduces the same grid.

use crate::grid::TissueGrid;
use crate::sampling::{seed_draw, trial};
use gut_core::{
    AttackKind, Census, Direction, GrowthMode, Label, ModelParams, Perturbation, Position, Result,
    SimConfig,
};
use rand::Rng;
use tracing::{debug, trace};

/// Stateless rule set over validated model parameters
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    params: ModelParams,
}

impl TransitionEngine {
    pub fn new(params: ModelParams) -> Self {
        Self { params }
    }

    /// Validate `config` and build an engine from it
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        Ok(Self::new(config.validate()?))
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn subpop_count(&self) -> usize {
        self.params.subpop_count()
    }

    /// Seed a fresh patch: each cell is occupied with the configured
    /// probability, by a type drawn from the cumulative thresholds.
    pub fn initialize<R: Rng + ?Sized>(&self, rng: &mut R) -> TissueGrid {
        let mut grid = TissueGrid::new(self.params.size());
        let seeded = self.reseed(&mut grid, rng);
        debug!(
            size = grid.size(),
            seeded,
            occupied = grid.occupied_count(),
            "Initialized tissue patch"
        );
        grid
    }

    /// Growth pass. Each occupied cell runs one trial per Moore neighbor and
    /// places a daughter in every in-bounds empty neighbor whose trial wins.
    pub fn divide<R: Rng + ?Sized>(&self, grid: &mut TissueGrid, rng: &mut R) {
        let colonized = match self.params.growth_mode() {
            GrowthMode::InPlace => self.divide_in_place(grid, rng),
            GrowthMode::Synchronous => self.divide_synchronous(grid, rng),
        };
        trace!(colonized, occupied = grid.occupied_count(), "Growth pass");
    }

    fn divide_in_place<R: Rng + ?Sized>(&self, grid: &mut TissueGrid, rng: &mut R) -> usize {
        let table = self.params.table();
        let size = grid.size();
        let mut colonized = 0;

        for index in 0..grid.cells().len() {
            let pos = grid.index_to_pos(index);
            // Read now, not before the pass: daughters placed earlier grow too
            let source = grid.cells()[index];
            if source.is_empty() {
                continue;
            }
            let growth_prob = table.growth_prob(source);

            for direction in Direction::all() {
                if trial(rng, growth_prob) {
                    if let Some(target) = pos.offset(direction, size) {
                        if grid.get(target) == Some(Label::EMPTY) {
                            grid.set(target, source);
                            colonized += 1;
                        }
                    }
                }
            }
        }

        colonized
    }

    fn divide_synchronous<R: Rng + ?Sized>(&self, grid: &mut TissueGrid, rng: &mut R) -> usize {
        let table = self.params.table();
        let before = grid.clone();
        let mut colonized = 0;

        for (pos, source) in before.iter() {
            if source.is_empty() {
                continue;
            }
            let growth_prob = table.growth_prob(source);

            for (_, neighbor) in before.neighbors(pos) {
                if trial(rng, growth_prob) {
                    if let Some(target) = neighbor {
                        // Cells empty before the pass that nobody claimed yet
                        if grid.get(target) == Some(Label::EMPTY) {
                            grid.set(target, source);
                            colonized += 1;
                        }
                    }
                }
            }
        }

        colonized
    }

    /// Death pass. Occupied cells die with their type's probability; empty
    /// cells draw nothing.
    pub fn die<R: Rng + ?Sized>(&self, grid: &mut TissueGrid, rng: &mut R) {
        let table = self.params.table();
        let mut died = 0;

        for index in 0..grid.cells().len() {
            let pos = grid.index_to_pos(index);
            let current = grid.cells()[index];
            if current.is_occupied() && trial(rng, table.death_prob(current)) {
                grid.set(pos, Label::EMPTY);
                died += 1;
            }
        }

        trace!(died, occupied = grid.occupied_count(), "Death pass");
    }

    /// Clear cells with the selected efficacy. Every cell draws, occupied or
    /// not, and the rule ignores the cell's type.
    pub fn attack<R: Rng + ?Sized>(&self, grid: &mut TissueGrid, attack: AttackKind, rng: &mut R) {
        let efficacy = self.params.efficacy(attack);
        let mut cleared = 0;

        for index in 0..grid.cells().len() {
            let pos = grid.index_to_pos(index);
            if trial(rng, efficacy) {
                if grid.cells()[index].is_occupied() {
                    cleared += 1;
                }
                grid.set(pos, Label::EMPTY);
            }
        }

        debug!(%attack, efficacy, cleared, occupied = grid.occupied_count(), "Attack applied");
    }

    /// Place the pathogen in the center cell
    pub fn infect(&self, grid: &mut TissueGrid) {
        let center = Position::center(grid.size());
        let pathogen = self.params.pathogen();
        grid.set(center, pathogen);
        debug!(row = center.row, col = center.col, %pathogen, "Pathogen introduced");
    }

    /// Fecal transplant: reseed every cell with the initialization rule,
    /// overwriting whatever a winning cell held.
    pub fn transplant<R: Rng + ?Sized>(&self, grid: &mut TissueGrid, rng: &mut R) {
        let seeded = self.reseed(grid, rng);
        debug!(seeded, occupied = grid.occupied_count(), "Fecal transplant applied");
    }

    fn reseed<R: Rng + ?Sized>(&self, grid: &mut TissueGrid, rng: &mut R) -> usize {
        let occupancy = self.params.occupancy();
        let table = self.params.table();
        let mut seeded = 0;

        for index in 0..grid.cells().len() {
            if let Some(k) = seed_draw(rng, occupancy, table.thresholds()) {
                grid.set(grid.index_to_pos(index), Label::new(k));
                seeded += 1;
            }
        }

        seeded
    }

    /// Apply one external perturbation
    pub fn perturb<R: Rng + ?Sized>(&self, grid: &mut TissueGrid, perturbation: Perturbation, rng: &mut R) {
        match perturbation {
            Perturbation::Attack { attack } => self.attack(grid, attack, rng),
            Perturbation::Infect => self.infect(grid),
            Perturbation::Transplant => self.transplant(grid, rng),
        }
    }

    pub fn census(&self, grid: &TissueGrid) -> Census {
        grid.census(self.subpop_count())
    }
}
