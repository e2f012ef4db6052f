//! Property tests for the transition rules over arbitrary seeds and tables.

use gut_core::{AttackKind, GrowthMode, Label, ModelParams, PerturbationConfig, Position, TissueConfig};
use gut_world::{TissueGrid, TransitionEngine};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn probability() -> impl Strategy<Value = f64> {
    0.0..=1.0f64
}

prop_compose! {
    fn tissue_config()(
        size in 1usize..9,
        subpop_count in 2usize..7,
        occupancy in probability(),
        synchronous in any::<bool>(),
    )(
        growth_probs in prop::collection::vec(probability(), subpop_count),
        death_probs in prop::collection::vec(probability(), subpop_count),
        init_thresholds in prop::collection::vec(0.0..1.5f64, subpop_count),
        pathogen in 1..subpop_count,
        size in Just(size),
        subpop_count in Just(subpop_count),
        occupancy in Just(occupancy),
        synchronous in Just(synchronous),
    ) -> TissueConfig {
        TissueConfig {
            size,
            subpop_count,
            occupancy,
            init_thresholds,
            growth_probs,
            death_probs,
            pathogen: Label::new(pathogen),
            growth_mode: if synchronous { GrowthMode::Synchronous } else { GrowthMode::InPlace },
        }
    }
}

prop_compose! {
    fn perturbation_config()(
        antibiotic_efficacy in probability(),
        immune_efficacy in probability(),
    ) -> PerturbationConfig {
        PerturbationConfig { antibiotic_efficacy, immune_efficacy }
    }
}

fn engine(tissue: &TissueConfig, perturbation: &PerturbationConfig) -> TransitionEngine {
    TransitionEngine::new(ModelParams::new(tissue, perturbation).unwrap())
}

proptest! {
    #[test]
    fn grid_stays_well_formed(
        tissue in tissue_config(),
        perturbation in perturbation_config(),
        seed in any::<u64>(),
        ops in prop::collection::vec(0u8..6, 0..30),
    ) {
        let engine = engine(&tissue, &perturbation);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = engine.initialize(&mut rng);
        let k = engine.subpop_count();
        prop_assert!(grid.is_well_formed(k));

        for op in ops {
            match op {
                0 => engine.divide(&mut grid, &mut rng),
                1 => engine.die(&mut grid, &mut rng),
                2 => engine.attack(&mut grid, AttackKind::Antibiotic, &mut rng),
                3 => engine.attack(&mut grid, AttackKind::Immune, &mut rng),
                4 => engine.infect(&mut grid),
                _ => engine.transplant(&mut grid, &mut rng),
            }
            prop_assert!(grid.is_well_formed(k));
            prop_assert_eq!(grid.size(), tissue.size);
            prop_assert_eq!(engine.census(&grid).total(), tissue.size * tissue.size);
        }
    }

    #[test]
    fn growth_only_fills_empty_cells(
        tissue in tissue_config(),
        seed in any::<u64>(),
    ) {
        let engine = engine(&tissue, &PerturbationConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = engine.initialize(&mut rng);
        let before = grid.clone();

        engine.divide(&mut grid, &mut rng);

        prop_assert!(grid.occupied_count() >= before.occupied_count());
        for (pos, label) in before.iter() {
            if label.is_occupied() {
                prop_assert_eq!(grid.get(pos), Some(label));
            }
        }
    }

    #[test]
    fn death_never_fills_cells(
        tissue in tissue_config(),
        seed in any::<u64>(),
    ) {
        let engine = engine(&tissue, &PerturbationConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = engine.initialize(&mut rng);
        let before = grid.clone();

        engine.die(&mut grid, &mut rng);

        for (pos, label) in grid.iter() {
            let prior = before.get(pos).unwrap();
            prop_assert!(label == prior || label == Label::EMPTY);
        }
    }

    #[test]
    fn rules_are_deterministic_under_seed(
        tissue in tissue_config(),
        perturbation in perturbation_config(),
        seed in any::<u64>(),
    ) {
        let engine = engine(&tissue, &perturbation);
        let run = || {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut grid = engine.initialize(&mut rng);
            engine.divide(&mut grid, &mut rng);
            engine.die(&mut grid, &mut rng);
            engine.attack(&mut grid, AttackKind::Antibiotic, &mut rng);
            engine.transplant(&mut grid, &mut rng);
            grid
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn infection_touches_only_center(
        tissue in tissue_config(),
        seed in any::<u64>(),
    ) {
        let engine = engine(&tissue, &PerturbationConfig::default());
        let mut grid = engine.initialize(&mut ChaCha8Rng::seed_from_u64(seed));
        let before = grid.clone();

        engine.infect(&mut grid);

        let center = Position::center(tissue.size);
        for (pos, label) in grid.iter() {
            if pos == center {
                prop_assert_eq!(label, tissue.pathogen);
            } else {
                prop_assert_eq!(Some(label), before.get(pos));
            }
        }
    }
}

#[test]
fn infection_on_reference_patch() {
    let engine = TransitionEngine::from_config(&Default::default()).unwrap();
    let mut grid = TissueGrid::new(5);
    engine.infect(&mut grid);

    assert_eq!(grid.get(Position::new(2, 2)), Some(Label(4)));
    assert_eq!(grid.occupied_count(), 1);
}
