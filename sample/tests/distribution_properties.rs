//! Property-based tests for the distribution engine.
//!
//! Uses proptest to check that every draw is deterministic, balanced where
//! the distribution promises it, and consistent with its recorded density.

use numlpa_sample::distributions::{
    DipolesParameters, Distribution, ParameterSets, RestrictedParameters, UniformParameters,
};
use numlpa_sample::{Metadata, Sense};
use proptest::prelude::*;

fn side() -> impl Strategy<Value = f64> {
    1.0e-7..1.0e-4f64
}

fn any_distribution() -> impl Strategy<Value = Distribution> {
    prop_oneof![
        (1u32..5, 1u32..4, side()).prop_map(|(nsub, pairs, side)| {
            let sets = ParameterSets {
                dipoles: DipolesParameters {
                    length: 0.0,
                    nsub,
                    pairs,
                    side,
                    confine: false,
                },
                ..ParameterSets::default()
            };
            Distribution::from_name("dipoles", &sets).unwrap()
        }),
        (1u32..200, side()).prop_map(|(number, side)| {
            let sets = ParameterSets {
                uniform: UniformParameters { number, side },
                ..ParameterSets::default()
            };
            Distribution::from_name("uniform", &sets).unwrap()
        }),
        (1u32..5, 1u32..4, side()).prop_map(|(nsub, pairs, side)| {
            let sets = ParameterSets {
                restricted: RestrictedParameters { nsub, pairs, side },
                ..ParameterSets::default()
            };
            Distribution::from_name("restricted", &sets).unwrap()
        }),
    ]
}

proptest! {
    /// Two draws with the same seed are bit-identical.
    #[test]
    fn prop_draws_are_deterministic(distribution in any_distribution(), seed in any::<u64>()) {
        let metadata = Metadata::now();
        let a = distribution.draw_with(seed, metadata.clone());
        let b = distribution.draw_with(seed, metadata);
        prop_assert_eq!(a.dislocations.senses, b.dislocations.senses);
        for axis in 0..2 {
            let xa: Vec<u64> = a.dislocations.positions[axis].iter().map(|v| v.to_bits()).collect();
            let xb: Vec<u64> = b.dislocations.positions[axis].iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(xa, xb);
        }
        prop_assert_eq!(a.distribution, b.distribution);
    }

    /// Recorded density equals count over area.
    #[test]
    fn prop_density_is_consistent(distribution in any_distribution(), seed in any::<u64>()) {
        let sample = distribution.draw(seed);
        prop_assert!(sample.density_is_consistent(1e-12));
        prop_assert!(sample.dislocations.is_well_formed());
    }

    /// Dipoles carry `pairs · nsub²` dislocations of each sign.
    #[test]
    fn prop_dipoles_are_balanced(nsub in 1u32..6, pairs in 1u32..5, seed in any::<u64>()) {
        let sets = ParameterSets {
            dipoles: DipolesParameters { nsub, pairs, ..DipolesParameters::default() },
            ..ParameterSets::default()
        };
        let sample = Distribution::from_name("dipoles", &sets).unwrap().draw(seed);
        let expected = (pairs * nsub * nsub) as usize;
        prop_assert_eq!(sample.dislocations.count(Sense::Positive), expected);
        prop_assert_eq!(sample.dislocations.count(Sense::Negative), expected);
    }

    /// Uniform and restricted dislocations lie strictly inside the region.
    #[test]
    fn prop_non_dipole_draws_stay_inside(nsub in 1u32..5, pairs in 1u32..4, seed in any::<u64>()) {
        let sets = ParameterSets {
            restricted: RestrictedParameters { nsub, pairs, side: 1e-6 },
            uniform: UniformParameters { number: nsub * pairs, side: 1e-6 },
            ..ParameterSets::default()
        };
        for name in ["uniform", "restricted"] {
            let sample = Distribution::from_name(name, &sets).unwrap().draw(seed);
            for dislocation in sample.dislocations.iter() {
                prop_assert!(sample.region.contains(dislocation.x, dislocation.y));
            }
        }
    }
}
