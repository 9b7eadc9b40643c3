//! Model-guided search properties

use choicepoint::{EnvOverrides, Generator, OpError, Trainer};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn grid() -> Generator<Vec<usize>, Vec<usize>> {
    Generator::new("grid", |ops, sizes: &Vec<usize>| {
        sizes
            .iter()
            .map(|&size| ops.select(0..size, None))
            .collect::<Result<Vec<usize>, OpError>>()
    })
}

/// Guidance reorders the outputs but never adds or drops one
#[test]
fn test_guided_search_keeps_output_set() {
    let mut runner = proptest::test_runner::TestRunner::default();

    let strategy = (
        prop::collection::vec(1usize..4, 1..4),
        prop::collection::vec(any::<bool>(), 27),
        prop::sample::select(vec!["frequency", "perceptron"]),
        0usize..4,
    );
    runner
        .run(&strategy, |(sizes, keep, kind, epochs)| {
            let generator = grid();
            let traces: Vec<_> = generator
                .with_env(EnvOverrides::new().tracing(true))
                .generate(sizes.clone())
                .map(|item| item.unwrap().trace.unwrap())
                .zip(keep.iter())
                .filter(|(_, keep)| **keep)
                .map(|(trace, _)| trace)
                .collect();
            let bundle = Trainer::new(kind).unwrap().train(&traces, &[], epochs).unwrap();

            let exhaustive: Vec<Vec<usize>> = generator
                .generate(sizes.clone())
                .outputs()
                .collect::<Result<_, _>>()
                .unwrap();
            let guided: Vec<Vec<usize>> = generator
                .with_env(EnvOverrides::new().model(bundle))
                .generate(sizes)
                .outputs()
                .collect::<Result<_, _>>()
                .unwrap();

            prop_assert_eq!(guided.len(), exhaustive.len());
            prop_assert_eq!(
                guided.into_iter().collect::<BTreeSet<_>>(),
                exhaustive.into_iter().collect::<BTreeSet<_>>()
            );
            Ok(())
        })
        .unwrap();
}

/// Untrained models leave the exhaustive order unchanged
#[test]
fn test_untrained_guidance_is_identity() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(1usize..4, 1..4), |sizes| {
            let generator = grid();
            let traces: Vec<_> = generator
                .with_env(EnvOverrides::new().tracing(true))
                .generate(sizes.clone())
                .map(|item| item.unwrap().trace.unwrap())
                .collect();
            let bundle = Trainer::new("perceptron").unwrap().train(&traces, &[], 0).unwrap();

            let exhaustive: Vec<Vec<usize>> = generator
                .generate(sizes.clone())
                .outputs()
                .collect::<Result<_, _>>()
                .unwrap();
            let guided: Vec<Vec<usize>> = generator
                .with_env(EnvOverrides::new().model(bundle))
                .generate(sizes)
                .outputs()
                .collect::<Result<_, _>>()
                .unwrap();
            prop_assert_eq!(guided, exhaustive);
            Ok(())
        })
        .unwrap();
}
