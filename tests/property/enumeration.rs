//! Exhaustive enumeration and replay properties

use choicepoint::{EnvOverrides, Generator, OpError};
use proptest::prelude::*;

/// One choice per entry of `sizes`, each over `0..size`.
fn grid() -> Generator<Vec<usize>, Vec<usize>> {
    Generator::new("grid", |ops, sizes: &Vec<usize>| {
        sizes
            .iter()
            .map(|&size| ops.select(0..size, None))
            .collect::<Result<Vec<usize>, OpError>>()
    })
}

fn sizes_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..4, 0..4)
}

/// Output count is the product of domain sizes, in lexicographic order
#[test]
fn test_enumeration_is_ordered_product() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&sizes_strategy(), |sizes| {
            let outputs: Vec<Vec<usize>> = grid()
                .generate(sizes.clone())
                .outputs()
                .collect::<Result<_, _>>()
                .unwrap();

            let expected: usize = sizes.iter().product();
            prop_assert_eq!(outputs.len(), expected);
            prop_assert!(outputs.windows(2).all(|w| w[0] < w[1]));
            if let Some(first) = outputs.first() {
                prop_assert!(first.iter().all(|&x| x == 0));
            }
            Ok(())
        })
        .unwrap();
}

/// Replaying any trace reproduces exactly its output
#[test]
fn test_replay_is_deterministic() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(sizes_strategy(), any::<prop::sample::Index>()), |(sizes, index)| {
            let generator = grid();
            let items: Vec<_> = generator
                .with_env(EnvOverrides::new().tracing(true))
                .generate(sizes.clone())
                .collect::<Result<_, _>>()
                .unwrap();
            prop_assume!(!items.is_empty());
            let item = &items[index.index(items.len())];
            let trace = item.trace.as_ref().unwrap();

            let replayed: Vec<Vec<usize>> = generator
                .with_env(EnvOverrides::new().replay(trace.replay_map()))
                .generate(sizes.clone())
                .outputs()
                .collect::<Result<_, _>>()
                .unwrap();
            // a run with no choices has an empty replay map and is exhaustive
            prop_assert_eq!(replayed, vec![item.output.clone()]);
            Ok(())
        })
        .unwrap();
}

/// Repeated searches are identical
#[test]
fn test_search_is_restartable() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&sizes_strategy(), |sizes| {
            let generator = grid();
            let first: Vec<Vec<usize>> = generator
                .generate(sizes.clone())
                .outputs()
                .collect::<Result<_, _>>()
                .unwrap();
            let second: Vec<Vec<usize>> = generator
                .generate(sizes)
                .outputs()
                .collect::<Result<_, _>>()
                .unwrap();
            prop_assert_eq!(first, second);
            Ok(())
        })
        .unwrap();
}
