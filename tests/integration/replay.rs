//! Deterministic replay of recorded choices

use super::test_utils::{all_traces, pairs, words};
use choicepoint::{EnvOverrides, OpError, ReplayMap, SearchMode};

#[test]
fn test_replaying_a_trace_reproduces_its_output() {
    let generator = words();
    let alphabet = vec!['p', 'q', 'r'];
    let outputs: Vec<String> = generator
        .generate(alphabet.clone())
        .outputs()
        .collect::<Result<_, _>>()
        .unwrap();
    let traces = all_traces(&generator, alphabet.clone());
    assert_eq!(outputs.len(), traces.len());

    for (expected, trace) in outputs.iter().zip(&traces) {
        let view = generator.with_env(EnvOverrides::new().replay(trace.replay_map()));
        let replayed: Vec<String> = view
            .generate(alphabet.clone())
            .outputs()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(&replayed, &vec![expected.clone()]);
    }
}

#[test]
fn test_replay_by_call_index_key() {
    let mut replay = ReplayMap::new().with("Select@1", ['l']).unwrap();
    replay.push_value("Select@2", serde_json::json!("l"));
    let generator = pairs();
    let (output, trace) = generator
        .with_env(EnvOverrides::new().replay(replay))
        .call("Al".to_string())
        .unwrap();
    assert_eq!(output, "l.l");
    assert_eq!(trace.op_traces.len(), 2);
}

#[test]
fn test_over_visited_site_underflows() {
    let replay = ReplayMap::new()
        .with("len", [2usize])
        .unwrap()
        .with("letter", ['a'])
        .unwrap();
    let generator = words();
    let view = generator.with_env(EnvOverrides::new().replay(replay));
    let results: Vec<Result<String, OpError>> = view.generate(vec!['a', 'b']).outputs().collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(&results[0], Err(OpError::ReplayUnderflow(key)) if key == "letter"));
}

#[test]
fn test_exactly_visited_sites_do_not_underflow() {
    let replay = ReplayMap::new()
        .with("len", [1usize])
        .unwrap()
        .with("letter", ['b'])
        .unwrap();
    let generator = words();
    let view = generator.with_env(EnvOverrides::new().replay(replay));
    let (output, _) = view.call(vec!['a', 'b']).unwrap();
    assert_eq!(output, "b");
}

#[test]
fn test_replayed_value_outside_domain_is_fatal() {
    let replay = ReplayMap::new()
        .with("len", [1usize])
        .unwrap()
        .with("letter", ['z'])
        .unwrap();
    let generator = words();
    let view = generator.with_env(EnvOverrides::new().replay(replay));
    assert!(matches!(
        view.call(vec!['a', 'b']),
        Err(OpError::ReplayMismatch { site_key, .. }) if site_key == "letter"
    ));
}

#[test]
fn test_explicit_mode_overrides_replay_map() {
    let replay = ReplayMap::new().with("Select@1", ['l']).unwrap();
    let generator = pairs();
    let view = generator
        .with_env(EnvOverrides::new().replay(replay))
        .with_env(EnvOverrides::new().search_mode(SearchMode::Exhaustive));
    let count = view.generate("Al".to_string()).count();
    assert_eq!(count, 4);
}
