//! Exhaustive depth-first enumeration

use super::test_utils::{pairs, traced, words};
use choicepoint::{Generator, OpError, Sid};

#[test]
fn test_two_letter_product_in_order() {
    let outputs: Vec<String> = pairs()
        .generate("Al".to_string())
        .outputs()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(outputs, vec!["A.A", "A.l", "l.A", "l.l"]);
}

#[test]
fn test_output_count_is_domain_product() {
    let outputs: Vec<String> = words()
        .generate(vec!['a', 'b', 'c'])
        .outputs()
        .collect::<Result<_, _>>()
        .unwrap();
    // one-letter words then two-letter words
    assert_eq!(outputs.len(), 3 + 9);
    assert_eq!(&outputs[..4], &["a", "b", "c", "aa"]);
    assert_eq!(outputs.last().map(String::as_str), Some("cc"));
}

#[test]
fn test_search_is_lazy() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let generator = Generator::new("counted", move |ops, _: &()| {
        counter.fetch_add(1, Ordering::SeqCst);
        let x: u32 = ops.select(0..1000u32, None)?;
        Ok(x)
    });

    let first_three: Vec<u32> = generator
        .generate(())
        .outputs()
        .take(3)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(first_three, vec![0, 1, 2]);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[test]
fn test_traces_record_sites_and_inputs() {
    let items = traced(&words(), vec!['x', 'y']);
    let two_letter = items
        .iter()
        .find(|item| item.output == "yx")
        .unwrap();
    let trace = two_letter.trace.as_ref().unwrap();

    assert_eq!(trace.inputs, serde_json::json!(["x", "y"]));
    let sids: Vec<Sid> = trace.op_traces.iter().map(|t| t.op_info.sid()).collect();
    assert_eq!(
        sids,
        vec![
            Sid::from("words::Select::len"),
            Sid::from("words::Select::letter"),
            Sid::from("words::Select::letter"),
        ]
    );
    assert_eq!(trace.op_traces[2].op_info.call_index, 2);
    assert_eq!(trace.op_traces[2].context, Some(serde_json::json!("y")));
    assert_eq!(trace.op_traces[1].op_info.tags, vec!["alpha".to_string()]);
}

#[test]
fn test_nested_generator_call() {
    let inner = pairs();
    let outer = Generator::new("outer", move |ops, word: &String| {
        let (pair, _) = inner.call(word.clone())?;
        let suffix: char = ops.select(['!', '?'], None)?;
        Ok(format!("{}{}", pair, suffix))
    });
    let outputs: Vec<String> = outer
        .generate("ab".to_string())
        .outputs()
        .collect::<Result<_, OpError>>()
        .unwrap();
    assert_eq!(outputs, vec!["a.a!", "a.a?"]);
}
