//! Shared generators and helpers for integration tests

use choicepoint::{
    EnvOverrides, Generated, Generator, GeneratorTrace, OpError, SelectOptions,
};

/// Two independent picks from the characters of a word, joined by a dot.
pub fn pairs() -> Generator<String, String> {
    Generator::new("pairs", |ops, word: &String| {
        let first: char = ops.select(word.chars(), None)?;
        let second: char = ops.select(word.chars(), None)?;
        Ok(format!("{}.{}", first, second))
    })
}

/// A short "word" of named letter and length sites, with the previous
/// letter passed as context.
pub fn words() -> Generator<Vec<char>, String> {
    Generator::new("words", |ops, alphabet: &Vec<char>| {
        let len: usize = ops.select(1..=2usize, Some("len"))?;
        let mut word = String::new();
        let mut prev: Option<char> = None;
        for _ in 0..len {
            let mut options = SelectOptions::new().uid("letter").tag("alpha");
            if let Some(p) = prev {
                options = options.context(p.to_string());
            }
            let c: char = ops.select_with(alphabet.iter().copied(), options)?;
            word.push(c);
            prev = Some(c);
        }
        Ok(word)
    })
}

/// Every traced output of `generator` for `args`.
pub fn traced<A, O>(generator: &Generator<A, O>, args: A) -> Vec<Generated<O>>
where
    A: serde::Serialize,
{
    generator
        .with_env(EnvOverrides::new().tracing(true))
        .generate(args)
        .collect::<Result<Vec<_>, OpError>>()
        .unwrap()
}

/// Traces of every path of `generator` for `args`.
pub fn all_traces<A, O>(generator: &Generator<A, O>, args: A) -> Vec<GeneratorTrace>
where
    A: serde::Serialize,
{
    traced(generator, args)
        .into_iter()
        .map(|item| item.trace.unwrap())
        .collect()
}
