//! Integration tests for the configuration system driving the engine

use super::test_utils::{all_traces, words};
use choicepoint::config::{ConfigLoader, EngineConfig};
use choicepoint::{restore_model_with, save_model, Generator, ModelRegistry, Trainer};
use tempfile::TempDir;

#[test]
fn test_config_drives_trainer_and_search() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("engine.toml");
    std::fs::write(
        &config_file,
        r#"
[search]
max_depth = 2

[trainer]
num_epochs = 4
model_kind = "perceptron"

[archive]
verify_checksums = true
"#,
    )
    .unwrap();

    let config: EngineConfig = ConfigLoader::load_from_file(&config_file).unwrap();

    let trainer = Trainer::from_config(&config.trainer).unwrap();
    let traces = all_traces(&words(), vec!['a', 'b']);
    let bundle = trainer
        .train(&traces, &[], config.trainer.num_epochs)
        .unwrap();
    assert!(bundle.iter().all(|(_, site)| site.model.kind() == "perceptron"));

    let archive_dir = temp_dir.path().join("model");
    save_model(&bundle, &archive_dir).unwrap();
    let restored =
        restore_model_with(&archive_dir, &ModelRegistry::with_builtin(), &config.archive).unwrap();
    assert_eq!(restored.len(), bundle.len());

    // three choices exceed a depth limit of two: only one-letter words survive
    let limited = words().with_search_config(config.search.clone());
    let outputs: Vec<String> = limited
        .generate(vec!['a', 'b'])
        .outputs()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(outputs, vec!["a", "b"]);
}

#[test]
fn test_unknown_model_kind_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("engine.toml");
    std::fs::write(&config_file, "[trainer]\nmodel_kind = \"transformer\"\n").unwrap();

    let err = ConfigLoader::load_from_file(&config_file).unwrap_err();
    assert!(err.to_string().contains("transformer"));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_default_search_config_on_generator() {
    let generator: Generator<(), ()> = Generator::new("noop", |_ops, _: &()| Ok(()));
    assert_eq!(
        generator.search_config(),
        &EngineConfig::default().search
    );
}
