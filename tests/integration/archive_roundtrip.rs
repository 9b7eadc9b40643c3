//! Save and restore trained bundles

use super::test_utils::{all_traces, words};
use choicepoint::archive::{read_manifest, ARCHIVE_FORMAT_VERSION, MANIFEST_FILE};
use choicepoint::{
    restore_model, restore_model_with, save_model, ArchiveConfig, ArchiveError, EnvOverrides,
    ModelRegistry, Trainer,
};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_restored_bundle_guides_identically() {
    let generator = words();
    let alphabet = vec!['a', 'b', 'c'];
    let traces: Vec<_> = all_traces(&generator, alphabet.clone())
        .into_iter()
        .filter(|t| t.op_traces.len() == 3)
        .collect();

    for kind in ["frequency", "perceptron"] {
        let bundle = Trainer::new(kind).unwrap().train(&traces, &[], 4).unwrap();
        let temp_dir = TempDir::new().unwrap();
        save_model(&bundle, temp_dir.path()).unwrap();
        let restored = restore_model(temp_dir.path()).unwrap();

        let domain: Vec<_> = alphabet.iter().map(|c| json!(c.to_string())).collect();
        for sid in bundle.sids() {
            for ctx in [None, Some(json!("a")), Some(json!("c"))] {
                assert_eq!(
                    restored.infer(sid, &domain, ctx.as_ref()),
                    bundle.infer(sid, &domain, ctx.as_ref())
                );
            }
        }

        let original: Vec<String> = generator
            .with_env(EnvOverrides::new().model(bundle))
            .generate(alphabet.clone())
            .outputs()
            .collect::<Result<_, _>>()
            .unwrap();
        let reloaded: Vec<String> = generator
            .with_env(EnvOverrides::new().model(restored))
            .generate(alphabet.clone())
            .outputs()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(original, reloaded);
    }
}

#[test]
fn test_manifest_layout() {
    let traces = all_traces(&words(), vec!['a']);
    let bundle = Trainer::new("frequency").unwrap().train(&traces, &[], 1).unwrap();
    let temp_dir = TempDir::new().unwrap();
    save_model(&bundle, temp_dir.path()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(raw["format_version"], json!(ARCHIVE_FORMAT_VERSION));
    assert!(raw["created_at"].is_string());

    let manifest = read_manifest(temp_dir.path()).unwrap();
    assert_eq!(manifest.sites.len(), 2);
    for entry in &manifest.sites {
        assert!(entry.payload.starts_with("models/"));
        assert_eq!(entry.checksum.len(), 64);
        assert!(temp_dir.path().join(&entry.payload).exists());
        assert_eq!(entry.op_info.sid(), entry.sid);
    }
}

#[test]
fn test_checksum_verification_can_be_disabled() {
    let traces = all_traces(&words(), vec!['a', 'b']);
    let bundle = Trainer::new("frequency").unwrap().train(&traces, &[], 1).unwrap();
    let temp_dir = TempDir::new().unwrap();
    let manifest = save_model(&bundle, temp_dir.path()).unwrap();

    // rewrite the manifest with a wrong checksum for the first entry
    let mut tampered = manifest.clone();
    tampered.sites[0].checksum = "0".repeat(64);
    std::fs::write(
        temp_dir.path().join(MANIFEST_FILE),
        serde_json::to_vec(&tampered).unwrap(),
    )
    .unwrap();

    let registry = ModelRegistry::with_builtin();
    assert!(matches!(
        restore_model_with(temp_dir.path(), &registry, &ArchiveConfig::default()),
        Err(ArchiveError::Corrupt(_))
    ));
    let unchecked = ArchiveConfig {
        verify_checksums: false,
    };
    assert_eq!(
        restore_model_with(temp_dir.path(), &registry, &unchecked)
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_truncated_manifest_is_corrupt() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join(MANIFEST_FILE), b"{\"format_version\": 1, \"sites\"").unwrap();
    assert!(matches!(
        restore_model(temp_dir.path()),
        Err(ArchiveError::Corrupt(_))
    ));
}
