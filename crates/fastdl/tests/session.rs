use std::fs;
use std::path::Path;

use fastdl::{ConfigWarning, Diagnostic, EngineError, FastdlEngine, ManifestError};
use proptest::prelude::*;
use tempfile::{TempDir, tempdir};

type Engine = FastdlEngine<Vec<Diagnostic>>;

fn engine() -> Engine {
    FastdlEngine::with_sink(Vec::new())
}

fn config_dir(config: &str) -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("fastdl.toml"), config).unwrap();
    dir
}

fn manifest(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join("fastdl_whitelist.txt")).unwrap()
}

#[test]
fn test_end_to_end_session() {
    let dir = config_dir("download_url=http://cdn.example.com/%game%/\n");
    let mut engine = engine();

    let mut out = [0u8; 64];
    let copy = engine.init(dir.path(), Path::new("valve"), &mut out).unwrap();
    assert_eq!(&out[..copy.written], b"http://cdn.example.com/valve/");
    assert!(!copy.is_truncated());
    assert_eq!(engine.download_url(), Some("http://cdn.example.com/valve/"));

    // The empty manifest is published as soon as the session starts.
    assert_eq!(manifest(&dir), "");

    assert!(engine.classify_and_insert("", "models/player.mdl"));
    assert!(engine.classify_and_insert("sound", "ambience/wind.wav"));
    engine.deinit();

    assert!(!engine.is_active());
    assert_eq!(manifest(&dir), "models/player.mdl\nsound/ambience/wind.wav\n");
}

#[test]
fn test_url_truncated_to_buffer() {
    let dir = config_dir("download_url = \"http://fastdl.example.com/%game%/maps/ab/\"\n");
    let mut engine = engine();

    let mut out = [0u8; 10];
    let copy = engine.init(dir.path(), Path::new("valve"), &mut out).unwrap();
    assert_eq!(copy.written, 10);
    assert_eq!(copy.full, 40);
    assert_eq!(&out, b"http://fas");
    assert!(engine.sink().iter().any(|d| matches!(
        d,
        Diagnostic::UrlTruncated {
            full_len: 40,
            capacity: 10
        }
    )));
    engine.deinit();
}

#[test]
fn test_missing_config_still_starts() {
    let dir = tempdir().unwrap();
    let mut engine = engine();

    let mut out = [0u8; 64];
    let copy = engine.init(dir.path(), Path::new("/srv/hlds/cstrike"), &mut out).unwrap();
    assert!(engine.is_active());
    assert_eq!(&out[..copy.written], b"http://localhost/cstrike/");
    assert!(
        engine
            .sink()
            .iter()
            .any(|d| matches!(d, Diagnostic::Config(ConfigWarning::MissingFile { .. })))
    );

    // No rules configured: everything is whitelisted.
    assert!(engine.classify_and_insert("", "maps/de_dust2.bsp"));
    engine.deinit();
    assert_eq!(manifest(&dir), "maps/de_dust2.bsp\n");
}

#[test]
fn test_second_init_is_refused() {
    let dir = config_dir("download_url = \"http://cdn.example.com/%game%/\"\n");
    let mut engine = engine();
    engine.init(dir.path(), Path::new("valve"), &mut [0u8; 64]).unwrap();
    assert!(engine.classify_and_insert("", "models/player.mdl"));

    let mut out = [0xAAu8; 64];
    let err = engine.init(dir.path(), Path::new("cstrike"), &mut out).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyActive));
    assert!(out.iter().all(|&b| b == 0xAA));
    assert_eq!(engine.download_url(), Some("http://cdn.example.com/valve/"));
    assert_eq!(engine.whitelist().unwrap().len(), 1);
    engine.deinit();
}

#[test]
fn test_first_matching_rule_wins() {
    let dir = config_dir(
        r#"
download_url = "http://cdn.example.com/"
rules = ["exclude sound sound/weapons", "include sound sound/*"]
"#,
    );
    let mut engine = engine();
    engine.init(dir.path(), Path::new("valve"), &mut []).unwrap();

    assert!(!engine.classify_and_insert("sound", "weapons/ak47.wav"));
    assert!(engine.classify_and_insert("sound", "ambience/wind.wav"));
    assert!(!engine.classify_and_insert("", "models/player.mdl"));
    engine.deinit();

    assert_eq!(manifest(&dir), "sound/ambience/wind.wav\n");
}

#[test]
fn test_typo_in_config_keeps_exclusions() {
    let dir = config_dir(
        r#"
download_url = "http://cdn.example.com/"
rules = ["exclude sound sound/weapons", "include sound sound/*"]
flush_every = oops
"#,
    );
    let mut engine = engine();
    engine.init(dir.path(), Path::new("valve"), &mut []).unwrap();

    assert_eq!(engine.download_url(), Some("http://cdn.example.com/"));
    assert!(!engine.classify_and_insert("sound", "weapons/ak47.wav"));
    assert!(engine.classify_and_insert("sound", "ambience/wind.wav"));
    assert!(engine.sink().iter().any(|d| matches!(
        d,
        Diagnostic::Config(ConfigWarning::InvalidValue { key, .. }) if key == "flush_every"
    )));
    engine.deinit();

    assert_eq!(manifest(&dir), "sound/ambience/wind.wav\n");
}

#[test]
fn test_insert_is_idempotent() {
    let dir = config_dir("download_url = \"http://cdn.example.com/\"\n");
    let mut engine = engine();
    engine.init(dir.path(), Path::new("valve"), &mut []).unwrap();

    assert!(engine.classify_and_insert("", "models/player.mdl"));
    assert!(engine.classify_and_insert("", "models/player.mdl"));
    assert!(engine.classify_and_insert("", "models\\player.mdl"));
    assert_eq!(engine.whitelist().unwrap().len(), 1);
    engine.deinit();

    assert_eq!(manifest(&dir), "models/player.mdl\n");
}

#[test]
fn test_calls_without_session_are_ignored() {
    let mut engine = engine();
    assert!(!engine.classify_and_insert("sound", "ambience/wind.wav"));
    engine.deinit();
    assert!(!engine.is_active());
    assert!(engine.whitelist().is_none());

    let operations: Vec<_> = engine
        .sink()
        .iter()
        .filter_map(|d| match d {
            Diagnostic::NotActive { operation } => Some(*operation),
            _ => None,
        })
        .collect();
    assert_eq!(operations, vec!["classify_and_insert", "deinit"]);
}

#[test]
fn test_engine_is_reusable() {
    let dir = config_dir("download_url = \"http://cdn.example.com/%game%/\"\n");
    let mut engine = engine();

    engine.init(dir.path(), Path::new("valve"), &mut []).unwrap();
    engine.classify_and_insert("", "models/player.mdl");
    engine.deinit();

    engine.init(dir.path(), Path::new("cstrike"), &mut []).unwrap();
    assert_eq!(engine.download_url(), Some("http://cdn.example.com/cstrike/"));
    assert!(engine.whitelist().unwrap().is_empty());
    assert_eq!(manifest(&dir), "");
    engine.deinit();
}

#[test]
fn test_flush_checkpoints_manifest() {
    let dir = config_dir("download_url = \"http://cdn.example.com/\"\n");
    let mut engine = engine();
    engine.init(dir.path(), Path::new("valve"), &mut []).unwrap();

    engine.classify_and_insert("sound", "ambience/wind.wav");
    engine.flush().unwrap();
    assert_eq!(manifest(&dir), "sound/ambience/wind.wav\n");
    engine.deinit();
}

#[test]
fn test_brush_models_are_dropped() {
    let dir = config_dir("download_url = \"http://cdn.example.com/\"\n");
    let mut engine = engine();
    engine.init(dir.path(), Path::new("valve"), &mut []).unwrap();

    assert!(!engine.classify_and_insert("", "*3"));
    assert!(!engine.classify_and_insert("", ""));
    assert!(engine.whitelist().unwrap().is_empty());
    engine.deinit();
}

#[test]
fn test_manifest_failure_keeps_session_alive() {
    let dir = config_dir(
        "download_url = \"http://cdn.example.com/\"\nmanifest = \"blocker/list.txt\"\n",
    );
    fs::write(dir.path().join("blocker"), "not a directory").unwrap();

    let mut engine = engine();
    engine.init(dir.path(), Path::new("valve"), &mut []).unwrap();
    assert!(engine.is_active());
    assert!(
        engine
            .sink()
            .iter()
            .any(|d| matches!(d, Diagnostic::Manifest(ManifestError::WriteFailure { .. })))
    );

    assert!(engine.classify_and_insert("", "models/player.mdl"));
    assert!(matches!(engine.flush(), Err(EngineError::Manifest(_))));
    assert_eq!(engine.whitelist().unwrap().len(), 1);
    engine.deinit();
}

fn resource() -> impl Strategy<Value = (&'static str, String)> {
    let hint = prop::sample::select(vec!["", "sound", "model", "generic"]);
    let segment = prop::sample::select(vec!["a", "B", "wind", "player"]);
    let path = prop::collection::vec(segment, 1..4).prop_flat_map(|segments| {
        prop::sample::select(vec!["wav", "mdl", "spr", "txt"])
            .prop_map(move |ext| format!("{}.{ext}", segments.join("/")))
    });
    (hint, path)
}

fn run(calls: &[(&'static str, String)], repeat: bool) -> String {
    let dir = config_dir(
        "download_url = \"http://cdn.example.com/\"\ncase_folding = \"sensitive\"\n",
    );
    let mut engine = engine();
    engine.init(dir.path(), Path::new("valve"), &mut []).unwrap();
    for (hint, path) in calls {
        engine.classify_and_insert(hint, path);
        if repeat {
            engine.classify_and_insert(hint, path);
        }
    }
    engine.deinit();
    manifest(&dir)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_manifest_is_deterministic_and_idempotent(calls in prop::collection::vec(resource(), 0..12)) {
        let once = run(&calls, false);
        prop_assert_eq!(&once, &run(&calls, false));
        prop_assert_eq!(&once, &run(&calls, true));

        for line in once.lines() {
            prop_assert!(!line.is_empty());
        }
        let sounds = calls.iter().filter(|(hint, _)| *hint == "sound").count();
        prop_assert!(once.lines().filter(|l| l.starts_with("sound/")).count() <= sounds);
    }
}
