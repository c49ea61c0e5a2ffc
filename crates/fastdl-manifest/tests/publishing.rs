use std::time::Duration;

use fastdl_manifest::{FlushPolicy, ManifestFormat, ManifestWriter};
use fastdl_whitelist::{CaseFolding, PathNormalizer, ResourceCategory, WhitelistEntry, WhitelistSet};
use tempfile::tempdir;

const SEQUENCE: &[(ResourceCategory, &str)] = &[
    (ResourceCategory::Model, "models/player.mdl"),
    (ResourceCategory::Sound, "ambience/wind.wav"),
    (ResourceCategory::Model, "models\\player.mdl"),
    (ResourceCategory::Generic, "gfx/env/skyup.tga"),
    (ResourceCategory::Sound, "sound/ambience/wind.wav"),
    (ResourceCategory::Model, "sprites/smoke.spr"),
];

fn run_session(path: &std::path::Path, format: ManifestFormat) {
    let n = PathNormalizer::new(CaseFolding::Sensitive);
    let mut set = WhitelistSet::new();
    let policy = FlushPolicy::default().max_pending(2).max_age(Duration::from_secs(3600));
    let mut writer = ManifestWriter::new(path, format, policy);
    writer.flush().unwrap();

    for (category, raw) in SEQUENCE {
        let entry = WhitelistEntry::new(*category, n.normalize(raw, *category));
        if set.insert(entry.clone()) {
            writer.record(&entry).unwrap();
        }
    }
    writer.close().unwrap();
}

#[test]
fn identical_sessions_publish_identical_bytes() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");

    run_session(&first, ManifestFormat::Plain);
    run_session(&second, ManifestFormat::Plain);

    let first = std::fs::read(first).unwrap();
    assert_eq!(first, std::fs::read(second).unwrap());
    assert_eq!(
        String::from_utf8(first).unwrap(),
        "models/player.mdl\nsound/ambience/wind.wav\ngfx/env/skyup.tga\nsprites/smoke.spr\n"
    );
}

#[test]
fn tagged_manifest_lists_each_entry() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tagged.txt");
    run_session(&path, ManifestFormat::Tagged);

    let body = std::fs::read_to_string(path).unwrap();
    let lines: Vec<_> = body.lines().collect();
    assert_eq!(
        lines,
        vec![
            "model\tmodels/player.mdl",
            "sound\tsound/ambience/wind.wav",
            "generic\tgfx/env/skyup.tga",
            "model\tsprites/smoke.spr",
        ]
    );
}

#[test]
fn manifest_directory_is_created_on_first_flush() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cstrike").join("fastdl").join("whitelist.txt");
    let writer = ManifestWriter::new(&path, ManifestFormat::Plain, FlushPolicy::default());
    writer.close().unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "");
}
