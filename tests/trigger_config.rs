use std::sync::Mutex;

use tempfile::NamedTempFile;

use wildlife_trigger::{ClassId, TriggerConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "WILDLIFE_CONFIG",
        "WILDLIFE_SOURCE",
        "WILDLIFE_BACKEND",
        "WILDLIFE_CONFIDENCE_THRESHOLD",
        "WILDLIFE_CENTER_FRACTION",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": {
            "url": "frames://./captures",
            "target_fps": 5,
            "width": 800,
            "height": 600
        },
        "backend": "tract",
        "model_path": "models/yard.onnx",
        "confidence_threshold": 0.25,
        "pins": {
            "squirrel": 5,
            "raccoon": 6
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("WILDLIFE_CONFIG", file.path());
    std::env::set_var("WILDLIFE_BACKEND", "color");
    std::env::set_var("WILDLIFE_CENTER_FRACTION", "0.4");

    let cfg = TriggerConfig::load().expect("load config");

    assert_eq!(cfg.source.url, "frames://./captures");
    assert_eq!(cfg.source.target_fps, 5);
    assert_eq!(cfg.source.width, 800);
    assert_eq!(cfg.source.height, 600);
    assert_eq!(cfg.backend, "color", "env overrides the file");
    assert_eq!(cfg.model_path.as_deref().unwrap().to_str(), Some("models/yard.onnx"));
    assert_eq!(cfg.confidence_threshold, 0.25);
    assert_eq!(cfg.center_fraction, 0.4);
    assert_eq!(cfg.pins.get(&ClassId::Squirrel), Some(&5));
    assert_eq!(cfg.pins.get(&ClassId::Raccoon), Some(&6));
    assert_eq!(cfg.pins.get(&ClassId::Skunk), None, "unmapped class stays unmapped");

    clear_env();
}

#[test]
fn defaults_apply_when_no_file_is_configured() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = TriggerConfig::load().expect("load defaults");

    assert_eq!(cfg.source.url, "stub://yard");
    assert_eq!(cfg.backend, "color");
    assert_eq!(cfg.confidence_threshold, 0.5);
    assert_eq!(cfg.center_fraction, 0.3);
    assert_eq!(cfg.pins.get(&ClassId::Squirrel), Some(&18));
    assert_eq!(cfg.pins.get(&ClassId::Skunk), Some(&19));
    assert_eq!(cfg.pins.get(&ClassId::Raccoon), Some(&20));

    clear_env();
}

#[test]
fn invalid_env_override_fails_at_load() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("WILDLIFE_CONFIDENCE_THRESHOLD", "not-a-number");
    assert!(TriggerConfig::load().is_err());

    std::env::set_var("WILDLIFE_CONFIDENCE_THRESHOLD", "1.5");
    assert!(TriggerConfig::load().is_err(), "out-of-range threshold is rejected");

    clear_env();
}

#[test]
fn malformed_config_file_fails_at_load() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ not json").expect("write config");
    std::env::set_var("WILDLIFE_CONFIG", file.path());

    assert!(TriggerConfig::load().is_err());

    clear_env();
}

#[test]
fn duplicate_channels_in_file_fail_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{ "pins": { "squirrel": 18, "skunk": 18 } }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("WILDLIFE_CONFIG", file.path());

    assert!(TriggerConfig::load().is_err());

    clear_env();
}
