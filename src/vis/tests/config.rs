use super::unique_temp_dir;
use crate::vis::{VisConfig, VisError, VisMethod};
use std::path::PathBuf;

#[test]
fn test_default_config() {
    let config = VisConfig::default();
    assert_eq!(config.batch_size, 8);
    assert_eq!(config.checkpoint_prefix(), PathBuf::from("model").join("tmp-model"));
    assert_eq!(config.log_dir, PathBuf::from("./Log"));
    assert_eq!(config.out_dir, PathBuf::from("./Output"));
    assert!(config.save_artifacts);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_config() {
    let dir = unique_temp_dir("config_json");
    let path = dir.join("vis.json");
    std::fs::write(&path, r#"{ "batch_size": 3, "save_artifacts": false }"#).unwrap();

    let config = VisConfig::from_json_file(&path).unwrap();
    assert_eq!(config.batch_size, 3);
    assert!(!config.save_artifacts);
    assert_eq!(config.checkpoint_name, "tmp-model");
}

#[test]
fn test_invalid_configs() {
    let dir = unique_temp_dir("config_invalid");
    let path = dir.join("zero.json");
    std::fs::write(&path, r#"{ "batch_size": 0 }"#).unwrap();
    assert!(matches!(
        VisConfig::from_json_file(&path),
        Err(VisError::InvalidInput(_))
    ));

    let path = dir.join("broken.json");
    std::fs::write(&path, "{ batch_size").unwrap();
    assert!(matches!(
        VisConfig::from_json_file(&path),
        Err(VisError::InvalidInput(_))
    ));

    assert!(matches!(
        VisConfig::from_json_file(dir.join("absent.json")),
        Err(VisError::Io(_))
    ));
}

#[test]
fn test_with_dirs() {
    let config = VisConfig::default().with_dirs("logs", "out");
    assert_eq!(config.log_dir, PathBuf::from("logs"));
    assert_eq!(config.out_dir, PathBuf::from("out"));
}

#[test]
fn test_method_from_str() {
    assert_eq!("act".parse::<VisMethod>().ok(), Some(VisMethod::Activation));
    assert_eq!("Deconv".parse::<VisMethod>().ok(), Some(VisMethod::Deconv));
    assert!(matches!(
        "deepdream".parse::<VisMethod>(),
        Err(VisError::InvalidInput(_))
    ));
}
