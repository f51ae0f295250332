use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;
use classimport::{
    config::parser::{
        create_default_config, find_first_config, parse_config_content, parse_config_file,
        validate_partial_settings,
    },
    error::{ImportError, Result},
    models::config::PartialSettings,
};

#[test]
fn test_parse_config_content() -> Result<()> {
    let config_content = r#"
        classpath = ["build/classes/java/main", "libs/*"]
        java_home = "/opt/jdk-21"
        exclude_patterns = ["*/generated/*"]
        exclude_package_infos = true
        worker_threads = 2
        follow_links = true
    "#;

    let settings = parse_config_content(config_content, "virtual_path.toml")?;

    assert_eq!(
        settings.classpath,
        Some(vec![
            PathBuf::from("build/classes/java/main"),
            PathBuf::from("libs/*")
        ])
    );
    assert_eq!(settings.java_home, Some(PathBuf::from("/opt/jdk-21")));
    assert_eq!(settings.exclude_patterns, Some(vec!["*/generated/*".to_string()]));
    assert_eq!(settings.exclude_package_infos, Some(true));
    assert_eq!(settings.worker_threads, Some(2));
    assert_eq!(settings.follow_links, Some(true));
    assert_eq!(settings.parallel, None);

    Ok(())
}

#[test]
fn test_parse_config_file() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("test_config.toml");

    fs::write(
        &config_path,
        r#"
            exclude_tests = true
            parallel = false
            max_depth = 12
        "#,
    )?;

    let settings = parse_config_file(&config_path)?;

    assert_eq!(settings.exclude_tests, Some(true));
    assert_eq!(settings.parallel, Some(false));
    assert_eq!(settings.max_depth, Some(12));

    Ok(())
}

#[test]
fn test_parse_config_file_errors() -> Result<()> {
    let temp_dir = tempdir()?;

    let missing = temp_dir.path().join("missing.toml");
    assert!(matches!(
        parse_config_file(&missing),
        Err(ImportError::ConfigNotFound { .. })
    ));

    let broken = temp_dir.path().join("broken.toml");
    fs::write(&broken, "classpath = [")?;
    let err = parse_config_file(&broken).unwrap_err();
    assert!(matches!(err, ImportError::ConfigParse { .. }));
    assert!(err.is_critical());

    Ok(())
}

#[test]
fn test_validate_partial_settings() -> Result<()> {
    let valid_settings = PartialSettings {
        classpath: Some(vec![PathBuf::from("/app/classes")]),
        exclude_patterns: Some(vec!["*Test.class".to_string()]),
        max_depth: Some(5),
        ..Default::default()
    };
    assert!(validate_partial_settings(&valid_settings, "test.toml").is_ok());

    let empty_classpath_entry = PartialSettings {
        classpath: Some(vec![PathBuf::new()]),
        ..Default::default()
    };
    assert!(validate_partial_settings(&empty_classpath_entry, "test.toml").is_err());

    let bad_pattern = PartialSettings {
        exclude_patterns: Some(vec!["[oops".to_string()]),
        ..Default::default()
    };
    assert!(validate_partial_settings(&bad_pattern, "test.toml").is_err());

    Ok(())
}

#[test]
fn test_default_config_round_trip() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join(".classimport.toml");

    create_default_config(&config_path)?;
    let found = find_first_config(&[config_path])?;

    let settings = found.expect("default config is found").to_settings();
    assert!(settings.parallel);
    assert!(settings.exclude_patterns.is_empty());
    assert!(settings.classpath.is_empty());

    Ok(())
}
