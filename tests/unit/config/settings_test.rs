use std::path::PathBuf;
use classimport::{
    config::{load_config_with_env_prefix, ConfigBuilder, SettingsValidator},
    core::ImportFilters,
    error::Result,
    models::config::{PartialSettings, Settings},
};

#[test]
fn test_partial_settings_merge() -> Result<()> {
    let mut base = PartialSettings {
        classpath: Some(vec![PathBuf::from("/base/classes")]),
        exclude_patterns: Some(vec!["*/generated/*".to_string()]),
        max_depth: Some(5),
        ..Default::default()
    };

    let override_settings = PartialSettings {
        classpath: Some(vec![PathBuf::from("/override/classes")]),
        exclude_tests: Some(true),
        parallel: Some(false),
        ..Default::default()
    };

    base.merge_from(override_settings);

    assert_eq!(base.classpath, Some(vec![PathBuf::from("/override/classes")]));
    assert_eq!(base.exclude_patterns, Some(vec!["*/generated/*".to_string()]));
    assert_eq!(base.max_depth, Some(5)); // Unchanged
    assert_eq!(base.exclude_tests, Some(true));
    assert_eq!(base.parallel, Some(false));

    Ok(())
}

#[test]
fn test_partial_settings_to_settings() -> Result<()> {
    let partial = PartialSettings {
        java_home: Some(PathBuf::from("/opt/jdk")),
        worker_threads: Some(3),
        ..Default::default()
    };

    let settings = partial.to_settings();

    assert_eq!(settings.java_home, Some(PathBuf::from("/opt/jdk")));
    assert_eq!(settings.effective_worker_threads(), 3);
    // Defaults for unspecified fields
    assert!(settings.parallel);
    assert!(!settings.exclude_tests);
    assert!(!settings.follow_links);
    assert!(settings.classpath.is_empty());

    Ok(())
}

#[test]
fn test_settings_default() -> Result<()> {
    let settings = Settings::default();

    assert!(settings.classpath.is_empty());
    assert_eq!(settings.java_home, None);
    assert!(settings.exclude_patterns.is_empty());
    assert!(!settings.exclude_package_infos);
    assert!(settings.parallel);
    assert_eq!(settings.worker_threads, None);
    assert!(settings.effective_worker_threads() >= 1);
    assert_eq!(settings.max_depth, None);
    assert!(SettingsValidator::validate(&settings).is_ok());

    Ok(())
}

#[test]
fn test_settings_become_filters() -> Result<()> {
    let settings = ConfigBuilder::new()
        .merge(PartialSettings {
            exclude_patterns: Some(vec!["*/shaded/*".to_string()]),
            exclude_tests: Some(true),
            exclude_package_infos: Some(true),
            ..Default::default()
        })
        .build()?;

    let filters = ImportFilters::from_settings(&settings)?;
    assert_eq!(filters.len(), 3);
    assert!(ImportFilters::from_settings(&Settings::default())?.is_empty());

    Ok(())
}

#[test]
fn test_overrides_beat_environment() -> Result<()> {
    std::env::set_var("CISETTINGSTEST_WORKER_THREADS", "6");
    std::env::set_var("CISETTINGSTEST_EXCLUDE_TESTS", "true");

    let settings = load_config_with_env_prefix(
        PartialSettings {
            worker_threads: Some(2),
            ..Default::default()
        },
        "CISETTINGSTEST",
    )?;

    assert_eq!(settings.worker_threads, Some(2));
    assert!(settings.exclude_tests);

    std::env::remove_var("CISETTINGSTEST_WORKER_THREADS");
    std::env::remove_var("CISETTINGSTEST_EXCLUDE_TESTS");

    Ok(())
}
