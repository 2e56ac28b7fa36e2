//! Global subscriber installation
//!
//! Runs in its own process, so this file owns the global default.

use murmur_logging::{FileConfig, LogConfig, LoggingError, MurmurSubscriberBuilder, RotationStrategy};

#[test]
fn test_file_output_and_double_init() {
    let dir = tempfile::tempdir().unwrap();
    let config = LogConfig {
        default_level: "info".to_string(),
        file: Some(FileConfig {
            directory: dir.path().to_path_buf(),
            prefix: "murmur-test".to_string(),
            rotation: RotationStrategy::Never,
        }),
        ..LogConfig::testing()
    };

    let guard = MurmurSubscriberBuilder::new()
        .with_config(config)
        .with_console(false)
        .try_init()
        .expect("first init succeeds");
    assert!(guard.is_some(), "file output returns a worker guard");

    tracing::warn!(step = 1, "opinion sweep finished");
    drop(guard);

    let written = std::fs::read_to_string(dir.path().join("murmur-test.log")).unwrap();
    let line = written.lines().next().expect("one JSON line written");
    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(value["message"], "opinion sweep finished");
    assert_eq!(value["step"], 1);

    let second = MurmurSubscriberBuilder::new().try_init();
    assert!(matches!(second, Err(LoggingError::AlreadyInitialized(_))));
}
