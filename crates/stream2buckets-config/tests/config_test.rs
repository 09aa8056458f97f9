use anyhow::Result;
use std::io::Write;
use stream2buckets_config::{
    apply_blueprint_properties, load_property_groups, InitialPosition, RecordKind,
    RuntimeConfig, RuntimeMode,
};
use tempfile::NamedTempFile;

#[test]
fn test_load_from_path() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[source]
stream_name = "orders"
region = "eu-central-1"
record_kind = "order"

[sink]
output_path = "/tmp/out"
partition_format = "yyyy-MM-dd-HH"
job_start_millis = 1700000000000

[filter]
min_price = 5.0
"#
    )?;

    let config = RuntimeConfig::load_from_path(file.path())?;
    assert_eq!(config.source.record_kind, RecordKind::Order);
    assert_eq!(config.filter.min_price, 5.0);
    assert_eq!(
        config.sink.bucket_prefix(),
        "app-kda-kafka-to-s3/job_start=1700000000000/"
    );
    Ok(())
}

#[test]
fn test_invalid_partition_format_fails_load() {
    let result = RuntimeConfig::from_toml_str(
        RuntimeMode::Local,
        r#"
[sink]
output_path = "/tmp/out"
partition_format = "yyyy-MM-dd HH:mm z"
"#,
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Invalid partition format"));
}

#[test]
fn test_managed_defaults_require_properties() {
    let config = RuntimeConfig::from_mode_defaults(RuntimeMode::Managed);
    assert!(config.validate().is_err());
}

#[test]
fn test_managed_properties_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"[{{"PropertyGroupId": "BlueprintMetadata", "PropertyMap": {{
            "StreamName": "stocks",
            "AWSRegion": "us-east-2",
            "StreamInitialPosition": "AT_TIMESTAMP",
            "BucketName": "s3://analytics/stocks/",
            "PartitionFormat": "yyyy-MM-dd"
        }}}}]"#
    )?;

    let groups = load_property_groups(file.path())?;
    let mut config = RuntimeConfig::from_mode_defaults(RuntimeMode::Managed);
    apply_blueprint_properties(&mut config, &groups)?;
    config.validate()?;

    assert_eq!(config.source.initial_position, InitialPosition::AtTimestamp);
    assert_eq!(config.sink.output_path, "s3://analytics/stocks/");
    assert_eq!(config.sink.parallelism, None);
    Ok(())
}
