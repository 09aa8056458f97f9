// Managed application properties
//
// The managed runtime publishes application properties as a JSON array of
// property groups:
//
//   [{"PropertyGroupId": "BlueprintMetadata", "PropertyMap": {"StreamName": "..."}}]
//
// Blueprint settings live in the BlueprintMetadata group.

use crate::RuntimeConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Property group carrying the blueprint's settings
pub const BLUEPRINT_PROPERTY_GROUP: &str = "BlueprintMetadata";

const STREAM_NAME: &str = "StreamName";
const AWS_REGION: &str = "AWSRegion";
const STREAM_INITIAL_POSITION: &str = "StreamInitialPosition";
const BUCKET_NAME: &str = "BucketName";
const PARTITION_FORMAT: &str = "PartitionFormat";
const SINK_PARALLELISM: &str = "SinkParallelism";

const REQUIRED_KEYS: &[&str] = &[
    STREAM_NAME,
    AWS_REGION,
    STREAM_INITIAL_POSITION,
    BUCKET_NAME,
    PARTITION_FORMAT,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyGroup {
    #[serde(rename = "PropertyGroupId")]
    pub id: String,
    #[serde(rename = "PropertyMap", default)]
    pub properties: HashMap<String, String>,
}

/// Parse the JSON property-group document
pub fn parse_property_groups(content: &str) -> Result<Vec<PropertyGroup>> {
    serde_json::from_str(content).context("Failed to parse application properties")
}

/// Read and parse an application properties file
pub fn load_property_groups(path: impl AsRef<Path>) -> Result<Vec<PropertyGroup>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read application properties: {}", path.display()))?;
    parse_property_groups(&content)
}

/// Apply the BlueprintMetadata group to a config.
///
/// Every required key must be present; the first missing key is reported.
pub fn apply_blueprint_properties(
    config: &mut RuntimeConfig,
    groups: &[PropertyGroup],
) -> Result<()> {
    let group = groups
        .iter()
        .find(|g| g.id == BLUEPRINT_PROPERTY_GROUP)
        .ok_or_else(|| {
            anyhow!(
                "Unable to retrieve {}; supply it via application properties",
                BLUEPRINT_PROPERTY_GROUP
            )
        })?;

    if let Some(missing) = REQUIRED_KEYS
        .iter()
        .find(|key| !group.properties.contains_key(**key))
    {
        anyhow::bail!("Unable to retrieve property: {}", missing);
    }

    let props = &group.properties;
    config.source.stream_name = props[STREAM_NAME].clone();
    config.source.region = props[AWS_REGION].clone();
    config.source.initial_position = props[STREAM_INITIAL_POSITION]
        .parse()
        .with_context(|| format!("Invalid property: {}", STREAM_INITIAL_POSITION))?;
    config.sink.output_path = props[BUCKET_NAME].clone();
    config.sink.partition_format = props[PARTITION_FORMAT].clone();

    if let Some(parallelism) = props.get(SINK_PARALLELISM) {
        let parsed = parallelism
            .parse::<usize>()
            .with_context(|| format!("Invalid property: {}", SINK_PARALLELISM))?;
        config.sink.parallelism = Some(parsed);
    }

    tracing::debug!(
        stream_name = %config.source.stream_name,
        output_path = %config.sink.output_path,
        "Applied application properties"
    );

    Ok(())
}
