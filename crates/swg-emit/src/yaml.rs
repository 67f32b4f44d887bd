use crate::error::EmitError;

/// Transcode the JSON encoding into YAML.
///
/// The YAML is derived from the JSON text rather than from the document, so
/// both encodings always describe the same value.
pub fn json_to_yaml(json: &str) -> Result<String, EmitError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(serde_yaml_ng::to_string(&value)?)
}
