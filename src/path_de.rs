use serde::de::DeserializeOwned;

/// A deserialization failure together with the JSON path where it happened.
#[derive(Debug, thiserror::Error)]
#[error("at JSON path {json_path} → {message}")]
pub struct JsonPathError {
    pub json_path: String,
    pub message: String,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, JsonPathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| JsonPathError {
        json_path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}
