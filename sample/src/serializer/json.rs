//! Canonical JSON form of a sample.

use std::io;

use crate::model::Sample;

/// Serializes `sample` to pretty-printed JSON followed by a newline.
///
/// Key order is fixed by the model types, so equal samples always produce
/// byte-identical output.
///
/// # Errors
///
/// Returns an error if a float is not finite.
pub fn encode(sample: &Sample) -> io::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(sample)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses a sample from JSON bytes.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidData`] if the bytes are not a sample.
pub fn decode(bytes: &[u8]) -> io::Result<Sample> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{Distribution, ParameterSets};
    use crate::model::Metadata;

    #[test]
    fn layout_matches_the_interchange_format() {
        let distribution = Distribution::from_name("dipoles", &ParameterSets::default()).unwrap();
        let sample = distribution.draw_with(0, Metadata::now());
        let value: serde_json::Value = serde_json::from_slice(&encode(&sample).unwrap()).unwrap();
        assert_eq!(value["metadata"]["type"], "dislocation-sample");
        assert_eq!(value["distribution"]["module"], "dipoles");
        assert_eq!(value["distribution"]["seed"], 0);
        assert_eq!(value["region"]["type"], "square");
        assert_eq!(value["dislocations"]["senses"], serde_json::json!([1, -1]));
        assert_eq!(value["dislocations"]["positions"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn equal_samples_encode_identically() {
        let distribution = Distribution::from_name("restricted", &ParameterSets::default()).unwrap();
        let metadata = Metadata::now();
        let a = encode(&distribution.draw_with(4, metadata.clone())).unwrap();
        let b = encode(&distribution.draw_with(4, metadata)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn decodes_what_it_encodes() {
        let distribution = Distribution::from_name("uniform", &ParameterSets::default()).unwrap();
        let sample = distribution.draw(8);
        assert_eq!(decode(&encode(&sample).unwrap()).unwrap(), sample);
    }

    #[test]
    fn rejects_foreign_documents() {
        let err = decode(br#"{"metadata": 1}"#).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
