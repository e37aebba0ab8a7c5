//! Model definition loading
//!
//! Only the bits the bridge needs are extracted: the model name and the link
//! names. The document itself is handed to the simulator untouched.

use std::path::Path;

use contracts::ModelDescriptor;
use tracing::{debug, instrument};

use crate::error::{Result, TwinError};

/// Read a model definition file
///
/// # Errors
/// - `ModelFileMissing` if the path does not exist
/// - `ModelRead` if it cannot be read
/// - `MalformedModel` if no `<model name="...">` element is present
#[instrument(name = "twin_load_descriptor", skip(path), fields(path = %path.display()))]
pub fn load_descriptor(path: &Path) -> Result<ModelDescriptor> {
    if !path.exists() {
        return Err(TwinError::ModelFileMissing {
            path: path.to_path_buf(),
        });
    }

    let document = std::fs::read_to_string(path).map_err(|source| TwinError::ModelRead {
        path: path.to_path_buf(),
        source,
    })?;

    let name = parse_model_name(&document).ok_or_else(|| TwinError::MalformedModel {
        path: path.to_path_buf(),
        reason: "no <model name=\"...\"> element".to_string(),
    })?;

    debug!(model = %name, bytes = document.len(), "Model definition loaded");

    Ok(ModelDescriptor {
        name,
        source: path.to_path_buf(),
        document,
    })
}

/// Name of the first `<model>` element
pub fn parse_model_name(document: &str) -> Option<String> {
    element_names(document, "model").into_iter().next()
}

/// `name` attributes of every `<element ...>` tag, in document order
///
/// Tags without a non-empty `name` attribute are skipped.
pub fn element_names(document: &str, element: &str) -> Vec<String> {
    let open = format!("<{element}");
    let mut names = Vec::new();
    let mut rest = document;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(end) = after.find('>') else {
            break;
        };
        let tag = &after[..end];
        rest = &after[end..];

        // `<modeling>` is not `<model>`
        if !tag.starts_with(|c: char| c.is_whitespace()) {
            continue;
        }
        if let Some(name) = attribute(tag, "name").filter(|n| !n.is_empty()) {
            names.push(name.to_string());
        }
    }
    names
}

/// Value of `key="..."` or `key='...'` inside a tag body
fn attribute<'a>(tag: &'a str, key: &str) -> Option<&'a str> {
    let mut rest = tag;
    loop {
        let idx = rest.find(key)?;
        let preceded_by_space = rest[..idx]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        let after = rest[idx + key.len()..].trim_start();
        rest = &rest[idx + key.len()..];

        if !preceded_by_space {
            continue;
        }
        let Some(value) = after.strip_prefix('=') else {
            continue;
        };
        let value = value.trim_start();
        let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let body = &value[1..];
        return body.find(quote).map(|end| &body[..end]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const QUAD: &str = r#"<?xml version="1.0"?>
<sdf version="1.9">
  <model name="quadrotor">
    <link name="base_link"/>
    <link name='cg'>
      <inertial/>
    </link>
    <joint name="rotor_0_joint" type="revolute"/>
  </model>
</sdf>
"#;

    #[test]
    fn test_parse_model_name() {
        assert_eq!(parse_model_name(QUAD).as_deref(), Some("quadrotor"));
        assert_eq!(parse_model_name("<sdf><world name='w'/></sdf>"), None);
        assert_eq!(parse_model_name("<modeling name='x'/>"), None);
        assert_eq!(parse_model_name("<model name=\"\"/>"), None);
    }

    #[test]
    fn test_element_names() {
        assert_eq!(element_names(QUAD, "link"), vec!["base_link", "cg"]);
        assert_eq!(element_names(QUAD, "joint"), vec!["rotor_0_joint"]);
    }

    #[test]
    fn test_attribute_requires_exact_key() {
        assert_eq!(attribute(" filename=\"a\" name=\"b\"", "name"), Some("b"));
        assert_eq!(attribute(" name = 'spaced'", "name"), Some("spaced"));
        assert_eq!(attribute(" type=\"ball\"", "name"), None);
    }

    #[test]
    fn test_load_descriptor() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(QUAD.as_bytes()).unwrap();

        let descriptor = load_descriptor(file.path()).unwrap();
        assert_eq!(descriptor.name, "quadrotor");
        assert_eq!(descriptor.source, file.path());
        assert_eq!(descriptor.document, QUAD);
    }

    #[test]
    fn test_missing_file() {
        let err = load_descriptor(Path::new("/nonexistent/twin.sdf")).unwrap_err();
        assert!(matches!(err, TwinError::ModelFileMissing { .. }));
    }

    #[test]
    fn test_malformed_model() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<sdf version='1.9'></sdf>").unwrap();

        let err = load_descriptor(file.path()).unwrap_err();
        assert!(matches!(err, TwinError::MalformedModel { .. }));
    }
}
