//! Pod validation rules.
//!
//! Validation never stops at the first problem: every rule runs and all
//! failures are returned together as [`ValidationErrors`].

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::types::{Container, ContainerManifest, Pod, MANIFEST_VERSION};

const DNS_LABEL_MAX: usize = 63;
const DNS_SUBDOMAIN_MAX: usize = 253;

/// Why a field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    /// A required value is missing.
    #[error("required value")]
    Required,

    /// The value is not allowed.
    #[error("invalid value {0:?}")]
    Invalid(String),

    /// The value repeats one seen earlier.
    #[error("duplicate value {0:?}")]
    Duplicate(String),

    /// The value is not one of the supported options.
    #[error("unsupported value {0:?}")]
    NotSupported(String),
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {kind}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What was wrong with it.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// Every rule that failed for one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// The individual failures.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation errors: [")?;
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        f.write_str("]")
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a pod and its manifest.
///
/// # Errors
///
/// Returns every failed rule if the pod is not acceptable.
pub fn validate_pod(pod: &Pod) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if pod.id.is_empty() {
        errors.push(ValidationError::new("id", ValidationErrorKind::Required));
    } else if !is_dns_subdomain(pod.id.as_str()) {
        errors.push(ValidationError::new(
            "id",
            ValidationErrorKind::Invalid(pod.id.to_string()),
        ));
    }

    validate_manifest(&pod.desired_state.manifest, &mut errors);

    let manifest_id = &pod.desired_state.manifest.id;
    if !pod.id.is_empty() && !manifest_id.is_empty() && *manifest_id != pod.id {
        errors.push(ValidationError::new(
            "desired_state.manifest.id",
            ValidationErrorKind::Invalid(manifest_id.to_string()),
        ));
    }

    errors.into_result()
}

fn validate_manifest(manifest: &ContainerManifest, errors: &mut ValidationErrors) {
    if manifest.version.is_empty() {
        errors.push(ValidationError::new(
            "desired_state.manifest.version",
            ValidationErrorKind::Required,
        ));
    } else if manifest.version != MANIFEST_VERSION {
        errors.push(ValidationError::new(
            "desired_state.manifest.version",
            ValidationErrorKind::NotSupported(manifest.version.clone()),
        ));
    }

    if manifest.id.is_empty() {
        errors.push(ValidationError::new(
            "desired_state.manifest.id",
            ValidationErrorKind::Required,
        ));
    } else if !is_dns_subdomain(manifest.id.as_str()) {
        errors.push(ValidationError::new(
            "desired_state.manifest.id",
            ValidationErrorKind::Invalid(manifest.id.to_string()),
        ));
    }

    let mut names = HashSet::new();
    let mut port_names = HashSet::new();
    let mut host_ports = HashSet::new();

    for (i, container) in manifest.containers.iter().enumerate() {
        let field = format!("desired_state.manifest.containers[{i}]");
        validate_container(container, &field, &mut names, errors);

        for (j, port) in container.ports.iter().enumerate() {
            let port_field = format!("{field}.ports[{j}]");
            if port.container_port == 0 {
                errors.push(ValidationError::new(
                    format!("{port_field}.container_port"),
                    ValidationErrorKind::Invalid("0".to_string()),
                ));
            }
            if !port.name.is_empty() {
                if !is_dns_label(&port.name) {
                    errors.push(ValidationError::new(
                        format!("{port_field}.name"),
                        ValidationErrorKind::Invalid(port.name.clone()),
                    ));
                } else if !port_names.insert(port.name.clone()) {
                    errors.push(ValidationError::new(
                        format!("{port_field}.name"),
                        ValidationErrorKind::Duplicate(port.name.clone()),
                    ));
                }
            }
            match port.host_port {
                Some(0) => errors.push(ValidationError::new(
                    format!("{port_field}.host_port"),
                    ValidationErrorKind::Invalid("0".to_string()),
                )),
                Some(hp) if !host_ports.insert(hp) => errors.push(ValidationError::new(
                    format!("{port_field}.host_port"),
                    ValidationErrorKind::Duplicate(hp.to_string()),
                )),
                _ => {}
            }
        }
    }
}

fn validate_container(
    container: &Container,
    field: &str,
    names: &mut HashSet<String>,
    errors: &mut ValidationErrors,
) {
    if container.name.is_empty() {
        errors.push(ValidationError::new(
            format!("{field}.name"),
            ValidationErrorKind::Required,
        ));
    } else if !is_dns_label(&container.name) {
        errors.push(ValidationError::new(
            format!("{field}.name"),
            ValidationErrorKind::Invalid(container.name.clone()),
        ));
    } else if !names.insert(container.name.clone()) {
        errors.push(ValidationError::new(
            format!("{field}.name"),
            ValidationErrorKind::Duplicate(container.name.clone()),
        ));
    }

    if container.image.trim().is_empty() {
        errors.push(ValidationError::new(
            format!("{field}.image"),
            ValidationErrorKind::Required,
        ));
    }

    for (k, env) in container.env.iter().enumerate() {
        if env.name.is_empty() {
            errors.push(ValidationError::new(
                format!("{field}.env[{k}].name"),
                ValidationErrorKind::Required,
            ));
        } else if !is_c_identifier(&env.name) {
            errors.push(ValidationError::new(
                format!("{field}.env[{k}].name"),
                ValidationErrorKind::Invalid(env.name.clone()),
            ));
        }
    }
}

/// Lowercase alphanumerics and `-`, starting and ending alphanumeric, at most 63 chars.
#[must_use]
pub fn is_dns_label(value: &str) -> bool {
    let bytes = value.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= DNS_LABEL_MAX
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes[0] != b'-'
        && bytes[bytes.len() - 1] != b'-'
}

/// Dot-separated DNS labels, at most 253 chars.
#[must_use]
pub fn is_dns_subdomain(value: &str) -> bool {
    !value.is_empty() && value.len() <= DNS_SUBDOMAIN_MAX && value.split('.').all(is_dns_label)
}

fn is_c_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnvVar, Port};

    fn valid_pod() -> Pod {
        Pod::new(
            "web-1",
            vec![Container::new("nginx", "nginx:1.25").with_port(Port {
                name: "http".to_string(),
                container_port: 80,
                host_port: Some(8080),
                ..Default::default()
            })],
        )
    }

    #[test]
    fn accepts_valid_pod() {
        assert!(validate_pod(&valid_pod()).is_ok());
    }

    #[test]
    fn uuid_ids_are_dns_subdomains() {
        let id = crate::PodId::generate();
        assert!(is_dns_subdomain(id.as_str()));
    }

    #[test]
    fn aggregates_every_failure() {
        let mut pod = valid_pod();
        pod.desired_state.manifest.version = "v2".to_string();
        pod.desired_state.manifest.containers.push(Container::new("nginx", ""));

        let errors = validate_pod(&pod).unwrap_err();
        let fields: Vec<_> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(errors.len(), 3);
        assert!(fields.contains(&"desired_state.manifest.version"));
        assert!(fields.contains(&"desired_state.manifest.containers[1].name"));
        assert!(fields.contains(&"desired_state.manifest.containers[1].image"));
    }

    #[test]
    fn rejects_missing_ids() {
        let mut pod = valid_pod();
        pod.id = crate::PodId::default();
        pod.desired_state.manifest.id = crate::PodId::default();

        let errors = validate_pod(&pod).unwrap_err();
        assert!(errors
            .errors()
            .iter()
            .all(|e| e.kind == ValidationErrorKind::Required));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn rejects_manifest_id_mismatch() {
        let mut pod = valid_pod();
        pod.desired_state.manifest.id = crate::PodId::from("other");

        let errors = validate_pod(&pod).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].field, "desired_state.manifest.id");
        assert_eq!(
            errors.errors()[0].kind,
            ValidationErrorKind::Invalid("other".to_string())
        );
    }

    #[test]
    fn rejects_duplicate_host_ports() {
        let mut pod = valid_pod();
        pod.desired_state.manifest.containers.push(
            Container::new("sidecar", "envoy").with_port(Port {
                container_port: 9000,
                host_port: Some(8080),
                ..Default::default()
            }),
        );

        let errors = validate_pod(&pod).unwrap_err();
        assert_eq!(
            errors.errors()[0].kind,
            ValidationErrorKind::Duplicate("8080".to_string())
        );
    }

    #[test]
    fn rejects_bad_env_names() {
        let mut pod = valid_pod();
        pod.desired_state.manifest.containers[0].env.push(EnvVar {
            name: "1BAD".to_string(),
            value: String::new(),
        });
        assert!(validate_pod(&pod).is_err());
    }

    #[test]
    fn dns_label_rules() {
        assert!(is_dns_label("a"));
        assert!(is_dns_label("web-1"));
        assert!(!is_dns_label("-web"));
        assert!(!is_dns_label("web-"));
        assert!(!is_dns_label("Web"));
        assert!(!is_dns_label(&"a".repeat(64)));
        assert!(is_dns_subdomain("host1.zone.example"));
        assert!(!is_dns_subdomain("host1..zone"));
    }

    #[test]
    fn display_lists_all_errors() {
        let mut pod = valid_pod();
        pod.desired_state.manifest.containers[0].image = String::new();
        let message = validate_pod(&pod).unwrap_err().to_string();
        assert!(message.starts_with("validation errors: ["));
        assert!(message.contains("image: required value"));
    }
}
