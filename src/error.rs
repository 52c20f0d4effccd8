//! Construction-time failures.
//!
//! Every error here is raised synchronously by a build or instancing call and
//! leaves the scene untouched. Collision queries and emission toggling never
//! fail; they degrade to "no collision" / "no transition" instead.

use std::fmt;

use crate::data_structures::store::TemplateId;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A profile had too few points to span a surface.
    DegenerateProfile { shape: String, points: usize },
    /// A closed outline crosses itself and cannot be capped.
    SelfIntersectingProfile { shape: String },
    /// The number of uv regions does not match the faces the primitive produces.
    FaceMappingMismatch {
        primitive: &'static str,
        expected: usize,
        found: usize,
    },
    /// The template was already consumed by an earlier `instantiate` call.
    StaleTemplate { template: TemplateId },
    UnknownTemplate { template: TemplateId },
    /// An instance with this identifier is already registered.
    DuplicateInstance { id: String },
    Tessellation { shape: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DegenerateProfile { shape, points } => write!(
                f,
                "profile for '{}' is degenerate: {} point(s), at least 3 are required",
                shape, points
            ),
            Error::SelfIntersectingProfile { shape } => {
                write!(f, "outline for '{}' intersects itself", shape)
            }
            Error::FaceMappingMismatch {
                primitive,
                expected,
                found,
            } => write!(
                f,
                "{} expects {} face regions but the mapping has {}",
                primitive, expected, found
            ),
            Error::StaleTemplate { template } => write!(
                f,
                "template {} was already instanced and removed from the scene",
                template
            ),
            Error::UnknownTemplate { template } => {
                write!(f, "template {} is not in the store", template)
            }
            Error::DuplicateInstance { id } => {
                write!(f, "an instance named '{}' is already registered", id)
            }
            Error::Tessellation { shape, reason } => {
                write!(f, "failed to tessellate '{}': {}", shape, reason)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = Error::DegenerateProfile {
            shape: "roof".into(),
            points: 2,
        };
        assert!(err.to_string().contains("roof"));
        assert!(err.to_string().contains("2 point"));

        let err = Error::FaceMappingMismatch {
            primitive: "cylinder",
            expected: 3,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "cylinder expects 3 face regions but the mapping has 4"
        );
    }

    #[test]
    fn converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(Error::DuplicateInstance { id: "house_0".into() })?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(err.downcast_ref::<Error>().is_some());
    }
}
