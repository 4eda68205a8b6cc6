//! Strongly-typed ID types for flows, flow versions and triggers.
//!
//! All IDs are ULIDs, rendered with a short type prefix (`flow_01H...`).
//! Parsing accepts both the prefixed form and a bare ULID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new ID with a randomly generated ULID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Creates an ID from a ULID.
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Returns the prefix used for display formatting.
            #[must_use]
            pub const fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let ulid_str = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ulid::from_str(ulid_str)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }

        impl From<Ulid> for $name {
            fn from(ulid: Ulid) -> Self {
                Self(ulid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a flow.
    FlowId,
    "flow"
);

define_id!(
    /// Unique identifier for one immutable snapshot of a flow's step graph.
    FlowVersionId,
    "fv"
);

define_id!(
    /// Unique identifier for an enabled trigger of a flow.
    TriggerId,
    "trg"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_version_id_display_format() {
        let id = FlowVersionId::new();
        assert!(id.to_string().starts_with("fv_"));
    }

    #[test]
    fn parse_with_prefix() {
        let id = FlowId::new();
        let parsed: FlowId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_without_prefix() {
        let ulid = Ulid::new();
        let id: FlowVersionId = ulid.to_string().parse().expect("should parse");
        assert_eq!(id.as_ulid(), ulid);
    }

    #[test]
    fn parse_rejects_foreign_prefix() {
        let id = FlowId::new();
        let result: Result<FlowVersionId, _> = id.to_string().parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "FlowVersionId");
    }

    #[test]
    fn ids_order_by_creation_time() {
        let earlier = FlowVersionId::from_ulid(Ulid::from_parts(1_000, 7));
        let later = FlowVersionId::from_ulid(Ulid::from_parts(2_000, 1));
        assert!(earlier < later);
    }

    #[test]
    fn id_serializes_as_bare_ulid() {
        let id = TriggerId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id.as_ulid()));
        let parsed: TriggerId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }
}
