use serde::{Deserialize, Serialize};

/// Closed node classification. Source records carry free-form type strings;
/// everything funnels through `normalize` exactly once, at build time.
///
/// The wire names follow the NER label vocabulary the upstream extraction
/// pipeline emits (PERSON / ORG / GPE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "PERSON")]
    Person,
    #[serde(rename = "ORG")]
    Org,
    #[serde(rename = "GPE")]
    Place,
    #[serde(rename = "IMAGE")]
    Image,
    #[serde(rename = "OTHER")]
    Other,
}

impl NodeKind {
    /// Total normalization from an arbitrary source-provided type string.
    pub fn normalize(raw: &str) -> NodeKind {
        match raw.trim().to_lowercase().as_str() {
            "person" | "per" => NodeKind::Person,
            "organization" | "org" => NodeKind::Org,
            "place" | "location" | "loc" | "gpe" => NodeKind::Place,
            "image" | "img" => NodeKind::Image,
            _ => NodeKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_known_types() {
        assert_eq!(NodeKind::normalize("person"), NodeKind::Person);
        assert_eq!(NodeKind::normalize("PERSON"), NodeKind::Person);
        assert_eq!(NodeKind::normalize("org"), NodeKind::Org);
        assert_eq!(NodeKind::normalize("Organization"), NodeKind::Org);
        assert_eq!(NodeKind::normalize("place"), NodeKind::Place);
        assert_eq!(NodeKind::normalize("LOC"), NodeKind::Place);
        assert_eq!(NodeKind::normalize("location"), NodeKind::Place);
    }

    #[test]
    fn unknown_types_fall_through_to_other() {
        assert_eq!(NodeKind::normalize("vessel"), NodeKind::Other);
        assert_eq!(NodeKind::normalize(""), NodeKind::Other);
        assert_eq!(NodeKind::normalize("  WORK_OF_ART "), NodeKind::Other);
    }

    #[test]
    fn serializes_with_ner_vocabulary() {
        assert_eq!(
            serde_json::to_string(&NodeKind::Place).unwrap(),
            r#""GPE""#
        );
        assert_eq!(
            serde_json::to_string(&NodeKind::Person).unwrap(),
            r#""PERSON""#
        );
    }
}
