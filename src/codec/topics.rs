//! Ethereum topic filter expansion.
//!
//! An Ethereum log filter's `topics` array is an AND of per-position ORs:
//! each position holds either a single topic, a list of alternatives, or
//! null (wildcard). The backend instead takes a list of flat "topic set"
//! objects keyed `topic0..topicN`, any of which may match. Expansion is the
//! cartesian product of the per-position alternatives.

use serde_json::{Map, Value};

use crate::codec::{CodecError, CodecResult};

/// One backend topic set: `{"topic0": ..., "topic1": ...}`.
pub type TopicSet = Map<String, Value>;

/// Expand an Ethereum `topics` parameter into backend topic sets.
///
/// An empty (or absent) filter yields no sets, meaning no topic filtering.
/// Null positions are wildcards and are left out of every produced set.
pub fn topics_to_backend(topics: &Value) -> CodecResult<Vec<TopicSet>> {
    let positions = match topics {
        Value::Null => return Ok(Vec::new()),
        Value::Array(positions) => positions,
        other => {
            return Err(CodecError::InvalidHex(format!(
                "topics must be an array, got {other}"
            )))
        }
    };
    if positions.is_empty() {
        return Ok(Vec::new());
    }

    // Per-position alternative lists; `None` marks a wildcard position.
    let mut matrix: Vec<Vec<Option<String>>> = Vec::with_capacity(positions.len());
    for position in positions {
        match position {
            Value::Null => matrix.push(vec![None]),
            Value::String(topic) => matrix.push(vec![Some(topic.clone())]),
            Value::Array(alternatives) => {
                let mut parsed = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    match alternative {
                        Value::String(topic) => parsed.push(Some(topic.clone())),
                        Value::Null => parsed.push(None),
                        other => {
                            return Err(CodecError::InvalidHex(format!(
                                "topic alternative must be a string, got {other}"
                            )))
                        }
                    }
                }
                matrix.push(parsed);
            }
            other => {
                return Err(CodecError::InvalidHex(format!(
                    "topic position must be a string or array, got {other}"
                )))
            }
        }
    }

    // Cartesian product across positions.
    let mut combinations: Vec<Vec<Option<String>>> = vec![Vec::new()];
    for alternatives in &matrix {
        let mut next = Vec::with_capacity(combinations.len() * alternatives.len());
        for prefix in &combinations {
            for alternative in alternatives {
                let mut extended = prefix.clone();
                extended.push(alternative.clone());
                next.push(extended);
            }
        }
        combinations = next;
    }

    Ok(combinations
        .into_iter()
        .map(|combination| {
            let mut set = TopicSet::new();
            for (index, topic) in combination.into_iter().enumerate() {
                if let Some(topic) = topic {
                    set.insert(format!("topic{index}"), Value::String(topic));
                }
            }
            set
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_cartesian_product() {
        let sets = topics_to_backend(&json!([["a", "b"], "c"])).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].get("topic0"), Some(&json!("a")));
        assert_eq!(sets[0].get("topic1"), Some(&json!("c")));
        assert_eq!(sets[1].get("topic0"), Some(&json!("b")));
        assert_eq!(sets[1].get("topic1"), Some(&json!("c")));
    }

    #[test]
    fn empty_filter_yields_no_sets() {
        assert!(topics_to_backend(&json!([])).unwrap().is_empty());
        assert!(topics_to_backend(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn null_positions_are_wildcards() {
        let sets = topics_to_backend(&json!([null, "c"])).unwrap();
        assert_eq!(sets.len(), 1);
        assert!(sets[0].get("topic0").is_none());
        assert_eq!(sets[0].get("topic1"), Some(&json!("c")));
    }

    #[test]
    fn triple_position_product() {
        let sets = topics_to_backend(&json!([["a", "b"], ["x", "y"], "z"])).unwrap();
        assert_eq!(sets.len(), 4);
        for set in &sets {
            assert_eq!(set.get("topic2"), Some(&json!("z")));
        }
    }

    #[test]
    fn rejects_non_string_topics() {
        assert!(topics_to_backend(&json!([42])).is_err());
    }
}
