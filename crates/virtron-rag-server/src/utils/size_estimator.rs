/// Byte-size estimation for conversation messages.
///
/// Sizes are the length of the compact JSON encoding. They are an estimate
/// for capacity accounting, not an exact memory footprint.

use serde::Serialize;

/// Fallback when serialization fails: raw text length plus a fixed overhead
const FALLBACK_OVERHEAD: usize = 64;

/// Estimate the serialized byte cost of any serializable value
pub fn estimate_bytes<T: Serialize>(value: &T) -> usize {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .unwrap_or(FALLBACK_OVERHEAD)
}

/// Sum of estimated byte costs
pub fn estimate_total<T: Serialize>(values: &[T]) -> usize {
    values.iter().map(estimate_bytes).sum()
}

/// Check if adding `new_bytes` would exceed limit
pub fn would_exceed_limit(current_bytes: usize, new_bytes: usize, max_bytes: usize) -> bool {
    current_bytes.saturating_add(new_bytes) > max_bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        text: String,
    }

    #[test]
    fn test_estimate_matches_json_length() {
        let sample = Sample { text: "hello".to_string() };
        // {"text":"hello"}
        assert_eq!(estimate_bytes(&sample), 16);
    }

    #[test]
    fn test_estimate_total() {
        let samples = vec![
            Sample { text: "a".to_string() },
            Sample { text: "bb".to_string() },
        ];
        assert_eq!(estimate_total(&samples), 12 + 13);
    }

    #[test]
    fn test_would_exceed() {
        assert!(would_exceed_limit(1000, 600, 1500));
        assert!(!would_exceed_limit(1000, 500, 1500));
        assert!(!would_exceed_limit(usize::MAX, 0, usize::MAX));
    }
}
