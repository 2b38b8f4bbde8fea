//! Deterministic cache-key derivation for chat responses.

use sha2::{Digest, Sha256};

/// Field separator inside the digest input. Prevents ambiguous
/// concatenations such as ("ab", "c") vs ("a", "bc") from colliding.
const SEP: u8 = 0x1f;

/// Compute the content-addressed cache key for a chat generation.
///
/// The key is a SHA-256 digest over the caller-supplied content identifier,
/// the full serialized prompt, and the model identifier, in that order.
/// Changing the model or the prompt always produces a different key even
/// when the content identifier is unchanged, so a cached response can never
/// be replayed across models or prompts.
pub fn cache_fingerprint(content_id: &str, prompt: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content_id.as_bytes());
    hasher.update([SEP]);
    hasher.update(prompt.as_bytes());
    hasher.update([SEP]);
    hasher.update(model.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = cache_fingerprint("doc-abc", "summarize this", "gpt-4o-mini");
        let b = cache_fingerprint("doc-abc", "summarize this", "gpt-4o-mini");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_is_fixed_length_hex() {
        let key = cache_fingerprint("doc-abc", "summarize this", "gpt-4o-mini");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_model_misses() {
        let a = cache_fingerprint("doc-abc", "summarize this", "gpt-4o-mini");
        let b = cache_fingerprint("doc-abc", "summarize this", "gpt-4o");
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_prompt_misses() {
        let a = cache_fingerprint("doc-abc", "summarize this", "gpt-4o-mini");
        let b = cache_fingerprint("doc-abc", "make flashcards", "gpt-4o-mini");
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_content_misses() {
        let a = cache_fingerprint("doc-abc", "summarize this", "gpt-4o-mini");
        let b = cache_fingerprint("doc-def", "summarize this", "gpt-4o-mini");
        assert_ne!(a, b);
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        // Without a separator these two would hash identical byte streams.
        let a = cache_fingerprint("ab", "c", "m");
        let b = cache_fingerprint("a", "bc", "m");
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_fields_allowed() {
        let key = cache_fingerprint("", "", "");
        assert_eq!(key.len(), 64);
    }
}
