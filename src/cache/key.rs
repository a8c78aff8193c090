//! Cache key derivation
//!
//! A key is `prefix + suffix`. The suffix folds the query text followed by
//! the JSON serialization of its parameters (`select 1+?` with `[2]` becomes
//! `select 1+?[2]`) through the selected [`HashStrategy`].

use crate::cache::config::ResolvedOptions;
use crate::cache::string64;
use crate::cache::types::{CacheKey, HashStrategy};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use blake2::{Blake2b512, Digest};
use md5::Md5;
use serde_json::Value;
use std::sync::Once;
use tracing::warn;

static FARMHASH_FALLBACK: Once = Once::new();

/// The string that gets hashed: query text followed by serialized parameters
pub fn key_input(query: &str, params: &[Value]) -> String {
    let serialized = serde_json::to_string(params).unwrap_or_default();
    let mut input = String::with_capacity(query.len() + serialized.len());
    input.push_str(query);
    input.push_str(&serialized);
    input
}

/// Derive the key suffix for a query and its parameters
pub fn derive_key(query: &str, params: &[Value], strategy: HashStrategy) -> String {
    hash_input(&key_input(query, params), strategy)
}

/// Derive the full key (prefix included)
pub fn cache_key(prefix: &str, query: &str, params: &[Value], strategy: HashStrategy) -> CacheKey {
    let mut key = prefix.to_string();
    key.push_str(&derive_key(query, params, strategy));
    key
}

/// Key for one call: the pinned suffix when the caller supplied one,
/// otherwise the derived suffix.
pub fn resolve_key(options: &ResolvedOptions, query: &str, params: &[Value]) -> CacheKey {
    match &options.pinned_hash {
        Some(pinned) => format!("{}{}", options.key_prefix, pinned),
        None => cache_key(&options.key_prefix, query, params, options.hash_strategy),
    }
}

/// Hash an already assembled key input
pub fn hash_input(input: &str, strategy: HashStrategy) -> String {
    let effective = strategy.effective();
    if effective != strategy {
        FARMHASH_FALLBACK.call_once(|| {
            warn!(
                "farmhash is not available in this build, deriving {} keys with md5",
                strategy
            );
        });
    }

    match effective {
        HashStrategy::Verbatim => input.to_string(),
        HashStrategy::Farmhash32 => string64::encode(u64::from(fingerprint32(input))),
        HashStrategy::Farmhash64 => string64::encode(fingerprint64(input)),
        HashStrategy::Blake2b512 => BASE64_STANDARD.encode(Blake2b512::digest(input.as_bytes())),
        HashStrategy::Md5 => md5_base64(input),
    }
}

fn md5_base64(input: &str) -> String {
    BASE64_STANDARD.encode(Md5::digest(input.as_bytes()))
}

#[cfg(feature = "farmhash")]
fn fingerprint32(input: &str) -> u32 {
    farmhash::fingerprint32(input.as_bytes())
}

#[cfg(feature = "farmhash")]
fn fingerprint64(input: &str) -> u64 {
    farmhash::fingerprint64(input.as_bytes())
}

// Never reached: `effective()` maps farmhash strategies to md5 in this build.
#[cfg(not(feature = "farmhash"))]
fn fingerprint32(input: &str) -> u32 {
    let digest = Md5::digest(input.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

#[cfg(not(feature = "farmhash"))]
fn fingerprint64(input: &str) -> u64 {
    let digest = Md5::digest(input.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::{CacheConfig, QueryOptions};
    use serde_json::json;

    #[test]
    fn test_key_input_layout() {
        assert_eq!(key_input("select 1+?", &[json!(2)]), "select 1+?[2]");
        assert_eq!(key_input("select 1+2", &[]), "select 1+2[]");
        assert_eq!(
            key_input("select ?", &[json!("a\"b"), Value::Null]),
            r#"select ?["a\"b",null]"#
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        for strategy in HashStrategy::ALL {
            let a = derive_key("select * from t where id = ?", &[json!(7)], strategy);
            let b = derive_key("select * from t where id = ?", &[json!(7)], strategy);
            assert_eq!(a, b, "{} must be deterministic", strategy);
        }
    }

    #[test]
    fn test_parameters_change_the_key() {
        for strategy in HashStrategy::ALL {
            let a = derive_key("select 1+?", &[json!(2)], strategy);
            let b = derive_key("select 1+?", &[json!(3)], strategy);
            assert_ne!(a, b, "{} must separate parameter values", strategy);
        }
    }

    #[test]
    fn test_parameter_order_matters() {
        let a = derive_key("select ?, ?", &[json!(1), json!(2)], HashStrategy::Blake2b512);
        let b = derive_key("select ?, ?", &[json!(2), json!(1)], HashStrategy::Blake2b512);
        assert_ne!(a, b);
    }

    #[test]
    fn test_verbatim_is_raw_input() {
        let key = cache_key("sql.", "select 1+2", &[], HashStrategy::Verbatim);
        assert_eq!(key, "sql.select 1+2[]");
    }

    #[cfg(feature = "farmhash")]
    #[test]
    fn test_farmhash_encoding() {
        let input = key_input("select 1+?", &[json!(2)]);

        let short = derive_key("select 1+?", &[json!(2)], HashStrategy::Farmhash32);
        assert_eq!(
            string64::decode(&short),
            Some(u64::from(farmhash::fingerprint32(input.as_bytes())))
        );
        assert!(short.len() <= 6);

        let long = derive_key("select 1+?", &[json!(2)], HashStrategy::Farmhash64);
        assert_eq!(
            string64::decode(&long),
            Some(farmhash::fingerprint64(input.as_bytes()))
        );
        assert!(long.len() <= 11);
    }

    #[test]
    fn test_digest_lengths() {
        // 64 bytes -> 88 base64 chars, 16 bytes -> 24
        assert_eq!(derive_key("q", &[], HashStrategy::Blake2b512).len(), 88);
        assert_eq!(derive_key("q", &[], HashStrategy::Md5).len(), 24);
    }

    #[cfg(feature = "farmhash")]
    #[test]
    fn test_strategies_produce_distinct_keys() {
        let keys: Vec<String> = HashStrategy::ALL
            .iter()
            .map(|s| derive_key("select 1", &[], *s))
            .collect();
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_resolve_key_prefers_pinned_hash() {
        let config = CacheConfig::default();

        let pinned = config.resolve(&QueryOptions::new().hash("users.by_id.7"));
        assert_eq!(resolve_key(&pinned, "select 1", &[]), "sql.users.by_id.7");

        let derived = config.resolve(&QueryOptions::new().hash_strategy(HashStrategy::Verbatim));
        assert_eq!(resolve_key(&derived, "select 1", &[]), "sql.select 1[]");
    }
}
