use crux_kv::error::KeyValueError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Keys of the durable key-value store. Every value is JSON; every read
/// tolerates missing or corrupt data by substituting the type's default.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKey {
    Preferences,
    Favorites,
    FallbackDrips,
    Profile,
    Comments,
    Achievements,
}

impl StorageKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preferences => "preferences",
            Self::Favorites => "favorites",
            Self::FallbackDrips => "fallback_drips",
            Self::Profile => "profile",
            Self::Comments => "comments",
            Self::Achievements => "achievements",
        }
    }
}

/// Decode a raw read result, falling back to the default on a missing key,
/// a read error, or bytes that no longer parse. Never propagates.
pub fn decode_or_default<T>(key: StorageKey, result: Result<Option<Vec<u8>>, KeyValueError>) -> T
where
    T: DeserializeOwned + Default,
{
    match result {
        Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::warn!(key = key.as_str(), error = %e, "stored value corrupt, using default");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key = key.as_str(), error = %e, "cache read failed, using default");
            T::default()
        }
    }
}

/// Serialize a value for storage; a failure is logged and yields `None` so
/// the write is skipped rather than surfaced.
pub fn encode<T: Serialize>(key: StorageKey, value: &T) -> Option<Vec<u8>> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(key = key.as_str(), error = %e, "failed to serialize value for cache");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_bytes_fall_back_to_default() {
        let decoded: Vec<String> =
            decode_or_default(StorageKey::Preferences, Ok(Some(b"not json".to_vec())));
        assert!(decoded.is_empty());
    }

    #[test]
    fn missing_key_falls_back_to_default() {
        let decoded: Vec<String> = decode_or_default(StorageKey::Preferences, Ok(None));
        assert!(decoded.is_empty());
    }

    #[test]
    fn round_trip_through_encode() {
        let prefs = vec!["Science & Tech".to_string(), "History".to_string()];
        let bytes = encode(StorageKey::Preferences, &prefs).expect("encode");
        let decoded: Vec<String> = decode_or_default(StorageKey::Preferences, Ok(Some(bytes)));
        assert_eq!(decoded, prefs);
    }
}
