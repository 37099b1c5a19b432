//! Serde helpers for flexible deserialization.
//!
//! When the `tracing` feature is enabled, this module also logs warnings for any
//! unknown fields encountered during deserialization, helping detect API changes.

#[cfg(feature = "rest")]
use {serde::de::DeserializeOwned, serde_json::Value};

/// A `serde_as` type that deserializes strings or integers as `String`.
///
/// Use with `#[serde_as(as = "StringFromAny")]` for identifier fields the API sends either way.
pub struct StringFromAny;

impl<'de> serde_with::DeserializeAs<'de, String> for StringFromAny {
    fn deserialize_as<D>(deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use std::fmt;

        use serde::de::{self, Visitor};

        struct StringOrNumberVisitor;

        impl Visitor<'_> for StringOrNumberVisitor {
            type Value = String;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("string or integer")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_owned())
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v)
            }

            fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_string())
            }
        }

        deserializer.deserialize_any(StringOrNumberVisitor)
    }
}

impl serde_with::SerializeAs<String> for StringFromAny {
    fn serialize_as<S>(source: &String, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(source)
    }
}

/// Deserialize JSON with unknown field warnings.
///
/// Unknown fields trigger warnings but do not cause deserialization to fail.
///
/// ```ignore
/// let json = serde_json::json!({
///     "symbol": "BTC-USDT",
///     "unknown_field": "extra"
/// });
/// let result: Market = deserialize_with_warnings(json)?;
/// // Logs: WARN unknown field in API response field="unknown_field" value="extra"
/// ```
#[cfg(all(feature = "tracing", feature = "rest"))]
pub fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    use std::any::type_name;

    tracing::trace!(
        type_name = %type_name::<T>(),
        json = %value,
        "deserializing JSON"
    );

    let original = value.clone();
    let mut unknown_paths: Vec<String> = Vec::new();

    let result: T = serde_ignored::deserialize(value, |path| {
        unknown_paths.push(path.to_string());
    })
    .inspect_err(|_| {
        // Re-deserialize with serde_path_to_error to get the error path
        let json_str = original.to_string();
        let jd = &mut serde_json::Deserializer::from_str(&json_str);
        let path_result: Result<T, _> = serde_path_to_error::deserialize(jd);
        if let Err(path_err) = path_result {
            let path = path_err.path().to_string();
            let value_display = format_value(lookup_value(&original, &path));

            tracing::error!(
                type_name = %type_name::<T>(),
                path = %path,
                value = %value_display,
                error = %path_err.inner(),
                "deserialization failed"
            );
        }
    })?;

    for path in unknown_paths {
        let value_display = format_value(lookup_value(&original, &path));

        tracing::warn!(
            type_name = %type_name::<T>(),
            field = %path,
            value = %value_display,
            "unknown field in API response"
        );
    }

    Ok(result)
}

/// Pass-through deserialization when tracing is disabled.
#[cfg(all(not(feature = "tracing"), feature = "rest"))]
pub fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Look up a value in a JSON structure by a `serde_ignored` or `serde_path_to_error` path.
///
/// `?` segments (Option wrappers) are skipped; numeric segments index arrays.
#[cfg(all(feature = "tracing", feature = "rest"))]
fn lookup_value<'value>(value: &'value Value, path: &str) -> Option<&'value Value> {
    let mut current = value;

    for segment in path_segments(path) {
        if segment.is_empty() || segment == "?" {
            continue;
        }

        match current {
            Value::Object(map) => current = map.get(&segment)?,
            Value::Array(arr) => current = arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        }
    }

    Some(current)
}

/// Splits `data[15].symbol` into `["data", "15", "symbol"]`.
#[cfg(all(feature = "tracing", feature = "rest"))]
fn path_segments(path: &str) -> Vec<String> {
    path.split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(all(feature = "tracing", feature = "rest"))]
fn format_value(value: Option<&Value>) -> String {
    const MAX_LEN: usize = 200;

    match value {
        None => "<unable to retrieve>".to_owned(),
        Some(v) => {
            let s = v.to_string();
            if s.len() > MAX_LEN {
                let truncated: String = s.chars().take(MAX_LEN).collect();
                format!("{truncated}...")
            } else {
                s
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[serde_with::serde_as]
    #[derive(Debug, Deserialize)]
    struct Identified {
        #[serde_as(as = "StringFromAny")]
        id: String,
    }

    #[test]
    fn string_from_any_should_accept_numbers() {
        let numeric: Identified = serde_json::from_value(json!({ "id": 42 })).unwrap();
        let text: Identified = serde_json::from_value(json!({ "id": "ord-1" })).unwrap();

        assert_eq!(numeric.id, "42");
        assert_eq!(text.id, "ord-1");
    }

    #[cfg(feature = "rest")]
    #[derive(Debug, Deserialize, PartialEq)]
    struct Level {
        price: String,
    }

    #[cfg(feature = "rest")]
    #[test]
    fn deserialize_with_warnings_should_ignore_unknown_fields() {
        let level: Level =
            deserialize_with_warnings(json!({ "price": "1.0", "extra": true })).unwrap();

        assert_eq!(
            level,
            Level {
                price: "1.0".to_owned()
            }
        );
    }

    #[cfg(feature = "rest")]
    #[test]
    fn deserialize_with_warnings_should_fail_on_missing_fields() {
        deserialize_with_warnings::<Level>(json!({ "size": "1.0" })).unwrap_err();
    }

    #[cfg(all(feature = "tracing", feature = "rest"))]
    #[test]
    fn lookup_value_should_follow_nested_paths() {
        let value = json!({ "data": [{ "symbol": "BTC-USDT" }] });

        assert_eq!(
            lookup_value(&value, "data[0].symbol"),
            Some(&json!("BTC-USDT"))
        );
        assert_eq!(lookup_value(&value, "data.0.?.symbol"), Some(&json!("BTC-USDT")));
        assert_eq!(lookup_value(&value, "data[3]"), None);
    }
}
