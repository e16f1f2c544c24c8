//! Lenient deserializers: environment overrides always arrive as strings.
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            other => Err(de::Error::custom(format!("not a boolean flag: {other:?}"))),
        },
        other => Err(de::Error::custom(format!("not a boolean flag: {other}"))),
    }
}

pub(crate) fn number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("expected a non-negative integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a non-negative integer, got {s:?}"))),
        other => Err(de::Error::custom(format!("expected a non-negative integer, got {other}"))),
    }
}

/// Identifiers may be written unquoted in YAML and come back as numbers.
pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected a string, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "super::flag")]
        on: bool,
        #[serde(deserialize_with = "super::number")]
        n: u64,
        #[serde(deserialize_with = "super::string")]
        id: String,
    }

    #[test]
    fn accepts_strings_and_natives() {
        let p: Probe =
            serde_json::from_str(r#"{"on":"Yes","n":"250","id":2203306141}"#).unwrap();
        assert!(p.on);
        assert_eq!(p.n, 250);
        assert_eq!(p.id, "2203306141");

        let p: Probe = serde_json::from_str(r#"{"on":false,"n":7,"id":"abc"}"#).unwrap();
        assert!(!p.on);
        assert_eq!(p.n, 7);
        assert_eq!(p.id, "abc");
    }

    #[test]
    fn rejects_garbage_flags() {
        let err = serde_json::from_str::<Probe>(r#"{"on":"maybe","n":1,"id":"x"}"#);
        assert!(err.is_err());
    }
}
