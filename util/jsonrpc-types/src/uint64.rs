use serde::de::{Error, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A `u64` rendered as a `0x`-prefixed hex string on the wire.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct Uint64(u64);

impl Uint64 {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Uint64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.value())
    }
}

impl From<u64> for Uint64 {
    fn from(value: u64) -> Self {
        Uint64(value)
    }
}

impl From<Uint64> for u64 {
    fn from(value: Uint64) -> Self {
        value.value()
    }
}

impl Serialize for Uint64 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'a> Deserialize<'a> for Uint64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'a>,
    {
        deserializer.deserialize_str(Uint64Visitor)
    }
}

struct Uint64Visitor;

impl<'b> Visitor<'b> for Uint64Visitor {
    type Value = Uint64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a 0x-prefixed hex string")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let hex = value
            .strip_prefix("0x")
            .ok_or_else(|| E::custom(format!("missing 0x prefix: {value}")))?;
        u64::from_str_radix(hex, 16)
            .map(Uint64)
            .map_err(|err| E::custom(format!("invalid hex integer {value}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::Uint64;

    #[test]
    fn serialize_as_hex_string() {
        let value = Uint64::from(4660u64);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#""0x1234""#);
    }

    #[test]
    fn deserialize_from_hex_string() {
        let value: Uint64 = serde_json::from_str(r#""0x1234""#).unwrap();
        assert_eq!(value.value(), 4660);

        assert!(serde_json::from_str::<Uint64>(r#""1234""#).is_err());
        assert!(serde_json::from_str::<Uint64>(r#""0xzz""#).is_err());
    }
}
