use std::fmt;

use indexmap::IndexMap;
use serde::{
    de::{self, MapAccess, Visitor},
    Deserializer,
};
use serde_derive::Deserialize;

use crate::parse_int;

/// Optional TOML settings for the command line assembler.
///
/// ```toml
/// base = "$4000"
///
/// [defines]
/// screen = "$0400"
/// rows = 16
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, deserialize_with = "deserialize_base")]
    pub base: Option<u16>,

    #[serde(default, deserialize_with = "deserialize_defines")]
    pub defines: IndexMap<String, i32>,
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// Accepts integers and `$`/`%`/decimal strings.
struct IntVisitor;

impl<'de> Visitor<'de> for IntVisitor {
    type Value = i32;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer or a `$`/`%` prefixed string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i32, E> {
        i32::try_from(v).map_err(|_| E::custom(format!("{v} does not fit in 32 bits")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i32, E> {
        parse_int(v).ok_or_else(|| E::custom(format!("{v} is not a valid number")))
    }
}

fn deserialize_base<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserializer.deserialize_any(IntVisitor)?;
    u16::try_from(value)
        .map(Some)
        .map_err(|_| de::Error::custom(format!("base {value} exceeds $FFFF")))
}

fn deserialize_defines<'de, D>(deserializer: D) -> Result<IndexMap<String, i32>, D::Error>
where
    D: Deserializer<'de>,
{
    struct DefinesVisitor;

    impl<'de> Visitor<'de> for DefinesVisitor {
        type Value = IndexMap<String, i32>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a table of constant values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut defines = IndexMap::new();
            while let Some(name) = map.next_key::<String>()? {
                let value = map.next_value_seed(IntSeed)?;
                defines.insert(name.to_ascii_lowercase(), value);
            }
            Ok(defines)
        }
    }

    deserializer.deserialize_map(DefinesVisitor)
}

struct IntSeed;

impl<'de> de::DeserializeSeed<'de> for IntSeed {
    type Value = i32;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<i32, D::Error> {
        deserializer.deserialize_any(IntVisitor)
    }
}
