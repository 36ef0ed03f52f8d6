//! RecordId 序列化辅助
//!
//! SurrealDB 的记录主键有两种长相：HTTP JSON 里是 "table:key" 字符串，
//! 数据库原生结果集里是结构化的 RecordId。模型字段统一挂这里的 helper，
//! 对外永远呈现字符串形式。

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serializer};
use std::fmt;
use surrealdb::RecordId;

/// 缺省 true 的布尔字段（历史数据里该列可能为 null）
pub fn bool_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<bool>::deserialize(deserializer)?;
    Ok(value.unwrap_or(true))
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = RecordId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a \"table:key\" string or a native record id")
    }

    fn visit_str<E>(self, text: &str) -> Result<RecordId, E>
    where
        E: de::Error,
    {
        text.parse()
            .map_err(|_| E::custom(format!("malformed record id '{}'", text)))
    }

    fn visit_map<M>(self, access: M) -> Result<RecordId, M::Error>
    where
        M: MapAccess<'de>,
    {
        RecordId::deserialize(de::value::MapAccessDeserializer::new(access))
    }
}

/// 双格式反序列化：字符串与原生 RecordId 都接受
fn flexible_id<'de, D>(deserializer: D) -> Result<RecordId, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(IdVisitor)
}

/// `Option<RecordId>` 字段的 `with` 模块，序列化输出 "table:key" 字符串
pub mod option_record_id {
    use super::*;

    struct Wire(RecordId);

    impl<'de> Deserialize<'de> for Wire {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            flexible_id(deserializer).map(Wire)
        }
    }

    pub fn serialize<S>(id: &Option<RecordId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match id {
            Some(id) => serializer.serialize_some(&id.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Wire>::deserialize(deserializer)?.map(|wire| wire.0))
    }
}
