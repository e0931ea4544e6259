//! Rescued-animal feed payload.
//!
//! The feed is a realtime-database dump: `data` holds month → day → animal
//! records (a day may hold a single record or arbitrarily nested arrays), and
//! `shelters` holds the shelter registry plus region-wide counters. Producers
//! are inconsistent about strings vs numbers, so scalar fields are read
//! leniently.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug)]
pub enum FeedError {
    Json(serde_json::Error),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Json(e) => write!(f, "invalid feed payload: {e}"),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Json(e) => Some(e),
        }
    }
}

/// One animal as published by the feed. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub desertion_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub process_state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub happen_dt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notice_sdt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notice_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub kind_nm: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sex_cd: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub care_nm: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub care_addr: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub popfile1: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub popfile2: Option<String>,
}

impl AnimalRecord {
    pub fn state_contains(&self, needle: &str) -> bool {
        self.process_state
            .as_deref()
            .is_some_and(|s| s.contains(needle))
    }

    pub fn address_contains(&self, needle: &str) -> bool {
        self.care_addr.as_deref().is_some_and(|s| s.contains(needle))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShelterInfo {
    #[serde(default, rename = "careNm", deserialize_with = "lenient_string")]
    pub care_nm: Option<String>,
    #[serde(default, rename = "careAddr", deserialize_with = "lenient_string")]
    pub care_addr: Option<String>,
    /// Declared capacity; kept raw, see [`ShelterInfo::capacity`].
    #[serde(default, rename = "ACEPTNC_ABLTY_CNT")]
    pub capacity_raw: Option<Value>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub animals: Vec<AnimalRecord>,
}

impl ShelterInfo {
    /// Capacity parsed from a number or a numeric string (leading integer part).
    pub fn capacity(&self) -> Option<i64> {
        match self.capacity_raw.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => leading_int(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShelterEntry {
    #[serde(default)]
    pub info: ShelterInfo,
}

/// Region-wide counters published next to the shelter list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMeta {
    #[serde(default)]
    pub total_shelters: Option<Value>,
    #[serde(default)]
    pub total_vet_person_cnt: Option<Value>,
    #[serde(default)]
    pub total_specs_person_cnt: Option<Value>,
}

impl FeedMeta {
    pub fn shelters(&self) -> u64 {
        lenient_count(self.total_shelters.as_ref())
    }

    pub fn vet_persons(&self) -> u64 {
        lenient_count(self.total_vet_person_cnt.as_ref())
    }

    pub fn specs_persons(&self) -> u64 {
        lenient_count(self.total_specs_person_cnt.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShelterSection {
    #[serde(default)]
    pub list: Vec<ShelterEntry>,
    #[serde(default)]
    pub meta: FeedMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShelterFeed {
    /// month → day → records, kept raw until [`ShelterFeed::historical_animals`].
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub shelters: ShelterSection,
}

impl ShelterFeed {
    pub fn from_json_str(payload: &str) -> Result<Self, FeedError> {
        serde_json::from_str(payload).map_err(FeedError::Json)
    }

    /// Every animal record under `data`, months and days in key order.
    pub fn historical_animals(&self) -> Vec<AnimalRecord> {
        let mut out = Vec::new();
        for month in children(&self.data) {
            for day in children(month) {
                collect_records(day, &mut out);
            }
        }
        out
    }
}

fn children(v: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match v {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}

/// Depth-first flatten: arrays recurse, objects are records, the rest is noise.
fn collect_records(v: &Value, out: &mut Vec<AnimalRecord>) {
    match v {
        Value::Array(items) => {
            for item in items {
                collect_records(item, out);
            }
        }
        Value::Object(_) => match AnimalRecord::deserialize(v) {
            Ok(record) => out.push(record),
            Err(e) => warn!("skipping unreadable animal record: {e}"),
        },
        _ => {}
    }
}

fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_records<'de, D>(de: D) -> Result<Vec<AnimalRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(de)?;
    let mut out = Vec::new();
    if let Some(v @ Value::Array(_)) = raw.as_ref() {
        collect_records(v, &mut out);
    }
    Ok(out)
}

fn leading_int(s: &str) -> Option<i64> {
    let t = s.trim();
    let end = t
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(t.len());
    t[..end].parse().ok()
}

fn lenient_count(v: Option<&Value>) -> u64 {
    match v {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => leading_int(s).and_then(|n| u64::try_from(n).ok()).unwrap_or(0),
        _ => 0,
    }
}
