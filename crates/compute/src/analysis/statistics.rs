use std::collections::BTreeMap;

use chrono::NaiveDate;
use formats::{AnimalRecord, FeedMeta, ShelterEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::temporal::TemporalAnalysis;

/// Placeholder for missing shelter names and addresses.
pub const UNREGISTERED: &str = "미등록";
/// Exact process state of an animal still in care.
pub const STATE_PROTECTED: &str = "보호중";

const MARK_PROTECTED: &str = "보호";
const MARK_ADOPTED: &str = "입양";
const MARK_RETURNED: &str = "반환";
const MARK_EUTHANASIA: &str = "안락사";
const MARK_NATURAL_DEATH: &str = "자연사";

pub struct Statistics;

impl Statistics {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        Some(sum / values.len() as f64)
    }

    /// Occupancy percentage, capped at 100. No capacity means no pressure.
    pub fn pressure(count: u64, capacity: i64) -> u32 {
        if capacity <= 0 {
            return 0;
        }
        let rate = (count as f64 / capacity as f64) * 100.0;
        rate.round().min(100.0) as u32
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureThresholds {
    pub danger: u32,
    pub warning: u32,
}

impl Default for PressureThresholds {
    fn default() -> Self {
        Self {
            danger: 70,
            warning: 40,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PressureClass {
    Safe,
    Warning,
    Danger,
}

impl PressureClass {
    /// Progress-bar band: thresholds are inclusive.
    pub fn for_progress(pressure: u32, t: PressureThresholds) -> Self {
        if pressure >= t.danger {
            PressureClass::Danger
        } else if pressure >= t.warning {
            PressureClass::Warning
        } else {
            PressureClass::Safe
        }
    }

    /// Dashboard card band: thresholds are exclusive.
    pub fn for_dashboard(pressure: u32, t: PressureThresholds) -> Self {
        if pressure > t.danger {
            PressureClass::Danger
        } else if pressure > t.warning {
            PressureClass::Warning
        } else {
            PressureClass::Safe
        }
    }

    pub fn progress_css(self) -> &'static str {
        match self {
            PressureClass::Safe => "progress-safe",
            PressureClass::Warning => "progress-warning",
            PressureClass::Danger => "progress-danger",
        }
    }

    pub fn card_css(self) -> &'static str {
        match self {
            PressureClass::Safe => "card-null",
            PressureClass::Warning => "card-warning",
            PressureClass::Danger => "card-danger",
        }
    }
}

/// A shelter with a usable capacity and its current load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShelterLoad {
    pub name: String,
    pub address: String,
    pub capacity: u64,
    pub count: u64,
    pub pressure: u32,
}

impl ShelterLoad {
    /// Second whitespace token of the address ("경기도 수원시 ..." → "수원시").
    pub fn city(&self) -> Option<&str> {
        self.address.split_whitespace().nth(1)
    }
}

pub fn process_shelters(entries: &[ShelterEntry]) -> Vec<ShelterLoad> {
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let info = &entry.info;
        let capacity = match info.capacity() {
            Some(c) if c > 0 => c,
            _ => {
                debug!(name = ?info.care_nm, "shelter without capacity dropped");
                continue;
            }
        };
        let count = info
            .animals
            .iter()
            .filter(|a| a.state_contains(MARK_PROTECTED))
            .count() as u64;

        out.push(ShelterLoad {
            name: non_empty_or(info.care_nm.as_deref(), UNREGISTERED),
            address: non_empty_or(info.care_addr.as_deref(), UNREGISTERED),
            capacity: capacity as u64,
            count,
            pressure: Statistics::pressure(count, capacity),
        });
    }
    out
}

/// Mean shelter pressure per city inside `region`, keyed by city name.
///
/// This is the table the municipality map resolves its values from.
pub fn city_pressure_table(shelters: &[ShelterLoad], region: &str) -> BTreeMap<String, u32> {
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for shelter in shelters.iter().filter(|s| s.address.contains(region)) {
        let Some(city) = shelter.city() else {
            continue;
        };
        grouped
            .entry(city.to_string())
            .or_default()
            .push(shelter.pressure as f64);
    }

    grouped
        .into_iter()
        .filter_map(|(city, values)| {
            let mean = Statistics::mean(&values)?;
            Some((city, mean.round() as u32))
        })
        .collect()
}

/// Recent outcome counts shown in the bar chart.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessStateCounts {
    pub notice: u64,
    pub adopt: u64,
    pub returned: u64,
    pub euthanasia: u64,
    pub death: u64,
}

/// One bar of the outcome chart.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChartBar {
    pub label: &'static str,
    pub color: &'static str,
    pub count: u64,
}

impl ProcessStateCounts {
    pub fn bars(&self) -> [ChartBar; 5] {
        [
            ChartBar {
                label: "공고 수",
                color: "#6673FF",
                count: self.notice,
            },
            ChartBar {
                label: "입양 수",
                color: "#09F66C",
                count: self.adopt,
            },
            ChartBar {
                label: "반환 수",
                color: "#FFB01F",
                count: self.returned,
            },
            ChartBar {
                label: "안락사 수",
                color: "#ff2462",
                count: self.euthanasia,
            },
            ChartBar {
                label: "자연사 수",
                color: "#B9BFFF",
                count: self.death,
            },
        ]
    }
}

pub fn process_state_counts(animals: &[AnimalRecord], today: NaiveDate) -> ProcessStateCounts {
    let mut counts = ProcessStateCounts::default();
    for a in animals
        .iter()
        .filter(|a| TemporalAnalysis::is_recent(a.happen_dt.as_deref(), today))
    {
        // An animal may match several markers; each bar counts independently.
        if a.state_contains(MARK_PROTECTED) {
            counts.notice += 1;
        }
        if a.state_contains(MARK_ADOPTED) {
            counts.adopt += 1;
        }
        if a.state_contains(MARK_RETURNED) {
            counts.returned += 1;
        }
        if a.state_contains(MARK_EUTHANASIA) {
            counts.euthanasia += 1;
        }
        if a.state_contains(MARK_NATURAL_DEATH) {
            counts.death += 1;
        }
    }
    counts
}

/// Headline numbers for one region.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
    pub total_capacity: u64,
    /// Not capped: a region can run over its declared capacity.
    pub total_pressure: u32,
    pub notice_count: u64,
    pub total_shelters: u64,
    pub vet_person_cnt: u64,
    pub specs_person_cnt: u64,
}

pub fn region_summary(
    animals: &[AnimalRecord],
    shelters: &[ShelterLoad],
    meta: &FeedMeta,
    region: &str,
) -> RegionSummary {
    let total_capacity: u64 = shelters
        .iter()
        .filter(|s| !s.address.is_empty())
        .map(|s| s.capacity)
        .sum();

    let notice_count = animals
        .iter()
        .filter(|a| a.address_contains(region) && a.state_contains(MARK_PROTECTED))
        .count() as u64;

    let total_pressure = if total_capacity > 0 {
        ((notice_count as f64 / total_capacity as f64) * 100.0).round() as u32
    } else {
        0
    };

    RegionSummary {
        total_capacity,
        total_pressure,
        notice_count,
        total_shelters: meta.shelters(),
        vet_person_cnt: meta.vet_persons(),
        specs_person_cnt: meta.specs_persons(),
    }
}

/// The `n` most pressured shelters; ties keep input order.
pub fn top_shelters(shelters: &[ShelterLoad], n: usize) -> Vec<ShelterLoad> {
    let mut sorted = shelters.to_vec();
    sorted.sort_by(|a, b| b.pressure.cmp(&a.pressure));
    sorted.truncate(n);
    sorted
}

/// Animals still in care, longest-waiting first.
pub fn protected_animals(animals: &[AnimalRecord]) -> Vec<AnimalRecord> {
    let mut out: Vec<AnimalRecord> = animals
        .iter()
        .filter(|a| a.process_state.as_deref() == Some(STATE_PROTECTED))
        .cloned()
        .collect();
    out.sort_by(|a, b| waiting_since(a).cmp(waiting_since(b)));
    out
}

fn waiting_since(a: &AnimalRecord) -> &str {
    a.happen_dt
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(a.notice_sdt.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or("99999999")
}

fn non_empty_or(v: Option<&str>, fallback: &str) -> String {
    v.filter(|s| !s.is_empty()).unwrap_or(fallback).to_string()
}
