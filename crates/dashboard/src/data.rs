use chrono::NaiveDate;
use compute::{
    CounterAnimation, PressureClass, ProcessStateCounts, RegionSummary, ShelterLoad, city_pressure_table,
    format_grouped, process_shelters, process_state_counts, protected_animals, region_summary, top_shelters,
};
use formats::{AnimalRecord, ShelterFeed};
use scene::ValueTable;
use tracing::info;

use crate::config::DashboardConfig;

/// One animated summary counter.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCounter {
    /// DOM id of the element showing the number.
    pub element_id: &'static str,
    pub animation: CounterAnimation,
    /// Render with thousands separators.
    pub grouped: bool,
}

impl SummaryCounter {
    pub fn text_at(&self, elapsed_ms: f64) -> String {
        let v = self.animation.value_at(elapsed_ms);
        if self.grouped { format_grouped(v) } else { v.to_string() }
    }
}

/// Everything the page shows besides the map, derived from one feed snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub shelters: Vec<ShelterLoad>,
    pub top: Vec<ShelterLoad>,
    /// Mean pressure per city of the configured region; the map's drill-down overrides.
    pub city_pressure: ValueTable,
    pub summary: RegionSummary,
    pub outcomes: ProcessStateCounts,
    /// Animals of the `data` section still in care, longest-waiting first.
    pub protected: Vec<AnimalRecord>,
}

impl DashboardData {
    pub fn from_feed(feed: &ShelterFeed, config: &DashboardConfig, today: NaiveDate) -> Self {
        let animals = feed.historical_animals();
        let shelters = process_shelters(&feed.shelters.list);

        let city_pressure: ValueTable = city_pressure_table(&shelters, &config.region).into_iter().collect();
        let summary = region_summary(&animals, &shelters, &feed.shelters.meta, &config.region);
        info!(
            animals = animals.len(),
            shelters = shelters.len(),
            cities = city_pressure.len(),
            pressure = summary.total_pressure,
            "dashboard data derived"
        );

        Self {
            top: top_shelters(&shelters, config.top_shelters),
            outcomes: process_state_counts(&animals, today),
            protected: protected_animals(&animals),
            shelters,
            city_pressure,
            summary,
        }
    }

    pub fn pet_cards(&self, limit: usize) -> &[AnimalRecord] {
        &self.protected[..self.protected.len().min(limit)]
    }

    /// Card colour band for the region-wide pressure.
    pub fn summary_class(&self, config: &DashboardConfig) -> PressureClass {
        PressureClass::for_dashboard(self.summary.total_pressure, config.thresholds)
    }

    pub fn counters(&self, duration_ms: f64) -> [SummaryCounter; 6] {
        let s = &self.summary;
        let counter = |element_id, target: u64, grouped| SummaryCounter {
            element_id,
            animation: CounterAnimation::new(target, duration_ms),
            grouped,
        };
        [
            counter("aceptncAbltyCntComp", s.total_capacity, true),
            counter("prolterComp", u64::from(s.total_pressure), false),
            counter("processStateComp", s.notice_count, true),
            counter("totalSheltersComp", s.total_shelters, false),
            counter("vetPersonCntComp", s.vet_person_cnt, false),
            counter("specsPersonCntComp", s.specs_person_cnt, false),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::DashboardData;
    use crate::config::DashboardConfig;
    use chrono::NaiveDate;
    use compute::PressureClass;
    use formats::ShelterFeed;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"{
        "data": {
            "202610": {
                "10": [
                    {"desertionNo": "1", "processState": "보호중", "happenDt": "20261010", "careAddr": "경기도 수원시 권선구"},
                    {"desertionNo": "2", "processState": "종료(입양)", "happenDt": "20261011", "careAddr": "경기도 수원시"}
                ],
                "11": {"desertionNo": "3", "processState": "보호중", "happenDt": "20260801", "careAddr": "경기도 화성시"}
            }
        },
        "shelters": {
            "list": [
                {"info": {"careNm": "수원센터", "careAddr": "경기도 수원시 권선구", "ACEPTNC_ABLTY_CNT": "4",
                          "animals": [
                            {"desertionNo": "a", "processState": "보호중", "happenDt": "20261001"},
                            {"desertionNo": "b", "processState": "보호중", "noticeSdt": "20260901"},
                            {"desertionNo": "c", "processState": "종료(반환)"}
                          ]}},
                {"info": {"careNm": "화성센터", "careAddr": "경기도 화성시", "ACEPTNC_ABLTY_CNT": 10,
                          "animals": [{"desertionNo": "d", "processState": "보호중", "happenDt": "20260915"}]}},
                {"info": {"careNm": "서울센터", "careAddr": "서울특별시 마포구", "ACEPTNC_ABLTY_CNT": 1,
                          "animals": [{"desertionNo": "e", "processState": "보호중", "happenDt": "20261002"}]}},
                {"info": {"careNm": "용량없음", "careAddr": "경기도 안성시", "ACEPTNC_ABLTY_CNT": "0"}}
            ],
            "meta": {"totalShelters": 27, "totalVetPersonCnt": "13", "totalSpecsPersonCnt": 40}
        }
    }"#;

    fn data() -> DashboardData {
        let feed = ShelterFeed::from_json_str(FEED).expect("feed");
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
        DashboardData::from_feed(&feed, &DashboardConfig::default(), today)
    }

    #[test]
    fn city_table_feeds_drill_down_overrides() {
        let d = data();
        // 수원: 2/4 → 50, 화성: 1/10 → 10; 서울 is outside the region.
        assert_eq!(d.city_pressure.get("수원시"), Some(50));
        assert_eq!(d.city_pressure.get("화성시"), Some(10));
        assert_eq!(d.city_pressure.len(), 2);
    }

    #[test]
    fn ranking_and_summary() {
        let d = data();
        let names: Vec<_> = d.top.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["서울센터", "수원센터", "화성센터"]);
        assert_eq!(d.summary.total_capacity, 15);
        assert_eq!(d.summary.notice_count, 2);
        assert_eq!(d.summary.total_pressure, 13);
        assert_eq!(d.summary.vet_person_cnt, 13);
        assert_eq!(d.summary_class(&DashboardConfig::default()), PressureClass::Safe);
    }

    #[test]
    fn recent_outcomes_skip_old_records() {
        let d = data();
        assert_eq!(d.outcomes.notice, 1);
        assert_eq!(d.outcomes.adopt, 1);
    }

    #[test]
    fn pet_cards_are_longest_waiting_first() {
        let d = data();
        let ids: Vec<_> = d
            .pet_cards(4)
            .iter()
            .map(|a| a.desertion_no.clone().unwrap_or_default())
            .collect();
        // Registry animals (a, b, d, e) are not cards; only `data` records are.
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(d.pet_cards(1).len(), 1);
    }

    #[test]
    fn pet_cards_come_from_historical_records_only() {
        let feed = ShelterFeed::from_json_str(
            r#"{"data": {"202610": {"10": [{"desertionNo": "h1", "processState": "보호중"}]}},
                "shelters": {"list": [{"info": {"careNm": "빈센터", "careAddr": "경기도 수원시", "ACEPTNC_ABLTY_CNT": 3}}]}}"#,
        )
        .expect("feed");
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
        let d = DashboardData::from_feed(&feed, &DashboardConfig::default(), today);
        let ids: Vec<_> = d.pet_cards(4).iter().map(|a| a.desertion_no.as_deref()).collect();
        assert_eq!(ids, vec![Some("h1")]);
    }

    #[test]
    fn counters_finish_on_their_targets() {
        let d = data();
        let counters = d.counters(800.0);
        assert_eq!(counters[0].element_id, "aceptncAbltyCntComp");
        assert_eq!(counters[0].text_at(0.0), "0");
        assert_eq!(counters[0].text_at(800.0), "15");
        assert_eq!(counters[3].text_at(1000.0), "27");
    }
}
