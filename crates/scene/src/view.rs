use formats::FeatureFilter;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::value::ValueTable;

pub const OVERVIEW_URL: &str = "https://unpkg.com/realmap-collection/kr-sido-low.geo.json";
pub const DRILL_DOWN_URL: &str = "https://raw.githubusercontent.com/southkorea/southkorea-maps/master/kostat/2013/json/skorea_municipalities_geo_simple.json";
pub const DRILL_DOWN_REGION: &str = "경기도";

const OVERVIEW_VALUES: [(&str, u32); 17] = [
    ("서울특별시", 94),
    ("부산광역시", 78),
    ("대구광역시", 65),
    ("인천광역시", 82),
    ("광주광역시", 35),
    ("대전광역시", 55),
    ("울산광역시", 42),
    ("세종특별자치시", 30),
    ("경기도", 38),
    ("강원특별자치도", 25),
    ("충청북도", 48),
    ("충청남도", 52),
    ("전북특별자치도", 38),
    ("전라남도", 15),
    ("경상북도", 44),
    ("경상남도", 58),
    ("제주특별자치도", 20),
];

const DRILL_DOWN_VALUES: [(&str, u32); 31] = [
    ("가평군", 5),
    ("고양시", 70),
    ("광명시", 0),
    ("광주시", 40),
    ("과천시", 78),
    ("구리시", 0),
    ("군포시", 0),
    ("김포시", 0),
    ("남양주시", 58),
    ("동두천시", 21),
    ("부천시", 55),
    ("성남시", 62),
    ("수원시", 85),
    ("시흥시", 60),
    ("안산시", 40),
    ("안성시", 0),
    ("안양시", 82),
    ("양주시", 0),
    ("양평군", 5),
    ("여주시", 12),
    ("연천군", 0),
    ("오산시", 9),
    ("용인시", 45),
    ("의왕시", 0),
    ("의정부시", 48),
    ("이천시", 41),
    ("파주시", 81),
    ("평택시", 75),
    ("포천시", 99),
    ("하남시", 0),
    ("화성시", 92),
];

pub fn default_overview_values() -> ValueTable {
    OVERVIEW_VALUES.into_iter().collect()
}

pub fn default_drill_down_values() -> ValueTable {
    DRILL_DOWN_VALUES.into_iter().collect()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Overview,
    DrillDown,
}

/// Everything a load needs for one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewBinding {
    pub state: ViewState,
    pub url: String,
    pub filter: Option<FeatureFilter>,
    pub table: ValueTable,
}

/// Data sources and tables for both views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub overview_url: String,
    pub overview_values: ValueTable,
    pub drill_down_url: String,
    /// Overview region whose click opens the drill-down.
    pub drill_down_region: String,
    pub drill_down_filter: FeatureFilter,
    pub drill_down_values: ValueTable,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            overview_url: OVERVIEW_URL.to_string(),
            overview_values: default_overview_values(),
            drill_down_url: DRILL_DOWN_URL.to_string(),
            drill_down_region: DRILL_DOWN_REGION.to_string(),
            drill_down_filter: FeatureFilter::code_prefix("code", "31"),
            drill_down_values: default_drill_down_values(),
        }
    }
}

/// Two-state view switcher.
///
/// Overview → drill-down on a click while the designated region is hovered;
/// drill-down → overview on a click over the background.
#[derive(Debug, Clone)]
pub struct ViewController {
    config: ViewConfig,
    state: ViewState,
    overrides: ValueTable,
}

impl ViewController {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            state: ViewState::Overview,
            overrides: ValueTable::new(),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Replace the externally computed drill-down values.
    ///
    /// Takes effect the next time the drill-down binding is built.
    pub fn set_override_table(&mut self, table: ValueTable) {
        self.overrides = table;
    }

    pub fn overrides(&self) -> &ValueTable {
        &self.overrides
    }

    /// Binding for the current state.
    pub fn binding(&self) -> ViewBinding {
        match self.state {
            ViewState::Overview => ViewBinding {
                state: ViewState::Overview,
                url: self.config.overview_url.clone(),
                filter: None,
                table: self.config.overview_values.clone(),
            },
            ViewState::DrillDown => {
                let mut table = self.config.drill_down_values.clone();
                table.apply_overrides(self.overrides.iter());
                ViewBinding {
                    state: ViewState::DrillDown,
                    url: self.config.drill_down_url.clone(),
                    filter: Some(self.config.drill_down_filter.clone()),
                    table,
                }
            }
        }
    }

    /// Apply a click. Returns the binding to load when the view changed.
    pub fn on_click(&mut self, hovered: Option<&str>) -> Option<ViewBinding> {
        let next = match (self.state, hovered) {
            (ViewState::Overview, Some(id)) if id == self.config.drill_down_region => ViewState::DrillDown,
            (ViewState::DrillDown, None) => ViewState::Overview,
            _ => return None,
        };
        info!(from = ?self.state, to = ?next, "view transition");
        self.state = next;
        Some(self.binding())
    }
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{DRILL_DOWN_URL, OVERVIEW_URL, ViewConfig, ViewController, ViewState};
    use crate::value::ValueTable;
    use formats::FeatureFilter;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_on_overview_without_filter() {
        let vc = ViewController::default();
        let b = vc.binding();
        assert_eq!(b.state, ViewState::Overview);
        assert_eq!(b.url, OVERVIEW_URL);
        assert_eq!(b.filter, None);
        assert_eq!(b.table.resolve("서울특별시"), 94);
    }

    #[test]
    fn drills_down_only_on_designated_region() {
        let mut vc = ViewController::default();
        assert_eq!(vc.on_click(None), None);
        assert_eq!(vc.on_click(Some("서울특별시")), None);
        assert_eq!(vc.state(), ViewState::Overview);

        let b = vc.on_click(Some("경기도")).expect("transition");
        assert_eq!(vc.state(), ViewState::DrillDown);
        assert_eq!(b.url, DRILL_DOWN_URL);
        assert_eq!(b.filter, Some(FeatureFilter::code_prefix("code", "31")));
    }

    #[test]
    fn background_click_returns_to_overview() {
        let mut vc = ViewController::default();
        vc.on_click(Some("경기도"));
        assert_eq!(vc.on_click(Some("수원시")), None);
        let b = vc.on_click(None).expect("transition");
        assert_eq!(b.state, ViewState::Overview);
        assert_eq!(b.url, OVERVIEW_URL);
    }

    #[test]
    fn overrides_apply_to_known_drill_down_keys() {
        let mut vc = ViewController::default();
        let overrides: ValueTable = [("수원시", 33), ("서울", 99)].into_iter().collect();
        vc.set_override_table(overrides);
        // Overview is unaffected.
        assert_eq!(vc.binding().table.resolve("서울특별시"), 94);

        let b = vc.on_click(Some("경기도")).expect("transition");
        assert_eq!(b.table.get("수원시"), Some(33));
        assert_eq!(b.table.get("서울"), None);
        assert_eq!(b.table.get("화성시"), Some(92));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: ViewConfig =
            serde_json::from_str(r#"{"drill_down_region": "강원특별자치도"}"#).expect("config");
        assert_eq!(cfg.drill_down_region, "강원특별자치도");
        assert_eq!(cfg.overview_url, OVERVIEW_URL);
        assert_eq!(cfg.drill_down_values.len(), 31);
    }
}
