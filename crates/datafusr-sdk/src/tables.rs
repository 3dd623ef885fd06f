//! Typed access to the shaft-design tables returned by DataFusr.
//!
//! The API replies with several flat tables keyed by shaft identifier. The
//! identifiers present in `shaft_area` drive processing; the companion
//! tables are expected to carry an entry for every one of those shafts.
//! Lookups are explicit about absent and non-numeric values instead of
//! coercing them.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::DatafusrError;

const T_AREA: &str = "shaft_area";
const T_SUPPLY_WIDTH: &str = "shaft_supply_width";
const T_SUPPLY_DEPTH: &str = "shaft_supply_depth";
const T_RETURN_WIDTH: &str = "shaft_return_width";
const T_RETURN_DEPTH: &str = "shaft_return_depth";
const T_HEATING_COOLING: &str = "shaft_heating_cooling_area";
const T_ELECTRICAL: &str = "shaft_electrical_area";
const T_PLUMBING: &str = "shaft_plumbing_area";

/// Millimetres to metres; duct dimensions arrive in mm, areas in m².
const MM_TO_M: f64 = 1e-3;

/// The `shaft_design` table set, as returned by the API.
///
/// `BTreeMap` keeps shaft iteration order stable across identical
/// responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShaftDesign {
    #[serde(default)]
    pub shaft_area: BTreeMap<String, Value>,
    #[serde(default)]
    pub shaft_supply_width: BTreeMap<String, Value>,
    #[serde(default)]
    pub shaft_supply_depth: BTreeMap<String, Value>,
    #[serde(default)]
    pub shaft_return_width: BTreeMap<String, Value>,
    #[serde(default)]
    pub shaft_return_depth: BTreeMap<String, Value>,
    #[serde(default)]
    pub shaft_heating_cooling_area: BTreeMap<String, Value>,
    #[serde(default)]
    pub shaft_electrical_area: BTreeMap<String, Value>,
    #[serde(default)]
    pub shaft_plumbing_area: BTreeMap<String, Value>,
}

/// Fully-extracted measurements for one shaft, in metres and square metres.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaftRecord {
    /// Required plan area of the whole shaft, m².
    pub area: f64,
    /// Ventilation supply duct, m.
    pub supply_width: f64,
    pub supply_depth: f64,
    /// Ventilation return duct, m.
    pub return_width: f64,
    pub return_depth: f64,
    /// Equipment footprints, m².
    pub heating_cooling_area: f64,
    pub electrical_area: f64,
    pub plumbing_area: f64,
}

impl ShaftDesign {
    /// Identifiers of every shaft the API sized, in sorted order.
    pub fn shaft_ids(&self) -> impl Iterator<Item = &str> {
        self.shaft_area.keys().map(String::as_str)
    }

    /// True when the response carried the `shaft_design` key but none of
    /// the tables have any content.
    pub fn is_empty(&self) -> bool {
        self.shaft_area.is_empty()
            && self.shaft_supply_width.is_empty()
            && self.shaft_supply_depth.is_empty()
            && self.shaft_return_width.is_empty()
            && self.shaft_return_depth.is_empty()
            && self.shaft_heating_cooling_area.is_empty()
            && self.shaft_electrical_area.is_empty()
            && self.shaft_plumbing_area.is_empty()
    }

    /// The planned area for one shaft. A JSON `null` reads as 0.0 so the
    /// caller's zero-guard can skip the shaft; anything else non-numeric is
    /// an error.
    pub fn planned_area(&self, shaft: &str) -> Result<f64, DatafusrError> {
        let value = self.shaft_area.get(shaft).ok_or_else(|| missing(T_AREA, shaft))?;
        match value {
            Value::Null => Ok(0.0),
            _ => value.as_f64().ok_or_else(|| not_a_number(T_AREA, shaft)),
        }
    }

    /// Extract the full measurement record for one shaft, converting duct
    /// dimensions from millimetres to metres. Every companion table must
    /// carry a numeric entry for the shaft.
    pub fn record(&self, shaft: &str) -> Result<ShaftRecord, DatafusrError> {
        Ok(ShaftRecord {
            area: self.planned_area(shaft)?,
            supply_width: numeric(&self.shaft_supply_width, T_SUPPLY_WIDTH, shaft)? * MM_TO_M,
            supply_depth: numeric(&self.shaft_supply_depth, T_SUPPLY_DEPTH, shaft)? * MM_TO_M,
            return_width: numeric(&self.shaft_return_width, T_RETURN_WIDTH, shaft)? * MM_TO_M,
            return_depth: numeric(&self.shaft_return_depth, T_RETURN_DEPTH, shaft)? * MM_TO_M,
            heating_cooling_area: numeric(&self.shaft_heating_cooling_area, T_HEATING_COOLING, shaft)?,
            electrical_area: numeric(&self.shaft_electrical_area, T_ELECTRICAL, shaft)?,
            plumbing_area: numeric(&self.shaft_plumbing_area, T_PLUMBING, shaft)?,
        })
    }
}

fn numeric(
    table: &BTreeMap<String, Value>,
    name: &'static str,
    shaft: &str,
) -> Result<f64, DatafusrError> {
    let value = table.get(shaft).ok_or_else(|| missing(name, shaft))?;
    value.as_f64().ok_or_else(|| not_a_number(name, shaft))
}

fn missing(table: &'static str, shaft: &str) -> DatafusrError {
    DatafusrError::MissingValue {
        table,
        shaft: shaft.to_string(),
    }
}

fn not_a_number(table: &'static str, shaft: &str) -> DatafusrError {
    DatafusrError::NotANumber {
        table,
        shaft: shaft.to_string(),
    }
}
