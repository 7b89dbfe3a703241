#![forbid(unsafe_code)]

//! The vertical hour scale beside the week view's columns.
//!
//! One row group per hour between `startTime` and `endTime`. Changing any
//! config after construction rebuilds the rows and fires `change` with the
//! new [`TimeAxisMetrics`] so the owner can resize its columns.

use std::sync::LazyLock;
use weft_core::config::{ConfigDescriptor, ConfigSchema, ConfigStore, Configurable};
use weft_core::{ConfigValue, EventData, Result, ValidationRejected};
use weft_render::{Target, VNode};
use weft_runtime::{Component, ComponentCore, HandlerScope, Runtime};

pub const CHANGE_EVENT: &str = "change";

/// Largest accepted `rowHeight`, in pixels.
pub const MAX_ROW_HEIGHT: i64 = 500;
/// Largest accepted `rowsPerItem` (one row per five minutes).
pub const MAX_ROWS_PER_ITEM: i64 = 12;

static TIME_AXIS_SCHEMA: LazyLock<ConfigSchema<TimeAxis>> = LazyLock::new(|| {
    ConfigSchema::builder("TimeAxis")
        .declare(
            ConfigDescriptor::new("startTime", "00:00")
                .before_set(before_set_start)
                .after_set(after_set_any),
        )
        .declare(
            ConfigDescriptor::new("endTime", "24:00")
                .before_set(before_set_end)
                .after_set(after_set_any),
        )
        .declare(
            ConfigDescriptor::new("rowHeight", 20)
                .before_set(before_set_row_height)
                .after_set(after_set_any),
        )
        .declare(
            ConfigDescriptor::new("rowsPerItem", 2)
                .before_set(before_set_rows_per_item)
                .after_set(after_set_any),
        )
        .build()
});

/// Parse `HH:MM` into fractional hours. `24:00` is the only hour-24 value.
#[must_use]
pub fn parse_time(s: &str) -> Option<f64> {
    let (h, m) = s.split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    if m > 59 || h > 24 || (h == 24 && m != 0) {
        return None;
    }
    Some(f64::from(h) + f64::from(m) / 60.0)
}

fn time_value(property: &str, value: &ConfigValue) -> Result<(f64, String)> {
    let hours = value.as_str().and_then(parse_time).ok_or_else(|| {
        ValidationRejected::new(property, format!("expected HH:MM, got {value}"))
    })?;
    let whole = hours.trunc();
    let canonical = format!("{:02}:{:02}", whole as u32, ((hours - whole) * 60.0).round() as u32);
    Ok((hours, canonical))
}

fn before_set_start(t: &mut TimeAxis, value: ConfigValue, _: Option<&ConfigValue>) -> Result<ConfigValue> {
    let (hours, canonical) = time_value("startTime", &value)?;
    if hours >= t.metrics().end {
        return Err(ValidationRejected::new("startTime", "must be before endTime").into());
    }
    Ok(ConfigValue::Str(canonical))
}

fn before_set_end(t: &mut TimeAxis, value: ConfigValue, _: Option<&ConfigValue>) -> Result<ConfigValue> {
    let (hours, canonical) = time_value("endTime", &value)?;
    if hours <= t.metrics().start {
        return Err(ValidationRejected::new("endTime", "must be after startTime").into());
    }
    Ok(ConfigValue::Str(canonical))
}

fn bounded(property: &str, value: ConfigValue, max: i64) -> Result<ConfigValue> {
    let n = match value {
        ConfigValue::Int(n) => n,
        ConfigValue::Float(f) if f.is_finite() => f.round() as i64,
        other => {
            return Err(ValidationRejected::new(property, format!("expected a number, got {other}")).into());
        }
    };
    if !(1..=max).contains(&n) {
        return Err(ValidationRejected::new(property, format!("{n} is outside 1..={max}")).into());
    }
    Ok(ConfigValue::Int(n))
}

fn before_set_row_height(_: &mut TimeAxis, value: ConfigValue, _: Option<&ConfigValue>) -> Result<ConfigValue> {
    bounded("rowHeight", value, MAX_ROW_HEIGHT)
}

fn before_set_rows_per_item(_: &mut TimeAxis, value: ConfigValue, _: Option<&ConfigValue>) -> Result<ConfigValue> {
    bounded("rowsPerItem", value, MAX_ROWS_PER_ITEM)
}

fn after_set_any(t: &mut TimeAxis, _: &ConfigValue, _: Option<&ConfigValue>) -> Result<()> {
    if !t.core.lifecycle().is_constructed() {
        return Ok(());
    }
    t.rebuild()?;
    let _pending = t.core.request_update()?;
    let metrics = t.metrics();
    tracing::debug!(target: "weft.calendar", axis = %t.core.id(), total_height = metrics.total_height, "time axis changed");
    t.core.fire(CHANGE_EVENT, metrics.to_event_data())
}

/// Geometry of the time axis, as carried by its `change` event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxisMetrics {
    /// First visible hour.
    pub start: f64,
    /// Last visible hour.
    pub end: f64,
    pub row_height: i64,
    pub rows_per_item: i64,
    /// Height of all rows in pixels, one-pixel row borders included.
    pub total_height: f64,
}

impl TimeAxisMetrics {
    fn new(start: f64, end: f64, row_height: i64, rows_per_item: i64) -> Self {
        let per_hour = (rows_per_item * row_height + rows_per_item) as f64;
        Self {
            start,
            end,
            row_height,
            rows_per_item,
            total_height: (end - start) * per_hour,
        }
    }

    /// Visible range in hours.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn to_event_data(&self) -> EventData {
        EventData::values([
            ("startTime", ConfigValue::Float(self.start)),
            ("endTime", ConfigValue::Float(self.end)),
            ("rowHeight", ConfigValue::Int(self.row_height)),
            ("rowsPerItem", ConfigValue::Int(self.rows_per_item)),
            ("totalHeight", ConfigValue::Float(self.total_height)),
        ])
    }

    /// Read back a `change` payload. Row sizes outside the accepted
    /// ranges yield `None`.
    #[must_use]
    pub fn from_event_data(data: &EventData) -> Option<Self> {
        let start = data.value("startTime")?.as_float()?;
        let end = data.value("endTime")?.as_float()?;
        let row_height = data.value("rowHeight")?.as_int()?;
        let rows_per_item = data.value("rowsPerItem")?.as_int()?;
        if !(1..=MAX_ROW_HEIGHT).contains(&row_height) || !(1..=MAX_ROWS_PER_ITEM).contains(&rows_per_item) {
            return None;
        }
        Some(Self::new(start, end, row_height, rows_per_item))
    }
}

/// Hour scale component.
pub struct TimeAxis {
    core: ComponentCore,
    config: ConfigStore<TimeAxis>,
}

impl TimeAxis {
    pub fn new(mut core: ComponentCore) -> Result<Self> {
        core.set_root(VNode::new("div").id(core.id().to_string()).class("neo-c-w-timeaxis"))?;
        let owner = core.id().to_string();
        Ok(Self {
            core,
            config: ConfigStore::new(&TIME_AXIS_SCHEMA, owner),
        })
    }

    fn read_time(&self, name: &str) -> Option<f64> {
        self.get_config(name).ok()?.as_str().and_then(parse_time)
    }

    fn read_int(&self, name: &str) -> Option<i64> {
        self.get_config(name).ok()?.as_int()
    }

    /// Current geometry. Unreadable values fall back to the declared
    /// defaults.
    #[must_use]
    pub fn metrics(&self) -> TimeAxisMetrics {
        TimeAxisMetrics::new(
            self.read_time("startTime").unwrap_or(0.0),
            self.read_time("endTime").unwrap_or(24.0),
            self.read_int("rowHeight").unwrap_or(20),
            self.read_int("rowsPerItem").unwrap_or(2),
        )
    }

    fn rows(&self) -> Vec<VNode> {
        let m = self.metrics();
        let height = format!("{}px", m.rows_per_item * m.row_height + m.rows_per_item);
        let first = m.start.floor() as u32;
        let last = m.end.ceil() as u32;
        (first..last)
            .map(|hour| {
                VNode::new("div")
                    .class("neo-c-w-timeaxis-item")
                    .style("height", height.clone())
                    .child(VNode::new("div").class("neo-c-w-time").text(format!("{hour:02}:00")))
            })
            .collect()
    }

    fn rebuild(&mut self) -> Result<()> {
        let rows = self.rows();
        self.core.tree_mut()?.replace_children(Target::Root, rows)?;
        Ok(())
    }
}

impl Configurable for TimeAxis {
    fn config(&self) -> &ConfigStore<Self> {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigStore<Self> {
        &mut self.config
    }
}

impl HandlerScope for TimeAxis {}

impl Component for TimeAxis {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn clear_config(&mut self) {
        self.config.clear();
    }

    fn on_constructed(&mut self, _rt: &Runtime) -> Result<()> {
        self.rebuild()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_time_accepts_clock_values() {
        assert_eq!(parse_time("08:30"), Some(8.5));
        assert_eq!(parse_time("24:00"), Some(24.0));
        assert_eq!(parse_time("24:30"), None);
        assert_eq!(parse_time("7"), None);
        assert_eq!(parse_time("07:60"), None);
    }

    #[test]
    fn metrics_total_height_includes_row_borders() {
        let m = TimeAxisMetrics::new(8.0, 18.0, 20, 2);
        assert_eq!(m.total_height, 10.0 * 42.0);
        assert_eq!(m.span(), 10.0);
    }

    #[test]
    fn metrics_survive_event_payload() {
        let m = TimeAxisMetrics::new(6.0, 20.5, 25, 3);
        assert_eq!(TimeAxisMetrics::from_event_data(&m.to_event_data()), Some(m));
        assert_eq!(TimeAxisMetrics::from_event_data(&EventData::None), None);
    }

    #[test]
    fn oversized_rows_in_payload_are_ignored() {
        let mut m = TimeAxisMetrics::new(8.0, 18.0, 20, 2);
        m.rows_per_item = i64::MAX;
        assert_eq!(TimeAxisMetrics::from_event_data(&m.to_event_data()), None);
    }
}
