#![forbid(unsafe_code)]

//! Sliding-window week view.
//!
//! # Design
//!
//! The view shows three weeks at a time: the week holding `currentDate`
//! in the middle, one page of seven columns on each side. The column
//! container and the header row each hold exactly 21 children, one per
//! day, and every column carries its date (`YYYY-MM-DD`) as its flag.
//!
//! ```text
//! scroll container (flag neo-c-w-scrollcontainer)
//! ├── header row (flag neo-header-row)         21 header items
//! └── column/time-axis container
//!     ├── time axis placeholder                (start or end)
//!     └── column container                     21 columns
//! ```
//!
//! Horizontal wheel input moves the window a page at a time. Past the
//! 13/14 column boundary the leading page is dropped and a page appended;
//! before the 0/1 boundary the trailing page is dropped and a page
//! prepended. Only the seven new columns are built. The renderer is then
//! scrolled back by one page width so the content under the pointer stays
//! put; further wheel input is ignored until that scroll is acknowledged.
//!
//! # Invariants
//!
//! 1. Column and header counts are both 21 after construction.
//! 2. Column dates are contiguous and increasing.
//! 3. `first_column_date` is the flag of the first column.

use crate::event_store::{CalendarEvent, EventStore};
use crate::formatter::{DayNameFormat, DayNameFormatter, EnglishDayNames};
use crate::time_axis::{CHANGE_EVENT, TimeAxis, TimeAxisMetrics};
use chrono::{Datelike, Days, Local, NaiveDate, Timelike, Weekday};
use std::rc::Rc;
use std::sync::LazyLock;
use weft_core::config::{ConfigDescriptor, ConfigSchema, ConfigStore, Configurable};
use weft_core::{ComponentId, ConfigValue, DomEvent, Error, EventData, Result, ValidationRejected};
use weft_render::{Axis, Target, VNode};
use weft_runtime::{
    Component, ComponentCore, CreateOptions, HandlerContext, HandlerScope, HandlerTable,
    ListenerScope, ListenerSpec, Runtime,
};

pub const SCROLL_CONTAINER: &str = "neo-c-w-scrollcontainer";
pub const HEADER_ROW: &str = "neo-header-row";
pub const COLUMN_TIMEAXIS_CONTAINER: &str = "neo-c-w-column-timeaxis-container";
pub const COLUMN_CONTAINER: &str = "neo-c-w-column-container";

/// Columns per page.
pub const PAGE: usize = 7;
/// Columns in the window.
pub const WINDOW: usize = 3 * PAGE;
/// Pixel width reserved for the time axis inside the scroll container.
pub const TIME_AXIS_WIDTH: f64 = 50.0;

const DATE_FLAG_FORMAT: &str = "%Y-%m-%d";

static WEEK_VIEW_SCHEMA: LazyLock<ConfigSchema<WeekView>> = LazyLock::new(|| {
    ConfigSchema::builder("WeekView")
        .declare(
            ConfigDescriptor::new("currentDate", ConfigValue::Null)
                .before_set(before_set_current_date)
                .after_set(after_set_refresh),
        )
        .declare(
            ConfigDescriptor::new("dayNameFormat", DayNameFormat::Short.as_str())
                .legal_values(DayNameFormat::ALL)
                .after_set(after_set_header),
        )
        .declare(
            ConfigDescriptor::new("locale", "en-US")
                .before_set(before_set_locale)
                .after_set(after_set_header),
        )
        .declare(
            ConfigDescriptor::new("timeAxisPosition", "start")
                .legal_values(["start", "end"])
                .after_set(after_set_time_axis_position)
                .after_on_init(),
        )
        .declare(
            ConfigDescriptor::new("weekStartDay", 0)
                .legal_values(0..=6)
                .after_set(after_set_refresh),
        )
        .build()
});

static WEEK_VIEW_HANDLERS: LazyLock<HandlerTable<WeekView>> = LazyLock::new(|| {
    HandlerTable::new()
        .with("onWheel", WeekView::on_wheel)
        .with("onTimeAxisChange", WeekView::on_time_axis_change)
});

fn before_set_current_date(
    w: &mut WeekView,
    value: ConfigValue,
    _: Option<&ConfigValue>,
) -> Result<ConfigValue> {
    match value {
        ConfigValue::Null => Ok(ConfigValue::Date(w.today)),
        ConfigValue::Date(_) => Ok(value),
        ConfigValue::Str(ref s) => NaiveDate::parse_from_str(s, DATE_FLAG_FORMAT)
            .map(ConfigValue::Date)
            .map_err(|e| Error::from(ValidationRejected::new("currentDate", format!("{s}: {e}")))),
        other => Err(ValidationRejected::new(
            "currentDate",
            format!("expected a date, got {}", other.kind()),
        )
        .into()),
    }
}

fn before_set_locale(_: &mut WeekView, value: ConfigValue, _: Option<&ConfigValue>) -> Result<ConfigValue> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(value),
        _ => Err(ValidationRejected::new("locale", "expected a non-empty locale tag").into()),
    }
}

fn after_set_refresh(w: &mut WeekView, _: &ConfigValue, _: Option<&ConfigValue>) -> Result<()> {
    if !w.header_created {
        return Ok(());
    }
    w.update_header(false)?;
    w.update_events()?;
    w.touch()
}

fn after_set_header(w: &mut WeekView, _: &ConfigValue, _: Option<&ConfigValue>) -> Result<()> {
    if !w.header_created {
        return Ok(());
    }
    w.update_header(false)?;
    w.touch()
}

fn after_set_time_axis_position(
    w: &mut WeekView,
    value: &ConfigValue,
    old: Option<&ConfigValue>,
) -> Result<()> {
    let at_end = value.as_str() == Some("end");
    let tree = w.core.tree_mut()?;
    tree.update(Target::Root, |root| root.set_class("neo-timeaxis-end", at_end))?;
    if old.is_some() {
        tree.update(COLUMN_TIMEAXIS_CONTAINER, |node| node.children.reverse())?;
        w.touch()?;
    }
    Ok(())
}

/// Offset of `date` from the start of its week.
#[must_use]
pub fn days_into_week(date: NaiveDate, week_start_day: u32) -> u64 {
    u64::from((date.weekday().num_days_from_sunday() + 7 - week_start_day % 7) % 7)
}

/// First date of the 21-day window around `current`.
#[must_use]
pub fn window_start(current: NaiveDate, week_start_day: u32) -> NaiveDate {
    let back = days_into_week(current, week_start_day) + PAGE as u64;
    current.checked_sub_days(Days::new(back)).unwrap_or(current)
}

/// Flag carried by the column of `date`.
#[must_use]
pub fn date_flag(date: NaiveDate) -> String {
    date.format(DATE_FLAG_FORMAT).to_string()
}

/// Date of a column flag.
#[must_use]
pub fn parse_date_flag(flag: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(flag, DATE_FLAG_FORMAT).ok()
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Three-week calendar view.
pub struct WeekView {
    core: ComponentCore,
    config: ConfigStore<WeekView>,
    formatter: Rc<dyn DayNameFormatter>,
    today: NaiveDate,
    events: EventStore,
    first_column_date: NaiveDate,
    header_created: bool,
    is_updating: bool,
    time_axis: Option<ComponentId>,
    time_axis_config: Vec<(String, ConfigValue)>,
    metrics: Option<TimeAxisMetrics>,
}

impl WeekView {
    pub fn new(mut core: ComponentCore) -> Result<Self> {
        let root = VNode::new("div")
            .id(core.id().to_string())
            .class("neo-calendar-weekcomponent")
            .child(VNode::new("div").class("neo-header"))
            .child(VNode::new("div").class("neo-scroll-overlay"))
            .child(
                VNode::new("div")
                    .class(SCROLL_CONTAINER)
                    .flag(SCROLL_CONTAINER)
                    .id(core.node_id("scrollcontainer"))
                    .child(VNode::new("div").class(HEADER_ROW).flag(HEADER_ROW))
                    .child(
                        VNode::new("div")
                            .class(COLUMN_TIMEAXIS_CONTAINER)
                            .flag(COLUMN_TIMEAXIS_CONTAINER)
                            .child(
                                VNode::new("div")
                                    .class(COLUMN_CONTAINER)
                                    .flag(COLUMN_CONTAINER)
                                    .id(core.node_id("column-container")),
                            ),
                    ),
            );
        core.set_root(root)?;
        let owner = core.id().to_string();
        let today = Local::now().date_naive();
        Ok(Self {
            core,
            config: ConfigStore::new(&WEEK_VIEW_SCHEMA, owner),
            formatter: Rc::new(EnglishDayNames),
            today,
            events: EventStore::new(),
            first_column_date: today,
            header_created: false,
            is_updating: false,
            time_axis: None,
            time_axis_config: Vec::new(),
            metrics: None,
        })
    }

    /// Use `formatter` for column headers.
    #[must_use]
    pub fn with_formatter(mut self, formatter: impl DayNameFormatter + 'static) -> Self {
        self.formatter = Rc::new(formatter);
        self
    }

    /// Treat `today` as the current day for `neo-today` and the default
    /// `currentDate`.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: EventStore) -> Self {
        self.events = events;
        self
    }

    /// Creation config for the owned time axis.
    #[must_use]
    pub fn with_time_axis_config(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.time_axis_config.push((name.into(), value.into()));
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn current_date(&self) -> NaiveDate {
        self.get_config("currentDate")
            .ok()
            .and_then(|v| v.as_date())
            .unwrap_or(self.today)
    }

    #[must_use]
    pub fn week_start_day(&self) -> u32 {
        self.get_config("weekStartDay")
            .ok()
            .and_then(|v| v.as_int())
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0)
    }

    #[must_use]
    pub fn day_name_format(&self) -> DayNameFormat {
        self.get_config("dayNameFormat")
            .ok()
            .and_then(|v| v.as_str().and_then(DayNameFormat::parse))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn locale(&self) -> String {
        self.get_config("locale")
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn first_column_date(&self) -> NaiveDate {
        self.first_column_date
    }

    /// Dates of the columns, read from their flags.
    #[must_use]
    pub fn column_dates(&self) -> Vec<NaiveDate> {
        self.core
            .tree()
            .find(COLUMN_CONTAINER)
            .map(|c| {
                c.children
                    .iter()
                    .filter_map(|n| n.flag.as_deref().and_then(parse_date_flag))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.is_updating
    }

    #[must_use]
    pub fn time_axis(&self) -> Option<ComponentId> {
        self.time_axis
    }

    #[must_use]
    pub fn events(&self) -> &EventStore {
        &self.events
    }

    /// Replace the event store and lay the events out again.
    pub fn set_events(&mut self, events: EventStore) -> Result<()> {
        self.events = events;
        if self.header_created {
            self.update_events()?;
            self.touch()?;
        }
        Ok(())
    }

    /// Add or replace one event.
    pub fn upsert_event(&mut self, event: CalendarEvent) -> Result<()> {
        self.events.insert(event);
        if self.header_created {
            self.update_events()?;
            self.touch()?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Tree building
    // -----------------------------------------------------------------------

    fn column(&self, date: NaiveDate) -> VNode {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        let mut column = VNode::new("div")
            .classes(["neo-c-w-column", "neo-draggable"])
            .flag(date_flag(date))
            .with_children(self.event_nodes(date));
        column.set_class("neo-weekend", weekend);
        column
    }

    fn header_item(&self, date: NaiveDate, format: DayNameFormat, locale: &str) -> VNode {
        let mut date_node = VNode::new("div").class("neo-date").text(date.day().to_string());
        date_node.set_class("neo-today", date == self.today);
        VNode::new("div")
            .class("neo-header-row-item")
            .child(
                VNode::new("div")
                    .class("neo-day")
                    .text(self.formatter.day_name(date, format, locale)),
            )
            .child(date_node)
    }

    fn event_nodes(&self, date: NaiveDate) -> Vec<VNode> {
        let Some(metrics) = self.metrics else {
            return Vec::new();
        };
        let span = metrics.span();
        if span <= 0.0 {
            return Vec::new();
        }
        self.events
            .on(date)
            .map(|event| {
                let start_hours = f64::from(event.start.hour()) + f64::from(event.start.minute()) / 60.0;
                let height = round3(event.duration_hours() / span * 100.0);
                let top = round3((start_hours - metrics.start) / span * 100.0);
                VNode::new("div")
                    .classes(["neo-event", "neo-draggable"])
                    .id(self.core.node_id(&event.id))
                    .attr("tabIndex", "-1")
                    .style("height", format!("calc({height}% - 2px)"))
                    .style("top", format!("calc({top}% + 1px)"))
                    .style("width", "calc(100% - 1px)")
                    .child(
                        VNode::new("div")
                            .class("neo-event-time")
                            .text(event.start.format("%H:%M").to_string()),
                    )
                    .child(VNode::new("div").class("neo-event-title").text(event.title.clone()))
            })
            .collect()
    }

    fn dates_from(first: NaiveDate, count: usize) -> impl Iterator<Item = NaiveDate> {
        first.iter_days().take(count)
    }

    /// Recompute the window from `currentDate` and `weekStartDay`.
    ///
    /// With `create` the 21 columns and header items are built; otherwise
    /// the existing ones are relabelled in place.
    fn update_header(&mut self, create: bool) -> Result<()> {
        let first = window_start(self.current_date(), self.week_start_day());
        self.first_column_date = first;
        let format = self.day_name_format();
        let locale = self.locale();
        let dates: Vec<NaiveDate> = Self::dates_from(first, WINDOW).collect();

        if create {
            let columns: Vec<VNode> = dates.iter().map(|d| self.column(*d)).collect();
            let headers: Vec<VNode> = dates
                .iter()
                .map(|d| self.header_item(*d, format, &locale))
                .collect();
            let tree = self.core.tree_mut()?;
            tree.replace_children(COLUMN_CONTAINER, columns)?;
            tree.replace_children(HEADER_ROW, headers)?;
        } else {
            let labels: Vec<(String, bool, bool, String, String)> = dates
                .iter()
                .map(|d| {
                    (
                        date_flag(*d),
                        matches!(d.weekday(), Weekday::Sat | Weekday::Sun),
                        *d == self.today,
                        self.formatter.day_name(*d, format, &locale),
                        d.day().to_string(),
                    )
                })
                .collect();
            let tree = self.core.tree_mut()?;
            tree.update(COLUMN_CONTAINER, |node| {
                for (column, (flag, weekend, ..)) in node.children.iter_mut().zip(&labels) {
                    column.flag = Some(flag.clone());
                    column.set_class("neo-weekend", *weekend);
                }
            })?;
            tree.update(HEADER_ROW, |node| {
                for (item, (_, _, today, day_name, day)) in node.children.iter_mut().zip(&labels) {
                    if let [name_node, date_node, ..] = item.children.as_mut_slice() {
                        name_node.text = Some(day_name.clone());
                        date_node.text = Some(day.clone());
                        date_node.set_class("neo-today", *today);
                    }
                }
            })?;
        }
        tracing::debug!(
            target: "weft.calendar",
            view = %self.core.id(),
            first = %first,
            create,
            "week header updated"
        );
        Ok(())
    }

    /// Lay every event out again in the columns it falls on.
    fn update_events(&mut self) -> Result<()> {
        let per_column: Vec<Vec<VNode>> = self
            .column_dates()
            .into_iter()
            .map(|d| self.event_nodes(d))
            .collect();
        let placed: usize = per_column.iter().map(Vec::len).sum();
        self.core.tree_mut()?.update(COLUMN_CONTAINER, |node| {
            for (column, events) in node.children.iter_mut().zip(per_column) {
                column.children = events;
            }
        })?;
        tracing::trace!(target: "weft.calendar", view = %self.core.id(), placed, "events laid out");
        Ok(())
    }

    /// Size the column container to the time axis.
    fn adjust_total_height(&mut self, metrics: TimeAxisMetrics) -> Result<()> {
        let row_height = metrics.row_height;
        let rows = metrics.rows_per_item;
        let height = metrics.total_height - row_height as f64;
        let mut gradient = Vec::new();
        for i in 0..rows {
            gradient.push(format!("var(--c-w-background-color) {}px", i * row_height + i));
            gradient.push(format!("var(--c-w-background-color) {}px", (i + 1) * row_height + i));
            gradient.push("var(--c-w-border-color) 0".to_owned());
        }
        self.metrics = Some(metrics);
        self.core.tree_mut()?.update(COLUMN_CONTAINER, |node| {
            node.style.insert(
                "background-image".into(),
                format!("linear-gradient({})", gradient.join(",")),
            );
            node.style
                .insert("background-size".into(), format!("1px {}px", rows * row_height + rows));
            node.style.insert("height".into(), format!("{height}px"));
            node.style.insert("max-height".into(), format!("{height}px"));
        })?;
        Ok(())
    }

    /// Drop the leading page and append the page after the window.
    fn shift_forward(&mut self) -> Result<()> {
        let first = self.first_column_date + Days::new(PAGE as u64);
        let new_dates: Vec<NaiveDate> = Self::dates_from(first + Days::new(2 * PAGE as u64), PAGE).collect();
        self.replace_page(0, WINDOW - PAGE, &new_dates)?;
        self.first_column_date = first;
        Ok(())
    }

    /// Drop the trailing page and prepend the page before the window.
    fn shift_backward(&mut self) -> Result<()> {
        let first = self.first_column_date - Days::new(PAGE as u64);
        let new_dates: Vec<NaiveDate> = Self::dates_from(first, PAGE).collect();
        self.replace_page(WINDOW - PAGE, 0, &new_dates)?;
        self.first_column_date = first;
        Ok(())
    }

    /// Remove the page at `remove_at`, then insert `dates` at `insert_at`
    /// (an index into the shortened list).
    fn replace_page(&mut self, remove_at: usize, insert_at: usize, dates: &[NaiveDate]) -> Result<()> {
        let format = self.day_name_format();
        let locale = self.locale();
        let columns: Vec<VNode> = dates.iter().map(|d| self.column(*d)).collect();
        let headers: Vec<VNode> = dates
            .iter()
            .map(|d| self.header_item(*d, format, &locale))
            .collect();
        let tree = self.core.tree_mut()?;
        tree.splice_children(COLUMN_CONTAINER, remove_at, PAGE, Vec::new())?;
        tree.splice_children(HEADER_ROW, remove_at, PAGE, Vec::new())?;
        tree.splice_children(COLUMN_CONTAINER, insert_at, 0, columns)?;
        tree.splice_children(HEADER_ROW, insert_at, 0, headers)?;
        Ok(())
    }

    fn touch(&self) -> Result<()> {
        if self.core.lifecycle().is_constructed() {
            let _pending = self.core.request_update()?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    fn on_wheel(&mut self, cx: &mut HandlerContext<'_>, event: &DomEvent) -> Result<()> {
        let EventData::Wheel {
            delta_x,
            delta_y,
            scroll_left,
            client_width,
        } = event.data
        else {
            return Ok(());
        };
        if self.is_updating || delta_x.abs() <= delta_y.abs() {
            return Ok(());
        }
        let width = client_width - TIME_AXIS_WIDTH;
        if width <= 0.0 {
            return Ok(());
        }
        let position = (scroll_left / width * PAGE as f64).round();
        let scroll = if delta_x > 0.0 && position > 13.0 {
            self.shift_forward()?;
            -width
        } else if delta_x < 0.0 && position < 1.0 {
            self.shift_backward()?;
            width
        } else {
            return Ok(());
        };
        tracing::debug!(
            target: "weft.calendar",
            view = %self.core.id(),
            first = %self.first_column_date,
            scroll,
            "week window shifted"
        );

        let update = self.core.request_update()?;
        let rt = cx.runtime().clone();
        let id = self.core.id();
        let node = self.core.node_id("scrollcontainer");
        self.is_updating = true;
        let spawned = rt.spawn({
            let rt = rt.clone();
            async move {
                let result = match update.await {
                    Ok(_) => rt.scroll_by(&node, Axis::X, scroll).await,
                    Err(err) => Err(err),
                };
                if let Err(err) = &result {
                    tracing::warn!(target: "weft.calendar", view = %id, error = %err, "window scroll failed");
                }
                if let Err(err) = rt.with_component_mut::<WeekView, _>(id, |w| w.is_updating = false) {
                    tracing::warn!(target: "weft.calendar", view = %id, error = %err, "update guard not cleared");
                }
            }
        });
        if let Err(err) = spawned {
            self.is_updating = false;
            return Err(err);
        }
        Ok(())
    }

    fn on_time_axis_change(&mut self, _cx: &mut HandlerContext<'_>, event: &DomEvent) -> Result<()> {
        let Some(metrics) = TimeAxisMetrics::from_event_data(&event.data) else {
            return Ok(());
        };
        self.adjust_total_height(metrics)?;
        if self.header_created {
            self.update_events()?;
        }
        self.touch()
    }

    /// Scroll the middle week into view.
    fn center_middle_week(&self, rt: &Runtime) -> Result<()> {
        let columns = self.core.node_id("column-container");
        let scroller = self.core.node_id("scrollcontainer");
        let id = self.core.id();
        let task_rt = rt.clone();
        rt.spawn(async move {
            let result = match task_rt.measure(&columns).await {
                Ok(m) => task_rt.scroll_by(&scroller, Axis::X, m.width / 3.0).await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                tracing::warn!(target: "weft.calendar", view = %id, error = %err, "initial scroll failed");
            }
        })
        .map(drop)
    }
}

impl Configurable for WeekView {
    fn config(&self) -> &ConfigStore<Self> {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigStore<Self> {
        &mut self.config
    }
}

impl HandlerScope for WeekView {
    fn defines(&self, handler: &str) -> bool {
        WEEK_VIEW_HANDLERS.defines(handler)
    }

    fn invoke(&mut self, handler: &str, cx: &mut HandlerContext<'_>, event: &DomEvent) -> Result<()> {
        WEEK_VIEW_HANDLERS.invoke(self, handler, cx, event)
    }
}

impl Component for WeekView {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn clear_config(&mut self) {
        self.config.clear();
    }

    fn default_dom_listeners(&self) -> Vec<ListenerSpec> {
        vec![ListenerSpec::named("wheel", "onWheel").scope(ListenerScope::Own)]
    }

    fn on_constructed(&mut self, rt: &Runtime) -> Result<()> {
        let id = self.core.id();
        let mut options = CreateOptions::new().parent(id).reference("timeAxis").listener(
            ListenerSpec::named(CHANGE_EVENT, "onTimeAxisChange").scope(ListenerScope::Component(id)),
        );
        for (name, value) in std::mem::take(&mut self.time_axis_config) {
            options = options.config(name, value);
        }
        let axis = rt.create(options, TimeAxis::new)?;
        self.time_axis = Some(axis);

        let at_start = self.get_config("timeAxisPosition")?.as_str() != Some("end");
        self.core.tree_mut()?.update(COLUMN_TIMEAXIS_CONTAINER, |node| {
            let placeholder = VNode::placeholder(axis);
            if at_start {
                node.children.insert(0, placeholder);
            } else {
                node.children.push(placeholder);
            }
        })?;

        let metrics = rt.with_component(axis, |t: &TimeAxis| t.metrics())?;
        self.adjust_total_height(metrics)?;
        self.update_header(true)?;
        self.header_created = true;
        tracing::debug!(target: "weft.calendar", view = %id, axis = %axis, "week view constructed");
        Ok(())
    }

    fn on_mounted(&mut self, rt: &Runtime, first: bool) -> Result<()> {
        if first {
            self.center_middle_week(rt)?;
        }
        Ok(())
    }

    fn on_destroy(&mut self, _rt: &Runtime) {
        self.events = EventStore::new();
        self.time_axis = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn window_starts_a_week_before_the_current_week() {
        // 2024-01-10 is a Wednesday.
        assert_eq!(window_start(d(2024, 1, 10), 1), d(2024, 1, 1));
        assert_eq!(window_start(d(2024, 1, 10), 0), d(2023, 12, 31));
        // A Monday with Monday weeks is the first day of its own week.
        assert_eq!(window_start(d(2024, 1, 8), 1), d(2024, 1, 1));
        // A Sunday with Monday weeks belongs to the week started six days earlier.
        assert_eq!(window_start(d(2024, 1, 14), 1), d(2024, 1, 1));
    }

    #[test]
    fn flags_round_trip() {
        let date = d(2024, 2, 29);
        assert_eq!(date_flag(date), "2024-02-29");
        assert_eq!(parse_date_flag("2024-02-29"), Some(date));
        assert_eq!(parse_date_flag("neo-header-row"), None);
    }

    #[test]
    fn round3_keeps_three_decimals() {
        assert_eq!(round3(100.0 / 3.0), 33.333);
        assert_eq!(round3(12.5), 12.5);
    }
}
