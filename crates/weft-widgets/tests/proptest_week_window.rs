//! Property-based invariant tests for the week view's sliding window.
//!
//! 1. The window always holds 21 contiguous, increasing dates.
//! 2. Header and column counts stay equal.
//! 3. `first_column_date` is the flag of the first column.
//! 4. The net page shift matches the net scroll correction.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use weft_core::{ComponentId, DomEvent, EventData, PathNode};
use weft_render::VNode;
use weft_runtime::{Component, CreateOptions, Runtime, RuntimeConfig};
use weft_widgets::WeekView;
use weft_widgets::week_view::{HEADER_ROW, PAGE, WINDOW, window_start};

// ── Strategies ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Wheel {
    Forward,
    Backward,
    Vertical,
    Middle,
}

fn wheel_strategy() -> impl Strategy<Value = Wheel> {
    prop_oneof![
        3 => Just(Wheel::Forward),
        3 => Just(Wheel::Backward),
        1 => Just(Wheel::Vertical),
        1 => Just(Wheel::Middle),
    ]
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0u64..3650).prop_map(|n| NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(n))
}

fn event(id: ComponentId, wheel: Wheel) -> DomEvent {
    let (delta_x, delta_y, scroll_left) = match wheel {
        Wheel::Forward => (40.0, 0.0, 1400.0),
        Wheel::Backward => (-40.0, 0.0, 0.0),
        Wheel::Vertical => (1.0, 40.0, 1400.0),
        Wheel::Middle => (40.0, 0.0, 700.0),
    };
    DomEvent::new(
        "wheel",
        vec![PathNode::new("div").in_component(id)],
        EventData::Wheel {
            delta_x,
            delta_y,
            scroll_left,
            client_width: 750.0,
        },
    )
}

fn header_len(rt: &Runtime, id: ComponentId) -> usize {
    rt.with_component(id, |w: &WeekView| {
        w.core().tree().find(HEADER_ROW).map_or(0, |n: &VNode| n.children.len())
    })
    .unwrap()
}

// ═════════════════════════════════════════════════════════════════════════
// 1-4. Window shape under random wheel input
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn window_stays_contiguous(
        current in date_strategy(),
        week_start in 0i64..7,
        wheels in proptest::collection::vec(wheel_strategy(), 1..24),
    ) {
        let (rt, renderer) = Runtime::headless(RuntimeConfig::default());
        let id = rt
            .create(
                CreateOptions::new()
                    .config("currentDate", current)
                    .config("weekStartDay", week_start),
                move |core| Ok(WeekView::new(core)?.with_today(current)),
            )
            .unwrap();
        let start = window_start(current, week_start as u32);
        let scroller = rt.with_component(id, |w: &WeekView| w.core().node_id("scrollcontainer")).unwrap();

        let mut pages: i64 = 0;
        for wheel in wheels {
            rt.dispatch(event(id, wheel)).unwrap();
            rt.run_until_stalled().unwrap();
            match wheel {
                Wheel::Forward => pages += 1,
                Wheel::Backward => pages -= 1,
                Wheel::Vertical | Wheel::Middle => {}
            }

            let (dates, first) = rt
                .with_component(id, |w: &WeekView| (w.column_dates(), w.first_column_date()))
                .unwrap();
            prop_assert_eq!(dates.len(), WINDOW);
            prop_assert!(dates.windows(2).all(|p| p[0].succ_opt() == Some(p[1])));
            prop_assert_eq!(dates[0], first);
            prop_assert_eq!(header_len(&rt, id), WINDOW);
            prop_assert!(!rt.with_component(id, |w: &WeekView| w.is_updating()).unwrap());
        }

        let first = rt.with_component(id, |w: &WeekView| w.first_column_date()).unwrap();
        let shift = (first - start).num_days();
        prop_assert_eq!(shift, pages * PAGE as i64);
        let (left, _) = renderer.scroll_offset(&scroller);
        prop_assert_eq!(left, -(pages as f64) * 700.0);
    }
}
