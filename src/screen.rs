//! Report screen: one screen's date picker wired to its data fetches.
//!
//! widget click → normalizer → override resolver → effective-range
//! broadcaster → debounced fetch scheduler.

use crate::config::DashboardConfig;
use crate::range::{
    default_range, GlobalDateContext, GlobalRange, OverrideResolver, RangeNormalizer, RangeWidget,
};
use crate::sources::ReportSource;
use crate::sync::{Broadcaster, FetchScheduler, Subscription};
use crate::types::{CalendarType, DateRange, FetchState, Identity, LimitCalendar, RangeType, TimeOfDay};
use crate::utils::time::{local_now, LookbackWindow};
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Per-screen date picker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenOptions {
    pub calendar_type: CalendarType,
    pub limit_calendar: LimitCalendar,
    /// Hint shown next to the picker
    pub tool_tip_value: Option<String>,
    /// Previously committed range to restore, e.g. on navigating back
    pub date_input: Option<DateRange>,
}

pub struct ReportScreen {
    options: ScreenOptions,
    lookback_days: i64,
    widget: RangeWidget,
    normalizer: RangeNormalizer,
    resolver: OverrideResolver,
    global_rx: watch::Receiver<Option<GlobalRange>>,
    committed: Broadcaster<DateRange>,
    effective: Broadcaster<DateRange>,
    scheduler: Arc<FetchScheduler>,
    identity: Arc<Mutex<Option<Identity>>>,
    _fetch_link: Subscription,
}

impl ReportScreen {
    pub fn new(
        config: &DashboardConfig,
        options: ScreenOptions,
        source: Arc<dyn ReportSource>,
        global: &GlobalDateContext,
    ) -> Self {
        let today = local_now().date();
        let scheduler = Arc::new(FetchScheduler::new(source, config.debounce()));
        let identity: Arc<Mutex<Option<Identity>>> = Arc::new(Mutex::new(None));

        let effective = Broadcaster::new();
        let fetch_link = {
            let scheduler = Arc::clone(&scheduler);
            let identity = Arc::clone(&identity);
            effective.subscribe(move |range: &DateRange| {
                let current = identity.lock().clone();
                scheduler.schedule(range.clone(), current, false);
            })
        };

        Self {
            widget: RangeWidget::from_config(config, today),
            normalizer: RangeNormalizer::from_config(config, options.calendar_type, options.limit_calendar, today),
            lookback_days: config.lookback_days,
            options,
            resolver: OverrideResolver::new(),
            global_rx: global.subscribe(),
            committed: Broadcaster::new(),
            effective,
            scheduler,
            identity,
            _fetch_link: fetch_link,
        }
    }

    /// Commits `dateInput` (or the calendar type's default preset), takes in
    /// the current global range and broadcasts the effective range once.
    pub fn mount(&mut self, now: NaiveDateTime) -> Option<DateRange> {
        self.set_today(now.date());

        let initial = match self.options.date_input.clone() {
            Some(range) => {
                self.widget.hydrate(&range);
                range
            }
            None => default_range(self.options.calendar_type, now, self.normalizer.display_format()),
        };
        self.resolver.set_local(initial.clone());
        self.committed.next(&initial);

        let global = self.global_rx.borrow_and_update().clone();
        self.resolver.observe_global(global.as_ref());

        let effective = self.resolver.effective();
        if let Some(ref range) = effective {
            self.effective.next(range);
        }
        effective
    }

    /// Moves the selectable window, e.g. at midnight
    pub fn set_today(&mut self, today: NaiveDate) {
        let window = LookbackWindow::new(today, self.lookback_days);
        self.widget.set_window(window);
        self.normalizer.set_window(window);
    }

    /// A click on the calendar. Returns the newly committed range, or `None`
    /// when the click was ignored, is still pending, or was rejected.
    pub fn click(&mut self, at: NaiveDateTime) -> Option<DateRange> {
        if !self.widget.click(at) {
            return None;
        }
        if !self.normalizer.is_ready(&self.widget.selection()) {
            return None;
        }
        self.normalize_and_commit()
    }

    pub fn choose_preset(&mut self, kind: RangeType, now: NaiveDateTime) -> Option<DateRange> {
        let range = self.normalizer.preset(kind, now);
        self.widget.hydrate(&range);
        self.commit(range)
    }

    /// Confirms the current selection with the current picker times. A free
    /// range with only a start commits as a single instant.
    pub fn apply(&mut self) -> Option<DateRange> {
        self.normalize_and_commit()
    }

    pub fn set_from_time(&mut self, time: TimeOfDay) {
        self.widget.set_from_time(time);
    }

    pub fn set_to_time(&mut self, time: TimeOfDay) {
        self.widget.set_to_time(time);
    }

    /// Applies a newly published global range, if there is one
    pub fn sync_global(&mut self) -> Option<DateRange> {
        if !self.global_rx.has_changed().unwrap_or(false) {
            return None;
        }
        self.take_global()
    }

    /// Waits for the next global publish and applies it. Returns `None` once
    /// the global context is gone.
    pub async fn global_changed(&mut self) -> Option<DateRange> {
        self.global_rx.changed().await.ok()?;
        self.take_global()
    }

    /// New project selection; `None` suppresses fetching
    pub fn set_identity(&mut self, identity: Option<Identity>) {
        *self.identity.lock() = identity.clone();
        if let Some(range) = self.resolver.effective() {
            self.scheduler.schedule(range, identity, false);
        }
    }

    /// Manual reload: bypasses the dedup guard, still debounced
    pub fn reload(&self) {
        if let Some(range) = self.resolver.effective() {
            self.scheduler.schedule(range, self.identity.lock().clone(), true);
        }
    }

    pub fn on_selected_range_value_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DateRange) + Send + Sync + 'static,
    {
        self.committed.subscribe(callback)
    }

    /// Extra consumers of the effective range (a second chart on the screen)
    pub fn on_effective_range<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DateRange) + Send + Sync + 'static,
    {
        self.effective.subscribe(callback)
    }

    pub fn effective_range(&self) -> Option<DateRange> {
        self.resolver.effective()
    }

    pub fn local_override(&self) -> Option<&DateRange> {
        self.resolver.local()
    }

    pub fn fetch_state(&self) -> FetchState {
        self.scheduler.state()
    }

    pub fn subscribe_fetch_state(&self) -> watch::Receiver<FetchState> {
        self.scheduler.subscribe()
    }

    pub fn fetch_count(&self) -> u64 {
        self.scheduler.issued()
    }

    pub fn widget(&self) -> &RangeWidget {
        &self.widget
    }

    pub fn tool_tip(&self) -> Option<&str> {
        self.options.tool_tip_value.as_deref()
    }

    /// Closes both channels and stops the scheduler; late results are dropped
    pub fn teardown(&mut self) {
        self.committed.close();
        self.effective.close();
        self.scheduler.shutdown();
    }

    fn normalize_and_commit(&mut self) -> Option<DateRange> {
        let result = self.normalizer.normalize(
            &self.widget.selection(),
            self.widget.from_time(),
            self.widget.to_time(),
        );
        match result {
            Ok(range) => self.commit(range),
            Err(rejection) => {
                debug!(reason = %rejection, "selection rejected, keeping previous range");
                None
            }
        }
    }

    fn commit(&mut self, range: DateRange) -> Option<DateRange> {
        self.resolver.set_local(range.clone());
        self.committed.next(&range);
        if let Some(ref effective) = self.resolver.effective() {
            self.effective.next(effective);
        }
        Some(range)
    }

    fn take_global(&mut self) -> Option<DateRange> {
        let global = self.global_rx.borrow_and_update().clone();
        let effective = self.resolver.observe_global(global.as_ref())?;
        self.effective.next(&effective);
        Some(effective)
    }
}

impl Drop for ReportScreen {
    fn drop(&mut self) {
        self.teardown();
    }
}
