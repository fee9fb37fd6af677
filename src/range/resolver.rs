//! Local override vs. global range reconciliation
//!
//! Policy: the global range wins whenever a new global value is published,
//! the screen's own selection wins otherwise.

use crate::types::DateRange;
use std::sync::Arc;
use tokio::sync::watch;

/// Outcome of one reconciliation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Range to fetch with, if any range exists yet
    pub effective: Option<DateRange>,
    /// Local override surviving this step
    pub local: Option<DateRange>,
}

/// `global_changed` means "a new global value was published since the last
/// step", regardless of whether it equals the previous one.
pub fn resolve(local: Option<&DateRange>, global: Option<&DateRange>, global_changed: bool) -> Resolution {
    if global_changed {
        return Resolution {
            effective: global.cloned().or_else(|| local.cloned()),
            local: if global.is_some() { None } else { local.cloned() },
        };
    }

    Resolution {
        effective: local.or(global).cloned(),
        local: local.cloned(),
    }
}

/// A global value stamped with its publish count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalRange {
    pub generation: u64,
    pub range: DateRange,
}

/// Process-wide date selection shared by every screen. Cloning shares the
/// same channel.
#[derive(Debug, Clone)]
pub struct GlobalDateContext {
    tx: Arc<watch::Sender<Option<GlobalRange>>>,
}

impl GlobalDateContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Publishes `range` and wakes every subscriber, even if the value is
    /// unchanged.
    pub fn publish(&self, range: DateRange) {
        self.tx.send_modify(|slot| {
            let generation = slot.as_ref().map(|g| g.generation + 1).unwrap_or(1);
            *slot = Some(GlobalRange { generation, range });
        });
    }

    pub fn current(&self) -> Option<GlobalRange> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<GlobalRange>> {
        self.tx.subscribe()
    }
}

impl Default for GlobalDateContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-screen reconciliation state
#[derive(Debug, Clone, Default)]
pub struct OverrideResolver {
    local: Option<DateRange>,
    global: Option<DateRange>,
    seen_generation: Option<u64>,
}

impl OverrideResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user picked a range on this screen
    pub fn set_local(&mut self, range: DateRange) -> Option<DateRange> {
        self.local = Some(range);
        self.effective()
    }

    /// Feeds the latest global value. Returns the new effective range when
    /// the value is a fresh publish, `None` when it was already seen.
    pub fn observe_global(&mut self, global: Option<&GlobalRange>) -> Option<DateRange> {
        let generation = global.map(|g| g.generation);
        let changed = generation.is_some() && generation != self.seen_generation;
        if !changed {
            return None;
        }

        self.seen_generation = generation;
        self.global = global.map(|g| g.range.clone());

        let resolution = resolve(self.local.as_ref(), self.global.as_ref(), true);
        self.local = resolution.local;
        resolution.effective
    }

    pub fn local(&self) -> Option<&DateRange> {
        self.local.as_ref()
    }

    pub fn effective(&self) -> Option<DateRange> {
        resolve(self.local.as_ref(), self.global.as_ref(), false).effective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RangeType;
    use chrono::NaiveDate;

    fn range(day: u32) -> DateRange {
        let d = NaiveDate::from_ymd_opt(2026, 10, day).unwrap();
        DateRange::new(
            d.and_hms_opt(0, 0, 0).unwrap(),
            d.and_hms_opt(23, 59, 59).unwrap(),
            RangeType::Custom,
        )
    }

    #[test]
    fn test_resolve_local_wins_without_global_change() {
        let out = resolve(Some(&range(3)), Some(&range(9)), false);
        assert_eq!(out.effective, Some(range(3)));
        assert_eq!(out.local, Some(range(3)));
    }

    #[test]
    fn test_resolve_global_change_clears_local() {
        let out = resolve(Some(&range(3)), Some(&range(9)), true);
        assert_eq!(out.effective, Some(range(9)));
        assert_eq!(out.local, None);
    }

    #[test]
    fn test_resolve_falls_back_to_global() {
        let out = resolve(None, Some(&range(9)), false);
        assert_eq!(out.effective, Some(range(9)));
        assert_eq!(resolve(None, None, false).effective, None);
    }

    #[test]
    fn test_resolve_change_to_nothing_keeps_local() {
        let out = resolve(Some(&range(3)), None, true);
        assert_eq!(out.effective, Some(range(3)));
        assert_eq!(out.local, Some(range(3)));
    }

    #[test]
    fn test_value_equal_republish_still_overrides_local() {
        let context = GlobalDateContext::new();
        let mut resolver = OverrideResolver::new();

        context.publish(range(9));
        assert_eq!(resolver.observe_global(context.current().as_ref()), Some(range(9)));

        resolver.set_local(range(3));
        assert_eq!(resolver.effective(), Some(range(3)));

        // observing the same publish again changes nothing
        assert_eq!(resolver.observe_global(context.current().as_ref()), None);
        assert_eq!(resolver.effective(), Some(range(3)));

        // an identical value published again is still a change
        context.publish(range(9));
        assert_eq!(resolver.observe_global(context.current().as_ref()), Some(range(9)));
        assert_eq!(resolver.local(), None);
        assert_eq!(resolver.effective(), Some(range(9)));
    }

    #[test]
    fn test_generations_increase() {
        let context = GlobalDateContext::new();
        assert!(context.current().is_none());
        context.publish(range(1));
        context.publish(range(1));
        assert_eq!(context.current().unwrap().generation, 2);
    }

    #[tokio::test]
    async fn test_subscribers_are_woken_on_publish() {
        let context = GlobalDateContext::new();
        let mut rx = context.subscribe();
        let publisher = context.clone();

        tokio::spawn(async move { publisher.publish(range(5)) });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().map(|g| g.range.clone()), Some(range(5)));
    }
}
