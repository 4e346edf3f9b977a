use super::context::TickContext;
use super::system::SimSystem;
use crate::model::{DiplomacyState, TrendSnapshot};

const TREND_RETENTION_DAYS: u32 = 365;

/// Records the day's diplomatic climate. Must run after every other system.
#[derive(Debug, Default)]
pub struct TrendSystem;

impl SimSystem for TrendSystem {
    fn name(&self) -> &str {
        "trends"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let day = ctx.day();
        let Some(snapshot) = compute_trend(ctx.state, day) else {
            return;
        };
        ctx.state.trends.insert(day, snapshot);
        ctx.state
            .trends
            .retain(|&d, _| day.saturating_sub(d) <= TREND_RETENTION_DAYS);
    }
}

/// Aggregate indicators over live relations. `None` when there are none.
pub fn compute_trend(state: &DiplomacyState, day: u32) -> Option<TrendSnapshot> {
    let mut total = 0usize;
    let mut trust = 0.0;
    let mut peaceful = 0usize;
    let mut hostile = 0usize;
    for rel in state.live_relations() {
        total += 1;
        trust += rel.trust;
        if rel.status.is_peaceful() {
            peaceful += 1;
        } else if rel.status.is_hostile() {
            hostile += 1;
        }
    }
    if total == 0 {
        return None;
    }

    let n = total as f64;
    Some(TrendSnapshot {
        day,
        average_trust: trust / n,
        peaceful_relations: peaceful as f64 / n,
        hostile_relations: hostile as f64 / n,
        active_treaties: state.active_treaty_count(),
        open_negotiations: state.negotiations.len(),
    })
}
