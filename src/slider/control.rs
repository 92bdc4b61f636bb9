use std::time::{Duration, Instant};

use tracing::debug;

use super::model::{SYNC_TOLERANCE, SliderPositions};
use super::presets::{SizePreset, selected_preset, toggle_preset};
use crate::debounce::Debouncer;
use crate::state::{SearchState, SizeRange, StateChange, StateSubscriber};

/// Default quiet period before a drag is committed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Which side currently owns the handle positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Positions follow the committed size range.
    ExternallyDriven,
    /// The user is dragging, or a drag has not been committed yet; external
    /// updates do not move the handles.
    LocallyDriven,
}

/// State of the size filter widget: handle positions, the drag/commit
/// lifecycle and the debounce that buffers drags before they reach the
/// search state.
#[derive(Debug)]
pub struct SizeFilterControl {
    positions: SliderPositions,
    mode: DriveMode,
    dragging: bool,
    debouncer: Debouncer<Option<SizeRange>>,
    committed: Option<SizeRange>,
}

impl SizeFilterControl {
    #[must_use]
    pub fn new(committed: Option<SizeRange>, debounce: Duration) -> Self {
        Self {
            positions: SliderPositions::from_range(committed),
            mode: DriveMode::ExternallyDriven,
            dragging: false,
            debouncer: Debouncer::new(debounce),
            committed,
        }
    }

    #[must_use]
    pub const fn positions(&self) -> SliderPositions {
        self.positions
    }

    #[must_use]
    pub const fn mode(&self) -> DriveMode {
        self.mode
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// The last range seen from outside the control.
    #[must_use]
    pub const fn committed(&self) -> Option<SizeRange> {
        self.committed
    }

    #[must_use]
    pub fn selected_preset(&self) -> Option<&'static SizePreset> {
        selected_preset(self.committed)
    }

    /// When the pending drag will be committed, if one is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
        self.mode = DriveMode::LocallyDriven;
    }

    /// Move the handles to raw pointer positions and restart the commit
    /// timer. Implies [`begin_drag`](Self::begin_drag).
    pub fn drag_to(&mut self, first: f64, second: f64, now: Instant) {
        if !self.dragging {
            self.begin_drag();
        }
        self.positions = SliderPositions::new(first, second);
        self.debouncer.schedule(self.positions.to_range(), now);
    }

    /// Pointer released. The pending commit still fires after the debounce.
    pub fn end_drag(&mut self) {
        self.dragging = false;
        if !self.debouncer.is_pending() {
            self.mode = DriveMode::ExternallyDriven;
        }
    }

    /// Fire the debounced commit if it is due. The returned range is what
    /// should be pushed into the search state.
    pub fn poll(&mut self, now: Instant) -> Option<Option<SizeRange>> {
        let range = self.debouncer.poll(now)?;
        if !self.dragging {
            self.mode = DriveMode::ExternallyDriven;
        }
        debug!(?range, "committing size range from slider");
        Some(range)
    }

    /// Range to commit for a preset click. Cancels any pending drag commit so
    /// the click is not overwritten a moment later.
    pub fn select_preset(&mut self, preset: &SizePreset) -> Option<SizeRange> {
        self.release();
        toggle_preset(preset, self.committed)
    }

    /// Range to commit for the "clear" action.
    pub fn clear(&mut self) -> Option<SizeRange> {
        self.release();
        None
    }

    /// Drop the pending drag commit because a newer range is being written
    /// from outside the control. A pointer that is still down keeps the drag
    /// alive; its next movement schedules a fresh commit. Returns whether a
    /// commit was dropped.
    pub fn supersede(&mut self) -> bool {
        let dropped = self.debouncer.cancel();
        if !self.dragging {
            self.mode = DriveMode::ExternallyDriven;
        }
        if dropped {
            debug!("pending size commit superseded by a direct write");
        }
        dropped
    }

    /// Reconcile with a range that arrived from outside (URL load, preset,
    /// echo of our own commit). Returns whether the handles moved.
    pub fn sync_external(&mut self, range: Option<SizeRange>) -> bool {
        self.committed = range;
        if self.mode == DriveMode::LocallyDriven {
            return false;
        }
        let implied = SliderPositions::from_range(range);
        if implied.distance(&self.positions) <= SYNC_TOLERANCE {
            return false;
        }
        self.positions = implied;
        true
    }

    /// Tear the control down, discarding any uncommitted drag. Returns
    /// whether a commit was pending.
    pub fn unmount(mut self) -> bool {
        self.debouncer.cancel()
    }

    fn release(&mut self) {
        self.debouncer.cancel();
        self.dragging = false;
        self.mode = DriveMode::ExternallyDriven;
    }
}

impl StateSubscriber for SizeFilterControl {
    fn state_changed(&mut self, state: &SearchState, _change: StateChange) {
        self.sync_external(state.size_range());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slider::presets::{KB, find_preset};

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn starts_from_committed_range() {
        let control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        assert_eq!(control.positions(), SliderPositions::FULL);
        assert_eq!(control.mode(), DriveMode::ExternallyDriven);
    }

    #[test]
    fn drag_commits_once_after_quiet_period() {
        let start = Instant::now();
        let mut control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        control.drag_to(10.0, 90.0, start);
        control.drag_to(20.0, 80.0, ms(start, 100));
        control.drag_to(30.0, 70.0, ms(start, 200));

        assert_eq!(control.poll(ms(start, 400)), None);
        let committed = control.poll(ms(start, 500)).unwrap();
        assert_eq!(committed, SliderPositions::new(30.0, 70.0).to_range());
        assert_eq!(control.poll(ms(start, 900)), None);
    }

    #[test]
    fn full_drag_commits_no_range() {
        let start = Instant::now();
        let mut control = SizeFilterControl::new(Some(SizeRange::at_most(KB)), DEFAULT_DEBOUNCE);
        control.drag_to(0.0, 100.0, start);
        control.end_drag();
        assert_eq!(control.poll(ms(start, 300)), Some(None));
        assert_eq!(control.mode(), DriveMode::ExternallyDriven);
    }

    #[test]
    fn echo_during_drag_does_not_move_handles() {
        let start = Instant::now();
        let mut control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        control.drag_to(10.0, 60.0, start);
        let first = control.poll(ms(start, 300)).unwrap();

        control.drag_to(25.0, 60.0, ms(start, 310));
        assert!(!control.sync_external(first));
        assert_eq!(control.positions().min(), 25.0);
    }

    #[test]
    fn echo_after_commit_is_within_tolerance() {
        let start = Instant::now();
        let mut control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        control.drag_to(12.3, 45.6, start);
        control.end_drag();
        let committed = control.poll(ms(start, 300)).unwrap();
        let before = control.positions();

        assert!(!control.sync_external(committed));
        assert_eq!(control.positions(), before);
    }

    #[test]
    fn external_change_moves_handles_when_idle() {
        let mut control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        assert!(control.sync_external(Some(SizeRange::between(500, 5_000))));
        assert_eq!(
            control.positions(),
            SliderPositions::from_range(Some(SizeRange::between(500, 5_000)))
        );
    }

    #[test]
    fn preset_click_cancels_pending_drag() {
        let start = Instant::now();
        let mut control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        control.drag_to(30.0, 70.0, start);
        let preset = find_preset("< 1 KB").unwrap();

        let range = control.select_preset(preset);
        assert_eq!(range, Some(SizeRange::at_most(KB)));
        assert_eq!(control.poll(ms(start, 1_000)), None);
        assert_eq!(control.mode(), DriveMode::ExternallyDriven);
    }

    #[test]
    fn preset_selection_follows_external_range() {
        let mut control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        let preset = find_preset("< 1 KB").unwrap();
        let range = control.select_preset(preset);
        control.sync_external(range);
        assert_eq!(control.selected_preset(), Some(preset));

        control.sync_external(Some(SizeRange::between(500, 5_000)));
        assert_eq!(control.selected_preset(), None);
    }

    #[test]
    fn unmount_reports_discarded_commit() {
        let mut control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        control.drag_to(5.0, 50.0, Instant::now());
        assert!(control.unmount());
    }

    #[test]
    fn direct_write_supersedes_released_drag() {
        let start = Instant::now();
        let mut control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        control.drag_to(20.0, 60.0, start);
        control.end_drag();

        assert!(control.supersede());
        assert_eq!(control.mode(), DriveMode::ExternallyDriven);
        assert!(control.sync_external(Some(SizeRange::at_most(KB))));
        assert_eq!(control.poll(ms(start, 1_000)), None);
    }

    #[test]
    fn direct_write_keeps_held_pointer_dragging() {
        let start = Instant::now();
        let mut control = SizeFilterControl::new(None, DEFAULT_DEBOUNCE);
        control.drag_to(20.0, 60.0, start);

        assert!(control.supersede());
        assert!(control.is_dragging());
        assert_eq!(control.mode(), DriveMode::LocallyDriven);
        assert_eq!(control.poll(ms(start, 1_000)), None);
        assert!(!control.supersede());
    }
}
