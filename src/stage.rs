//! Install stage machine
//!
//! The installation is a strictly linear chain of ten steps. `StageTracker`
//! owns the current stage and refuses skipped or backward transitions, so the
//! orchestrator cannot run, say, mounting before formatting.
//!
//! ```text
//! NotStarted
//!     ↓
//! SelectingDevice        (1)
//!     ↓
//! QueryingSize           (2)
//!     ↓
//! Partitioning           (3)  destructive
//!     ↓
//! Formatting             (4)  destructive
//!     ↓
//! Mounting               (5)
//!     ↓
//! InstallingBase         (6)
//!     ↓
//! GeneratingFstab        (7)
//!     ↓
//! ConfiguringSystem      (8)
//!     ↓
//! InstallingBootloader   (9)
//!     ↓
//! InstallingComponents   (10)
//!     ↓
//! Completed
//!
//! (Any stage can transition to Halted)
//! ```

use std::fmt;
use thiserror::Error;

/// Installation stages in sequential order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InstallStage {
    NotStarted = 0,
    SelectingDevice = 1,
    QueryingSize = 2,
    Partitioning = 3,
    Formatting = 4,
    Mounting = 5,
    InstallingBase = 6,
    GeneratingFstab = 7,
    ConfiguringSystem = 8,
    InstallingBootloader = 9,
    InstallingComponents = 10,
    Completed = 11,
    /// The procedure stopped early (device missing, or halt policy tripped)
    Halted = 255,
}

impl InstallStage {
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Step number as shown to the operator (1-10), None outside the chain
    pub const fn step_number(self) -> Option<u8> {
        match self {
            Self::NotStarted | Self::Completed | Self::Halted => None,
            other => Some(other as u8),
        }
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Halted)
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::SelectingDevice),
            Self::SelectingDevice => Some(Self::QueryingSize),
            Self::QueryingSize => Some(Self::Partitioning),
            Self::Partitioning => Some(Self::Formatting),
            Self::Formatting => Some(Self::Mounting),
            Self::Mounting => Some(Self::InstallingBase),
            Self::InstallingBase => Some(Self::GeneratingFstab),
            Self::GeneratingFstab => Some(Self::ConfiguringSystem),
            Self::ConfiguringSystem => Some(Self::InstallingBootloader),
            Self::InstallingBootloader => Some(Self::InstallingComponents),
            Self::InstallingComponents => Some(Self::Completed),
            Self::Completed | Self::Halted => None,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::SelectingDevice => "Selecting device",
            Self::QueryingSize => "Querying device size",
            Self::Partitioning => "Partitioning disk",
            Self::Formatting => "Formatting partitions",
            Self::Mounting => "Mounting partitions",
            Self::InstallingBase => "Installing base system",
            Self::GeneratingFstab => "Generating fstab",
            Self::ConfiguringSystem => "Configuring system",
            Self::InstallingBootloader => "Installing bootloader",
            Self::InstallingComponents => "Installing components",
            Self::Completed => "Installation complete",
            Self::Halted => "Installation halted",
        }
    }

    /// All stages of the chain in order (excluding Halted)
    pub const fn all_stages() -> &'static [Self] {
        &[
            Self::NotStarted,
            Self::SelectingDevice,
            Self::QueryingSize,
            Self::Partitioning,
            Self::Formatting,
            Self::Mounting,
            Self::InstallingBase,
            Self::GeneratingFstab,
            Self::ConfiguringSystem,
            Self::InstallingBootloader,
            Self::InstallingComponents,
            Self::Completed,
        ]
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during stage transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("Cannot skip from {from} to {to}")]
    SkippedStage { from: InstallStage, to: InstallStage },

    #[error("Cannot go backwards from {from} to {to}")]
    BackwardTransition { from: InstallStage, to: InstallStage },

    #[error("Cannot transition from terminal state {from}")]
    FromTerminalState { from: InstallStage },

    #[error("Already at stage {stage}")]
    AlreadyAtStage { stage: InstallStage },
}

/// Owns the current stage of one installation run.
///
/// ```
/// use hyprstrap::stage::{InstallStage, StageTracker};
///
/// let mut tracker = StageTracker::new();
/// tracker.advance().unwrap();
/// assert_eq!(tracker.current(), InstallStage::SelectingDevice);
/// assert!(tracker.transition_to(InstallStage::Mounting).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: InstallStage,
    halted_at: Option<InstallStage>,
    history: Vec<InstallStage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: InstallStage::NotStarted,
            halted_at: None,
            history: Vec::with_capacity(InstallStage::all_stages().len()),
        }
    }

    #[inline]
    pub fn current(&self) -> InstallStage {
        self.current
    }

    /// The stage the run stopped in, if it halted
    #[inline]
    pub fn halted_at(&self) -> Option<InstallStage> {
        self.halted_at
    }

    /// Stages entered so far, in order
    pub fn history(&self) -> &[InstallStage] {
        &self.history
    }

    /// Advance to the next stage in sequence.
    pub fn advance(&mut self) -> Result<InstallStage, StageTransitionError> {
        let from = self.current();
        let next = from
            .next()
            .ok_or(StageTransitionError::FromTerminalState { from })?;
        self.enter(next);
        Ok(next)
    }

    /// Transition to `target`, which must be the immediate next stage.
    pub fn transition_to(
        &mut self,
        target: InstallStage,
    ) -> Result<InstallStage, StageTransitionError> {
        let from = self.current();
        if from.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from });
        }
        if target == from {
            return Err(StageTransitionError::AlreadyAtStage { stage: target });
        }
        if target != InstallStage::Halted && target.order() < from.order() {
            return Err(StageTransitionError::BackwardTransition { from, to: target });
        }
        if from.next() != Some(target) {
            return Err(StageTransitionError::SkippedStage { from, to: target });
        }
        self.enter(target);
        Ok(target)
    }

    /// Stop the chain in the current stage.
    pub fn halt(&mut self) -> Result<(), StageTransitionError> {
        let from = self.current();
        if from.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from });
        }
        self.halted_at = Some(from);
        self.enter(InstallStage::Halted);
        Ok(())
    }

    fn enter(&mut self, stage: InstallStage) {
        tracing::debug!(stage = %stage, "entering stage");
        self.history.push(stage);
        self.current = stage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_sequential() {
        let stages = InstallStage::all_stages();
        for pair in stages.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert_eq!(pair[0].order() + 1, pair[1].order());
        }
    }

    #[test]
    fn test_step_numbers_cover_one_to_ten() {
        let numbers: Vec<u8> = InstallStage::all_stages()
            .iter()
            .filter_map(|s| s.step_number())
            .collect();
        assert_eq!(numbers, (1..=10).collect::<Vec<u8>>());
        assert_eq!(InstallStage::Halted.step_number(), None);
    }

    #[test]
    fn test_advance_walks_full_chain() {
        let mut tracker = StageTracker::new();
        while !tracker.current().is_terminal() {
            tracker.advance().expect("non-terminal stage advances");
        }
        assert_eq!(tracker.current(), InstallStage::Completed);
        assert_eq!(tracker.history().len(), 11);
        assert!(matches!(
            tracker.advance(),
            Err(StageTransitionError::FromTerminalState { .. })
        ));
    }

    #[test]
    fn test_cannot_skip_stage() {
        let mut tracker = StageTracker::new();
        tracker.advance().unwrap();
        let err = tracker.transition_to(InstallStage::Partitioning).unwrap_err();
        assert_eq!(
            err,
            StageTransitionError::SkippedStage {
                from: InstallStage::SelectingDevice,
                to: InstallStage::Partitioning,
            }
        );
    }

    #[test]
    fn test_cannot_go_backwards() {
        let mut tracker = StageTracker::new();
        tracker.advance().unwrap();
        tracker.advance().unwrap();
        let err = tracker
            .transition_to(InstallStage::SelectingDevice)
            .unwrap_err();
        assert!(matches!(err, StageTransitionError::BackwardTransition { .. }));
    }

    #[test]
    fn test_halt_records_stage() {
        let mut tracker = StageTracker::new();
        tracker.advance().unwrap();
        tracker.halt().unwrap();
        assert_eq!(tracker.current(), InstallStage::Halted);
        assert_eq!(tracker.halted_at(), Some(InstallStage::SelectingDevice));
        assert!(tracker.halt().is_err());
    }
}
