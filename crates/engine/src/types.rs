use serde::Serialize;

/// A coarse-grid index with its resolved label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePoint<L> {
    pub index: usize,
    pub label: L,
}

/// Interval between two adjacent sample points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window<L> {
    pub start: usize,
    pub end: usize,
    pub start_label: L,
    pub end_label: L,
}

impl<L: Clone + PartialEq> Window<L> {
    pub fn between(start: &SamplePoint<L>, end: &SamplePoint<L>) -> Self {
        Self {
            start: start.index,
            end: end.index,
            start_label: start.label.clone(),
            end_label: end.label.clone(),
        }
    }

    /// Windows whose endpoints agree are assumed to hold no boundary.
    pub fn needs_search(&self) -> bool {
        self.start_label != self.end_label
    }
}

/// First index carrying a new label inside a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary<L> {
    pub index: usize,
    pub label: L,
}

/// One emitted result: a label and the item where it was first seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment<I, L> {
    pub index: usize,
    pub label: L,
    pub item: I,
}

/// Lifecycle of a single discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Sampling,
    Bisecting,
    Draining,
    Done,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_between_agreeing_samples_needs_no_search() {
        let a = SamplePoint {
            index: 0,
            label: "red",
        };
        let b = SamplePoint {
            index: 10,
            label: "red",
        };
        let c = SamplePoint {
            index: 20,
            label: "blue",
        };
        assert!(!Window::between(&a, &b).needs_search());
        let window = Window::between(&b, &c);
        assert!(window.needs_search());
        assert_eq!((window.start, window.end), (10, 20));
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Done.is_terminal());
        assert!(RunState::Cancelled.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Draining.is_terminal());
        assert!(!RunState::Idle.is_terminal());
    }
}
