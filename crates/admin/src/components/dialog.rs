//! Generic modal dialog lifecycle.
//!
//! A [`Dialog`] owns a [`DialogBehavior`] and drives it through the
//! open/closed states. Behaviors receive the state they operate on as an
//! argument instead of holding a reference to it, so the owner of that state
//! can keep both the state and the dialog side by side.

/// Lifecycle state of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    /// Editing a draft.
    Open,
    /// Dismissed; the draft was committed or discarded.
    Closed,
}

/// Behavior plugged into a [`Dialog`].
pub trait DialogBehavior {
    /// State shared with the surrounding screen.
    type State;
    /// A form field change.
    type Field;
    /// Data handed to the template on render.
    type View;

    /// Build template data for the current draft.
    fn prepare(&self, state: &Self::State) -> Self::View;

    /// Apply a field change. Returns `true` if the draft changed.
    fn on_field_change(&mut self, field: Self::Field) -> bool;

    /// Handle form submission.
    fn on_submit(&mut self, state: &mut Self::State);

    /// Whether something observed since the last call requires closing.
    fn close_requested(&mut self) -> bool;

    /// Release subscriptions. Called exactly once, on close.
    fn teardown(&mut self) {}
}

/// A modal dialog driving a [`DialogBehavior`].
#[derive(Debug)]
pub struct Dialog<B> {
    behavior: B,
    state: DialogState,
    renders: usize,
}

impl<B: DialogBehavior> Dialog<B> {
    /// Open a dialog around `behavior`.
    #[must_use]
    pub const fn open(behavior: B) -> Self {
        Self {
            behavior,
            state: DialogState::Open,
            renders: 0,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> DialogState {
        self.state
    }

    /// Whether the dialog is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == DialogState::Open
    }

    /// The plugged-in behavior.
    #[must_use]
    pub const fn behavior(&self) -> &B {
        &self.behavior
    }

    /// How many times the dialog has been rendered.
    #[must_use]
    pub const fn render_count(&self) -> usize {
        self.renders
    }

    /// Prepare template data. Closed dialogs render nothing.
    pub fn render(&mut self, state: &B::State) -> Option<B::View> {
        if !self.is_open() {
            return None;
        }
        self.renders += 1;
        Some(self.behavior.prepare(state))
    }

    /// Apply a field change, re-rendering if the draft changed.
    ///
    /// Returns `None` when the dialog is closed or nothing changed.
    pub fn change(&mut self, field: B::Field, state: &B::State) -> Option<B::View> {
        if !self.is_open() {
            return None;
        }
        if self.behavior.on_field_change(field) {
            self.render(state)
        } else {
            None
        }
    }

    /// Submit the dialog, then react to whatever the submission triggered.
    ///
    /// Returns `false` if the dialog was already closed.
    pub fn submit(&mut self, state: &mut B::State) -> bool {
        if !self.is_open() {
            return false;
        }
        self.behavior.on_submit(state);
        self.sync();
        true
    }

    /// Close the dialog if the behavior has observed a reason to.
    pub fn sync(&mut self) {
        if self.is_open() && self.behavior.close_requested() {
            self.close();
        }
    }

    /// Close the dialog and tear down the behavior. Idempotent.
    pub fn close(&mut self) {
        if self.is_open() {
            self.state = DialogState::Closed;
            self.behavior.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pushes its value into the shared state and always asks to close.
    #[derive(Default)]
    struct Counter {
        value: i32,
        teardowns: usize,
    }

    impl DialogBehavior for Counter {
        type State = Vec<i32>;
        type Field = i32;
        type View = (i32, usize);

        fn prepare(&self, state: &Self::State) -> Self::View {
            (self.value, state.len())
        }

        fn on_field_change(&mut self, field: i32) -> bool {
            let changed = self.value != field;
            self.value = field;
            changed
        }

        fn on_submit(&mut self, state: &mut Self::State) {
            state.push(self.value);
        }

        fn close_requested(&mut self) -> bool {
            true
        }

        fn teardown(&mut self) {
            self.teardowns += 1;
        }
    }

    #[test]
    fn test_change_renders_only_when_draft_changes() {
        let state = Vec::new();
        let mut dialog = Dialog::open(Counter::default());

        assert_eq!(dialog.change(3, &state), Some((3, 0)));
        assert_eq!(dialog.change(3, &state), None);
        assert_eq!(dialog.render_count(), 1);
    }

    #[test]
    fn test_submit_closes_when_behavior_requests_it() {
        let mut state = Vec::new();
        let mut dialog = Dialog::open(Counter::default());
        dialog.change(7, &state);

        assert!(dialog.submit(&mut state));
        assert_eq!(state, vec![7]);
        assert_eq!(dialog.state(), DialogState::Closed);
        assert_eq!(dialog.behavior().teardowns, 1);
    }

    #[test]
    fn test_closed_dialog_ignores_everything() {
        let mut state = Vec::new();
        let mut dialog = Dialog::open(Counter::default());
        dialog.close();
        dialog.close();

        assert_eq!(dialog.behavior().teardowns, 1);
        assert!(dialog.render(&state).is_none());
        assert!(dialog.change(1, &state).is_none());
        assert!(!dialog.submit(&mut state));
        assert!(state.is_empty());
    }
}
