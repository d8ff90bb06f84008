/// Keyboard shortcuts for the workflow editor
///
/// Resolution is pure: given a key event and a snapshot of editor state it yields
/// the action to run, or nothing. The guards here keep Delete/Backspace and `?`
/// from firing while the user is typing in a text field.

/// Key identity, independent of the windowing toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Char(char),
}

/// Where keyboard focus sits when the key is pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Canvas,
    /// Any editable text: inputs, text areas, content-editable regions
    TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    /// Cmd on macOS
    pub meta: bool,
    pub shift: bool,
    pub focus: FocusTarget,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            focus: FocusTarget::Canvas,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.focus = FocusTarget::TextInput;
        self
    }

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Editor facts the guards depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutContext {
    pub has_selection: bool,
    pub dirty: bool,
    pub saving: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    DeleteSelected,
    Save,
    ClearSelection,
    ToggleHelp,
}

/// Map a key event to an action, applying the mandatory guards
pub fn resolve(event: &KeyEvent, context: &ShortcutContext) -> Option<ShortcutAction> {
    let typing = event.focus == FocusTarget::TextInput;

    match event.key {
        Key::Delete | Key::Backspace if !typing && context.has_selection => {
            Some(ShortcutAction::DeleteSelected)
        }
        Key::Char('s') | Key::Char('S') if event.command() => {
            (context.dirty && !context.saving).then_some(ShortcutAction::Save)
        }
        Key::Escape => Some(ShortcutAction::ClearSelection),
        Key::Char('?') if !typing && !event.command() => Some(ShortcutAction::ToggleHelp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELECTED: ShortcutContext = ShortcutContext {
        has_selection: true,
        dirty: true,
        saving: false,
    };

    #[test]
    fn delete_requires_selection_and_canvas_focus() {
        let delete = KeyEvent::new(Key::Delete);
        assert_eq!(resolve(&delete, &SELECTED), Some(ShortcutAction::DeleteSelected));
        assert_eq!(
            resolve(&KeyEvent::new(Key::Backspace), &SELECTED),
            Some(ShortcutAction::DeleteSelected)
        );

        assert_eq!(resolve(&delete.in_text_input(), &SELECTED), None);
        assert_eq!(
            resolve(&KeyEvent::new(Key::Backspace), &ShortcutContext::default()),
            None
        );
    }

    #[test]
    fn save_requires_dirty_and_idle() {
        let save = KeyEvent::new(Key::Char('s')).with_ctrl();
        assert_eq!(resolve(&save, &SELECTED), Some(ShortcutAction::Save));
        assert_eq!(
            resolve(&KeyEvent::new(Key::Char('s')).with_meta(), &SELECTED),
            Some(ShortcutAction::Save)
        );

        let clean = ShortcutContext { dirty: false, ..SELECTED };
        assert_eq!(resolve(&save, &clean), None);

        let saving = ShortcutContext { saving: true, ..SELECTED };
        assert_eq!(resolve(&save, &saving), None);

        assert_eq!(resolve(&KeyEvent::new(Key::Char('s')), &SELECTED), None);
    }

    #[test]
    fn escape_and_help() {
        assert_eq!(
            resolve(&KeyEvent::new(Key::Escape), &SELECTED),
            Some(ShortcutAction::ClearSelection)
        );
        assert_eq!(
            resolve(&KeyEvent::new(Key::Char('?')), &ShortcutContext::default()),
            Some(ShortcutAction::ToggleHelp)
        );
        assert_eq!(
            resolve(&KeyEvent::new(Key::Char('?')).in_text_input(), &SELECTED),
            None
        );
    }
}
