//! The event vocabulary consumed by the widget tree.

use geom::Direction;

/// Keyboard modifier state attached to key events.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Mods {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Mods {
    /// Shift held, nothing else.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };

    /// Control held, nothing else.
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };
}

/// Key codes for the keys the core routes on. Printable input arrives as
/// `Char`.
#[derive(Debug, PartialOrd, PartialEq, Eq, Clone, Copy)]
pub enum Key {
    Backspace,
    Enter,
    Esc,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Char(char),
    F(u8),
}

/// A key together with its modifier state.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct KeyPress {
    pub key: Key,
    pub mods: Mods,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            mods: Mods::default(),
        }
    }

    pub fn with_mods(key: Key, mods: Mods) -> Self {
        Self { key, mods }
    }
}

impl From<char> for KeyPress {
    fn from(c: char) -> Self {
        Self::new(Key::Char(c))
    }
}

impl From<Key> for KeyPress {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}

/// Events delivered to the widget tree. Pointer events carry no coordinates
/// of their own; positions are resolved against the ambient pointer state in
/// [`crate::Ui`], which dispatch translates into each target's local space.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Event {
    /// An attempt to move keyboard focus to the target. Carries the
    /// navigation direction that produced it, if any.
    Focus(Option<Direction>),
    /// The target lost keyboard focus.
    Unfocus,
    /// The pointer entered the target's bounds.
    Enter,
    /// The pointer left the target's bounds.
    Leave,
    /// The pointer moved within the target.
    Move,
    /// A button was pressed over the target.
    Push,
    /// The pointer moved with a button held.
    Drag,
    /// The held button was released.
    Release,
    /// A data drag entered the target's bounds.
    DndEnter,
    /// A data drag moved within the target.
    DndDrag,
    /// A data drag left the target.
    DndLeave,
    /// A data drag was dropped on the target.
    DndRelease,
    /// A keystroke delivered to the focus widget.
    Key(KeyPress),
    /// A keystroke no focused widget consumed, offered for shortcuts and
    /// keyboard navigation.
    Shortcut(KeyPress),
    /// The target became visible.
    Show,
    /// The target was hidden.
    Hide,
}

/// Map a shortcut key to a focus-navigation direction. Tab advances (Shift
/// reverses it) unless Ctrl is held; the arrow keys map directly.
pub fn navigation_key(k: KeyPress) -> Option<Direction> {
    match k.key {
        Key::Tab if !k.mods.ctrl => {
            if k.mods.shift {
                Some(Direction::Left)
            } else {
                Some(Direction::Right)
            }
        }
        Key::Left => Some(Direction::Left),
        Key::Right => Some(Direction::Right),
        Key::Up => Some(Direction::Up),
        Key::Down => Some(Direction::Down),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_navigation() {
        assert_eq!(
            navigation_key(KeyPress::new(Key::Tab)),
            Some(Direction::Right)
        );
        assert_eq!(
            navigation_key(KeyPress::with_mods(Key::Tab, Mods::SHIFT)),
            Some(Direction::Left)
        );
        // Ctrl-Tab is left for widgets that want the real key.
        assert_eq!(navigation_key(KeyPress::with_mods(Key::Tab, Mods::CTRL)), None);
    }

    #[test]
    fn arrows_and_others() {
        assert_eq!(navigation_key(KeyPress::new(Key::Up)), Some(Direction::Up));
        assert_eq!(
            navigation_key(KeyPress::new(Key::Down)),
            Some(Direction::Down)
        );
        assert_eq!(navigation_key('x'.into()), None);
        assert_eq!(navigation_key(KeyPress::new(Key::Enter)), None);
    }
}
