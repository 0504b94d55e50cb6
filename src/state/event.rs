//! Event Module - Native and synthetic event types
//!
//! Native events are what the host hands to the dispatcher: an event type, a
//! category-specific payload and an optional timestamp. The dispatcher wraps
//! them in a [`SyntheticEvent`] that exposes the same field set for every
//! category (target, current target, phase, timestamp, propagation and
//! default-prevention state).
//!
//! # Example
//!
//! ```ignore
//! use spark_vtree::state::{NativeEvent, EventType, MouseDetail};
//!
//! let click = NativeEvent::new(EventType::Click)
//!     .with_mouse(MouseDetail { client_x: 4.0, client_y: 2.0, ..Default::default() });
//! runtime.dispatch(click, node)?;
//! ```

use std::fmt;

use crate::types::{InstanceId, NodeId};

// =============================================================================
// EVENT TYPES
// =============================================================================

/// Category of an event, which decides the shape of its detail payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Clipboard,
    Keyboard,
    Focus,
    Form,
    Mouse,
    Ui,
    Wheel,
}

/// Every event type a listener can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    // Clipboard
    Copy,
    Cut,
    Paste,
    // Keyboard
    KeyDown,
    KeyPress,
    KeyUp,
    // Focus
    Focus,
    Blur,
    // Form
    Change,
    Input,
    Submit,
    // Mouse
    Click,
    ContextMenu,
    DoubleClick,
    Drag,
    DragEnd,
    DragEnter,
    DragExit,
    DragLeave,
    DragOver,
    DragStart,
    Drop,
    MouseDown,
    MouseEnter,
    MouseLeave,
    MouseMove,
    MouseUp,
    // UI
    Scroll,
    // Wheel
    Wheel,
}

impl EventType {
    /// All event types, in declaration order.
    pub const ALL: [EventType; 29] = [
        EventType::Copy,
        EventType::Cut,
        EventType::Paste,
        EventType::KeyDown,
        EventType::KeyPress,
        EventType::KeyUp,
        EventType::Focus,
        EventType::Blur,
        EventType::Change,
        EventType::Input,
        EventType::Submit,
        EventType::Click,
        EventType::ContextMenu,
        EventType::DoubleClick,
        EventType::Drag,
        EventType::DragEnd,
        EventType::DragEnter,
        EventType::DragExit,
        EventType::DragLeave,
        EventType::DragOver,
        EventType::DragStart,
        EventType::Drop,
        EventType::MouseDown,
        EventType::MouseEnter,
        EventType::MouseLeave,
        EventType::MouseMove,
        EventType::MouseUp,
        EventType::Scroll,
        EventType::Wheel,
    ];

    /// Lowercase event name (`"click"`, `"keydown"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            EventType::Copy => "copy",
            EventType::Cut => "cut",
            EventType::Paste => "paste",
            EventType::KeyDown => "keydown",
            EventType::KeyPress => "keypress",
            EventType::KeyUp => "keyup",
            EventType::Focus => "focus",
            EventType::Blur => "blur",
            EventType::Change => "change",
            EventType::Input => "input",
            EventType::Submit => "submit",
            EventType::Click => "click",
            EventType::ContextMenu => "contextmenu",
            EventType::DoubleClick => "dblclick",
            EventType::Drag => "drag",
            EventType::DragEnd => "dragend",
            EventType::DragEnter => "dragenter",
            EventType::DragExit => "dragexit",
            EventType::DragLeave => "dragleave",
            EventType::DragOver => "dragover",
            EventType::DragStart => "dragstart",
            EventType::Drop => "drop",
            EventType::MouseDown => "mousedown",
            EventType::MouseEnter => "mouseenter",
            EventType::MouseLeave => "mouseleave",
            EventType::MouseMove => "mousemove",
            EventType::MouseUp => "mouseup",
            EventType::Scroll => "scroll",
            EventType::Wheel => "wheel",
        }
    }

    /// Look up an event type by its lowercase name.
    pub fn from_name(name: &str) -> Option<EventType> {
        Self::ALL.iter().copied().find(|ty| ty.name() == name)
    }

    /// Category of this event type.
    pub fn category(self) -> EventCategory {
        match self {
            EventType::Copy | EventType::Cut | EventType::Paste => EventCategory::Clipboard,
            EventType::KeyDown | EventType::KeyPress | EventType::KeyUp => EventCategory::Keyboard,
            EventType::Focus | EventType::Blur => EventCategory::Focus,
            EventType::Change | EventType::Input | EventType::Submit => EventCategory::Form,
            EventType::Scroll => EventCategory::Ui,
            EventType::Wheel => EventCategory::Wheel,
            _ => EventCategory::Mouse,
        }
    }

    /// Whether the event walks up through ancestors after the target.
    pub fn bubbles(self) -> bool {
        !matches!(self, EventType::MouseEnter | EventType::MouseLeave)
    }

    /// Whether `prevent_default` has any effect for this event type.
    pub fn cancelable(self) -> bool {
        !matches!(
            self,
            EventType::Focus
                | EventType::Blur
                | EventType::MouseEnter
                | EventType::MouseLeave
                | EventType::Scroll
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// FLAGS
// =============================================================================

bitflags::bitflags! {
    /// Modifier keys held while the event fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const ALT = 1 << 0;
        const CTRL = 1 << 1;
        const META = 1 << 2;
        const SHIFT = 1 << 3;
    }
}

impl Modifiers {
    /// Query a modifier by its key name (`"Alt"`, `"Control"`, `"Meta"`, `"Shift"`).
    pub fn get_modifier_state(self, key: &str) -> bool {
        match key {
            "Alt" => self.contains(Modifiers::ALT),
            "Control" => self.contains(Modifiers::CTRL),
            "Meta" => self.contains(Modifiers::META),
            "Shift" => self.contains(Modifiers::SHIFT),
            _ => false,
        }
    }
}

bitflags::bitflags! {
    /// Per-event state shared by every category.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u8 {
        const BUBBLES = 1 << 0;
        const CANCELABLE = 1 << 1;
        const TRUSTED = 1 << 2;
        const DEFAULT_PREVENTED = 1 << 3;
        const PROPAGATION_STOPPED = 1 << 4;
    }
}

/// Where the event currently is on its way through the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    #[default]
    None = 0,
    Capturing = 1,
    AtTarget = 2,
    Bubbling = 3,
}

// =============================================================================
// DETAIL PAYLOADS
// =============================================================================

/// Keyboard payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyboardDetail {
    /// Key name (e.g. `"a"`, `"Enter"`, `"ArrowUp"`).
    pub key: String,
    pub key_code: u32,
    pub char_code: u32,
    pub location: u32,
    pub locale: Option<String>,
    pub repeat: bool,
    pub modifiers: Modifiers,
}

impl KeyboardDetail {
    /// Simple key press with no modifiers.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Legacy `which` value: the key code, or the char code for printable keys.
    pub fn which(&self) -> u32 {
        if self.key_code != 0 { self.key_code } else { self.char_code }
    }
}

/// Mouse payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MouseDetail {
    pub button: i16,
    pub buttons: u16,
    pub client_x: f64,
    pub client_y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub screen_x: f64,
    pub screen_y: f64,
    pub modifiers: Modifiers,
    pub related_target: Option<NodeId>,
}

/// Wheel payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WheelDetail {
    pub delta_mode: u32,
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_z: f64,
}

/// Category-specific payload of an event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventDetail {
    #[default]
    None,
    Clipboard {
        data: Option<String>,
    },
    Keyboard(KeyboardDetail),
    Focus {
        related_target: Option<NodeId>,
    },
    Form {
        value: Option<String>,
    },
    Mouse(MouseDetail),
    Ui {
        detail: i32,
    },
    Wheel(WheelDetail),
}

// =============================================================================
// NATIVE EVENT
// =============================================================================

/// An event as delivered by the host, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent {
    pub event_type: EventType,
    pub detail: EventDetail,
    /// Host timestamp in milliseconds. When absent the runtime clock is used.
    pub timestamp: Option<u64>,
    pub is_trusted: bool,
}

impl NativeEvent {
    /// Create a trusted native event with no payload.
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            detail: EventDetail::None,
            timestamp: None,
            is_trusted: true,
        }
    }

    /// Plain left click.
    pub fn click() -> Self {
        Self::new(EventType::Click).with_mouse(MouseDetail::default())
    }

    /// Key down for the given key.
    pub fn key_down(key: impl Into<String>) -> Self {
        Self::new(EventType::KeyDown).with_detail(EventDetail::Keyboard(KeyboardDetail::new(key)))
    }

    /// Form change carrying the new value.
    pub fn change(value: impl Into<String>) -> Self {
        Self::new(EventType::Change).with_detail(EventDetail::Form {
            value: Some(value.into()),
        })
    }

    /// Attach a payload.
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Attach a mouse payload.
    pub fn with_mouse(self, detail: MouseDetail) -> Self {
        self.with_detail(EventDetail::Mouse(detail))
    }

    /// Attach a host timestamp.
    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Mark the event as synthesized by script rather than user input.
    pub fn untrusted(mut self) -> Self {
        self.is_trusted = false;
        self
    }
}

// =============================================================================
// SYNTHETIC EVENT
// =============================================================================

/// Normalized event handed to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticEvent {
    pub event_type: EventType,
    /// Node the native event was fired on.
    pub target: NodeId,
    /// Node whose listener is currently running.
    pub current_target: NodeId,
    /// Component instance that rendered the current listener, if any.
    pub owner: Option<InstanceId>,
    /// Milliseconds, host-provided or runtime-relative.
    pub timestamp: u64,
    pub phase: EventPhase,
    pub detail: EventDetail,
    flags: EventFlags,
}

impl SyntheticEvent {
    pub(crate) fn from_native(native: NativeEvent, target: NodeId, timestamp: u64) -> Self {
        let mut flags = EventFlags::empty();
        flags.set(EventFlags::BUBBLES, native.event_type.bubbles());
        flags.set(EventFlags::CANCELABLE, native.event_type.cancelable());
        flags.set(EventFlags::TRUSTED, native.is_trusted);
        Self {
            event_type: native.event_type,
            target,
            current_target: target,
            owner: None,
            timestamp: native.timestamp.unwrap_or(timestamp),
            phase: EventPhase::None,
            detail: native.detail,
            flags,
        }
    }

    /// Stop the event from reaching further ancestors.
    pub fn stop_propagation(&mut self) {
        self.flags.insert(EventFlags::PROPAGATION_STOPPED);
    }

    /// Mark the default action as prevented. No effect on non-cancelable events.
    pub fn prevent_default(&mut self) {
        if self.cancelable() {
            self.flags.insert(EventFlags::DEFAULT_PREVENTED);
        }
    }

    pub fn propagation_stopped(&self) -> bool {
        self.flags.contains(EventFlags::PROPAGATION_STOPPED)
    }

    pub fn default_prevented(&self) -> bool {
        self.flags.contains(EventFlags::DEFAULT_PREVENTED)
    }

    pub fn bubbles(&self) -> bool {
        self.flags.contains(EventFlags::BUBBLES)
    }

    pub fn cancelable(&self) -> bool {
        self.flags.contains(EventFlags::CANCELABLE)
    }

    pub fn is_trusted(&self) -> bool {
        self.flags.contains(EventFlags::TRUSTED)
    }

    /// Raw flag set.
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Category of this event.
    pub fn category(&self) -> EventCategory {
        self.event_type.category()
    }

    /// Mouse payload, if any.
    pub fn mouse(&self) -> Option<&MouseDetail> {
        match &self.detail {
            EventDetail::Mouse(detail) => Some(detail),
            _ => None,
        }
    }

    /// Keyboard payload, if any.
    pub fn keyboard(&self) -> Option<&KeyboardDetail> {
        match &self.detail {
            EventDetail::Keyboard(detail) => Some(detail),
            _ => None,
        }
    }

    /// Form value, if any.
    pub fn value(&self) -> Option<&str> {
        match &self.detail {
            EventDetail::Form { value } => value.as_deref(),
            _ => None,
        }
    }

    /// Modifier state for keyboard and mouse events (empty otherwise).
    pub fn modifiers(&self) -> Modifiers {
        match &self.detail {
            EventDetail::Keyboard(detail) => detail.modifiers,
            EventDetail::Mouse(detail) => detail.modifiers,
            _ => Modifiers::empty(),
        }
    }
}
