//! Counter state engine for the embedded tally widgets: slot values, the
//! single-slot undo buffer, and the side effects (storage write, host
//! notification, resize request) that follow every mutation.

pub mod catalog;
pub mod clock;
mod counter_set;
pub mod gesture;
mod host_bridge;
pub mod layout;
mod timer;
mod widget;

pub use clock::{Clock, ManualClock, SystemClock};
pub use counter_set::{CounterSet, CounterState, Slot, UndoSnapshot, UNDO_WINDOW_SECONDS};
pub use gesture::GestureTracker;
pub use host_bridge::{ChannelHostBridge, HostBridge, MissingHostBridge};
pub use layout::FrameLayout;
pub use timer::{UndoExpired, UndoTimer};
pub use widget::{CounterWidget, SlotView, WidgetCommand, WidgetOptions, WidgetView};
