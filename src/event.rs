use std::collections::VecDeque;
use std::sync::mpsc::Receiver;

/// The two joystick axes the launcher listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    UpDown,
    LeftRight,
}

/// Identifies a pending timer. Arming a key that is already pending replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    Snapshot,
    JoystickRepeat(Axis),
}

/// Raw event as delivered by the host, or a timer expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Quit,
    KeyDown { key: i32, modifiers: u16 },
    KeyUp { key: i32 },
    JoyAxis { axis: u8, value: i16 },
    /// Zero-based button index as reported by the device.
    JoyButtonUp { button: u8 },
    Timer(TimerKey),
}

/// Blocking source of events for the control loop. `None` ends the loop.
pub trait EventSource {
    fn next_event(&mut self) -> Option<Event>;
}

impl EventSource for Receiver<Event> {
    fn next_event(&mut self) -> Option<Event> {
        self.recv().ok()
    }
}

impl EventSource for VecDeque<Event> {
    fn next_event(&mut self) -> Option<Event> {
        self.pop_front()
    }
}
