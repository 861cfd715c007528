//! Input decoding.
//!
//! Turns raw key, joystick and timer events into logical [`Command`]s. Joystick
//! axes go through a glitch correction and a two threshold hysteresis, and an
//! engaged axis keeps a repeat timer running in the control loop's timer set.

use std::time::Duration;

use crate::config::{AxisBinding, KeyBindings, Settings};
use crate::event::{Axis, Event, TimerKey};
use crate::timer::TimerRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    AlphaUp,
    AlphaDown,
    CycleViewUp,
    CycleViewDown,
    Activate,
    Back,
    ToggleFavorite,
    ToggleHidden,
    RefreshSnapshot,
    Quit,
}

/// Result of decoding one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoded {
    pub command: Option<Command>,
    pub timer: Option<TimerRequest>,
}

impl Decoded {
    fn command(command: Command) -> Self {
        Decoded {
            command: Some(command),
            timer: None,
        }
    }
}

const AXIS_MAX: i32 = 32767;
const AXIS_NEG_MAX: i32 = 32768;
const SNAP_HIGH: i32 = 16383;
const SNAP_LOW: i32 = -16384;
const ENGAGE: i32 = 16383;
const RELEASE: i32 = 8191;

/// Snaps a raw axis reading to full deflection or zero, applying the axis
/// polarity. Some arcade encoders report a stray -2..+1 at rest.
pub fn correct_axis(value: i16, reverse: i32) -> i32 {
    let value = i32::from(value);
    if value > SNAP_HIGH {
        reverse * AXIS_MAX
    } else if value < SNAP_LOW {
        -reverse * AXIS_NEG_MAX
    } else {
        0
    }
}

/// Per-axis hysteresis state and repeat timing.
#[derive(Debug, Clone, Copy)]
struct AxisTracker {
    axis: Axis,
    binding: AxisBinding,
    /// +1, -1 or 0 for neutral
    direction: i32,
    positive: Command,
    negative: Command,
    delay: Duration,
    period: Duration,
}

impl AxisTracker {
    fn key(&self) -> TimerKey {
        TimerKey::JoystickRepeat(self.axis)
    }

    fn command_for(&self, direction: i32) -> Option<Command> {
        match direction {
            1 => Some(self.positive),
            -1 => Some(self.negative),
            _ => None,
        }
    }

    fn engage(&mut self, direction: i32) -> Decoded {
        self.direction = direction;
        Decoded {
            command: self.command_for(direction),
            timer: Some(TimerRequest::Arm {
                key: self.key(),
                after: self.delay,
            }),
        }
    }

    fn motion(&mut self, value: i16) -> Decoded {
        let corrected = correct_axis(value, self.binding.reverse);
        if corrected > ENGAGE && self.direction != 1 {
            self.engage(1)
        } else if corrected < -ENGAGE && self.direction != -1 {
            self.engage(-1)
        } else if corrected > -RELEASE && corrected < RELEASE {
            self.direction = 0;
            Decoded {
                command: None,
                timer: Some(TimerRequest::Cancel(self.key())),
            }
        } else {
            Decoded::default()
        }
    }

    fn repeat(&self) -> Decoded {
        match self.command_for(self.direction) {
            Some(command) => Decoded {
                command: Some(command),
                timer: Some(TimerRequest::Arm {
                    key: self.key(),
                    after: self.period,
                }),
            },
            // released after the timer had already fired
            None => Decoded::default(),
        }
    }
}

pub struct InputDecoder {
    keys: KeyBindings,
    button_select: u8,
    button_back: u8,
    up_down: Option<AxisTracker>,
    left_right: Option<AxisTracker>,
}

impl InputDecoder {
    pub fn new(settings: &Settings) -> Self {
        let delays = &settings.delays;
        let tracker = |axis, binding: Option<AxisBinding>, positive, negative| {
            binding.map(|binding| AxisTracker {
                axis,
                binding,
                direction: 0,
                positive,
                negative,
                delay: delays.repeat_delay,
                period: delays.repeat_period,
            })
        };
        InputDecoder {
            keys: settings.keys.clone(),
            button_select: settings.joystick.select,
            button_back: settings.joystick.back,
            up_down: tracker(
                Axis::UpDown,
                settings.joystick.up_down,
                Command::MoveUp,
                Command::MoveDown,
            ),
            left_right: tracker(
                Axis::LeftRight,
                settings.joystick.left_right,
                Command::CycleViewUp,
                Command::CycleViewDown,
            ),
        }
    }

    /// Current hysteresis state of `axis`: +1, -1 or 0.
    pub fn direction(&self, axis: Axis) -> i32 {
        self.tracker(axis).map(|t| t.direction).unwrap_or(0)
    }

    fn tracker(&self, axis: Axis) -> Option<&AxisTracker> {
        match axis {
            Axis::UpDown => self.up_down.as_ref(),
            Axis::LeftRight => self.left_right.as_ref(),
        }
    }

    fn tracker_for_index(&mut self, index: u8) -> Option<&mut AxisTracker> {
        if let Some(t) = self.up_down.as_mut().filter(|t| t.binding.index == index) {
            return Some(t);
        }
        self.left_right.as_mut().filter(|t| t.binding.index == index)
    }

    pub fn decode(&mut self, event: Event) -> Decoded {
        match event {
            Event::Quit => Decoded::command(Command::Quit),
            Event::KeyUp { key } => self.key_up(key),
            Event::KeyDown { key, modifiers } => self.key_down(key, modifiers),
            Event::JoyAxis { axis, value } => match self.tracker_for_index(axis) {
                Some(tracker) => tracker.motion(value),
                None => Decoded::default(),
            },
            Event::JoyButtonUp { button } => {
                let number = u16::from(button) + 1;
                if number == u16::from(self.button_select) {
                    Decoded::command(Command::Activate)
                } else if number == u16::from(self.button_back) {
                    Decoded::command(Command::Back)
                } else {
                    Decoded::default()
                }
            }
            Event::Timer(TimerKey::Snapshot) => Decoded::command(Command::RefreshSnapshot),
            Event::Timer(TimerKey::JoystickRepeat(axis)) => match self.tracker(axis) {
                Some(tracker) => tracker.repeat(),
                None => Decoded::default(),
            },
        }
    }

    fn key_up(&self, key: i32) -> Decoded {
        let k = &self.keys;
        let command = if key == k.exit {
            Command::Quit
        } else if key == k.select {
            Command::Activate
        } else if key == k.back {
            Command::Back
        } else if key == k.favorite {
            Command::ToggleFavorite
        } else if key == k.toggle_hidden {
            Command::ToggleHidden
        } else {
            return Decoded::default();
        };
        Decoded::command(command)
    }

    fn key_down(&self, key: i32, modifiers: u16) -> Decoded {
        let k = &self.keys;
        let alpha = modifiers & k.alpha_modifier != 0;
        let view = modifiers & k.view_modifier != 0;
        let command = if key == k.up {
            Command::MoveUp
        } else if key == k.down {
            Command::MoveDown
        } else if key == k.page_up {
            if alpha {
                Command::AlphaUp
            } else if view {
                Command::CycleViewDown
            } else {
                Command::PageUp
            }
        } else if key == k.page_down {
            if alpha {
                Command::AlphaDown
            } else if view {
                Command::CycleViewUp
            } else {
                Command::PageDown
            }
        } else {
            return Decoded::default();
        };
        Decoded::command(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisBinding;

    fn decoder() -> (InputDecoder, Settings) {
        let mut settings = Settings::defaults();
        settings.joystick.up_down = Some(AxisBinding { index: 1, reverse: 1 });
        settings.joystick.left_right = Some(AxisBinding { index: 0, reverse: 1 });
        (InputDecoder::new(&settings), settings)
    }

    fn axis(axis: u8, value: i16) -> Event {
        Event::JoyAxis { axis, value }
    }

    #[test]
    fn correction_snaps_to_extremes() {
        assert_eq!(correct_axis(20000, 1), 32767);
        assert_eq!(correct_axis(20000, -1), -32767);
        assert_eq!(correct_axis(-20000, 1), -32768);
        assert_eq!(correct_axis(-20000, -1), 32768);
        assert_eq!(correct_axis(16383, 1), 0);
        assert_eq!(correct_axis(-16384, 1), 0);
        assert_eq!(correct_axis(-2, 1), 0);
        assert_eq!(correct_axis(1, -1), 0);
    }

    #[test]
    fn engage_fires_once_and_arms_delay() {
        let (mut d, s) = decoder();
        let out = d.decode(axis(1, 20000));
        assert_eq!(out.command, Some(Command::MoveUp));
        assert_eq!(
            out.timer,
            Some(TimerRequest::Arm {
                key: TimerKey::JoystickRepeat(Axis::UpDown),
                after: s.delays.repeat_delay,
            })
        );
        assert_eq!(d.direction(Axis::UpDown), 1);

        // holding the stick produces nothing further
        assert_eq!(d.decode(axis(1, 25000)), Decoded::default());
        assert_eq!(d.decode(axis(1, 32767)), Decoded::default());

        let out = d.decode(axis(1, 0));
        assert_eq!(out.command, None);
        assert_eq!(
            out.timer,
            Some(TimerRequest::Cancel(TimerKey::JoystickRepeat(Axis::UpDown)))
        );
        assert_eq!(d.direction(Axis::UpDown), 0);
    }

    #[test]
    fn glitch_values_do_not_engage() {
        let (mut d, _) = decoder();
        for v in [-2i16, -1, 0, 1, 9000, -9000, 16383] {
            let out = d.decode(axis(1, v));
            assert_eq!(out.command, None);
        }
        assert_eq!(d.direction(Axis::UpDown), 0);
    }

    #[test]
    fn reversing_direction_fires_again() {
        let (mut d, _) = decoder();
        assert_eq!(d.decode(axis(1, 30000)).command, Some(Command::MoveUp));
        assert_eq!(d.decode(axis(1, -30000)).command, Some(Command::MoveDown));
        assert_eq!(d.direction(Axis::UpDown), -1);
    }

    #[test]
    fn reversed_axis_flips_commands() {
        let mut settings = Settings::defaults();
        settings.joystick.up_down = Some(AxisBinding { index: 1, reverse: -1 });
        let mut d = InputDecoder::new(&settings);
        assert_eq!(d.decode(axis(1, -30000)).command, Some(Command::MoveUp));
    }

    #[test]
    fn horizontal_axis_cycles_views() {
        let (mut d, _) = decoder();
        assert_eq!(d.decode(axis(0, 30000)).command, Some(Command::CycleViewUp));
        d.decode(axis(0, 0));
        assert_eq!(d.decode(axis(0, -30000)).command, Some(Command::CycleViewDown));
    }

    #[test]
    fn unknown_axis_is_ignored() {
        let (mut d, _) = decoder();
        assert_eq!(d.decode(axis(5, 30000)), Decoded::default());
    }

    #[test]
    fn repeat_reissues_and_rearms_with_period() {
        let (mut d, s) = decoder();
        d.decode(axis(1, -30000));
        let key = TimerKey::JoystickRepeat(Axis::UpDown);
        let out = d.decode(Event::Timer(key));
        assert_eq!(out.command, Some(Command::MoveDown));
        assert_eq!(
            out.timer,
            Some(TimerRequest::Arm {
                key,
                after: s.delays.repeat_period,
            })
        );
    }

    #[test]
    fn stale_repeat_after_release_is_ignored() {
        let (mut d, _) = decoder();
        d.decode(axis(1, 30000));
        d.decode(axis(1, 0));
        let out = d.decode(Event::Timer(TimerKey::JoystickRepeat(Axis::UpDown)));
        assert_eq!(out, Decoded::default());
    }

    #[test]
    fn keys_map_on_press_and_release() {
        let (mut d, s) = decoder();
        let k = s.keys.clone();
        let down = |d: &mut InputDecoder, key, modifiers| {
            d.decode(Event::KeyDown { key, modifiers }).command
        };
        assert_eq!(down(&mut d, k.up, 0), Some(Command::MoveUp));
        assert_eq!(down(&mut d, k.down, 0), Some(Command::MoveDown));
        assert_eq!(down(&mut d, k.page_up, 0), Some(Command::PageUp));
        assert_eq!(down(&mut d, k.page_down, 0), Some(Command::PageDown));
        assert_eq!(down(&mut d, k.page_up, k.alpha_modifier), Some(Command::AlphaUp));
        assert_eq!(down(&mut d, k.page_down, k.alpha_modifier), Some(Command::AlphaDown));
        assert_eq!(down(&mut d, k.page_up, k.view_modifier), Some(Command::CycleViewDown));
        assert_eq!(down(&mut d, k.page_down, k.view_modifier), Some(Command::CycleViewUp));
        // press of a release-bound key does nothing
        assert_eq!(down(&mut d, k.select, 0), None);

        let up = |d: &mut InputDecoder, key| d.decode(Event::KeyUp { key }).command;
        assert_eq!(up(&mut d, k.exit), Some(Command::Quit));
        assert_eq!(up(&mut d, k.select), Some(Command::Activate));
        assert_eq!(up(&mut d, k.back), Some(Command::Back));
        assert_eq!(up(&mut d, k.favorite), Some(Command::ToggleFavorite));
        assert_eq!(up(&mut d, k.toggle_hidden), Some(Command::ToggleHidden));
        assert_eq!(up(&mut d, k.up), None);
    }

    #[test]
    fn buttons_are_one_based() {
        let (mut d, _) = decoder();
        assert_eq!(d.decode(Event::JoyButtonUp { button: 0 }).command, Some(Command::Activate));
        assert_eq!(d.decode(Event::JoyButtonUp { button: 1 }).command, Some(Command::Back));
        assert_eq!(d.decode(Event::JoyButtonUp { button: 255 }).command, None);
    }

    #[test]
    fn timers_and_quit() {
        let (mut d, _) = decoder();
        assert_eq!(
            d.decode(Event::Timer(TimerKey::Snapshot)).command,
            Some(Command::RefreshSnapshot)
        );
        assert_eq!(d.decode(Event::Quit).command, Some(Command::Quit));
    }
}
