//! SDL2 host: event translation and the window renderer.

mod ui;

pub use ui::SdlRenderer;

use std::sync::mpsc::{Receiver, TryRecvError};

use sdl2::event::Event as SdlEvent;
use sdl2::joystick::Joystick;
use sdl2::{EventPump, JoystickSubsystem};

use crate::event::{Event, EventSource};

const POLL_MS: u32 = 20;

/// Merges the SDL event queue with timer expiries from the scheduler.
pub struct SdlEvents {
    pump: EventPump,
    timers: Receiver<Event>,
    // opened devices must stay alive to keep reporting
    _joysticks: Vec<Joystick>,
}

impl SdlEvents {
    pub fn new(pump: EventPump, joystick: &JoystickSubsystem, timers: Receiver<Event>) -> Self {
        let mut joysticks = Vec::new();
        let count = joystick.num_joysticks().unwrap_or(0);
        for id in 0..count {
            match joystick.open(id) {
                Ok(js) => {
                    log::info!("Opened joystick: {}", js.name());
                    joysticks.push(js);
                }
                Err(e) => log::warn!("Failed opening joystick {}: {}", id, e),
            }
        }
        SdlEvents {
            pump,
            timers,
            _joysticks: joysticks,
        }
    }
}

impl EventSource for SdlEvents {
    fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.timers.try_recv() {
                Ok(event) => return Some(event),
                // a dropped scheduler only ends timer events, input keeps flowing
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
            }
            if let Some(event) = self.pump.wait_event_timeout(POLL_MS).and_then(translate) {
                return Some(event);
            }
        }
    }
}

fn translate(event: SdlEvent) -> Option<Event> {
    match event {
        SdlEvent::Quit { .. } => Some(Event::Quit),
        SdlEvent::KeyDown {
            keycode: Some(k),
            keymod,
            ..
        } => Some(Event::KeyDown {
            key: k as i32,
            modifiers: keymod.bits(),
        }),
        SdlEvent::KeyUp { keycode: Some(k), .. } => Some(Event::KeyUp { key: k as i32 }),
        SdlEvent::JoyAxisMotion {
            axis_idx, value, ..
        } => Some(Event::JoyAxis {
            axis: axis_idx,
            value,
        }),
        SdlEvent::JoyButtonUp { button_idx, .. } => Some(Event::JoyButtonUp { button: button_idx }),
        _ => None,
    }
}
