//! Input sources
//!
//! Keyboard, gamepad and scripted sources all produce the same per-tick
//! `Intent`, so the simulation never sees which device a player uses.
//! Device polling itself happens elsewhere; sources only consume already
//! translated `InputEvent`s.

use glam::Vec2;

use crate::sim::{Command, Intent};

/// Gamepad stick values inside this magnitude read as centered
pub const GAMEPAD_DEAD_ZONE: i16 = 10_000;

/// Keys the sources understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Jump,
    /// Any other printable key (tuning hotkeys)
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadAxis {
    LeftX,
    LeftY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    A,
}

/// Already-translated device event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    Axis { axis: GamepadAxis, value: i16 },
    ButtonDown(GamepadButton),
    ButtonUp(GamepadButton),
}

/// Anything that can drive a player
pub trait InputSource {
    /// Feed one device event
    fn handle(&mut self, event: &InputEvent);

    /// Intent for the coming tick. One-shot triggers (jump) are consumed.
    fn intent(&mut self) -> Intent;

    /// Tuning commands collected since the last call
    fn take_commands(&mut self) -> Vec<Command> {
        Vec::new()
    }
}

/// Tuning hotkey bindings
pub fn hotkey(ch: char) -> Option<Command> {
    match ch {
        '1' => Some(Command::ToggleSeparation),
        '2' => Some(Command::ToggleBounce),
        'f' => Some(Command::ToggleFastFall),
        'c' => Some(Command::CycleFollowMode),
        'h' => Some(Command::AdjustJumpHeight(1.0)),
        'H' => Some(Command::AdjustJumpHeight(-1.0)),
        'j' => Some(Command::AdjustJumpLength(1.0)),
        'J' => Some(Command::AdjustJumpLength(-1.0)),
        '+' => Some(Command::Zoom(1.0)),
        '-' => Some(Command::Zoom(-1.0)),
        'o' => Some(layer_speed(0, LAYER_SPEED_STEP)),
        'i' => Some(layer_speed(0, -LAYER_SPEED_STEP)),
        'l' => Some(layer_speed(1, LAYER_SPEED_STEP)),
        'k' => Some(layer_speed(1, -LAYER_SPEED_STEP)),
        ',' => Some(layer_speed(2, LAYER_SPEED_STEP)),
        'm' => Some(layer_speed(2, -LAYER_SPEED_STEP)),
        _ => None,
    }
}

/// Scroll speed change per keypress
const LAYER_SPEED_STEP: f32 = 0.1;

fn layer_speed(layer: usize, delta: f32) -> Command {
    Command::AdjustLayerSpeed { layer, delta }
}

/// Arrow keys move, jump key jumps
#[derive(Debug, Clone, Default)]
pub struct KeyboardSource {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    jump_held: bool,
    jump_pending: bool,
    commands: Vec<Command>,
}

impl KeyboardSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn axis(&self) -> Vec2 {
        let x = f32::from(self.right as u8) - f32::from(self.left as u8);
        let y = f32::from(self.down as u8) - f32::from(self.up as u8);
        Vec2::new(x, y)
    }
}

impl InputSource for KeyboardSource {
    fn handle(&mut self, event: &InputEvent) {
        let (key, pressed) = match *event {
            InputEvent::KeyDown(key) => (key, true),
            InputEvent::KeyUp(key) => (key, false),
            _ => return,
        };
        match key {
            Key::Up => self.up = pressed,
            Key::Down => self.down = pressed,
            Key::Left => self.left = pressed,
            Key::Right => self.right = pressed,
            Key::Jump => {
                // key repeat does not re-trigger
                if pressed && !self.jump_held {
                    self.jump_pending = true;
                }
                self.jump_held = pressed;
            }
            Key::Char(ch) => {
                if pressed && let Some(command) = hotkey(ch) {
                    self.commands.push(command);
                }
            }
        }
    }

    fn intent(&mut self) -> Intent {
        Intent {
            axis: self.axis(),
            jump: std::mem::take(&mut self.jump_pending),
        }
    }

    fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

/// Left stick moves (digital, past the dead zone), button A jumps
#[derive(Debug, Clone, Default)]
pub struct GamepadSource {
    x: f32,
    y: f32,
    jump_pending: bool,
}

impl GamepadSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn digital(value: i16) -> f32 {
        if value < -GAMEPAD_DEAD_ZONE {
            -1.0
        } else if value > GAMEPAD_DEAD_ZONE {
            1.0
        } else {
            0.0
        }
    }
}

impl InputSource for GamepadSource {
    fn handle(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Axis {
                axis: GamepadAxis::LeftX,
                value,
            } => self.x = Self::digital(value),
            InputEvent::Axis {
                axis: GamepadAxis::LeftY,
                value,
            } => self.y = Self::digital(value),
            InputEvent::ButtonDown(GamepadButton::A) => self.jump_pending = true,
            _ => {}
        }
    }

    fn intent(&mut self) -> Intent {
        Intent {
            axis: Vec2::new(self.x, self.y),
            jump: std::mem::take(&mut self.jump_pending),
        }
    }
}

/// Hold `intent` for `ticks` ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptStep {
    pub ticks: u32,
    pub intent: Intent,
}

impl ScriptStep {
    pub fn new(ticks: u32, axis: Vec2, jump: bool) -> Self {
        Self {
            ticks,
            intent: Intent { axis, jump },
        }
    }
}

/// Replays a fixed list of intents, one call per tick. A step's jump fires
/// on its first tick only.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    steps: Vec<ScriptStep>,
    looping: bool,
    step: usize,
    elapsed: u32,
}

impl ScriptedSource {
    pub fn new(steps: Vec<ScriptStep>, looping: bool) -> Self {
        Self {
            steps,
            looping,
            step: 0,
            elapsed: 0,
        }
    }

    pub fn finished(&self) -> bool {
        self.step >= self.steps.len()
    }
}

impl InputSource for ScriptedSource {
    /// Scripts ignore live devices
    fn handle(&mut self, _event: &InputEvent) {}

    fn intent(&mut self) -> Intent {
        // skip empty steps
        while let Some(step) = self.steps.get(self.step) {
            if self.elapsed < step.ticks {
                break;
            }
            self.step += 1;
            self.elapsed = 0;
        }
        if self.finished() && self.looping && self.steps.iter().any(|s| s.ticks > 0) {
            self.step = 0;
            return self.intent();
        }

        let Some(step) = self.steps.get(self.step) else {
            return Intent::default();
        };
        let intent = Intent {
            axis: step.intent.axis,
            jump: step.intent.jump && self.elapsed == 0,
        };
        self.elapsed += 1;
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_axes() {
        let mut keys = KeyboardSource::new();
        keys.handle(&InputEvent::KeyDown(Key::Right));
        keys.handle(&InputEvent::KeyDown(Key::Up));
        assert_eq!(keys.intent().axis, Vec2::new(1.0, -1.0));

        keys.handle(&InputEvent::KeyDown(Key::Left));
        assert_eq!(keys.intent().axis, Vec2::new(0.0, -1.0));

        keys.handle(&InputEvent::KeyUp(Key::Right));
        keys.handle(&InputEvent::KeyUp(Key::Up));
        assert_eq!(keys.intent().axis, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_keyboard_jump_is_one_shot() {
        let mut keys = KeyboardSource::new();
        keys.handle(&InputEvent::KeyDown(Key::Jump));
        keys.handle(&InputEvent::KeyDown(Key::Jump)); // repeat
        assert!(keys.intent().jump);
        assert!(!keys.intent().jump);

        keys.handle(&InputEvent::KeyUp(Key::Jump));
        keys.handle(&InputEvent::KeyDown(Key::Jump));
        assert!(keys.intent().jump);
    }

    #[test]
    fn test_keyboard_hotkeys() {
        let mut keys = KeyboardSource::new();
        keys.handle(&InputEvent::KeyDown(Key::Char('c')));
        keys.handle(&InputEvent::KeyUp(Key::Char('c')));
        keys.handle(&InputEvent::KeyDown(Key::Char('H')));
        keys.handle(&InputEvent::KeyDown(Key::Char('x')));
        assert_eq!(
            keys.take_commands(),
            vec![Command::CycleFollowMode, Command::AdjustJumpHeight(-1.0)]
        );
        assert!(keys.take_commands().is_empty());
    }

    #[test]
    fn test_layer_speed_hotkeys() {
        let mut keys = KeyboardSource::new();
        for ch in ['o', 'k', 'm'] {
            keys.handle(&InputEvent::KeyDown(Key::Char(ch)));
        }
        assert_eq!(
            keys.take_commands(),
            vec![
                Command::AdjustLayerSpeed {
                    layer: 0,
                    delta: 0.1
                },
                Command::AdjustLayerSpeed {
                    layer: 1,
                    delta: -0.1
                },
                Command::AdjustLayerSpeed {
                    layer: 2,
                    delta: -0.1
                },
            ]
        );
    }

    #[test]
    fn test_gamepad_dead_zone() {
        let mut pad = GamepadSource::new();
        pad.handle(&InputEvent::Axis {
            axis: GamepadAxis::LeftX,
            value: 9_000,
        });
        pad.handle(&InputEvent::Axis {
            axis: GamepadAxis::LeftY,
            value: -20_000,
        });
        assert_eq!(pad.intent().axis, Vec2::new(0.0, -1.0));

        pad.handle(&InputEvent::Axis {
            axis: GamepadAxis::LeftX,
            value: i16::MAX,
        });
        pad.handle(&InputEvent::ButtonDown(GamepadButton::A));
        let intent = pad.intent();
        assert_eq!(intent.axis, Vec2::new(1.0, -1.0));
        assert!(intent.jump);
        assert!(!pad.intent().jump);
    }

    #[test]
    fn test_gamepad_ignores_keyboard() {
        let mut pad = GamepadSource::new();
        pad.handle(&InputEvent::KeyDown(Key::Right));
        assert_eq!(pad.intent(), Intent::default());
    }

    #[test]
    fn test_script_replays_steps() {
        let mut script = ScriptedSource::new(
            vec![
                ScriptStep::new(2, Vec2::X, true),
                ScriptStep::new(0, Vec2::Y, false),
                ScriptStep::new(1, Vec2::NEG_X, false),
            ],
            false,
        );
        let first = script.intent();
        assert_eq!(first.axis, Vec2::X);
        assert!(first.jump);
        let second = script.intent();
        assert_eq!(second.axis, Vec2::X);
        assert!(!second.jump);
        assert_eq!(script.intent().axis, Vec2::NEG_X);
        assert_eq!(script.intent(), Intent::default());
        assert!(script.finished());
    }

    #[test]
    fn test_script_loops() {
        let mut script = ScriptedSource::new(vec![ScriptStep::new(1, Vec2::X, true)], true);
        for _ in 0..3 {
            let intent = script.intent();
            assert_eq!(intent.axis, Vec2::X);
            assert!(intent.jump);
        }
    }

    #[test]
    fn test_sources_are_interchangeable() {
        let mut sources: Vec<Box<dyn InputSource>> = vec![
            Box::new(KeyboardSource::new()),
            Box::new(GamepadSource::new()),
        ];
        for source in &mut sources {
            assert_eq!(source.intent(), Intent::default());
        }
    }
}
