//! Platform abstraction layer
//!
//! Turns device events into device-independent intents.

pub mod input;

pub use input::{
    GamepadSource, InputEvent, InputSource, KeyboardSource, ScriptStep, ScriptedSource,
};
