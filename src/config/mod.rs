//! Configuration module for Kartka.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    DeckSettings, GeneralSettings, InputSettings, MovappSettings, Settings, SpeechProvider,
    SpeechSettings,
};
