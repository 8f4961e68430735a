//! Options forwarded to the external solving engine.

use serde::{Deserialize, Serialize};

/// Solver play style, transmitted as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayStyle {
    /// Flag mines as they are found
    #[default]
    Flags,
    /// Never place flags
    NoFlags,
    /// Optimize clicks per cell (chording)
    Efficiency,
    /// Efficiency without flags
    NoFlagsEfficiency,
}

impl From<PlayStyle> for u8 {
    fn from(style: PlayStyle) -> Self {
        match style {
            PlayStyle::Flags => 1,
            PlayStyle::NoFlags => 2,
            PlayStyle::Efficiency => 3,
            PlayStyle::NoFlagsEfficiency => 4,
        }
    }
}

impl TryFrom<u8> for PlayStyle {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        match code {
            1 => Ok(PlayStyle::Flags),
            2 => Ok(PlayStyle::NoFlags),
            3 => Ok(PlayStyle::Efficiency),
            4 => Ok(PlayStyle::NoFlagsEfficiency),
            other => Err(format!("unknown play style {other}")),
        }
    }
}

/// Options passed opaquely to the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolveOptions {
    /// Ask the engine for diagnostic output
    pub verbose: bool,
    /// Play style
    pub play_style: PlayStyle,
    /// Enable the deeper guess evaluation
    pub advanced_guessing: bool,
    /// Prune clearly inferior guesses
    pub guess_pruning: bool,
    /// Board generated without forced guesses
    pub no_guessing_mode: bool,
    /// Run brute-force analysis to completion
    #[serde(rename = "fullBFDA")]
    pub full_bfda: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            verbose: true,
            play_style: PlayStyle::Flags,
            advanced_guessing: true,
            guess_pruning: true,
            no_guessing_mode: false,
            full_bfda: false,
        }
    }
}
