//! Feature encoder - maps a categorical four-candle observation onto a `FeatureVector`
//!
//! Each choice set is a closed enum with a fixed integer code. Encoding is a
//! total, pure function; string parsing is where malformed input is rejected.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::{AtlasError, Feature, FeatureVector, Result};

/// Wire value and display label of one selectable choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

macro_rules! choice_set {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal, $lookup:ident {
            $($variant:ident = $code:literal => $value:tt, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $($variant,)+
        }

        static $lookup: phf::Map<&'static str, $name> = phf::phf_map! {
            $($value => $name::$variant,)+
        };

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Integer code used in the feature vector
            pub fn code(&self) -> u8 {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn choices() -> Vec<Choice> {
                Self::ALL
                    .iter()
                    .map(|c| Choice { value: c.as_str(), label: c.label() })
                    .collect()
            }
        }

        impl FromStr for $name {
            type Err = AtlasError;

            fn from_str(s: &str) -> Result<Self> {
                $lookup
                    .get(s.trim())
                    .copied()
                    .ok_or_else(|| AtlasError::InvalidChoice {
                        field: $field,
                        value: s.to_string(),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = AtlasError;

            fn try_from(s: String) -> Result<Self> {
                s.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(c: $name) -> Self {
                c.as_str()
            }
        }
    };
}

choice_set! {
    /// Where the first candle sits relative to the prior day's range
    C1Context, "c1_context", C1_CONTEXTS {
        InsidePdr = 0 => "inside_pdr", "Inside PDR";
        BreaksPdh = 1 => "breaks_pdh", "Breaks PDH";
        BreaksPdl = 2 => "breaks_pdl", "Breaks PDL";
    }
}

choice_set! {
    /// How the first candle behaves
    C1Behavior, "c1_behavior", C1_BEHAVIORS {
        Ranging = 0 => "ranging", "Ranging";
        TrendsUp = 1 => "trends_up", "Trends Up";
        TrendsDown = 2 => "trends_down", "Trends Down";
    }
}

choice_set! {
    /// What candles 2-4 do relative to the previous candle
    CandleAction, "candle_action", CANDLE_ACTIONS {
        InsideBar = 0 => "inside_bar", "Inside Bar / Ranges";
        BreaksHigh = 1 => "breaks_high", "Breaks High";
        BreaksLow = 2 => "breaks_low", "Breaks Low";
        Whipsaw = 3 => "whipsaw", "Whipsaw";
    }
}

choice_set! {
    /// Where candles 2-4 close or hold
    CandleClose, "candle_close", CANDLE_CLOSES {
        Inside = 0 => "inside", "Closes Inside";
        Above = 1 => "above", "Holds / Closes Above";
        Below = 2 => "below", "Holds / Closes Below";
    }
}

/// A user-described four-candle observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub c1_context: C1Context,
    pub c1_behavior: C1Behavior,
    pub c2_action: CandleAction,
    pub c2_close: CandleClose,
    pub c3_action: CandleAction,
    pub c3_close: CandleClose,
    pub c4_action: CandleAction,
    pub c4_close: CandleClose,
}

/// Encode an observation. Total: every choice maps to an in-domain code.
pub fn encode_input(input: &UserInput) -> FeatureVector {
    let mut values = [0u8; Feature::COUNT];
    values[Feature::C1Context.index()] = input.c1_context.code();
    values[Feature::C1Behavior.index()] = input.c1_behavior.code();
    values[Feature::C2Action.index()] = input.c2_action.code();
    values[Feature::C2Close.index()] = input.c2_close.code();
    values[Feature::C3Action.index()] = input.c3_action.code();
    values[Feature::C3Close.index()] = input.c3_close.code();
    values[Feature::C4Action.index()] = input.c4_action.code();
    values[Feature::C4Close.index()] = input.c4_close.code();
    FeatureVector::from_encoded(values)
}

/// All choice sets with their display labels
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceTables {
    pub c1_contexts: Vec<Choice>,
    pub c1_behaviors: Vec<Choice>,
    pub candle_actions: Vec<Choice>,
    pub candle_closes: Vec<Choice>,
}

pub fn choice_tables() -> ChoiceTables {
    ChoiceTables {
        c1_contexts: C1Context::choices(),
        c1_behaviors: C1Behavior::choices(),
        candle_actions: CandleAction::choices(),
        candle_closes: CandleClose::choices(),
    }
}
