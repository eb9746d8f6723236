//! Shareable replay codes capturing a session's seed and input script.

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use diamond_heist_core::Direction;
use diamond_heist_rendering::FrameInput;
use serde::{Deserialize, Serialize};

const REPLAY_DOMAIN: &str = "heist";
const REPLAY_VERSION: &str = "v1";

/// Identifier prefix emitted before the seed and encoded payload.
pub(crate) const REPLAY_HEADER: &str = "heist:v1";
/// Delimiter used to separate the prefix, seed and payload.
const FIELD_DELIMITER: char = ':';

/// Single input applied by the player or the autopilot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum InputAction {
    /// A direction key went down.
    Press(Direction),
    /// A direction key went up.
    Release(Direction),
    /// The sprint key changed state.
    Sprint(bool),
    /// A dash was requested.
    Dash,
    /// The session was ended early.
    End,
}

impl InputAction {
    /// Folds the action into the frame input delivered to the session.
    pub(crate) fn apply_to(self, input: &mut FrameInput) {
        match self {
            Self::Press(direction) => input.pressed.push(direction),
            Self::Release(direction) => input.released.push(direction),
            Self::Sprint(held) => input.sprint = Some(held),
            Self::Dash => input.dash = true,
            Self::End => input.end_session = true,
        }
    }
}

/// Input applied after the tick of the given frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ScriptedInput {
    /// Zero-based frame index.
    pub(crate) frame: u64,
    /// Applied action.
    pub(crate) action: InputAction,
}

/// Everything required to reproduce a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ReplayCode {
    /// Seed of the world random number generator.
    pub(crate) seed: u64,
    /// Whether the session was started with the master thief kit.
    pub(crate) has_kit: bool,
    /// Inputs in the order they were applied.
    pub(crate) inputs: Vec<ScriptedInput>,
}

impl ReplayCode {
    /// Encodes the replay into a single-line string suitable for sharing.
    pub(crate) fn encode(&self) -> Result<String, ReplayCodeError> {
        let payload = SerializablePayload {
            has_kit: self.has_kit,
            inputs: self
                .inputs
                .iter()
                .map(|input| (input.frame, input.action))
                .collect(),
        };
        let json = serde_json::to_vec(&payload).map_err(ReplayCodeError::Serialize)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{REPLAY_HEADER}:{}:{encoded}", self.seed))
    }

    /// Decodes a replay from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, ReplayCodeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ReplayCodeError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(ReplayCodeError::MissingPrefix)?;
        let version = parts.next().ok_or(ReplayCodeError::MissingVersion)?;
        let seed = parts.next().ok_or(ReplayCodeError::MissingSeed)?;
        let payload = parts.next().ok_or(ReplayCodeError::MissingPayload)?;

        if domain != REPLAY_DOMAIN {
            return Err(ReplayCodeError::InvalidPrefix(domain.to_owned()));
        }
        if version != REPLAY_VERSION {
            return Err(ReplayCodeError::UnsupportedVersion(version.to_owned()));
        }

        let seed = seed
            .trim()
            .parse::<u64>()
            .map_err(|_| ReplayCodeError::InvalidSeed(seed.to_owned()))?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ReplayCodeError::InvalidEncoding)?;
        let decoded: SerializablePayload =
            serde_json::from_slice(&bytes).map_err(ReplayCodeError::InvalidPayload)?;

        let inputs: Vec<ScriptedInput> = decoded
            .inputs
            .into_iter()
            .map(|(frame, action)| ScriptedInput { frame, action })
            .collect();
        if let Some(pair) = inputs.windows(2).find(|pair| pair[1].frame < pair[0].frame) {
            return Err(ReplayCodeError::UnorderedInputs {
                frame: pair[1].frame,
            });
        }

        Ok(Self {
            seed,
            has_kit: decoded.has_kit,
            inputs,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializablePayload {
    has_kit: bool,
    inputs: Vec<(u64, InputAction)>,
}

/// Errors that can occur while encoding or decoding replay codes.
#[derive(Debug)]
pub(crate) enum ReplayCodeError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the replay code.
    MissingPrefix,
    /// The replay code did not contain a version segment.
    MissingVersion,
    /// The replay code did not include a seed.
    MissingSeed,
    /// The replay code did not include the payload segment.
    MissingPayload,
    /// The replay code used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The replay code used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The seed could not be parsed.
    InvalidSeed(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// Inputs were not sorted by frame.
    UnorderedInputs {
        /// First frame that appeared out of order.
        frame: u64,
    },
    /// The payload could not be serialised.
    Serialize(serde_json::Error),
}

impl fmt::Display for ReplayCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "replay code was empty"),
            Self::MissingPrefix => write!(f, "replay code is missing the prefix"),
            Self::MissingVersion => write!(f, "replay code is missing the version"),
            Self::MissingSeed => write!(f, "replay code is missing the seed"),
            Self::MissingPayload => write!(f, "replay code is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "replay prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "replay version '{version}' is not supported")
            }
            Self::InvalidSeed(seed) => write!(f, "could not parse replay seed '{seed}'"),
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode replay payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse replay payload: {error}")
            }
            Self::UnorderedInputs { frame } => {
                write!(f, "replay input at frame {frame} is out of order")
            }
            Self::Serialize(error) => write!(f, "could not serialise replay payload: {error}"),
        }
    }
}

impl Error for ReplayCodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) | Self::Serialize(error) => Some(error),
            _ => None,
        }
    }
}
