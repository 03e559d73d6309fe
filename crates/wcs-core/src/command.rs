// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! G-code command surface: `G53`, `G54`..`G59`, `G10 L2 P..`, `WORK_OFFSETS`.
//!
//! Lines are tokenized as `NAME WORD...` where each word is a parameter
//! letter followed by its value (`P2`, `X-1.5`). Everything after `;` is a
//! comment. Names and letters are case-insensitive.

use crate::controller::{OffsetController, RedefineTarget};
use crate::error::CommandError;
use crate::motion::MotionTransform;
use crate::position::Position;
use crate::slot::{CoordinateSystem, Slot};
use crate::store::OffsetBackend;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name of the offsets report command.
pub const REPORT_COMMAND: &str = "WORK_OFFSETS";

/// A tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GCodeCommand {
    /// Upper-cased command name, e.g. `G10`.
    pub name: String,
    /// Parameter words in line order as `(LETTER, raw value)`.
    pub params: Vec<(char, String)>,
}

impl GCodeCommand {
    /// Tokenizes `line`. Returns [`CommandError::Empty`] for blank or comment-only lines.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let code = line.split(';').next().unwrap_or_default().trim();
        let mut words = code.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?.to_ascii_uppercase();
        let params = words
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(letter) if letter.is_ascii_alphabetic() && !chars.as_str().is_empty() => {
                        Ok((letter.to_ascii_uppercase(), chars.as_str().to_owned()))
                    }
                    _ => Err(CommandError::MalformedParameter(word.to_owned())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, params })
    }

    fn raw(&self, letter: char) -> Option<&str> {
        // Repeated words: the last one wins.
        self.params
            .iter()
            .rev()
            .find(|(l, _)| *l == letter)
            .map(|(_, v)| v.as_str())
    }

    /// Integer parameter `letter`, if present.
    pub fn get_int(&self, letter: char) -> Result<Option<i64>, CommandError> {
        self.raw(letter)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| CommandError::MalformedParameter(format!("{letter}{v}")))
            })
            .transpose()
    }

    /// Float parameter `letter`, if present.
    pub fn get_float(&self, letter: char) -> Result<Option<f64>, CommandError> {
        self.raw(letter)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| CommandError::MalformedParameter(format!("{letter}{v}")))
            })
            .transpose()
    }
}

/// Offset commands understood by the [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsetCommand {
    /// `G53`: suspend to machine space.
    MachineSpace,
    /// `G54`..`G59`: select a work coordinate system.
    Select(Slot),
    /// `G10 L2 P<0-6> [X..] [Y..] [Z..] [E..]`: redefine an offset.
    Redefine {
        /// Slot to redefine (`P0` is the active slot).
        target: RedefineTarget,
        /// New offset; axes not given are zero.
        offset: Position,
    },
    /// `WORK_OFFSETS`: list all offsets.
    Report,
}

impl OffsetCommand {
    /// Interprets a tokenized line.
    pub fn from_gcode(cmd: &GCodeCommand) -> Result<Self, CommandError> {
        match cmd.name.as_str() {
            "G53" => Ok(Self::MachineSpace),
            "G10" => Self::redefine_from(cmd),
            REPORT_COMMAND => Ok(Self::Report),
            name => name
                .strip_prefix('G')
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(Slot::from_gcode)
                .map(Self::Select)
                .ok_or_else(|| CommandError::Unknown(cmd.name.clone())),
        }
    }

    fn redefine_from(cmd: &GCodeCommand) -> Result<Self, CommandError> {
        if cmd.get_int('L')? != Some(2) {
            return Err(CommandError::MissingL2);
        }
        let target = cmd
            .get_int('P')?
            .and_then(RedefineTarget::from_index)
            .ok_or(CommandError::BadSlot)?;
        let offset = Position::try_from_axes(|axis| match cmd.get_float(axis.letter())? {
            Some(v) if !v.is_finite() => Err(CommandError::NonFinite(axis.letter())),
            v => Ok(v),
        })?;
        Ok(Self::Redefine { target, offset })
    }

    /// Parses a raw line straight into an offset command.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        Self::from_gcode(&GCodeCommand::parse(line)?)
    }
}

/// Host-level switch for the work offsets feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOffsetsMode {
    /// G53..G59, G10 L2 and WORK_OFFSETS are registered.
    #[default]
    Standard,
    /// Offset commands are not registered.
    None,
}

impl WorkOffsetsMode {
    /// Whether the offset commands are available.
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Standard)
    }
}

/// Routes operator lines to the offset controller and renders acknowledgments.
pub struct Dispatcher<B, M> {
    controller: Option<OffsetController<B, M>>,
}

impl<B, M> Dispatcher<B, M>
where
    B: OffsetBackend,
    M: MotionTransform,
{
    /// Dispatcher with the offset commands registered.
    pub fn new(controller: OffsetController<B, M>) -> Self {
        Self {
            controller: Some(controller),
        }
    }

    /// Dispatcher for a host with work offsets switched off.
    pub fn disabled() -> Self {
        Self { controller: None }
    }

    /// Borrow the controller, if the feature is enabled.
    pub fn controller(&self) -> Option<&OffsetController<B, M>> {
        self.controller.as_ref()
    }

    /// Executes one operator line.
    ///
    /// Blank and comment-only lines yield `Ok(None)`. Errors leave the store,
    /// the motion layer and the active slot unchanged.
    pub fn dispatch(&mut self, line: &str) -> Result<Option<String>, CommandError> {
        let gcode = match GCodeCommand::parse(line) {
            Ok(gcode) => gcode,
            Err(CommandError::Empty) => return Ok(None),
            Err(err) => return Err(err),
        };
        let result = match self.controller.as_mut() {
            Some(controller) => OffsetCommand::from_gcode(&gcode)
                .and_then(|cmd| Self::run(controller, cmd)),
            None => Err(CommandError::Unknown(gcode.name.clone())),
        };
        if let Err(err) = &result {
            warn!(command = %gcode.name, %err, "command rejected");
        }
        result.map(Some)
    }

    fn run(controller: &mut OffsetController<B, M>, cmd: OffsetCommand) -> Result<String, CommandError> {
        Ok(match cmd {
            OffsetCommand::MachineSpace => match controller.suspend()? {
                Some(_) => "machine coordinates active".to_owned(),
                None => "already in machine coordinates".to_owned(),
            },
            OffsetCommand::Select(slot) => {
                let slot = controller.select(slot)?;
                format!("{} selected", CoordinateSystem::InSystem(slot))
            }
            OffsetCommand::Redefine { target, offset } => {
                let slot = controller.redefine(target, offset)?;
                format!("{} offset set to {offset}", slot.name())
            }
            OffsetCommand::Report => controller.list().to_string(),
        })
    }
}
