//! Driver request set
//!
//! Two numbering schemes exist for the same operations:
//!
//! - character-device ioctl numbers 1..=5 for the protocol steps
//!   (reset, configure, load sample, process, read result)
//! - PCI driver request codes for raw register get/set
//!
//! | Code | Request          |
//! |------|------------------|
//! | 0x00 | GET_ID           |
//! | 0x10 | GET_CTRL         |
//! | 0x20 | GET_CFG0         |
//! | 0x30 | GET_DATAOUT      |
//! | 0x40 | GET_STATUS       |
//! | 0x50 | SET_CTRL         |
//! | 0x60 | SET_CFG0         |
//! | 0x70 | SET_DATAIN       |

use crate::error::{HostError, Result};
use fftacc_core::{Register, Status};

/// ioctl number: reset
pub const IOCTL_RESET: u32 = 1;
/// ioctl number: write CFG0
pub const IOCTL_CONFIGURE: u32 = 2;
/// ioctl number: load one DATAIN word
pub const IOCTL_LOAD_SAMPLE: u32 = 3;
/// ioctl number: run the transform
pub const IOCTL_PROCESS: u32 = 4;
/// ioctl number: drain one result
pub const IOCTL_READ_RESULT: u32 = 5;

/// Raw register request codes, in (code, register, is_write) form
const REGISTER_CODES: [(u32, Register, bool); 8] = [
    (0x00, Register::DevId, false),
    (0x10, Register::Ctrl, false),
    (0x20, Register::Cfg0, false),
    (0x30, Register::DataOut, false),
    (0x40, Register::Status, false),
    (0x50, Register::Ctrl, true),
    (0x60, Register::Cfg0, true),
    (0x70, Register::DataIn, true),
];

/// One request against an accelerator session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Return both cursors to 0 and wait for READY
    Reset,
    /// Write a raw CFG0 value
    Configure(u32),
    /// Load one DATAIN word and wait for SCPLT
    LoadSample(u32),
    /// Run the transform and wait for PCPLT
    Process,
    /// Drain one result
    ReadResult,
    /// Raw register read
    Get(Register),
    /// Raw register write
    Set(Register, u32),
}

/// Outcome of a [`Request`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Completed with nothing to report
    Done,
    /// A register or result value
    Value(u32),
    /// STATUS bits observed while waiting
    Status(Status),
}

impl Response {
    /// The register or result value, if this response carries one
    pub fn value(&self) -> Option<u32> {
        match self {
            Response::Value(v) => Some(*v),
            Response::Status(_) | Response::Done => None,
        }
    }

    /// The STATUS bits, if this response carries them
    pub fn status(&self) -> Option<Status> {
        match self {
            Response::Status(s) => Some(*s),
            Response::Value(_) | Response::Done => None,
        }
    }
}

impl Request {
    /// Decode a character-device ioctl
    pub fn from_ioctl(nr: u32, arg: u32) -> Result<Self> {
        match nr {
            IOCTL_RESET => Ok(Request::Reset),
            IOCTL_CONFIGURE => Ok(Request::Configure(arg)),
            IOCTL_LOAD_SAMPLE => Ok(Request::LoadSample(arg)),
            IOCTL_PROCESS => Ok(Request::Process),
            IOCTL_READ_RESULT => Ok(Request::ReadResult),
            _ => Err(HostError::UnknownRequest(nr)),
        }
    }

    /// Decode a raw register request code
    pub fn from_code(code: u32, arg: u32) -> Result<Self> {
        REGISTER_CODES
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|&(_, reg, is_write)| {
                if is_write {
                    Request::Set(reg, arg)
                } else {
                    Request::Get(reg)
                }
            })
            .ok_or(HostError::UnknownRequest(code))
    }

    /// ioctl number for protocol steps
    pub fn ioctl_number(&self) -> Option<u32> {
        match self {
            Request::Reset => Some(IOCTL_RESET),
            Request::Configure(_) => Some(IOCTL_CONFIGURE),
            Request::LoadSample(_) => Some(IOCTL_LOAD_SAMPLE),
            Request::Process => Some(IOCTL_PROCESS),
            Request::ReadResult => Some(IOCTL_READ_RESULT),
            Request::Get(_) | Request::Set(..) => None,
        }
    }

    /// Request code for raw register access, if the driver defines one
    pub fn code(&self) -> Option<u32> {
        let (reg, write) = match *self {
            Request::Get(reg) => (reg, false),
            Request::Set(reg, _) => (reg, true),
            _ => return None,
        };
        REGISTER_CODES
            .iter()
            .find(|(_, r, w)| *r == reg && *w == write)
            .map(|(c, _, _)| *c)
    }
}
