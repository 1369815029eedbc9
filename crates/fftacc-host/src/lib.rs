//! Host-side access to FFT accelerator instances
//!
//! This crate is the layer the test client talks to. It opens accelerator
//! backends by name, keeps attached instances in a registry, serializes
//! register access per instance and hands out one protocol session at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        CLI (bin/fftacc)                      │
//! │  - Opens backends, runs sessions, dumps registers           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     fftacc-host (this crate)                 │
//! │  - DeviceRegistry: instances keyed by id                     │
//! │  - AcceleratorHandle: mutex-serialized register access       │
//! │  - Session: one protocol sequence at a time per instance     │
//! │  - Request: driver request set (ioctl / raw register codes)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       fftacc-core                            │
//! │  - RegisterBus trait, protocol sequences                     │
//! │  - Accelerator state machine, codec, transform               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fftacc_host::{open_backend, InstanceSettings};
//! use fftacc_core::{protocol::PollConfig, SampleMode};
//!
//! let handle = open_backend("sim:irq=on", &InstanceSettings::default(), PollConfig::default())?;
//! let mut session = handle.open_session()?;
//! let spectrum = session.run(SampleMode::Bits32, &samples)?;
//! ```

pub mod config;
mod error;
mod handle;
mod irq;
mod registry;
pub mod request;

pub use config::{HostConfig, InstanceSettings};
pub use error::{HostError, Result};
pub use handle::{AcceleratorHandle, BoxedBus, Session};
pub use irq::{IrqLatch, LatchLine};
pub use registry::{
    apply_params, available_backends, backend_names_short, open_backend, open_simulator,
    parse_backend_params, BackendInfo, BackendParams, DeviceRegistry,
};
pub use request::{Request, Response};
