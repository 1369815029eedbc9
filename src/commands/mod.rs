//! CLI command implementations
//!
//! Every command that touches an accelerator goes through an
//! `AcceleratorHandle` from fftacc-host; `transform` and `gen` work on
//! sample files only.

mod exec;
mod gen;
mod list;
mod regs;
mod session;

pub use exec::cmd_exec;
pub use gen::cmd_gen;
pub use list::list_backends;
pub use regs::cmd_regs;
pub use session::{cmd_run, cmd_transform};
