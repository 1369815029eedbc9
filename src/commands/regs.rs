//! Register dump command

use fftacc_core::{Ctrl, Register, Status};
use fftacc_host::AcceleratorHandle;

/// Print every readable register
pub fn cmd_regs(handle: &AcceleratorHandle) -> Result<(), Box<dyn std::error::Error>> {
    println!("Accelerator instance {}:", handle.instance());
    for reg in Register::ALL {
        if !reg.is_readable() {
            println!("  {:<8} wo", reg.name());
            continue;
        }
        let value = handle.read_register(reg)?;
        let decoded = match reg {
            Register::Ctrl => format!("{:?}", Ctrl::from_bits_truncate(value)),
            Register::Status => format!("{:?}", Status::from_bits_truncate(value)),
            _ => String::new(),
        };
        let access = if reg.is_writable() { "rw" } else { "ro" };
        println!("  {:<8} {} 0x{:08X} {}", reg.name(), access, value, decoded);
    }
    Ok(())
}
