//! AcceleratorHandle - serialized access to one register file
//!
//! All register traffic for an instance goes through the handle's mutex, so
//! concurrent callers never interleave inside a single register access. On top
//! of that, a protocol sequence (load/process/drain) needs exclusive use of
//! the instance for its whole length: at most one [`Session`] is open per
//! handle, and a second `open_session` fails with [`HostError::Busy`].

use crate::error::{HostError, Result};
use crate::irq::IrqLatch;
use crate::request::{Request, Response};
use fftacc_core::protocol::{self, PollConfig};
use fftacc_core::{Register, RegisterBus, SampleMode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Boxed register bus usable across threads
pub type BoxedBus = Box<dyn RegisterBus + Send>;

/// One attached accelerator instance
pub struct AcceleratorHandle {
    instance: u32,
    bus: Mutex<BoxedBus>,
    in_session: AtomicBool,
    poll: PollConfig,
    irq: Option<IrqLatch>,
}

impl AcceleratorHandle {
    /// Wrap a register bus
    pub fn new(instance: u32, bus: BoxedBus, poll: PollConfig) -> Self {
        Self {
            instance,
            bus: Mutex::new(bus),
            in_session: AtomicBool::new(false),
            poll,
            irq: None,
        }
    }

    /// Attach the host end of the instance's interrupt line
    pub fn with_irq(mut self, latch: IrqLatch) -> Self {
        self.irq = Some(latch);
        self
    }

    /// Instance id
    pub fn instance(&self) -> u32 {
        self.instance
    }

    /// Polling bound used by sessions
    pub fn poll(&self) -> &PollConfig {
        &self.poll
    }

    /// Interrupt latch, if the instance has its line wired
    pub fn irq(&self) -> Option<&IrqLatch> {
        self.irq.as_ref()
    }

    /// Whether a session is currently open
    pub fn is_busy(&self) -> bool {
        self.in_session.load(Ordering::Acquire)
    }

    /// Run `f` with the bus locked
    fn with_bus<T>(
        &self,
        f: impl FnOnce(&mut BoxedBus) -> fftacc_core::Result<T>,
    ) -> Result<T> {
        // Poisoning is ignored: each access completes or fails as a whole
        let mut bus = self.bus.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut *bus).map_err(HostError::from)
    }

    /// Raw register read outside a session
    ///
    /// Reading STATUS here clears it like any other read.
    pub fn read_register(&self, reg: Register) -> Result<u32> {
        self.with_bus(|bus| bus.read_reg(reg))
    }

    /// Raw register write outside a session
    pub fn write_register(&self, reg: Register, value: u32) -> Result<()> {
        self.with_bus(|bus| bus.write_reg(reg, value))
    }

    /// Claim the instance for a protocol sequence
    pub fn open_session(&self) -> Result<Session<'_>> {
        self.in_session
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HostError::Busy(self.instance))?;
        log::debug!("instance {}: session opened", self.instance);
        Ok(Session { handle: self })
    }
}

/// Exclusive use of an instance; released on drop
pub struct Session<'a> {
    handle: &'a AcceleratorHandle,
}

impl Session<'_> {
    /// Instance this session holds
    pub fn instance(&self) -> u32 {
        self.handle.instance
    }

    /// Execute one driver request
    pub fn execute(&mut self, request: Request) -> Result<Response> {
        let poll = self.handle.poll;
        log::trace!("instance {}: {:?}", self.handle.instance, request);

        self.handle.with_bus(|bus| match request {
            Request::Reset => protocol::reset(bus, &poll).map(|()| Response::Done),
            Request::Configure(cfg) => bus
                .write_reg(Register::Cfg0, cfg)
                .map(|()| Response::Done),
            Request::LoadSample(word) => {
                protocol::load_sample(bus, word, &poll).map(Response::Status)
            }
            Request::Process => protocol::process(bus, &poll).map(|()| Response::Done),
            Request::ReadResult => protocol::read_result(bus, &poll).map(Response::Value),
            Request::Get(reg) => bus.read_reg(reg).map(Response::Value),
            Request::Set(reg, value) => bus.write_reg(reg, value).map(|()| Response::Done),
        })
    }

    /// Run a whole session and return the drained results
    pub fn run(&mut self, mode: SampleMode, samples: &[i32]) -> Result<Vec<u32>> {
        let poll = self.handle.poll;
        self.handle
            .with_bus(|bus| protocol::run_session(bus, mode, samples, &poll))
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.handle.in_session.store(false, Ordering::Release);
        log::debug!("instance {}: session closed", self.handle.instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fftacc_core::{Accelerator, Status};

    fn handle() -> AcceleratorHandle {
        AcceleratorHandle::new(
            0,
            Box::new(Accelerator::new_default()),
            PollConfig::default(),
        )
    }

    #[test]
    fn test_single_session() {
        let h = handle();
        let first = h.open_session().unwrap();
        assert!(h.is_busy());
        assert!(matches!(h.open_session(), Err(HostError::Busy(0))));
        drop(first);
        assert!(!h.is_busy());
        assert!(h.open_session().is_ok());
    }

    #[test]
    fn test_request_sequence() {
        let h = handle();
        let mut s = h.open_session().unwrap();

        assert_eq!(
            s.execute(Request::Get(Register::DevId)).unwrap(),
            Response::Value(0xCAFE_AFFE)
        );
        s.execute(Request::Reset).unwrap();
        s.execute(Request::Configure(0x0)).unwrap();
        s.execute(Request::Set(Register::Ctrl, 0x1)).unwrap();

        let mut last = Response::Done;
        for k in 0..16u32 {
            last = s
                .execute(Request::LoadSample(if k % 2 == 0 { 1500 } else { 500 }))
                .unwrap();
        }
        match last {
            Response::Status(status) => assert!(status.contains(Status::FULL)),
            other => panic!("unexpected {:?}", other),
        }

        s.execute(Request::Process).unwrap();
        assert_eq!(s.execute(Request::ReadResult).unwrap(), Response::Value(16));
        assert_eq!(s.execute(Request::ReadResult).unwrap(), Response::Value(0));
    }

    #[test]
    fn test_core_errors_pass_through() {
        let h = handle();
        let mut s = h.open_session().unwrap();
        assert!(matches!(
            s.execute(Request::Process),
            Err(HostError::Core(fftacc_core::Error::NotConfigured))
        ));
        assert!(matches!(
            s.execute(Request::Set(Register::Status, 0)),
            Err(HostError::Core(fftacc_core::Error::AccessDenied { offset: 0x14 }))
        ));
    }
}
