//! Multi-instance and interrupt tests through the host layer

use fftacc_core::{Register, SampleMode, Status};
use fftacc_host::{DeviceRegistry, HostConfig, HostError, Request, Response};
use std::sync::Arc;
use std::thread;

const CONFIG: &str = r#"
[poll]
max_polls = 100

[[accelerator]]
instance = 0
irq = true

[[accelerator]]
instance = 1
device_id = "0xFACECAFE"
addressing = "word"
"#;

fn alternating() -> Vec<i32> {
    (0..16).map(|k| if k % 2 == 0 { 1500 } else { 500 }).collect()
}

#[test]
fn instances_are_independent() {
    let config = HostConfig::from_toml_str(CONFIG).unwrap();
    let registry = DeviceRegistry::from_config(&config).unwrap();

    let a = registry.get(0).unwrap();
    let b = registry.get(1).unwrap();
    assert_eq!(a.read_register(Register::DevId).unwrap(), 0xCAFE_AFFE);
    assert_eq!(b.read_register(Register::DevId).unwrap(), 0xFACE_CAFE);

    // Half-load instance 0, then run a full session on instance 1
    let mut sa = a.open_session().unwrap();
    sa.execute(Request::Configure(0)).unwrap();
    sa.execute(Request::Set(Register::Ctrl, 1)).unwrap();
    for _ in 0..5 {
        sa.execute(Request::LoadSample(1)).unwrap();
    }

    let mut sb = b.open_session().unwrap();
    let out = sb.run(SampleMode::Bits32, &alternating()).unwrap();
    assert_eq!(out, vec![16, 0, 0, 0, 0, 0, 0, 0]);

    // Instance 0 still holds its partial load
    assert_eq!(
        sa.execute(Request::Get(Register::Cfg0)).unwrap(),
        Response::Value(0)
    );
    assert!(matches!(
        sa.execute(Request::Configure(0x2)),
        Err(HostError::Core(fftacc_core::Error::SessionInProgress))
    ));
}

#[test]
fn one_interrupt_per_completion() {
    let config = HostConfig::from_toml_str(CONFIG).unwrap();
    let registry = DeviceRegistry::from_config(&config).unwrap();
    let handle = registry.get(0).unwrap();
    let latch = handle.irq().cloned().unwrap();

    let mut s = handle.open_session().unwrap();
    s.execute(Request::Reset).unwrap();
    s.execute(Request::Configure(0)).unwrap();
    s.execute(Request::Set(Register::Ctrl, 0b11)).unwrap();
    assert_eq!(latch.take_edges(), 0);

    for k in 0..16u32 {
        s.execute(Request::LoadSample(k)).unwrap();
        // Each SCPLT raises once, the poll's STATUS read lowers it
        assert_eq!(latch.take_edges(), 1, "sample {}", k);
        assert!(!latch.asserted());
    }

    s.execute(Request::Process).unwrap();
    assert_eq!(latch.take_edges(), 1);

    // Without a STATUS read the line stays up and no new edge appears
    s.execute(Request::Set(Register::Ctrl, 0b0110)).unwrap();
    assert!(latch.asserted());
    s.execute(Request::Set(Register::Ctrl, 0b0110)).unwrap();
    assert_eq!(latch.take_edges(), 1);

    match s.execute(Request::Get(Register::Status)).unwrap() {
        Response::Value(v) => assert!(Status::from_bits_truncate(v).contains(Status::SCPLT)),
        other => panic!("unexpected {:?}", other),
    }
    assert!(!latch.asserted());
}

#[test]
fn sessions_exclude_each_other_across_threads() {
    let config = HostConfig::from_toml_str(CONFIG).unwrap();
    let registry = DeviceRegistry::from_config(&config).unwrap();
    let handle = registry.get(1).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            thread::spawn(move || loop {
                match handle.open_session() {
                    Ok(mut session) => break session.run(SampleMode::Bits16, &alternating()),
                    Err(HostError::Busy(_)) => thread::yield_now(),
                    Err(e) => break Err(e),
                }
            })
        })
        .collect();

    for worker in workers {
        let out = worker.join().unwrap().unwrap();
        assert_eq!(out[0], 32);
        assert!(out[1..].iter().all(|&v| v == 0));
    }
}
