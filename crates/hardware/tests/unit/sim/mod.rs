//! Simulator driver with the halting environment.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rvsmp_core::common::{MemoryError, PhysAddr};
use rvsmp_core::config::{Config, ConfigError};
use rvsmp_core::core::arch::csr;
use rvsmp_core::core::arch::mode::PrivilegeMode;
use rvsmp_core::core::hart::HartState;
use rvsmp_core::sim::{HaltingEnvironment, SimError};
use rvsmp_core::Simulator;

use crate::common::builder::instruction::*;
use crate::common::harness::{init_tracing, small_config, CODE_BASE};

const TIMEOUT: Duration = Duration::from_secs(10);
const COUNTER: u32 = 0x8000;

fn config(harts: usize) -> Config {
    let mut config = small_config(harts);
    config.system.start_pc = CODE_BASE;
    config
}

fn simulator(harts: usize, program: &[u32]) -> Simulator {
    init_tracing();
    let sim = Simulator::new(config(harts), HaltingEnvironment).unwrap();
    let bytes: Vec<u8> = program.iter().flat_map(|i| i.to_le_bytes()).collect();
    sim.load_image(u64::from(CODE_BASE), &bytes).unwrap();
    sim
}

/// Every hart bumps a shared counter, records its id in a slot on its own cache
/// line, makes an environment call, then hits an illegal word and stops.
fn count_and_stop() -> Vec<u32> {
    let mut program = li(10, COUNTER).to_vec();
    program.extend([
        addi(11, 0, 1),
        amoadd_w(0, 10, 11),
        csrrs(12, csr::MHARTID, 0),
        slli(13, 12, 6),
        add(13, 13, 10),
        sw(13, 12, 0x40),
        ECALL,
        addi(14, 0, 7),
        0,
    ]);
    program
}

#[test]
fn harts_run_until_an_unhandled_exception() {
    let mut sim = simulator(2, &count_and_stop());
    assert_eq!(sim.harts().len(), 2);
    sim.start().unwrap();
    assert_eq!(sim.handles().len(), 2);

    assert!(sim.wait_stopped(TIMEOUT));
    sim.join().unwrap();
    sim.flush().unwrap();

    let memory = sim.system().memory();
    assert_eq!(memory.load_word_physical(PhysAddr::new(u64::from(COUNTER))), Ok(2));
    assert_eq!(memory.load_word_physical(PhysAddr::new(u64::from(COUNTER) + 0x40)), Ok(0));
    assert_eq!(memory.load_word_physical(PhysAddr::new(u64::from(COUNTER) + 0x80)), Ok(1));

    for (id, hart) in sim.harts().iter().enumerate() {
        assert_eq!(hart.id(), id);
        assert_eq!(hart.state(), HartState::Stopped);
        assert_eq!(hart.privilege, PrivilegeMode::Machine);
        assert_eq!(hart.regs.read(14), 7);
        assert_eq!(hart.csrs.read(csr::MCAUSE), 2);
        assert_eq!(hart.csrs.read(csr::MTVAL), 0);
    }

    let stats = sim.stats();
    assert_eq!(stats.traps, 4);
    assert_eq!(stats.instret, 18);
    assert_eq!(stats.interrupts, 0);
}

#[test]
fn ebreak_falls_through() {
    let mut sim = simulator(1, &[EBREAK, addi(5, 0, 3), 0]);
    sim.start().unwrap();
    assert!(sim.wait_stopped(TIMEOUT));
    sim.join().unwrap();
    let hart = &sim.harts()[0];
    assert_eq!(hart.regs.read(5), 3);
    assert_eq!(hart.csrs.read(csr::MEPC), CODE_BASE + 8);
}

#[test]
fn idle_harts_are_woken_by_system_interrupts() {
    let mut sim = simulator(1, &[WFI, addi(6, 0, 9), 0]);
    sim.start().unwrap();
    assert!(sim.wait_idle(TIMEOUT));
    assert_eq!(sim.handles()[0].state(), HartState::NopLoop);

    assert!(sim.system().interrupt_matrix().raise_from_system(0, 0x5));
    assert!(sim.wait_stopped(TIMEOUT));
    sim.join().unwrap();

    let hart = &sim.harts()[0];
    assert_eq!(hart.regs.read(6), 9);
    assert_eq!(hart.interrupt_code(), 0x5);
    assert_eq!(hart.interrupted_by(), 1);
    assert_eq!(hart.stats().interrupts, 1);
}

#[test]
fn join_stops_spinning_harts() {
    let mut sim = simulator(2, &[jal(0, 0)]);
    sim.start().unwrap();
    sim.join().unwrap();
    assert!(sim.handles().is_empty());
    assert!(sim.harts().iter().all(|h| h.pc == CODE_BASE));
    assert_eq!(sim.system().wg_awake().count(), 0);
}

#[test]
fn parked_harts_can_be_seeded_and_restarted() {
    let mut sim = simulator(1, &[addi(7, 7, 1), 0]);
    sim.harts_mut()[0].regs.write(7, 40);
    sim.start().unwrap();
    assert!(sim.wait_stopped(TIMEOUT));
    sim.join().unwrap();
    assert_eq!(sim.harts()[0].regs.read(7), 41);

    sim.start().unwrap();
    assert!(sim.wait_stopped(TIMEOUT));
    sim.join().unwrap();
    assert_eq!(sim.harts()[0].regs.read(7), 42);
}

#[test]
fn dropping_the_simulator_stops_its_harts() {
    let mut sim = simulator(1, &[jal(0, 0)]);
    sim.start().unwrap();
    let system = Arc::clone(sim.system());
    drop(sim);
    assert_eq!(system.wg_awake().count(), 0);
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = Config::default();
    config.system.harts = 0;
    assert!(matches!(
        Simulator::new(config, HaltingEnvironment),
        Err(SimError::Config(ConfigError::Invalid { .. }))
    ));
}

#[test]
fn oversized_image_is_rejected() {
    let sim = simulator(1, &[]);
    assert!(matches!(
        sim.load_image(0, &vec![0; (1 << 20) + 1]),
        Err(SimError::Memory(MemoryError::OutOfRange { .. }))
    ));
}
