use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ls8_machine::{Machine, MachineConfig, RunExit, MAX_MEMORY_SIZE};

const LDI: u8 = 0b1000_0010;
const PUSH: u8 = 0b0100_0101;
const POP: u8 = 0b0100_0110;
const HLT: u8 = 0b0000_0001;

/// Fill memory below the stack with PUSH/POP pairs and a trailing HLT.
fn stack_churn_program() -> (Vec<u8>, u64) {
    let mut program = vec![LDI, 0, 0x5A];
    let mut insts = 1u64;
    while program.len() + 5 <= 0xC0 {
        program.extend_from_slice(&[PUSH, 0, POP, 1]);
        insts += 2;
    }
    program.push(HLT);
    (program, insts)
}

fn bench_run_loop(c: &mut Criterion) {
    let (program, insts) = stack_churn_program();
    let cfg = MachineConfig {
        memory_size: MAX_MEMORY_SIZE,
        initial_stack_pointer: 0xF4,
        ..MachineConfig::default()
    };

    let mut group = c.benchmark_group("run_loop");
    group.throughput(Throughput::Elements(insts));
    group.bench_function("push_pop", |b| {
        let mut m = Machine::new(cfg.clone()).unwrap();
        b.iter(|| {
            m.reset();
            m.load(&program).unwrap();
            let exit = m.run();
            assert!(matches!(exit, RunExit::Halted { .. }));
            black_box(exit)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_run_loop);
criterion_main!(benches);
