use criterion::{criterion_group, criterion_main, Criterion};
use kvm::backend::{MemoryStateDb, StateDB};
use kvm::executor::{Kvm, Precompiles};
use kvm::{BlockContext, Config};
use primitive_types::{H160, U256};

// Counts down from 0x1000 on the stack.
const LOOP: &str = "6110005b6001900380600357";

fn run_loop(config: &Config, precompiles: &Precompiles, code: &[u8]) {
	let mut state = MemoryStateDb::new();
	state.set_code(H160::from_low_u64_be(0xa), code.to_vec());

	let mut kvm = Kvm::new(BlockContext::default(), state, config, precompiles);
	let (reason, _, _) = kvm.call(
		H160::from_low_u64_be(0xca11),
		H160::from_low_u64_be(0xa),
		Vec::new(),
		u64::MAX,
		U256::zero(),
	);
	assert!(reason.is_ok());
}

fn criterion_benchmark(c: &mut Criterion) {
	let config = Config::kardia();
	let precompiles = Precompiles::new();
	let code = hex::decode(LOOP).unwrap();

	c.bench_function("loop", |b| b.iter(|| run_loop(&config, &precompiles, &code)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
