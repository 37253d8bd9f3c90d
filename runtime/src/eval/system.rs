use super::Control;
use crate::interrupt::Pending;
use crate::{
	CallInterrupt, CallScheme, Context, CreateInterrupt, CreateScheme, ExitError, ExitException,
	ExitFatal, ExitResult, ExitSucceed, Handler, Interrupt, Runtime, Transfer,
};
use alloc::vec::Vec;
use core::cmp::min;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

pub fn sha3<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, from, len);

	try_or_fail!(runtime.machine.memory_mut().resize_offset(from, len));
	let data = if len == U256::zero() {
		Vec::new()
	} else {
		let from = as_usize_or_fail!(from);
		let len = as_usize_or_fail!(len);

		runtime.machine.memory().get(from, len)
	};

	let ret = H256::from_slice(Keccak256::digest(data.as_slice()).as_slice());
	handler.preimage(ret, &data);
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn chainid<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.chain_id());

	Control::Continue
}

pub fn address(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.address);
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn balance<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.balance(address.into()));

	Control::Continue
}

pub fn origin<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	let ret = H256::from(handler.origin());
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn caller(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.caller);
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn callvalue(runtime: &mut Runtime) -> Control {
	let value = runtime.context.apparent_value;
	push_u256!(runtime, value);

	Control::Continue
}

pub fn gasprice<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.gas_price());

	Control::Continue
}

pub fn extcodesize<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.code_size(address.into()));

	Control::Continue
}

pub fn extcodecopy<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	pop_u256!(runtime, memory_offset, code_offset, len);

	try_or_fail!(runtime
		.machine
		.memory_mut()
		.resize_offset(memory_offset, len));
	match runtime.machine.memory_mut().copy_large(
		memory_offset,
		code_offset,
		len,
		&handler.code(address.into()),
	) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	};

	Control::Continue
}

pub fn returndatasize(runtime: &mut Runtime) -> Control {
	let size = U256::from(runtime.return_data_buffer.len());
	push_u256!(runtime, size);

	Control::Continue
}

pub fn returndatacopy(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, memory_offset, data_offset, len);

	try_or_fail!(runtime
		.machine
		.memory_mut()
		.resize_offset(memory_offset, len));
	if data_offset
		.checked_add(len)
		.map(|l| l > U256::from(runtime.return_data_buffer.len()))
		.unwrap_or(true)
	{
		return Control::Exit(ExitException::OutOfOffset.into());
	}

	match runtime.machine.memory_mut().copy_large(
		memory_offset,
		data_offset,
		len,
		&runtime.return_data_buffer,
	) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn blockhash<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_u256!(runtime, number);
	push_h256!(runtime, handler.block_hash(number));

	Control::Continue
}

pub fn coinbase<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_h256!(runtime, handler.block_coinbase().into());
	Control::Continue
}

pub fn timestamp<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_timestamp());
	Control::Continue
}

pub fn number<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_number());
	Control::Continue
}

pub fn gaslimit<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_gas_limit());
	Control::Continue
}

pub fn sload<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, index);
	let value = handler.storage(runtime.context.address, index);
	push_h256!(runtime, value);

	Control::Continue
}

pub fn sstore<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_h256!(runtime, index, value);

	match handler.set_storage(runtime.context.address, index, value) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn gas<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.gas_left());

	Control::Continue
}

pub fn log<H: Handler>(runtime: &mut Runtime, n: u8, handler: &mut H) -> Control {
	pop_u256!(runtime, offset, len);

	try_or_fail!(runtime.machine.memory_mut().resize_offset(offset, len));
	let data = if len == U256::zero() {
		Vec::new()
	} else {
		let offset = as_usize_or_fail!(offset);
		let len = as_usize_or_fail!(len);

		runtime.machine.memory().get(offset, len)
	};

	let mut topics = Vec::new();
	for _ in 0..(n as usize) {
		match runtime.machine.stack_mut().pop_h256() {
			Ok(value) => {
				topics.push(value);
			}
			Err(e) => return Control::Exit(e.into()),
		}
	}

	match handler.log(runtime.context.address, topics, data) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn suicide<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_h256!(runtime, target);

	match handler.mark_delete(runtime.context.address, target.into()) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	}

	Control::Exit(ExitSucceed::Suicided.into())
}

pub fn create(runtime: &mut Runtime, is_create2: bool) -> Control {
	runtime.return_data_buffer = Vec::new();

	pop_u256!(runtime, value, code_offset, len);

	try_or_fail!(runtime.machine.memory_mut().resize_offset(code_offset, len));
	let code = if len == U256::zero() {
		Vec::new()
	} else {
		let code_offset = as_usize_or_fail!(code_offset);
		let len = as_usize_or_fail!(len);

		runtime.machine.memory().get(code_offset, len)
	};

	let scheme = if is_create2 {
		pop_h256!(runtime, salt);
		let code_hash = H256::from_slice(Keccak256::digest(&code).as_slice());
		CreateScheme::Create2 {
			caller: runtime.context.address,
			salt,
			code_hash,
		}
	} else {
		CreateScheme::Legacy {
			caller: runtime.context.address,
		}
	};

	runtime.pending = Some(Pending::Create);
	Control::Interrupt(Interrupt::Create(CreateInterrupt {
		caller: runtime.context.address,
		scheme,
		value,
		init_code: code,
	}))
}

pub fn finish_create(
	runtime: &mut Runtime,
	reason: ExitResult,
	address: Option<H160>,
	return_data: Vec<u8>,
) -> Control {
	// Only a revert hands its output back as return data.
	if reason == Err(ExitError::Reverted) {
		runtime.return_data_buffer = return_data;
	}

	match reason {
		Ok(_) => {
			push_h256!(runtime, address.map(H256::from).unwrap_or_default());
			Control::Continue
		}
		Err(ExitError::Reverted) | Err(ExitError::Exception(_)) => {
			push_h256!(runtime, H256::default());
			Control::Continue
		}
		Err(ExitError::Fatal(e)) => {
			push_h256!(runtime, H256::default());
			Control::Exit(e.into())
		}
	}
}

pub fn call(runtime: &mut Runtime, scheme: CallScheme) -> Control {
	runtime.return_data_buffer = Vec::new();

	// The requested gas was already settled by the handler's pre-validation.
	pop_u256!(runtime, _gas);
	pop_h256!(runtime, to);

	let value = match scheme {
		CallScheme::Call | CallScheme::CallCode => {
			pop_u256!(runtime, value);
			value
		}
		CallScheme::DelegateCall | CallScheme::StaticCall => U256::zero(),
	};

	pop_u256!(runtime, in_offset, in_len, out_offset, out_len);

	try_or_fail!(runtime
		.machine
		.memory_mut()
		.resize_offset(in_offset, in_len));
	try_or_fail!(runtime
		.machine
		.memory_mut()
		.resize_offset(out_offset, out_len));

	let input = if in_len == U256::zero() {
		Vec::new()
	} else {
		let in_offset = as_usize_or_fail!(in_offset);
		let in_len = as_usize_or_fail!(in_len);

		runtime.machine.memory().get(in_offset, in_len)
	};

	let context = match scheme {
		CallScheme::Call | CallScheme::StaticCall => Context {
			address: to.into(),
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::CallCode => Context {
			address: runtime.context.address,
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::DelegateCall => Context {
			address: runtime.context.address,
			caller: runtime.context.caller,
			apparent_value: runtime.context.apparent_value,
		},
	};

	let transfer = match scheme {
		CallScheme::Call => Some(Transfer {
			source: runtime.context.address,
			target: to.into(),
			value,
		}),
		CallScheme::CallCode => Some(Transfer {
			source: runtime.context.address,
			target: runtime.context.address,
			value,
		}),
		CallScheme::DelegateCall | CallScheme::StaticCall => None,
	};

	runtime.pending = Some(Pending::Call {
		out_offset,
		out_len,
	});
	Control::Interrupt(Interrupt::Call(CallInterrupt {
		code_address: to.into(),
		transfer,
		input,
		is_static: scheme == CallScheme::StaticCall,
		context,
	}))
}

pub fn finish_call(
	runtime: &mut Runtime,
	out_offset: U256,
	out_len: U256,
	reason: ExitResult,
	return_data: Vec<u8>,
) -> Control {
	runtime.return_data_buffer = return_data;
	let target_len = min(out_len, U256::from(runtime.return_data_buffer.len()));

	match reason {
		Ok(_) | Err(ExitError::Reverted) => {
			let copied = runtime.machine.memory_mut().copy_large(
				out_offset,
				U256::zero(),
				target_len,
				&runtime.return_data_buffer[..],
			);
			if reason.is_ok() && copied.is_ok() {
				push_u256!(runtime, U256::one());
			} else {
				push_u256!(runtime, U256::zero());
			}
			Control::Continue
		}
		Err(ExitError::Exception(_)) => {
			push_u256!(runtime, U256::zero());
			Control::Continue
		}
		Err(ExitError::Fatal(e)) => {
			push_u256!(runtime, U256::zero());
			Control::Exit(e.into())
		}
	}
}
