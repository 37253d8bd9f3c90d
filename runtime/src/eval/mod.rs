#[macro_use]
mod macros;
mod system;

use crate::{CallScheme, ExitException, ExitResult, Handler, Interrupt, Opcode, Runtime};

pub use self::system::{finish_call, finish_create};

pub enum Control {
	Continue,
	Exit(ExitResult),
	Interrupt(Interrupt),
}

pub fn eval<H: Handler>(state: &mut Runtime, opcode: Opcode, handler: &mut H) -> Control {
	match opcode {
		Opcode::SHA3 => system::sha3(state, handler),
		Opcode::ADDRESS => system::address(state),
		Opcode::BALANCE => system::balance(state, handler),
		Opcode::ORIGIN => system::origin(state, handler),
		Opcode::CALLER => system::caller(state),
		Opcode::CALLVALUE => system::callvalue(state),
		Opcode::GASPRICE => system::gasprice(state, handler),
		Opcode::EXTCODESIZE => system::extcodesize(state, handler),
		Opcode::EXTCODECOPY => system::extcodecopy(state, handler),
		Opcode::RETURNDATASIZE => system::returndatasize(state),
		Opcode::RETURNDATACOPY => system::returndatacopy(state),
		Opcode::BLOCKHASH => system::blockhash(state, handler),
		Opcode::COINBASE => system::coinbase(state, handler),
		Opcode::TIMESTAMP => system::timestamp(state, handler),
		Opcode::NUMBER => system::number(state, handler),
		Opcode::GASLIMIT => system::gaslimit(state, handler),
		Opcode::CHAINID => system::chainid(state, handler),
		Opcode::SLOAD => system::sload(state, handler),
		Opcode::SSTORE => system::sstore(state, handler),
		Opcode::GAS => system::gas(state, handler),
		Opcode::LOG0 => system::log(state, 0, handler),
		Opcode::LOG1 => system::log(state, 1, handler),
		Opcode::LOG2 => system::log(state, 2, handler),
		Opcode::LOG3 => system::log(state, 3, handler),
		Opcode::LOG4 => system::log(state, 4, handler),
		Opcode::SUICIDE => system::suicide(state, handler),
		Opcode::CREATE => system::create(state, false),
		Opcode::CREATE2 => system::create(state, true),
		Opcode::CALL => system::call(state, CallScheme::Call),
		Opcode::CALLCODE => system::call(state, CallScheme::CallCode),
		Opcode::DELEGATECALL => system::call(state, CallScheme::DelegateCall),
		Opcode::STATICCALL => system::call(state, CallScheme::StaticCall),
		_ => Control::Exit(ExitException::InvalidOpcode(opcode).into()),
	}
}
