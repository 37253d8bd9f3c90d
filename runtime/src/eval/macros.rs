macro_rules! try_or_fail {
	( $e:expr ) => {
		match $e {
			Ok(v) => v,
			Err(e) => return Control::Exit(Err(e.into())),
		}
	};
}

macro_rules! pop_h256 {
	( $runtime:expr, $( $x:ident ),* ) => (
		$(
			let $x = match $runtime.machine.stack_mut().pop_h256() {
				Ok(value) => value,
				Err(e) => return Control::Exit(e.into()),
			};
		)*
	);
}

macro_rules! pop_u256 {
	( $runtime:expr, $( $x:ident ),* ) => (
		$(
			let $x = match $runtime.machine.stack_mut().pop() {
				Ok(value) => value,
				Err(e) => return Control::Exit(e.into()),
			};
		)*
	);
}

macro_rules! push_h256 {
	( $runtime:expr, $( $x:expr ),* ) => (
		$(
			match $runtime.machine.stack_mut().push_h256($x) {
				Ok(()) => (),
				Err(e) => return Control::Exit(e.into()),
			}
		)*
	)
}

macro_rules! push_u256 {
	( $runtime:expr, $( $x:expr ),* ) => (
		$(
			match $runtime.machine.stack_mut().push($x) {
				Ok(()) => (),
				Err(e) => return Control::Exit(e.into()),
			}
		)*
	)
}

macro_rules! as_usize_or_fail {
	( $v:expr ) => {{
		if $v > U256::from(usize::MAX) {
			return Control::Exit(ExitFatal::NotSupported.into());
		}

		$v.as_usize()
	}};
}
