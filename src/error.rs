use failure::{
	Context,
	Error,
	Fail,
};

/// Classes of failure a programming run can end with.
///
/// Transport level errors are wrapped as `Context<ErrorKind>` around the
/// underlying driver error, so the driver's status is kept in the chain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Fail)]
pub enum ErrorKind {
	#[fail(display = "device open failed")]
	DeviceOpenFailed,
	#[fail(display = "bit mode switch failed")]
	ModeSwitchFailed,
	#[fail(display = "transport write failed")]
	TransportWriteFailed,
	#[fail(display = "transport read failed")]
	TransportReadFailed,
	#[fail(display = "input unavailable")]
	InputUnavailable,
}

impl ErrorKind {
	/// wrap `cause` so that `kind_of` finds `self` in its chain
	pub fn wrap<E>(self, cause: E) -> Error
	where
		E: Into<Error>,
	{
		let cause: Error = cause.into();
		Error::from(cause.context(self))
	}
}

/// First `ErrorKind` found walking the cause chain of `e`.
pub fn kind_of(e: &Error) -> Option<ErrorKind> {
	for fail in e.iter_chain() {
		if let Some(ctx) = fail.downcast_ref::<Context<ErrorKind>>() {
			return Some(*ctx.get_context());
		}
		if let Some(kind) = fail.downcast_ref::<ErrorKind>() {
			return Some(*kind);
		}
	}
	None
}
