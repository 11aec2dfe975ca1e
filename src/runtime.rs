use tokio::runtime::{Handle, RuntimeFlavor};



/// Runs blocking work from within an async context.
///
/// The actix-web workers are single-threaded runtimes, so in the server the closure always
/// runs in place. Only when the library is driven from a multi-threaded tokio runtime is the
/// worker handed over to the blocking pool first, so other tasks keep running.
pub async fn block_on<F, R>( func: F ) -> R where
	F: FnOnce() -> R,
{
	match Handle::try_current() {
		Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
			tokio::task::block_in_place( func )
		},
		_ => func()
	}
}
