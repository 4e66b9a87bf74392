use std::time::Duration;

pub use datazone_pipeline_core::retry::Sleeper;

/// Blocks the invocation for the whole delay; retries have nothing else to
/// do in the meantime.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockingSleeper;

impl Sleeper for BlockingSleeper {
    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::task::block_in_place(|| std::thread::sleep(duration));
    }
}
