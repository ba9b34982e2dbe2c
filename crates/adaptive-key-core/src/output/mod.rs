// Adaptive Key Output Layer
// Executor seam, binding playback and the timed behavior queue

mod executor;
mod player;
mod queue;

pub use executor::{ActionExecutor, ExecutorCall, RecordingExecutor};
pub use player::{BindingSequencePlayer, PlaybackTiming, DEFAULT_TAP_MS, DEFAULT_WAIT_MS};
pub use queue::BehaviorQueue;
