// Adaptive Key Action Executor Seam
// Interface to whatever turns bindings into key effects, plus a recording executor

use std::fmt;

use crate::binding::Binding;

/// Downstream consumer of bindings.
///
/// `invoke` takes effect immediately. `enqueue` appends to a FIFO of timed
/// actions; `delay_ms` is the pause after the action runs before the next
/// queued action starts.
pub trait ActionExecutor {
    fn invoke(&mut self, binding: &Binding, pressed: bool);

    fn enqueue(&mut self, binding: &Binding, pressed: bool, delay_ms: u32);
}

impl<E: ActionExecutor + ?Sized> ActionExecutor for &mut E {
    fn invoke(&mut self, binding: &Binding, pressed: bool) {
        (**self).invoke(binding, pressed)
    }

    fn enqueue(&mut self, binding: &Binding, pressed: bool, delay_ms: u32) {
        (**self).enqueue(binding, pressed, delay_ms)
    }
}

/// One call made against an executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorCall {
    Invoke {
        binding: Binding,
        pressed: bool,
    },
    Enqueue {
        binding: Binding,
        pressed: bool,
        delay_ms: u32,
    },
}

impl ExecutorCall {
    pub fn binding(&self) -> &Binding {
        match self {
            ExecutorCall::Invoke { binding, .. } | ExecutorCall::Enqueue { binding, .. } => binding,
        }
    }

    pub fn pressed(&self) -> bool {
        match self {
            ExecutorCall::Invoke { pressed, .. } | ExecutorCall::Enqueue { pressed, .. } => {
                *pressed
            }
        }
    }

    pub fn is_enqueue(&self) -> bool {
        matches!(self, ExecutorCall::Enqueue { .. })
    }
}

impl fmt::Display for ExecutorCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |pressed: bool| if pressed { "press" } else { "release" };
        match self {
            ExecutorCall::Invoke { binding, pressed } => {
                write!(f, "invoke  {} {}", binding, state(*pressed))
            }
            ExecutorCall::Enqueue {
                binding,
                pressed,
                delay_ms,
            } => write!(
                f,
                "enqueue {} {} (wait {}ms)",
                binding,
                state(*pressed),
                delay_ms
            ),
        }
    }
}

/// Executor that only records what it was asked to do
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    calls: Vec<ExecutorCall>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[ExecutorCall] {
        &self.calls
    }

    /// Take the recorded calls, leaving the record empty
    pub fn drain(&mut self) -> Vec<ExecutorCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl ActionExecutor for RecordingExecutor {
    fn invoke(&mut self, binding: &Binding, pressed: bool) {
        self.calls.push(ExecutorCall::Invoke {
            binding: binding.clone(),
            pressed,
        });
    }

    fn enqueue(&mut self, binding: &Binding, pressed: bool, delay_ms: u32) {
        self.calls.push(ExecutorCall::Enqueue {
            binding: binding.clone(),
            pressed,
            delay_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_executor_keeps_order() {
        let a: Binding = "&kp A".parse().unwrap();
        let b: Binding = "&kp B".parse().unwrap();
        let mut exec = RecordingExecutor::new();

        exec.enqueue(&a, true, 5);
        exec.invoke(&b, false);

        assert_eq!(exec.calls().len(), 2);
        assert!(exec.calls()[0].is_enqueue());
        assert_eq!(exec.calls()[1].binding(), &b);
        assert!(!exec.calls()[1].pressed());
        assert_eq!(exec.calls()[0].to_string(), "enqueue &kp A press (wait 5ms)");

        let drained = exec.drain();
        assert_eq!(drained.len(), 2);
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_mut_ref_forwards() {
        let a: Binding = "&kp A".parse().unwrap();
        let mut exec = RecordingExecutor::new();
        {
            let mut forward = &mut exec;
            ActionExecutor::invoke(&mut forward, &a, true);
        }
        assert_eq!(
            exec.calls(),
            &[ExecutorCall::Invoke {
                binding: a,
                pressed: true
            }]
        );
    }
}
