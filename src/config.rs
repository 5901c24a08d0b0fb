use std::ops::ControlFlow;

use crate::Error;

/// Default initial buffer capacity
pub const DEFAULT_BUFFER_CAP: usize = 35000;

/// What the decoder does when a single part fails to split or decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing part and keep what was decoded before it.
    #[default]
    AbortRemaining,
    /// Drop the failing part and carry on with the next one.
    SkipPart,
}

impl FailurePolicy {
    pub(crate) fn on_failure(self, index: usize, e: &Error) -> ControlFlow<()> {
        match self {
            FailurePolicy::AbortRemaining => {
                log::warn!("Part {} failed, ignoring the remaining parts: {}", index, e);
                ControlFlow::Break(())
            }
            FailurePolicy::SkipPart => {
                log::warn!("Part {} failed, skipping it: {}", index, e);
                ControlFlow::Continue(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    pub failure_policy: FailurePolicy,
    /// Initial capacity of the buffer a body is read into.
    pub buffer_capacity: usize,
    /// Upper bound on the number of body bytes read, unbounded when `None`.
    pub max_body_size: Option<usize>,
    /// Discard everything up to the boundary token in a header block and
    /// report blocks lacking it, the way on-wire producers that leave a
    /// boundary remnant in front of the first header expect.
    pub strip_boundary_remnant: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            buffer_capacity: DEFAULT_BUFFER_CAP,
            max_body_size: None,
            strip_boundary_remnant: false,
        }
    }
}

impl DecoderConfig {
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn max_body_size(mut self, max: usize) -> Self {
        self.max_body_size = Some(max);
        self
    }

    pub fn strip_boundary_remnant(mut self, strip: bool) -> Self {
        self.strip_boundary_remnant = strip;
        self
    }

    /// Initial buffer capacity, never above the size limit.
    pub(crate) fn initial_capacity(&self) -> usize {
        match self.max_body_size {
            Some(max) => self.buffer_capacity.min(max),
            None => self.buffer_capacity,
        }
    }

    pub(crate) fn check_size(&self, len: usize) -> Result<(), Error> {
        match self.max_body_size {
            Some(max) if len > max => Err(Error::PayloadTooLarge(max)),
            _ => Ok(()),
        }
    }
}
