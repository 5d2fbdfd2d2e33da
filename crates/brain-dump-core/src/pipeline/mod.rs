//! Pipeline state machine: the orchestration core.

mod machine;
mod state;

pub use {
    machine::{PipelineHandle, PipelineMachine},
    state::{PipelineState, ResultPayload, ResultStatus, StateChange},
};
