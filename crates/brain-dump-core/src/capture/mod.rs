//! External capture process: line protocol and supervision.

pub(crate) mod protocol;
mod supervisor;

pub use {
    protocol::{ProtocolEvent, parse_line},
    supervisor::{
        CaptureEvent, CaptureHandle, CaptureSupervisor, RestartPolicy, SupervisorStatus,
        restart_delay,
    },
};

pub(crate) use supervisor::CaptureCommand;
