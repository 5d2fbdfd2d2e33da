//! Focus-triggered auto-fill: policy, decision function, coordinator.

mod coordinator;
mod policy;

pub use {
    coordinator::{
        AccessibilityBridge, AutoFillCoordinator, AutoFillHandle, FillTrigger, SkipReason,
        evaluate,
    },
    policy::{AutoFillPolicy, FocusDescriptor},
};
