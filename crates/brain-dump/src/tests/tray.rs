use crate::{TrayIconState, tray_manager::icon_rgba};

use brain_dump_core::PipelineState;

/// WHAT: Generated icons are full 32x32 RGBA buffers
/// WHY: tray-icon rejects buffers that do not match the declared size
#[test]
fn given_each_state_when_rendering_icon_then_buffer_is_32x32_rgba() {
    for state in [
        TrayIconState::Idle,
        TrayIconState::Recording,
        TrayIconState::Processing,
        TrayIconState::Error,
    ] {
        let rgba = icon_rgba(state);
        assert_eq!(rgba.len(), 32 * 32 * 4);
        // the disc center is opaque, the corner transparent
        let center = ((16 * 32 + 16) * 4) as usize;
        assert_eq!(rgba[center + 3], 255);
        assert_eq!(rgba[3], 0);
    }
}

/// WHAT: Each state renders a distinct color
/// WHY: The disc color is the only at-a-glance status signal
#[test]
fn given_different_states_when_rendered_then_colors_differ() {
    let center = ((16 * 32 + 16) * 4) as usize;
    let pixel = |state: TrayIconState| {
        let rgba = icon_rgba(state);
        [rgba[center], rgba[center + 1], rgba[center + 2]]
    };

    let idle = pixel(TrayIconState::Idle);
    let recording = pixel(TrayIconState::Recording);
    let processing = pixel(TrayIconState::Processing);
    let error = pixel(TrayIconState::Error);

    assert_ne!(idle, recording);
    assert_ne!(recording, processing);
    assert_ne!(processing, error);
    assert_ne!(error, idle);
}

/// WHAT: Pipeline states map onto the four tray states
/// WHY: The tray adapter renders whatever the machine broadcasts
#[test]
fn given_pipeline_states_when_mapped_then_tray_states_match() {
    assert_eq!(
        TrayIconState::from(&PipelineState::Idle),
        TrayIconState::Idle
    );
    assert_eq!(
        TrayIconState::from(&PipelineState::Recording),
        TrayIconState::Recording
    );
    assert_eq!(
        TrayIconState::from(&PipelineState::Processing),
        TrayIconState::Processing
    );
    assert_eq!(
        TrayIconState::from(&PipelineState::Error("boom".to_string())),
        TrayIconState::Error
    );
}
