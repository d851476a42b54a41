//! Boundary decision table
//!
//! Classifies one sensor frame into at most one boundary event. The
//! table is evaluated in fixed priority order and the first match wins;
//! a frame with both a bumper hit and a cliff signal in band reports the
//! bumper.
//!
//! Tape and destination bands overlap numerically across different
//! channels: the same raw signal range means boundary tape on one
//! physical sensor and docking target on another. Channel identity, not
//! the number, disambiguates; keep the table ordered when editing.

use crate::config::BoundaryConfig;
use crate::core::types::{BoundaryEvent, SensorFrame};

/// Classify one frame. Pure; recovery maneuvers are the controller's job.
pub fn classify(frame: &SensorFrame, bands: &BoundaryConfig) -> BoundaryEvent {
    use BoundaryEvent::*;

    let table = [
        (frame.bumper_left, BumperLeft),
        (frame.bumper_right, BumperRight),
        (frame.cliff_left, CliffLeft),
        (frame.cliff_right, CliffRight),
        (frame.cliff_front_left, CliffFrontLeft),
        (frame.cliff_front_right, CliffFrontRight),
        (bands.tape_left.contains(frame.cliff_left_signal), TapeLeft),
        (bands.tape_right.contains(frame.cliff_right_signal), TapeRight),
        (
            bands.tape_front_left.contains(frame.cliff_front_left_signal),
            TapeFrontLeft,
        ),
        (
            bands
                .tape_front_right
                .contains(frame.cliff_front_right_signal),
            TapeFrontRight,
        ),
        (
            bands.destination_left.contains(frame.cliff_left_signal),
            DestinationLeft,
        ),
        (
            bands.destination_right.contains(frame.cliff_right_signal),
            DestinationRight,
        ),
        (
            bands
                .destination_front_left
                .contains(frame.cliff_front_left_signal),
            DestinationFrontLeft,
        ),
        (
            bands
                .destination_front_right
                .contains(frame.cliff_front_right_signal),
            DestinationFrontRight,
        ),
    ];

    table
        .iter()
        .find(|(matched, _)| *matched)
        .map(|(_, event)| *event)
        .unwrap_or(None)
}
