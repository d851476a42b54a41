//! DishaIO - Teleoperated rover console
//!
//! Reads single-byte commands from stdin and executes each one to
//! completion against the perception/motion stack:
//!
//! - `q`/`w`/`e`: forward 100/200/300 cm, watching for boundaries
//! - `s`: backward 100 cm
//! - `a`/`d`: turn 10 degrees CCW/CW, `z`/`c`: 5 degrees
//! - `x`: turn 180 degrees CCW
//! - `g`: servo sweep, report detected objects
//! - `r`: report the raw sensor frame
//! - `1`/`2`: multi-leg bumper avoidance, CCW/CW
//! - `Q`: quit

mod capture;
mod config;
mod core;
mod devices;
mod error;
mod motion;
mod ranging;
mod status;
mod sweep;

use crate::capture::EdgeTimer;
use crate::config::AppConfig;
use crate::core::types::{BoundaryEvent, TurnDirection};
use crate::devices::mock::{MockAdcChannel, MockDrive, MockServo, MockSonarTransducer};
use crate::error::Result;
use crate::motion::MovementController;
use crate::ranging::{IrRanger, SonarRanger};
use crate::status::{format_frame, format_object, LogStatusSink};
use crate::sweep::SweepScanner;
use std::env;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `disha-io <path>` (positional)
/// - `disha-io --config <path>` (flag-based)
/// - `disha-io -c <path>` (short flag)
///
/// Defaults to `/etc/dishaio.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    // Default path
    "/etc/dishaio.toml".to_string()
}

/// Assemble the ranging/motion stack over the mock rig.
///
/// The mock drive synthesizes encoder feedback from commanded speeds and
/// the mock sonar/ADC replay a fixed mid-range target, so every command
/// is exercisable without hardware attached.
fn build_rig(config: &AppConfig) -> (MovementController, SweepScanner) {
    let drive = MockDrive::new();
    let controller = MovementController::new(
        Box::new(drive),
        Box::new(LogStatusSink),
        config.drive.clone(),
        config.boundary.clone(),
    );

    let (timer, handle) = EdgeTimer::new(Duration::from_millis(config.sonar.echo_timeout_ms));
    let transducer = MockSonarTransducer::new(handle);
    // constant echo at ~40cm round trip
    transducer.set_fallback_echo(0, 8200, 0);

    let adc = MockAdcChannel::new();
    adc.set_fallback_reading(180);

    let scanner = SweepScanner::new(
        Box::new(MockServo::new()),
        SonarRanger::new(Box::new(transducer), timer, config.sonar.clone()),
        IrRanger::new(Box::new(adc), config.ir.clone()),
        config.sweep.clone(),
    );

    (controller, scanner)
}

/// After a forward leg ends on a destination band, square up toward the
/// detected side and close the remaining distance.
fn converge_on_destination(
    controller: &mut MovementController,
    event: BoundaryEvent,
) -> Result<()> {
    let (direction, degrees) = match event {
        BoundaryEvent::DestinationLeft => (TurnDirection::CounterClockwise, 55),
        BoundaryEvent::DestinationRight => (TurnDirection::Clockwise, 55),
        BoundaryEvent::DestinationFrontLeft => (TurnDirection::CounterClockwise, 20),
        BoundaryEvent::DestinationFrontRight => (TurnDirection::Clockwise, 20),
        _ => return Ok(()),
    };
    controller.turn(direction, degrees)?;
    controller.drive_forward(15)?;
    Ok(())
}

/// Forward leg with destination handling. Returns true when the
/// destination has been reached and the session should end.
fn forward_leg(controller: &mut MovementController, distance_cm: u32) -> Result<bool> {
    match controller.drive_forward(distance_cm)? {
        Some(event) if event.is_destination() => {
            log::info!("main: destination detected ({})", event.describe());
            converge_on_destination(controller, event)?;
            Ok(true)
        }
        Some(event) => {
            log::info!("main: leg interrupted by {}", event.describe());
            Ok(false)
        }
        None => Ok(false),
    }
}

/// Multi-leg avoidance: turn 90 off the obstacle, then step back toward
/// the original track as long as each leg completes cleanly.
fn avoidance_maneuver(controller: &mut MovementController, first: TurnDirection) -> Result<()> {
    let back = match first {
        TurnDirection::Clockwise => TurnDirection::CounterClockwise,
        TurnDirection::CounterClockwise => TurnDirection::Clockwise,
    };
    controller.turn(first, 90)?;
    if controller.drive_forward(250)?.is_none() {
        controller.turn(back, 50)?;
        if controller.drive_forward(250)?.is_none() {
            controller.turn(back, 40)?;
            controller.drive_forward(200)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Get config path from args or default
    let config_path = parse_config_path();
    let (config, loaded) = if Path::new(&config_path).exists() {
        (AppConfig::from_file(&config_path)?, true)
    } else {
        (AppConfig::commissioning_defaults(), false)
    };

    // Initialize logger; RUST_LOG overrides the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("DishaIO v0.1.0 starting...");
    if loaded {
        log::info!("Using config: {}", config_path);
    } else {
        log::info!("No config at {}, using commissioning defaults", config_path);
    }

    let (mut controller, mut scanner) = build_rig(&config);

    log::info!("Ready for commands (Q to quit)");

    let mut stdin = std::io::stdin();
    let mut byte = [0u8; 1];
    loop {
        if stdin.read(&mut byte)? == 0 {
            log::info!("main: stdin closed, exiting");
            break;
        }
        let done = match byte[0] {
            b'q' => forward_leg(&mut controller, 100)?,
            b'w' => forward_leg(&mut controller, 200)?,
            b'e' => forward_leg(&mut controller, 300)?,
            b's' => {
                controller.drive_backward(100)?;
                false
            }
            b'a' => {
                controller.turn(TurnDirection::CounterClockwise, 10)?;
                false
            }
            b'd' => {
                controller.turn(TurnDirection::Clockwise, 10)?;
                false
            }
            b'z' => {
                controller.turn(TurnDirection::CounterClockwise, 5)?;
                false
            }
            b'c' => {
                controller.turn(TurnDirection::Clockwise, 5)?;
                false
            }
            b'x' => {
                controller.turn(TurnDirection::CounterClockwise, 180)?;
                false
            }
            b'g' => {
                let objects = scanner.sweep()?;
                log::info!("main: sweep found {} object(s)", objects.len());
                for obj in &objects {
                    log::info!("main: {}", format_object(obj));
                }
                false
            }
            b'r' => {
                let frame = controller.read_sensors()?;
                log::info!("main: {}", format_frame(&frame));
                let sample = scanner.sample()?;
                log::info!(
                    "main: Range(sonar: {:.2}cm  ir: {:.2}cm)",
                    sample.sonar_distance_cm,
                    sample.ir_distance_cm
                );
                false
            }
            b'1' => {
                avoidance_maneuver(&mut controller, TurnDirection::CounterClockwise)?;
                false
            }
            b'2' => {
                avoidance_maneuver(&mut controller, TurnDirection::Clockwise)?;
                false
            }
            b'Q' => true,
            b' ' | b'\n' | b'\r' | b'\t' => false,
            other => {
                log::warn!("main: unknown command byte 0x{:02x}", other);
                false
            }
        };
        if done {
            break;
        }
    }

    log::info!("DishaIO shutting down");
    Ok(())
}
