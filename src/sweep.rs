//! Rotational sweep and object segmentation
//!
//! Drives the rangefinder servo through the sweep arc one degree at a
//! time, samples both rangefinders at every step, and segments the IR
//! distance trace into discrete objects. IR is traced at half the sweep
//! resolution (one slot per two degrees), matching the sensor's useful
//! angular resolution.

use crate::config::SweepConfig;
use crate::core::types::{DetectedObject, RangeSample};
use crate::devices::ServoPositioner;
use crate::error::{Error, Result};
use crate::ranging::{IrRanger, SonarRanger};
use std::thread;
use std::time::Duration;

/// Segments a per-degree IR distance trace into detection episodes.
///
/// An episode opens on the transition from outside the object-present
/// band into it, and closes on the transition back out. The transition
/// requirement is the hysteresis: a single in-band sample with no
/// out-of-band neighbor on each side never opens and closes an episode
/// by itself. An episode still open when the trace ends is dropped.
pub struct Segmenter {
    band_near_cm: f64,
    band_far_cm: f64,
    max_objects: usize,
    previous_cm: f64,
    open_start_deg: Option<u32>,
    objects: Vec<DetectedObject>,
}

impl Segmenter {
    pub fn new(config: &SweepConfig) -> Self {
        Self {
            band_near_cm: config.band_near_cm,
            band_far_cm: config.band_far_cm,
            max_objects: config.max_objects,
            // seed outside the band so a sweep that starts on an object
            // opens an episode at step 0
            previous_cm: 0.0,
            open_start_deg: None,
            objects: Vec::new(),
        }
    }

    fn in_band(&self, distance_cm: f64) -> bool {
        distance_cm > self.band_near_cm && distance_cm < self.band_far_cm
    }

    /// Feed one sweep step.
    ///
    /// `sonar_cm` is the sonar reading taken at this step; `ir_trace` is
    /// the half-resolution IR trace filled up to this step, indexed by
    /// `degree / 2`. An episode closing here emits an object whose IR
    /// distance is looked up from the trace at the episode's center.
    pub fn observe(
        &mut self,
        step_deg: u32,
        ir_cm: f64,
        sonar_cm: f64,
        ir_trace: &[f64],
    ) -> Result<()> {
        let previous = self.previous_cm;
        self.previous_cm = ir_cm;

        if !self.in_band(previous) && self.in_band(ir_cm) {
            self.open_start_deg = Some(step_deg);
            log::debug!("Segmenter: episode opened at {} deg ({:.2}cm)", step_deg, ir_cm);
        } else if self.in_band(previous) && !self.in_band(ir_cm) {
            if let Some(start_deg) = self.open_start_deg.take() {
                if self.objects.len() >= self.max_objects {
                    return Err(Error::CapacityExceeded {
                        limit: self.max_objects,
                    });
                }

                let center_angle_deg = (start_deg + step_deg) / 2;
                let angular_width_deg = step_deg - start_deg;
                let ir_distance_cm = ir_trace[(center_angle_deg / 2) as usize];
                let object = DetectedObject {
                    sequence_index: self.objects.len(),
                    center_angle_deg,
                    angular_width_deg,
                    sonar_distance_cm: sonar_cm,
                    ir_distance_cm,
                    linear_width_cm: DetectedObject::linear_width(sonar_cm, angular_width_deg),
                };
                log::debug!(
                    "Segmenter: object {} closed at {} deg: center={} width={} sonar={:.2}cm",
                    object.sequence_index,
                    step_deg,
                    center_angle_deg,
                    angular_width_deg,
                    sonar_cm
                );
                self.objects.push(object);
            }
        }

        Ok(())
    }

    /// Consume the segmenter and return the emitted objects. An episode
    /// still open is dropped without emitting.
    pub fn finish(self) -> Vec<DetectedObject> {
        if let Some(start_deg) = self.open_start_deg {
            log::debug!(
                "Segmenter: episode opened at {} deg never closed, dropped",
                start_deg
            );
        }
        self.objects
    }
}

/// Sweeping rangefinder: servo + sonar + IR.
pub struct SweepScanner {
    servo: Box<dyn ServoPositioner>,
    sonar: SonarRanger,
    ir: IrRanger,
    config: SweepConfig,
}

impl SweepScanner {
    pub fn new(
        servo: Box<dyn ServoPositioner>,
        sonar: SonarRanger,
        ir: IrRanger,
        config: SweepConfig,
    ) -> Self {
        Self {
            servo,
            sonar,
            ir,
            config,
        }
    }

    /// One paired reading at the servo's current position, no sweep.
    pub fn sample(&mut self) -> Result<RangeSample> {
        Ok(RangeSample {
            ir_distance_cm: self.ir.measure_cm()?,
            sonar_distance_cm: self.sonar.measure_cm()?,
        })
    }

    /// Sweep the full arc and return the objects seen.
    ///
    /// Positions the servo at the start angle, allows settle time, then
    /// steps one degree at a time through `max_angle_deg` inclusive,
    /// sampling IR and sonar at each step. The result set is owned by
    /// this invocation; each sweep starts fresh.
    pub fn sweep(&mut self) -> Result<Vec<DetectedObject>> {
        if self.config.max_angle_deg > 180 {
            return Err(Error::InvalidParameter(format!(
                "sweep arc of {} degrees exceeds the servo range",
                self.config.max_angle_deg
            )));
        }

        log::info!("SweepScanner: sweeping 0..={} deg", self.config.max_angle_deg);

        self.servo.set_angle(0)?;
        if self.config.settle_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.settle_ms));
        }

        let mut ir_trace = vec![0.0f64; (self.config.max_angle_deg / 2 + 1) as usize];
        let mut segmenter = Segmenter::new(&self.config);

        for step_deg in 0..=self.config.max_angle_deg {
            self.servo.set_angle(step_deg as u8)?;
            let ir_cm = self.ir.measure_cm()?;
            let sonar_cm = self.sonar.measure_cm()?;
            ir_trace[(step_deg / 2) as usize] = ir_cm;

            log::trace!(
                "SweepScanner: {:>3} deg  ir={:.2}cm  sonar={:.2}cm",
                step_deg,
                ir_cm,
                sonar_cm
            );

            segmenter.observe(step_deg, ir_cm, sonar_cm, &ir_trace)?;
        }

        let objects = segmenter.finish();
        log::info!("SweepScanner: sweep complete, {} object(s)", objects.len());
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::EdgeTimer;
    use crate::config::{AppConfig, IrConfig, SonarConfig, SweepConfig};
    use crate::devices::mock::{MockAdcChannel, MockServo, MockSonarTransducer};

    fn test_sweep_config() -> SweepConfig {
        SweepConfig {
            max_angle_deg: 180,
            settle_ms: 0,
            band_near_cm: 5.0,
            band_far_cm: 50.0,
            max_objects: 10,
        }
    }

    fn feed(segmenter: &mut Segmenter, samples: &[(u32, f64)], sonar_cm: f64) -> Result<()> {
        // trace shaped the way sweep() builds it
        let max_deg = samples.iter().map(|(d, _)| *d).max().unwrap_or(0);
        let mut trace = vec![0.0f64; (max_deg / 2 + 1) as usize];
        for &(deg, ir) in samples {
            trace[(deg / 2) as usize] = ir;
            segmenter.observe(deg, ir, sonar_cm, &trace)?;
        }
        Ok(())
    }

    #[test]
    fn test_single_plateau_segments_one_object() {
        // In-band plateau from 2 to 9 deg inside out-of-band readings:
        // opens at the first in-band step, closes at the first step back
        // out of band.
        let mut samples = Vec::new();
        for deg in 0..=12u32 {
            let ir = if (2..=9).contains(&deg) { 30.0 } else { 60.0 };
            samples.push((deg, ir));
        }

        let mut seg = Segmenter::new(&test_sweep_config());
        feed(&mut seg, &samples, 40.0).unwrap();
        let objects = seg.finish();

        assert_eq!(objects.len(), 1);
        let obj = &objects[0];
        assert_eq!(obj.sequence_index, 0);
        // start=2, end=10
        assert_eq!(obj.angular_width_deg, 8);
        assert_eq!(obj.center_angle_deg, 6);
        assert_eq!(obj.sonar_distance_cm, 40.0);
        assert_eq!(obj.ir_distance_cm, 30.0);
        assert!((obj.linear_width_cm - 2.0 * 40.0 * (4.0f64.to_radians()).tan()).abs() < 1e-9);
    }

    #[test]
    fn test_linear_width_invariant() {
        // 60 deg wide at 40cm: 2 * 40 * tan(30 deg) = 46.19cm
        let mut samples = Vec::new();
        for deg in 0..=70u32 {
            let ir = if (5..65).contains(&deg) { 20.0 } else { 60.0 };
            samples.push((deg, ir));
        }

        let mut seg = Segmenter::new(&test_sweep_config());
        feed(&mut seg, &samples, 40.0).unwrap();
        let objects = seg.finish();

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].angular_width_deg, 60);
        assert!((objects[0].linear_width_cm - 46.19).abs() < 0.01);
    }

    #[test]
    fn test_open_without_close_drops_episode() {
        // Enters the band and stays there through the end of the sweep.
        let mut samples = Vec::new();
        for deg in 0..=12u32 {
            let ir = if deg >= 4 { 30.0 } else { 60.0 };
            samples.push((deg, ir));
        }

        let mut seg = Segmenter::new(&test_sweep_config());
        feed(&mut seg, &samples, 40.0).unwrap();
        assert!(seg.finish().is_empty());
    }

    #[test]
    fn test_too_close_readings_do_not_open() {
        // Readings below the near edge are noise, not objects.
        let mut samples = Vec::new();
        for deg in 0..=12u32 {
            let ir = if (2..=9).contains(&deg) { 3.0 } else { 60.0 };
            samples.push((deg, ir));
        }

        let mut seg = Segmenter::new(&test_sweep_config());
        feed(&mut seg, &samples, 40.0).unwrap();
        assert!(seg.finish().is_empty());
    }

    #[test]
    fn test_sweep_starting_on_object() {
        // Seeded previous distance is out of band, so an object at the
        // very start of the arc opens at step 0.
        let mut samples = Vec::new();
        for deg in 0..=12u32 {
            let ir = if deg <= 5 { 30.0 } else { 60.0 };
            samples.push((deg, ir));
        }

        let mut seg = Segmenter::new(&test_sweep_config());
        feed(&mut seg, &samples, 40.0).unwrap();
        let objects = seg.finish();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].center_angle_deg, 3);
        assert_eq!(objects[0].angular_width_deg, 6);
    }

    #[test]
    fn test_sequence_index_ordering() {
        // Two separated plateaus emit two objects in detection order.
        let mut samples = Vec::new();
        for deg in 0..=40u32 {
            let ir = if (5..=10).contains(&deg) || (20..=30).contains(&deg) {
                25.0
            } else {
                60.0
            };
            samples.push((deg, ir));
        }

        let mut seg = Segmenter::new(&test_sweep_config());
        feed(&mut seg, &samples, 35.0).unwrap();
        let objects = seg.finish();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].sequence_index, 0);
        assert_eq!(objects[1].sequence_index, 1);
        assert!(objects[0].center_angle_deg < objects[1].center_angle_deg);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut config = test_sweep_config();
        config.max_objects = 2;
        let mut seg = Segmenter::new(&config);

        // three separate plateaus, third closure overflows the record
        let mut samples = Vec::new();
        for deg in 0..=60u32 {
            let in_band = (5..=10).contains(&deg) || (20..=25).contains(&deg) || (40..=45).contains(&deg);
            samples.push((deg, if in_band { 25.0 } else { 60.0 }));
        }

        let result = feed(&mut seg, &samples, 35.0);
        assert!(matches!(result, Err(Error::CapacityExceeded { limit: 2 })));
    }

    #[test]
    fn test_full_sweep_with_mock_rig() {
        // IR curve simplified to scale/reading so readings map cleanly:
        // 50 -> 60cm (out of band), 100 -> 30cm (in band).
        let ir_config = IrConfig {
            scale: 3000.0,
            exponent: 1.0,
            sample_count: 5,
        };
        let sonar_config = SonarConfig {
            bias_cm: 0.0,
            ..AppConfig::commissioning_defaults().sonar
        };
        let sweep_config = SweepConfig {
            max_angle_deg: 12,
            settle_ms: 0,
            band_near_cm: 5.0,
            band_far_cm: 50.0,
            max_objects: 10,
        };

        let adc = MockAdcChannel::new();
        for deg in 0..=12u32 {
            let reading = if (2..=9).contains(&deg) { 100 } else { 50 };
            adc.script_readings(&[reading; 5]);
        }

        let (timer, handle) = EdgeTimer::new(Duration::from_millis(50));
        let transducer = MockSonarTransducer::new(handle);
        // constant echo: 4000 ticks -> 0.0343 * 2000us / 2 = 34.3cm
        transducer.set_fallback_echo(0, 4000, 0);

        let servo = MockServo::new();
        let servo_log = servo.clone();

        let mut scanner = SweepScanner::new(
            Box::new(servo),
            SonarRanger::new(Box::new(transducer), timer, sonar_config),
            IrRanger::new(Box::new(adc), ir_config),
            sweep_config,
        );

        let objects = scanner.sweep().unwrap();
        assert_eq!(objects.len(), 1);
        let obj = &objects[0];
        assert_eq!(obj.center_angle_deg, 6);
        assert_eq!(obj.angular_width_deg, 8);
        assert!((obj.sonar_distance_cm - 34.3).abs() < 1e-9);
        assert!((obj.ir_distance_cm - 30.0).abs() < 1e-9);

        // servo visited the start angle then every degree of the arc
        let angles = servo_log.angles();
        assert_eq!(angles[0], 0);
        assert_eq!(angles.len(), 1 + 13);
        assert_eq!(*angles.last().unwrap(), 12);
    }

    #[test]
    fn test_sample_pairs_both_rangefinders() {
        let ir_config = IrConfig {
            scale: 3000.0,
            exponent: 1.0,
            sample_count: 5,
        };
        let sonar_config = SonarConfig {
            bias_cm: 0.0,
            ..AppConfig::commissioning_defaults().sonar
        };

        let adc = MockAdcChannel::new();
        adc.script_readings(&[100; 5]);
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(50));
        let transducer = MockSonarTransducer::new(handle);
        transducer.script_echo(0, 4000, 0);

        let servo = MockServo::new();
        let servo_log = servo.clone();
        let mut scanner = SweepScanner::new(
            Box::new(servo),
            SonarRanger::new(Box::new(transducer), timer, sonar_config),
            IrRanger::new(Box::new(adc), ir_config),
            test_sweep_config(),
        );

        let sample = scanner.sample().unwrap();
        assert!((sample.ir_distance_cm - 30.0).abs() < 1e-9);
        assert!((sample.sonar_distance_cm - 34.3).abs() < 1e-9);
        // on-demand read never moves the servo
        assert!(servo_log.angles().is_empty());
    }

    #[test]
    fn test_sweep_arc_validated() {
        let mut config = test_sweep_config();
        config.max_angle_deg = 200;

        let adc = MockAdcChannel::new();
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(10));
        let transducer = MockSonarTransducer::new(handle);
        let mut scanner = SweepScanner::new(
            Box::new(MockServo::new()),
            SonarRanger::new(
                Box::new(transducer),
                timer,
                AppConfig::commissioning_defaults().sonar,
            ),
            IrRanger::new(Box::new(adc), AppConfig::commissioning_defaults().ir),
            config,
        );
        assert!(matches!(
            scanner.sweep(),
            Err(Error::InvalidParameter(_))
        ));
    }
}
