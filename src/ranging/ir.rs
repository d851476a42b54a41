//! IR ranging: averaged ADC sampling and inverse-power distance curve

use crate::config::IrConfig;
use crate::devices::AdcChannel;
use crate::error::{Error, Result};

/// Analog IR rangefinder.
pub struct IrRanger {
    adc: Box<dyn AdcChannel>,
    config: IrConfig,
}

impl IrRanger {
    pub fn new(adc: Box<dyn AdcChannel>, config: IrConfig) -> Self {
        Self { adc, config }
    }

    /// Measure distance in centimeters.
    ///
    /// Takes `sample_count` consecutive conversions, averages with
    /// integer truncation, then applies the calibrated curve
    /// `distance_cm = scale * avg^(-exponent)`.
    pub fn measure_cm(&mut self) -> Result<f64> {
        let mut sum: u32 = 0;
        for _ in 0..self.config.sample_count {
            self.adc.start_conversion()?;
            sum += u32::from(self.adc.read_blocking()?);
        }
        let avg = sum / self.config.sample_count;
        if avg == 0 {
            // the inverse-power curve diverges at zero
            return Err(Error::InvalidParameter(
                "ADC average of zero has no distance on the calibration curve".to_string(),
            ));
        }

        let distance_cm = self.config.scale * f64::from(avg).powf(-self.config.exponent);
        log::trace!("IrRanger: avg={}, distance={:.2}cm", avg, distance_cm);
        Ok(distance_cm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::devices::mock::MockAdcChannel;

    fn ranger_with_readings(readings: Vec<u16>) -> IrRanger {
        let adc = MockAdcChannel::new();
        adc.script_readings(&readings);
        IrRanger::new(Box::new(adc), AppConfig::commissioning_defaults().ir)
    }

    #[test]
    fn test_five_samples_averaged() {
        let mut ranger = ranger_with_readings(vec![500, 500, 500, 500, 500]);
        let d = ranger.measure_cm().unwrap();
        let expected = 34272.0 * 500f64.powf(-1.376);
        assert!((d - expected).abs() < 1e-9);
    }

    #[test]
    fn test_average_truncates() {
        // sum 54 over 5 samples averages to 10, not 10.8
        let mut ranger = ranger_with_readings(vec![10, 11, 11, 11, 11]);
        let d = ranger.measure_cm().unwrap();
        let expected = 34272.0 * 10f64.powf(-1.376);
        assert!((d - expected).abs() < 1e-9);
    }

    #[test]
    fn test_closer_target_reads_higher() {
        let mut near = ranger_with_readings(vec![800; 5]);
        let mut far = ranger_with_readings(vec![200; 5]);
        assert!(near.measure_cm().unwrap() < far.measure_cm().unwrap());
    }

    #[test]
    fn test_zero_average_rejected() {
        let mut ranger = ranger_with_readings(vec![0, 0, 0, 0, 0]);
        assert!(matches!(
            ranger.measure_cm(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_exhausted_adc_times_out() {
        let mut ranger = ranger_with_readings(vec![500, 500]);
        assert!(matches!(ranger.measure_cm(), Err(Error::Timeout(_))));
    }
}
