//! Linear trend over the reconstructed step series.

use crate::error::Unreliability;

/// Line fitted to `(time_us, steps)` samples, answering point and slope queries.
///
/// Implementations replace the previous fit on every `fit`; a failed fit leaves the
/// estimator without a model until the next success.
pub trait TrendEstimator: Send {
    fn fit(&mut self, xs: &[f64], ys: &[f64]) -> Result<(), Unreliability>;
    /// Fitted value at `t`, or `None` without a valid fit.
    fn extrapolate(&self, t: f64) -> Option<f64>;
    /// Steps per microsecond, or `None` without a valid fit.
    fn slope(&self) -> Option<f64>;
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Line {
    mean_x: f64,
    mean_y: f64,
    slope: f64,
}

/// Ordinary least squares, stored in mean-centered form so extrapolation at large
/// absolute timestamps does not lose precision.
#[derive(Debug, Clone, Default)]
pub struct LinearTrend {
    line: Option<Line>,
}

impl LinearTrend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intercept at `t = 0`, if fitted.
    pub fn intercept(&self) -> Option<f64> {
        self.line.map(|l| l.mean_y - l.slope * l.mean_x)
    }
}

impl TrendEstimator for LinearTrend {
    fn fit(&mut self, xs: &[f64], ys: &[f64]) -> Result<(), Unreliability> {
        self.line = None;
        if xs.len() != ys.len() || xs.len() < 2 {
            return Err(Unreliability::DegenerateFit);
        }
        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;
        let mut sxx = 0.0f64;
        let mut sxy = 0.0f64;
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            sxx += dx * dx;
            sxy += dx * (y - mean_y);
        }
        if !sxx.is_finite() || sxx == 0.0 {
            return Err(Unreliability::DegenerateFit);
        }
        let slope = sxy / sxx;
        if !slope.is_finite() || !mean_y.is_finite() {
            return Err(Unreliability::DegenerateFit);
        }
        self.line = Some(Line {
            mean_x,
            mean_y,
            slope,
        });
        Ok(())
    }

    fn extrapolate(&self, t: f64) -> Option<f64> {
        self.line.map(|l| l.mean_y + l.slope * (t - l.mean_x))
    }

    fn slope(&self) -> Option<f64> {
        self.line.map(|l| l.slope)
    }

    fn reset(&mut self) {
        self.line = None;
    }
}
