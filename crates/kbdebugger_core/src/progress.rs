/// Presentational state of a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBar {
    Determinate { percent: u8 },
    /// Animated, full-width indicator.
    Indeterminate,
}

/// Maps a raw numerator/denominator onto a progress bar.
///
/// Only finite values with `total > 0` produce a determinate bar; everything
/// else (missing, zero, negative or non-finite totals) is indeterminate.
pub fn project_progress(current: Option<f64>, total: Option<f64>) -> ProgressBar {
    match (current, total) {
        (Some(current), Some(total)) if current.is_finite() && total.is_finite() && total > 0.0 => {
            let percent = (current / total * 100.0).round().clamp(0.0, 100.0);
            ProgressBar::Determinate {
                percent: percent as u8,
            }
        }
        _ => ProgressBar::Indeterminate,
    }
}
