use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::BookDataset;

// ---------------------------------------------------------------------------
// Colour scale: rating difference → Color32
// ---------------------------------------------------------------------------

/// Hue for books where both platforms agree.
const AGREE_HUE: f32 = 210.0;
/// Hue for the largest disagreement in the dataset.
const DISAGREE_HUE: f32 = 0.0;

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Maps `|rating_difference|` onto a blue → red hue ramp.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    max_difference: f64,
    missing_color: Color32,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            max_difference: 0.0,
            missing_color: Color32::GRAY,
        }
    }
}

impl ColorScale {
    /// Scale the ramp to the largest difference in the dataset.
    pub fn for_dataset(dataset: &BookDataset) -> Self {
        let max_difference = dataset
            .records
            .iter()
            .filter_map(|r| r.rating_difference)
            .map(f64::abs)
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max);
        Self {
            max_difference,
            ..Self::default()
        }
    }

    /// Position of `|difference|` on the ramp, `None` when missing.
    fn fraction(&self, difference: Option<f64>) -> Option<f32> {
        let diff = difference.filter(|d| d.is_finite())?;
        if self.max_difference > 0.0 {
            Some((diff.abs() / self.max_difference).clamp(0.0, 1.0) as f32)
        } else {
            Some(0.0)
        }
    }

    fn ramp(t: f32) -> Color32 {
        let hue = AGREE_HUE + (DISAGREE_HUE - AGREE_HUE) * t;
        hsl_to_color32(hue, 0.75, 0.55)
    }

    /// Which of `n` equal colour buckets a difference falls into.
    pub fn bucket(&self, difference: Option<f64>, n: usize) -> Option<usize> {
        let t = self.fraction(difference)?;
        Some(((t * n as f32) as usize).min(n.saturating_sub(1)))
    }

    /// Representative colour of bucket `i` out of `n`.
    pub fn bucket_color(&self, i: usize, n: usize) -> Color32 {
        Self::ramp((i as f32 + 0.5) / n.max(1) as f32)
    }

    /// `[start, end)` of bucket `i` in rating-difference units.
    pub fn bucket_bounds(&self, i: usize, n: usize) -> (f64, f64) {
        let step = self.max_difference / n.max(1) as f64;
        (step * i as f64, step * (i + 1) as f64)
    }

    pub fn missing_color(&self) -> Color32 {
        self.missing_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{BookRecord, RawRow};

    #[test]
    fn ramp_spans_blue_to_red() {
        let mut rec = BookRecord::from_row(&RawRow::new());
        rec.rating_difference = Some(-4.0);
        let scale = ColorScale::for_dataset(&BookDataset {
            records: vec![rec],
            columns: vec![],
        });

        let agree = scale.bucket_color(0, 4);
        let disagree = scale.bucket_color(3, 4);
        assert!(agree.b() > agree.r());
        assert!(disagree.r() > disagree.b());
        assert_eq!(scale.missing_color(), Color32::GRAY);
        assert_eq!(scale.bucket(Some(9.0), 4), Some(3));

        assert_eq!(scale.bucket(Some(0.0), 4), Some(0));
        assert_eq!(scale.bucket(Some(-4.0), 4), Some(3));
        assert_eq!(scale.bucket(Some(2.0), 4), Some(2));
        assert_eq!(scale.bucket(None, 4), None);
        assert_eq!(scale.bucket_bounds(1, 4), (1.0, 2.0));
    }
}
