use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

pub struct Statistics;

impl Statistics {
    pub fn mean(values: ArrayView1<'_, f64>) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        Some(sum / values.len() as f64)
    }

    pub fn min_max(values: ArrayView1<'_, f64>) -> Option<(f64, f64)> {
        let first = *values.first()?;
        let mut min = first;
        let mut max = first;
        for &v in values.iter().skip(1) {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    /// Population standard deviation.
    pub fn std_dev(values: ArrayView1<'_, f64>) -> Option<f64> {
        let mean = Self::mean(values)?;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        Some(var.sqrt())
    }
}

/// Per-column scaling applied before clustering.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Values are clustered verbatim.
    #[default]
    None,
    MinMax,
    ZScore,
}

impl std::str::FromStr for Normalization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Normalization::None),
            "minmax" | "min-max" => Ok(Normalization::MinMax),
            "zscore" | "z-score" => Ok(Normalization::ZScore),
            other => Err(format!("unknown normalization: {other}")),
        }
    }
}

/// Affine per-column transform `scaled = (x - offset) / scale`.
///
/// Constant columns get `scale = 0` and scale to all zeros; the inverse maps
/// them back to the constant.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnScaler {
    offset: Array1<f64>,
    scale: Array1<f64>,
}

impl ColumnScaler {
    pub fn fit(data: ArrayView2<'_, f64>, normalization: Normalization) -> Self {
        let cols = data.ncols();
        let mut offset = Array1::zeros(cols);
        let mut scale = Array1::ones(cols);
        for (j, column) in data.axis_iter(Axis(1)).enumerate() {
            match normalization {
                Normalization::None => {}
                Normalization::MinMax => {
                    if let Some((min, max)) = Statistics::min_max(column) {
                        offset[j] = min;
                        scale[j] = max - min;
                    }
                }
                Normalization::ZScore => {
                    if let (Some(mean), Some(sd)) =
                        (Statistics::mean(column), Statistics::std_dev(column))
                    {
                        offset[j] = mean;
                        scale[j] = sd;
                    }
                }
            }
        }
        Self { offset, scale }
    }

    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = data.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (offset, scale) = (self.offset[j], self.scale[j]);
            column.mapv_inplace(|v| if scale > 0.0 { (v - offset) / scale } else { 0.0 });
        }
        out
    }

    pub fn inverse(&self, data: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = data.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (offset, scale) = (self.offset[j], self.scale[j]);
            column.mapv_inplace(|v| v * scale + offset);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnScaler, Normalization, Statistics};
    use ndarray::{Array1, array};

    #[test]
    fn mean_works() {
        let m = Statistics::mean(array![1.0, 2.0, 3.0].view()).unwrap();
        assert!((m - 2.0).abs() < 1e-9);
        assert!(Statistics::mean(Array1::<f64>::zeros(0).view()).is_none());
    }

    #[test]
    fn std_dev_is_population() {
        let values = array![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = Statistics::std_dev(values.view()).unwrap();
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn min_max_scaling_round_trips() {
        let data = array![[0.0, 10.0, 3.0], [5.0, 30.0, 3.0], [10.0, 20.0, 3.0]];
        let scaler = ColumnScaler::fit(data.view(), Normalization::MinMax);
        let scaled = scaler.transform(data.view());
        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 0.5, 1.0]);
        assert_eq!(scaled.column(1).to_vec(), vec![0.0, 1.0, 0.5]);
        // Constant column.
        assert_eq!(scaled.column(2).to_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(scaler.inverse(scaled.view()), data);
    }

    #[test]
    fn no_normalization_is_identity() {
        let data = array![[1.5, -2.0], [3.0, 4.0]];
        let scaler = ColumnScaler::fit(data.view(), Normalization::None);
        assert_eq!(scaler.transform(data.view()), data);
    }

    #[test]
    fn parses_names() {
        assert_eq!("zscore".parse::<Normalization>().unwrap(), Normalization::ZScore);
        assert_eq!("Min-Max".parse::<Normalization>().unwrap(), Normalization::MinMax);
        assert!("log".parse::<Normalization>().is_err());
    }
}
