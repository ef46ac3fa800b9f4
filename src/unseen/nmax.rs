//! # N 日滑动平均最大值 (JJA-NMAX)
//!
//! 季节内逐日序列的居中 N 日滑动平均，取其最大值作为该季节的事件强度。
//! 窗口不完整或含 NaN 时滑动平均为 NaN，求最大值时跳过。
//!
//! ## 依赖关系
//! - 被 `unseen/distribution.rs`, `unseen/observed.rs` 使用

use crate::stats::descriptive::nanmax;

/// 居中 N 日滑动平均
///
/// 位置 i 的窗口为 `[i - N/2, i - N/2 + N)`，超出序列范围时为 NaN。
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || window > n {
        return out;
    }
    let half = window / 2;
    for (i, slot) in out.iter_mut().enumerate() {
        if i < half || i - half + window > n {
            continue;
        }
        let win = &series[i - half..i - half + window];
        if win.iter().any(|x| x.is_nan()) {
            continue;
        }
        *slot = win.iter().sum::<f64>() / window as f64;
    }
    out
}

/// 滑动平均最大值；没有完整窗口时为 NaN
pub fn rolling_max(series: &[f64], window: usize) -> f64 {
    nanmax(&rolling_mean(series, window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centred_rolling_mean() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let rm = rolling_mean(&xs, 3);
        assert!(rm[0].is_nan());
        assert_eq!(&rm[1..4], &[2.0, 3.0, 4.0]);
        assert!(rm[4].is_nan());

        // 偶数窗口：位置 i 覆盖 [i-2, i+1]
        let rm = rolling_mean(&xs, 4);
        assert!(rm[0].is_nan() && rm[1].is_nan());
        assert_eq!(rm[2], 2.5);
        assert_eq!(rm[3], 3.5);
        assert!(rm[4].is_nan());
    }

    #[test]
    fn test_rolling_max_ignores_incomplete_windows() {
        // 末端的大值只出现在不完整窗口中
        let xs = [0.0, 0.0, 0.0, 0.0, 10.0];
        assert_eq!(rolling_max(&xs, 3), 10.0 / 3.0);
        assert_eq!(rolling_max(&xs, 1), 10.0);
    }

    #[test]
    fn test_nan_handling() {
        let xs = [1.0, f64::NAN, 3.0, 4.0, 5.0];
        let rm = rolling_mean(&xs, 2);
        assert!(rm[1].is_nan() && rm[2].is_nan());
        assert_eq!(rolling_max(&xs, 2), 4.5);

        assert!(rolling_max(&[1.0, 2.0], 3).is_nan());
        assert!(rolling_max(&[f64::NAN; 5], 2).is_nan());
    }
}
