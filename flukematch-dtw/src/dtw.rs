use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Dynamic time warping between two sequences of feature rows.
///
/// Each row of `x1` / `x2` is one step along the trailing edge. The local
/// cost of aligning row `i` with row `j` is `w_i * w_j * |x1_i - x2_j|`
/// (Euclidean norm), where `w` are the optional per-position weights. When
/// given, there must be exactly one weight per row of both inputs; any other
/// count yields NaN.
///
/// Alignments are restricted to the inclusive, symmetric band
/// `|i - j| <= window`, so the result does not depend on argument order. A
/// half-open band `i - window <= j < i + window` is one narrower on the
/// upper side; `window` here counts the same steps in both directions. The
/// band is widened to the length difference so the end of both sequences is
/// always reachable.
///
/// Two empty inputs are at distance 0, one empty input is infinitely far.
pub fn weighted_dtw(
    x1: ArrayView2<f32>,
    x2: ArrayView2<f32>,
    position_weights: Option<&[f32]>,
    window: usize,
) -> f32 {
    let m = x1.nrows();
    let n = x2.nrows();
    if let Some(w) = position_weights {
        if w.len() != m || w.len() != n {
            log::debug!("{} position weights for {}x{} rows", w.len(), m, n);
            return f32::NAN;
        }
    }
    if m == 0 && n == 0 {
        return 0.0;
    }
    if m == 0 || n == 0 {
        return f32::INFINITY;
    }
    debug_assert_eq!(x1.ncols(), x2.ncols(), "feature rows must have equal width");

    let band = window.max(m.abs_diff(n));
    if band > window {
        log::debug!("dtw band widened from {} to {} ({}x{})", window, band, m, n);
    }

    // costs[[i, j]] holds the cheapest alignment of the first i rows of x1
    // with the first j rows of x2; row/column 0 is the empty prefix.
    let mut costs = Array2::from_elem((m + 1, n + 1), f32::INFINITY);
    costs[[0, 0]] = 0.0;

    for i in 1..=m {
        let wi = weight_at(position_weights, i - 1);
        let lo = i.saturating_sub(band).max(1);
        let hi = (i + band).min(n);
        for j in lo..=hi {
            let wj = weight_at(position_weights, j - 1);
            let cost = wi * wj * row_distance(x1.row(i - 1), x2.row(j - 1));
            let prev = costs[[i, j - 1]]
                .min(costs[[i - 1, j]])
                .min(costs[[i - 1, j - 1]]);
            costs[[i, j]] = cost + prev;
        }
    }

    costs[[m, n]]
}

/// DTW over plain 1-D curvature sequences.
pub fn dtw_1d(a: &[f32], b: &[f32], window: usize) -> f32 {
    let x1 = ArrayView1::from(a).insert_axis(Axis(1));
    let x2 = ArrayView1::from(b).insert_axis(Axis(1));
    weighted_dtw(x1, x2, None, window)
}

fn weight_at(weights: Option<&[f32]>, idx: usize) -> f32 {
    weights.map_or(1.0, |w| w[idx])
}

fn row_distance(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
