use std::collections::VecDeque;

/// Trailing minimum over `window` values. Position `i` covers `values[i + 1 - window..=i]`.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    // Monotonic deque of indices whose values increase front to back
    let mut deque: VecDeque<usize> = VecDeque::new();
    for (i, &v) in values.iter().enumerate() {
        while deque.back().is_some_and(|&j| values[j] >= v) {
            deque.pop_back();
        }
        deque.push_back(i);
        if deque.front().is_some_and(|&j| j + window <= i) {
            deque.pop_front();
        }
        if i + 1 >= window {
            out[i] = deque.front().map(|&j| values[j]);
        }
    }
    out
}

/// Trailing arithmetic mean over `window` values.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

/// Trailing mean over a series that may itself have undefined positions.
/// A window containing any `None` produces `None`.
pub fn rolling_mean_opt(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        out[i] = slice
            .iter()
            .copied()
            .sum::<Option<f64>>()
            .map(|s| s / window as f64);
    }
    out
}
