/// Largest unit count accepted when converting amounts onto an integer grid.
pub const MAX_UNITS: f64 = 1e30;

/// Rounds `exact` (which sums to `total`) to `precision` decimals so the rounded
/// values sum to exactly `total` at that precision.
///
/// Residual units are handed out by highest averages over `weights`: the next
/// unit goes to the largest `weight / (units + 0.5)` and the next unit taken
/// back comes from the smallest `weight / (units - 0.5)`. Equal priorities
/// favour the earliest index, so callers pass values in canonical order. No
/// value is rounded below `min_value`.
///
/// Because every value ends up as `max(min, round(weight / d))` for one common
/// divisor `d`, raising one weight never raises any other value.
///
/// Returns `None` when the values do not fit the unit grid.
pub fn round_to_total(
    exact: &[f64],
    weights: &[f64],
    total: f64,
    precision: u32,
    min_value: f64,
) -> Option<Vec<f64>> {
    if exact.len() != weights.len() {
        return None;
    }
    if exact.is_empty() {
        return Some(Vec::new());
    }

    let scale = 10f64.powi(precision as i32);
    let total_units = to_units(total, scale)?;
    let min_units = to_units(ceil_to_precision(min_value, precision), scale)?;
    let mut units = exact
        .iter()
        .map(|value| to_units(*value, scale).map(|unit| unit.max(min_units)))
        .collect::<Option<Vec<_>>>()?;
    let weights = weights
        .iter()
        .map(|weight| {
            if weight.is_finite() && *weight > 0.0 {
                *weight
            } else {
                0.0
            }
        })
        .collect::<Vec<_>>();

    let mut assigned = sum_units(&units)?;
    while assigned < total_units {
        let index = next_to_add(&units, &weights);
        units[index] += 1;
        assigned += 1;
    }
    while assigned > total_units {
        let index = next_to_remove(&units, &weights, min_units)?;
        units[index] -= 1;
        assigned -= 1;
    }

    Some(
        units
            .into_iter()
            .map(|unit| unit as f64 / scale)
            .collect(),
    )
}

/// Splits `total_units` in proportion to `parts` using exact integer
/// arithmetic. Every result is within one unit of its exact quota; leftover
/// units go to the largest remainders, earliest index first.
pub fn split_units(total_units: i128, parts: &[i128]) -> Option<Vec<i128>> {
    let denominator = sum_units(parts)?;
    if parts.is_empty() || denominator <= 0 || total_units < 0 {
        return None;
    }

    let mut units = Vec::with_capacity(parts.len());
    let mut remainders = Vec::with_capacity(parts.len());
    for part in parts {
        let numerator = total_units.checked_mul((*part).max(0))?;
        units.push(numerator / denominator);
        remainders.push(numerator % denominator);
    }

    let leftover = total_units.checked_sub(sum_units(&units)?)?;
    let mut order = (0..parts.len()).collect::<Vec<_>>();
    order.sort_by(|a, b| remainders[*b].cmp(&remainders[*a]).then(a.cmp(b)));
    for index in order.into_iter().take(usize::try_from(leftover).ok()?) {
        units[index] += 1;
    }
    Some(units)
}

/// Converts `value` to whole units at `scale`, or `None` past [`MAX_UNITS`].
pub fn to_units(value: f64, scale: f64) -> Option<i128> {
    let scaled = (value * scale).round();
    (scaled.is_finite() && scaled.abs() <= MAX_UNITS).then_some(scaled as i128)
}

fn sum_units(units: &[i128]) -> Option<i128> {
    units
        .iter()
        .try_fold(0i128, |sum, unit| sum.checked_add(*unit))
}

fn next_to_add(units: &[i128], weights: &[f64]) -> usize {
    let mut best = 0;
    for index in 1..units.len() {
        // weights[index] / (units[index] + 0.5) > weights[best] / (units[best] + 0.5)
        if weights[index] * (units[best] as f64 + 0.5)
            > weights[best] * (units[index] as f64 + 0.5)
        {
            best = index;
        }
    }
    best
}

fn next_to_remove(units: &[i128], weights: &[f64], min_units: i128) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, &unit) in units.iter().enumerate() {
        if unit <= min_units {
            continue;
        }
        best = match best {
            Some(current)
                if weights[index] * (units[current] as f64 - 0.5)
                    > weights[current] * (unit as f64 - 0.5) =>
            {
                Some(current)
            }
            _ => Some(index),
        };
    }
    best
}

/// Smallest value on the `precision` grid that is not below `value`.
pub fn ceil_to_precision(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale - 1e-6).ceil().max(0.0) / scale
}
