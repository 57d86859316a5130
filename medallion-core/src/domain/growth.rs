// medallion-core/src/domain/growth.rs

/// Period-over-period change of an ordered series, as a signed fraction.
///
/// The first element has no predecessor and yields `None`. A zero (or
/// non-finite) predecessor also yields `None` instead of an infinity.
pub fn growth_rates(values: &[f64]) -> Vec<Option<f64>> {
    let mut rates = Vec::with_capacity(values.len());
    let mut previous: Option<f64> = None;
    for &value in values {
        rates.push(previous.and_then(|prev| rate(prev, value)));
        previous = Some(value);
    }
    rates
}

fn rate(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() {
        return None;
    }
    let r = (current - previous) / previous;
    r.is_finite().then_some(r)
}
