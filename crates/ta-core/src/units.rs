// ta-core/src/units.rs

use uom::si::f64::Time as UomTime;

pub type Time = UomTime;

#[inline]
pub fn days(v: f64) -> Time {
    use uom::si::time::day;
    Time::new::<day>(v)
}

#[inline]
pub fn years(v: f64) -> Time {
    use uom::si::time::year;
    Time::new::<year>(v)
}

#[inline]
pub fn in_years(t: Time) -> f64 {
    use uom::si::time::year;
    t.get::<year>()
}

/// Length in years of one nondimensional model time unit, given the
/// timescale expressed in days (365-day years).
#[inline]
pub fn timescale_in_years(timescale_days: f64) -> f64 {
    in_years(days(timescale_days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _d = days(1.0);
        let _y = years(2.0);
    }

    #[test]
    fn timescale_uses_365_day_year() {
        let y = timescale_in_years(365.0);
        assert!((y - 1.0).abs() < 1e-12);

        let ocean = timescale_in_years(737.2685);
        assert!((ocean - 737.2685 / 365.0).abs() < 1e-12);
    }
}
