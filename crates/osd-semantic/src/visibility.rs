//! Target visibility leaf check
//!
//! Some rules depend on whether a target rises above an elevation limit
//! during the observation window. This module computes target elevation
//! at a telescope site and locates the threshold crossing inside a time
//! window by bisection. The result feeds rules through the session-store
//! dependency mechanism; it is deliberately not callable from rule
//! expressions, which stay a closed sandbox.
//!
//! Unknown telescope names and windows that never bracket the threshold
//! are reported as visibility errors, never silently defaulted.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::error::{Result, SemanticError};

/// Geodetic location of a telescope site
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub elevation_m: f64,
}

/// Look up a telescope site by name.
pub fn site(telescope: &str) -> Result<Site> {
    match telescope {
        "mid" | "ska_mid" => Ok(Site {
            latitude_deg: -30.7129,
            longitude_deg: 21.4430,
            elevation_m: 1086.0,
        }),
        "low" | "ska_low" => Ok(Site {
            latitude_deg: -26.8247,
            longitude_deg: 116.7644,
            elevation_m: 377.0,
        }),
        other => Err(SemanticError::visibility(format!(
            "unknown telescope '{}'",
            other
        ))),
    }
}

/// Elevation of a target (ICRS right ascension/declination, degrees)
/// above the horizon at `at`, in degrees.
pub fn elevation_deg(site: &Site, ra_deg: f64, dec_deg: f64, at: DateTime<Utc>) -> f64 {
    let lst_deg = local_sidereal_time_deg(site.longitude_deg, at);
    let hour_angle = (lst_deg - ra_deg).to_radians();
    let lat = site.latitude_deg.to_radians();
    let dec = dec_deg.to_radians();

    let sin_el = lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos();
    sin_el.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Whether the target is at or above `threshold_deg` at `at`.
pub fn is_visible(
    site: &Site,
    ra_deg: f64,
    dec_deg: f64,
    threshold_deg: f64,
    at: DateTime<Utc>,
) -> bool {
    elevation_deg(site, ra_deg, dec_deg, at) >= threshold_deg
}

/// Locate the instant inside `[window_start, window_end]` where the
/// target's elevation crosses `threshold_deg`, by bisection.
///
/// The window must bracket the crossing: the elevation offsets at the
/// two endpoints must differ in sign. Windows that do not, and windows
/// where bisection fails to converge below one second, are visibility
/// errors.
pub fn crossing_time(
    site: &Site,
    ra_deg: f64,
    dec_deg: f64,
    threshold_deg: f64,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    if window_end <= window_start {
        return Err(SemanticError::visibility(
            "window end must be after window start".to_string(),
        ));
    }

    let offset = |t: DateTime<Utc>| elevation_deg(site, ra_deg, dec_deg, t) - threshold_deg;

    let mut lo = window_start;
    let mut hi = window_end;
    let f_lo = offset(lo);
    let f_hi = offset(hi);

    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(SemanticError::visibility(format!(
            "window does not bracket the {} deg elevation threshold",
            threshold_deg
        )));
    }

    const MAX_ITERATIONS: usize = 64;
    for _ in 0..MAX_ITERATIONS {
        let mid = lo + (hi - lo) / 2;
        if (hi - lo).num_seconds().abs() <= 1 {
            return Ok(mid);
        }
        if offset(mid).signum() == offset(lo).signum() {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Err(SemanticError::visibility(
        "elevation threshold search did not converge".to_string(),
    ))
}

/// Local mean sidereal time in degrees, from the standard GMST
/// polynomial on the UT1~UTC approximation.
fn local_sidereal_time_deg(longitude_deg: f64, at: DateTime<Utc>) -> f64 {
    let jd = julian_day(at);
    let d = jd - 2451545.0;
    let gmst = 280.460_618_37 + 360.985_647_366_29 * d;
    (gmst + longitude_deg).rem_euclid(360.0)
}

fn julian_day(at: DateTime<Utc>) -> f64 {
    let (year, month, day) = (at.year() as f64, at.month() as f64, at.day() as f64);
    let (y, m) = if month <= 2.0 {
        (year - 1.0, month + 12.0)
    } else {
        (year, month)
    };
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    let day_fraction = (at.hour() as f64
        + at.minute() as f64 / 60.0
        + at.second() as f64 / 3600.0)
        / 24.0;
    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day + b - 1524.5
        + day_fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_known_sites() {
        assert!(site("mid").is_ok());
        assert!(site("ska_low").is_ok());
    }

    #[test]
    fn test_unknown_telescope_is_visibility_error() {
        assert!(matches!(
            site("parkes"),
            Err(SemanticError::Visibility(_))
        ));
    }

    #[test]
    fn test_south_celestial_pole_elevation_equals_latitude() {
        let mid = site("mid").unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 21, 0, 0, 0).unwrap();
        // the celestial pole's elevation is the site latitude, at any time
        let el = elevation_deg(&mid, 0.0, -90.0, at);
        assert!((el - 30.7129).abs() < 0.1, "got {}", el);
    }

    #[test]
    fn test_pole_target_never_crosses_high_threshold() {
        let mid = site("mid").unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 21, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 21, 12, 0, 0).unwrap();
        // pole elevation is constant ~30.7 deg, never reaching 60
        let result = crossing_time(&mid, 0.0, -90.0, 60.0, start, end);
        assert!(matches!(result, Err(SemanticError::Visibility(_))));
    }

    #[test]
    fn test_crossing_found_for_rising_target() {
        let mid = site("mid").unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 21, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 21, 12, 0, 0).unwrap();
        // an equatorial target rises and sets over half a sidereal day;
        // pick a declination near the celestial equator
        let el_start = elevation_deg(&mid, 180.0, 0.0, start);
        let el_end = elevation_deg(&mid, 180.0, 0.0, end);
        let threshold = (el_start + el_end) / 2.0;
        let crossing = crossing_time(&mid, 180.0, 0.0, threshold, start, end).unwrap();
        assert!(crossing > start && crossing < end);
        let el_at_crossing = elevation_deg(&mid, 180.0, 0.0, crossing);
        assert!((el_at_crossing - threshold).abs() < 0.5);
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mid = site("mid").unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 21, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 21, 0, 0, 0).unwrap();
        assert!(matches!(
            crossing_time(&mid, 0.0, 0.0, 15.0, start, end),
            Err(SemanticError::Visibility(_))
        ));
    }
}
