/// MJD of the J2000.0 epoch.
pub const MJD_J2000: f64 = 51544.5;

/// Local sidereal time at J2000 for the observatory longitude, degrees.
const LST_AT_J2000: f64 = 168.86072948111115;

/// Sidereal degrees per solar day.
const SIDEREAL_RATE: f64 = 360.98564736628623;

/// Local sidereal time in degrees, in `[0, 360)`.
pub fn local_sidereal_time(mjd: f64) -> f64 {
    (LST_AT_J2000 + SIDEREAL_RATE * (mjd - MJD_J2000)).rem_euclid(360.0)
}

/// Fold an angle difference back into `[-180, 180]`.
///
/// Only a single turn is removed; inputs are differences of two angles in
/// `[0, 360)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    if angle > 180.0 {
        angle - 360.0
    } else if angle < -180.0 {
        angle + 360.0
    } else {
        angle
    }
}

/// Hour angle in degrees of a target at `ra` degrees observed at `mjd`.
pub fn hour_angle(mjd: f64, ra: f64) -> f64 {
    wrap_degrees(local_sidereal_time(mjd) - ra)
}
