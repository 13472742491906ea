pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const MINUTES_PER_HOUR: f64 = 60.0;
pub const HOURS_PER_DAY: f64 = 24.0;
pub const SECONDS_PER_DAY: f64 = SECONDS_PER_MINUTE * MINUTES_PER_HOUR * HOURS_PER_DAY;

pub const RIGHT_ANGLE_DEG: f64 = 90.0;

pub const EFFECTIVE_AREA_COLUMNS: usize = 5;
pub const SMEARING_COLUMNS: usize = 11;
pub const EVENT_COLUMNS: usize = 7;
pub const UPTIME_COLUMNS: usize = 2;
