//! Constants used throughout the billing core crate.
//!
//! Defaults for [`crate::CoreConfig`] and fixed identifiers the engine refers to by value.

/// Days of charge lag before a warning is raised.
pub const DEFAULT_CHARGE_LAG_WARNING_DAYS: i64 = 7;

/// Days of charge lag before the lag becomes an error.
pub const DEFAULT_CHARGE_LAG_ERROR_DAYS: i64 = 30;

/// Maximum number of diagnoses a selection may carry.
pub const DEFAULT_MAX_DIAGNOSES: usize = 24;

/// Window, in days, within which a later PCI is treated as a staged procedure.
pub const DEFAULT_STAGED_PCI_WINDOW_DAYS: i64 = 30;

/// Charges per patient per day above which the volume is flagged.
pub const DEFAULT_HIGH_VOLUME_THRESHOLD: usize = 4;

/// The internal no-charge code. When selected it is the only code present.
pub const NO_CHARGE_CODE: &str = "00000";

/// Separator between parts of a stored combined code string.
pub const COMBINED_CODE_SEPARATOR: &str = " + ";

/// Base critical care code and its time-increment add-on.
pub const CRITICAL_CARE_BASE: &str = "99291";
pub const CRITICAL_CARE_ADD_ON: &str = "99292";

/// Minimum documented minutes below which critical care time looks like an entry error.
pub const CRITICAL_CARE_MIN_SANE_MINUTES: u32 = 15;

/// Maximum plausible minutes for any E/M service (8 hours).
pub const EM_MAX_SANE_MINUTES: u32 = 480;

/// Maximum plausible minutes for discharge management.
pub const DISCHARGE_MAX_SANE_MINUTES: u32 = 120;
