//! Fixed lookup from raw error codes to user-facing messages.

/// Shown for any code missing from the table.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred. Please try again later.";

const MESSAGES: &[(&str, &str)] = &[
    (
        "network_error",
        "Could not reach the schedule service. Check your connection.",
    ),
    ("bad_status", "The schedule service returned an error."),
    ("io_error", "The schedule file could not be read."),
    ("invalid_schedule", "The schedule could not be understood."),
    (
        "schedule_unavailable",
        "No channel schedule is available right now.",
    ),
    (
        "tracker_stopped",
        "The program guide has stopped. Restart the application.",
    ),
    ("unknown_channel", "That channel does not exist."),
    ("unknown_program", "That program is not in the schedule."),
    (
        "not_in_catchup",
        "This program is no longer available to watch.",
    ),
    ("not_aired", "This program has not started yet."),
];

pub fn user_message(code: &str) -> &'static str {
    MESSAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, msg)| *msg)
        .unwrap_or(UNKNOWN_ERROR)
}
