//! Display formatting for countdowns and durations. Pure functions; negative
//! input clamps to zero instead of failing.

/// Countdown display: "MM:SS", or "H:MM:SS" once an hour or more remains.
pub fn format_seconds(total_secs: i64) -> String {
    let clamped = total_secs.max(0);
    let hours = clamped / 3600;
    let minutes = (clamped % 3600) / 60;
    let seconds = clamped % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Duration display: "Xh Ym", or just "Ym" under an hour.
pub fn format_minutes(total_minutes: i64) -> String {
    let clamped = total_minutes.max(0);
    let hours = clamped / 60;
    let minutes = clamped % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
