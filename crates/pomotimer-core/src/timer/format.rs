/// Render a second count as `MM:SS`.
///
/// Both fields are zero-padded to two digits. Minutes are never wrapped
/// into hours, so durations of 100 minutes or more render as `100:00`.
pub fn format_clock(remaining_seconds: u32) -> String {
    let minutes = remaining_seconds / 60;
    let seconds = remaining_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}
