/// Format a duration as an ASS timestamp: `H:MM:SS.CC`.
///
/// Hours are unpadded (variable width), minutes/seconds/centiseconds are
/// two-digit zero-padded. Centiseconds are truncated, not rounded, so a
/// timestamp never points past the instant it names.
pub fn format_timecode(seconds: f64) -> String {
    assert!(
        seconds >= 0.0 && seconds.is_finite(),
        "timestamp must be non-negative and finite: {seconds}"
    );

    let total_cs = (seconds * 100.0) as u64;
    let cs = total_cs % 100;
    let total_s = total_cs / 100;
    let s = total_s % 60;
    let m = (total_s / 60) % 60;
    let h = total_s / 3600;

    format!("{h}:{m:02}:{s:02}.{cs:02}")
}
