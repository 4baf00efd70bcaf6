//! Slider/hover position to series offset mapping
//!
//! Series are stored oldest to newest. The UI addresses them by slider
//! position, where the rightmost position (`len - 1`) is the newest point.
//! Lookups use a backward offset: 0 is the newest point, `k` is "k units ago".

/// Time unit of a series bucket, for labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hour,
    Day,
}

impl TimeUnit {
    /// Unit for a timeframe key such as `"hourly"` or `"7d"`.
    pub fn for_timeframe(timeframe: &str) -> Self {
        match timeframe {
            "hourly" | "24h" | "1d" => TimeUnit::Hour,
            _ => TimeUnit::Day,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
        }
    }
}

/// Backward offset for the effective slider position.
///
/// The hover position wins over the selected one. Returns `None` when the
/// effective position is outside a series of `series_len` points.
pub fn resolve(hover_index: Option<usize>, selected_index: usize, series_len: usize) -> Option<usize> {
    let effective = hover_index.unwrap_or(selected_index);
    if effective >= series_len {
        return None;
    }
    Some(series_len - 1 - effective)
}

/// Array position of the point `offset` units before the newest one.
pub fn array_index(series_len: usize, offset: usize) -> Option<usize> {
    series_len.checked_sub(1)?.checked_sub(offset)
}

/// "Now", "1 hour ago", "3 days ago"
pub fn ago_label(offset: usize, unit: TimeUnit) -> String {
    match offset {
        0 => "Now".to_string(),
        1 => format!("1 {} ago", unit.noun()),
        n => format!("{} {}s ago", n, unit.noun()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_selected_newest() {
        assert_eq!(resolve(None, 23, 24), Some(0));
        assert_eq!(resolve(None, 0, 24), Some(23));
    }

    #[test]
    fn test_hover_overrides_selection() {
        assert_eq!(resolve(Some(20), 23, 24), Some(3));
        assert_eq!(resolve(Some(23), 0, 24), Some(0));
    }

    #[test]
    fn test_resolve_out_of_range() {
        assert_eq!(resolve(None, 24, 24), None);
        assert_eq!(resolve(None, 0, 0), None);
        assert_eq!(resolve(Some(30), 1, 24), None);
    }

    #[test]
    fn test_array_index_inverts_offset() {
        assert_eq!(array_index(24, 0), Some(23));
        assert_eq!(array_index(24, 23), Some(0));
        assert_eq!(array_index(24, 24), None);
        assert_eq!(array_index(0, 0), None);

        // resolve + array_index land back on the slider position
        for slider in 0..24 {
            let offset = resolve(None, slider, 24).unwrap();
            assert_eq!(array_index(24, offset), Some(slider));
        }
    }

    #[test]
    fn test_ago_label() {
        assert_eq!(ago_label(0, TimeUnit::Hour), "Now");
        assert_eq!(ago_label(1, TimeUnit::Hour), "1 hour ago");
        assert_eq!(ago_label(5, TimeUnit::Hour), "5 hours ago");
        assert_eq!(ago_label(3, TimeUnit::for_timeframe("30d")), "3 days ago");
    }
}
