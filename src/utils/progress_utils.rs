use indicatif::{ProgressBar, ProgressStyle};

/// A progress bar for long per-player loops.
/// Returns `None` when there is nothing to track so callers can skip the bookkeeping.
pub fn progress_bar(len: u64, msg: String) -> Option<ProgressBar> {
    if len == 0 {
        return None;
    }

    let bar = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise} / {eta_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        .ok()?
        .progress_chars("##-");

    bar.set_style(style);
    bar.set_message(msg);

    Some(bar)
}

#[cfg(test)]
mod tests {
    use crate::utils::progress_utils::progress_bar;

    #[test]
    fn test_empty_progress_bar_is_skipped() {
        assert!(progress_bar(0, "Nothing".to_string()).is_none());
    }

    #[test]
    fn test_progress_bar_length() {
        let bar = progress_bar(10, "Rating players".to_string()).unwrap();
        assert_eq!(bar.length(), Some(10));
    }
}
