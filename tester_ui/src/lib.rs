#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Console rendering for the bench display and sweep progress.

/// `[#####-----] 25/50` style bar. `width` counts the cells between brackets.
pub fn render_progress_bar(done: u32, total: u32, width: usize) -> String {
    let done = done.min(total);
    let filled = if total == 0 {
        width
    } else {
        (u64::from(done) * width as u64 / u64::from(total)) as usize
    };
    let mut s = String::with_capacity(width + 16);
    s.push('[');
    s.extend(std::iter::repeat_n('#', filled));
    s.extend(std::iter::repeat_n('-', width - filled));
    s.push(']');
    s.push_str(&format!(" {done}/{total}"));
    s
}

/// Boxed one-line frame imitating a character LCD of `width` columns.
///
/// Text longer than the display is cut; shorter text is left-aligned.
pub fn render_display_frame(text: &str, width: usize) -> String {
    let shown: String = text.chars().take(width).collect();
    let pad = width - shown.chars().count();
    let border = "-".repeat(width);
    format!("+{border}+\n|{shown}{}|\n+{border}+", " ".repeat(pad))
}
