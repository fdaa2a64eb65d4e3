use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.split('\t')
        .enumerate()
        .map(|(i, part)| {
            let w = UnicodeWidthStr::width(part);
            if i > 0 { w + 4 } else { w }
        })
        .sum()
}

fn grapheme_display_width(g: &str) -> usize {
    if g == "\t" { 4 } else { UnicodeWidthStr::width(g) }
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1; // reserve 1 cell for '…'
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = grapheme_display_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

/// Left-pad with spaces to `cells` wide.
pub fn right_align(s: &str, cells: usize) -> String {
    let pad = cells.saturating_sub(display_width(s));
    format!("{}{}", " ".repeat(pad), s)
}

/// Truncate or right-pad to exactly `cells` wide.
pub fn fit_to_width(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let pad = cells.saturating_sub(display_width(&out));
    out.push_str(&" ".repeat(pad));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_counts_wide_chars() {
        assert_eq!(display_width("milk"), 4);
        assert_eq!(display_width("豆腐"), 4);
        assert_eq!(display_width("a\tb"), 6);
    }

    #[test]
    fn truncate_keeps_graphemes_whole() {
        assert_eq!(truncate_to_width("tomatoes", 5), "toma…");
        assert_eq!(truncate_to_width("豆腐豆腐", 4), "豆…");
        assert_eq!(truncate_to_width("eggs", 4), "eggs");
        assert_eq!(truncate_to_width("eggs", 1), "…");
        assert_eq!(truncate_to_width("eggs", 0), "");
    }

    #[test]
    fn align_and_fit() {
        assert_eq!(right_align("7", 3), "  7");
        assert_eq!(right_align("1234", 3), "1234");
        assert_eq!(fit_to_width("oat", 5), "oat  ");
        assert_eq!(fit_to_width("oatmeal", 5), "oatm…");
    }
}
