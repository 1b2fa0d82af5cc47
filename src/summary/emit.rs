//! Renders a `SummaryDescriptor` into the final teaser string: highlight
//! markup around matched ranges, continuation markers between windows, and
//! optional markup escaping, grounded on milli's `Matcher::get_formatted_text`.

use crate::config::{EscapeMarkup, SummaryConfig};
use crate::summary::descriptor::{MatchWindow, SummaryDescriptor};

pub fn render(doc: &str, descriptor: &SummaryDescriptor, config: &SummaryConfig) -> String {
    if descriptor.windows.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(config.length.min(doc.len()) + config.highlight_on.len() * 4);

    if !descriptor.whole_document && descriptor.windows[0].start_byte > 0 {
        out.push_str(&config.continuation);
    }
    for (i, window) in descriptor.windows.iter().enumerate() {
        if i > 0 {
            out.push_str(&config.continuation);
        }
        render_window(doc, window, config, &mut out);
    }
    if !descriptor.whole_document {
        if let Some(last) = descriptor.windows.last() {
            if last.end_byte < doc.len() {
                out.push_str(&config.continuation);
            }
        }
    }

    out
}

fn render_window(doc: &str, window: &MatchWindow, config: &SummaryConfig, out: &mut String) {
    let mut cursor = window.start_byte;
    for &(hs, he) in &window.highlights {
        let hs = hs.max(window.start_byte);
        let he = he.min(window.end_byte);
        if hs >= he || hs < cursor {
            continue;
        }
        push_text(out, &doc[cursor..hs], config);
        out.push_str(&config.highlight_on);
        push_text(out, &doc[hs..he], config);
        out.push_str(&config.highlight_off);
        cursor = he;
    }
    push_text(out, &doc[cursor..window.end_byte], config);
}

fn push_text(out: &mut String, text: &str, config: &SummaryConfig) {
    let escape = match config.escape_markup {
        EscapeMarkup::On => true,
        EscapeMarkup::Off => false,
        EscapeMarkup::Auto => text.contains(['<', '>', '&']),
    };
    if !escape {
        out.push_str(text);
        return;
    }
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_document_with_one_highlight() {
        let config = SummaryConfig::default();
        let doc = "the quick fox";
        let descriptor = SummaryDescriptor {
            whole_document: true,
            windows: vec![MatchWindow { start_byte: 4, end_byte: 9, highlights: vec![(4, 9)] }],
        };
        let rendered = render(doc, &descriptor, &config);
        assert_eq!(rendered, "the <b>quick</b> fox");
    }

    #[test]
    fn cropped_windows_get_continuations_on_both_sides() {
        let config = SummaryConfig::default();
        let doc = "0123456789abcdefghij";
        let descriptor = SummaryDescriptor {
            whole_document: false,
            windows: vec![MatchWindow { start_byte: 5, end_byte: 10, highlights: vec![] }],
        };
        let rendered = render(doc, &descriptor, &config);
        assert_eq!(rendered, "...56789...");
    }

    #[test]
    fn auto_escape_only_kicks_in_when_markup_chars_present() {
        let config = SummaryConfig::default();
        let doc = "a <script> tag";
        let descriptor =
            SummaryDescriptor { whole_document: true, windows: vec![MatchWindow { start_byte: 0, end_byte: doc.len(), highlights: vec![] }] };
        let rendered = render(doc, &descriptor, &config);
        assert!(rendered.contains("&lt;script&gt;"));
    }
}
