//! Reading-time estimate shown on article pages.

use pulldown_cmark::{Event, Parser, TagEnd};

const WORDS_PER_MINUTE: f64 = 650.0;

/// True for hiragana, katakana and common CJK ideographs.
pub fn is_japanese_char(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{4E00}'..='\u{9FAF}')
}

/// Count words, treating each Japanese character as one word.
pub fn word_count(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;

    for c in text.chars() {
        if is_japanese_char(c) {
            count += 1;
            in_word = false;
        } else if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            count += 1;
            in_word = true;
        }
    }

    count
}

/// Readable text of a markdown body: text and inline code, without markup.
///
/// Image alt text and code block contents are kept. Block boundaries become
/// newlines so words from adjacent blocks do not merge.
pub fn plain_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::TableCell,
            ) => text.push('\n'),
            _ => {}
        }
    }

    text
}

/// Minutes needed to read `text`, rounded up.
pub fn minutes(text: &str) -> u32 {
    (word_count(text) as f64 / WORDS_PER_MINUTE).ceil() as u32
}

/// Japanese display label, e.g. "3分で読めます".
pub fn minutes_read_label(text: &str) -> String {
    format!("{}分で読めます", minutes(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_mixed() {
        // 3 kana/kanji + "AI" + "DX"
        assert_eq!(word_count("宮崎のAI DX"), 5);
        assert_eq!(word_count("hello world"), 2);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_minutes_rounds_up() {
        let text = "あ".repeat(651);
        assert_eq!(minutes(&text), 2);
        assert_eq!(minutes_read_label(&"あ".repeat(650)), "1分で読めます");
    }

    #[test]
    fn test_markup_does_not_count_as_words() {
        let body = format!(
            "## 見出し\n\n{}\n\n![図](/img/a.png) [リンク](https://example.com) **強調** `code`\n\n- 項目\n\n```\nlet x = 1;\n```\n",
            "あ".repeat(630)
        );

        // Heading markers, link targets and fences push the raw count past one minute
        assert_eq!(word_count(&body), 656);
        assert_eq!(minutes_read_label(&body), "2分で読めます");

        let text = plain_text(&body);
        assert_eq!(word_count(&text), 646);
        assert!(text.contains("図"));
        assert!(text.contains("let x = 1;"));
        assert!(!text.contains("example.com"));
        assert_eq!(minutes_read_label(&text), "1分で読めます");
    }

    #[test]
    fn test_plain_text_separates_blocks() {
        assert_eq!(word_count(&plain_text("# Title\n\nBody text")), 3);
        assert_eq!(plain_text(""), "");
    }
}
