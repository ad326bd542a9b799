use regex::RegexBuilder;

/// Shortens a stored column value for display in a result list
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, keywords: &[String], max_chars: usize) -> String;

    fn name(&self) -> &str;
}

/// Leading text, cut at a word boundary
#[derive(Debug, Clone)]
pub struct HeadSummarizer {
    pub ellipsis: String,
}

impl Default for HeadSummarizer {
    fn default() -> Self {
        HeadSummarizer { ellipsis: "...".to_string() }
    }
}

impl Summarizer for HeadSummarizer {
    fn summarize(&self, text: &str, _keywords: &[String], max_chars: usize) -> String {
        match cut(text, max_chars) {
            Some(head) => format!("{}{}", head, self.ellipsis),
            None => text.to_string(),
        }
    }

    fn name(&self) -> &str {
        "head"
    }
}

/// Window around the first keyword found in the text
///
/// Falls back to the leading text when no keyword occurs.
#[derive(Debug, Clone)]
pub struct KeywordSummarizer {
    pub ellipsis: String,
    pub lead_chars: usize,  // Context kept before the keyword
}

impl Default for KeywordSummarizer {
    fn default() -> Self {
        KeywordSummarizer {
            ellipsis: "...".to_string(),
            lead_chars: 40,
        }
    }
}

impl KeywordSummarizer {
    fn first_match(text: &str, keywords: &[String]) -> Option<usize> {
        keywords
            .iter()
            .filter(|keyword| !keyword.trim().is_empty())
            .filter_map(|keyword| {
                RegexBuilder::new(&regex::escape(keyword.trim()))
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .and_then(|pattern| pattern.find(text))
                    .map(|found| found.start())
            })
            .min()
    }
}

impl Summarizer for KeywordSummarizer {
    fn summarize(&self, text: &str, keywords: &[String], max_chars: usize) -> String {
        let Some(hit) = Self::first_match(text, keywords) else {
            return HeadSummarizer { ellipsis: self.ellipsis.clone() }.summarize(text, keywords, max_chars);
        };

        let lead = self.lead_chars.min(max_chars / 2);
        let before: Vec<usize> = text[..hit].char_indices().map(|(i, _)| i).collect();
        let mut start = if before.len() > lead { before[before.len() - lead] } else { 0 };

        // Start on a word
        if start > 0 {
            if let Some((i, c)) = text[start..hit].char_indices().find(|(_, c)| c.is_whitespace()) {
                start += i + c.len_utf8();
            }
        }

        let rest = &text[start..];
        let prefix = if start > 0 { self.ellipsis.as_str() } else { "" };
        match cut(rest, max_chars) {
            Some(body) => format!("{}{}{}", prefix, body, self.ellipsis),
            None => format!("{}{}", prefix, rest),
        }
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// At most `max_chars` leading characters ending on a word boundary;
/// `None` when the whole text fits.
fn cut(text: &str, max_chars: usize) -> Option<&str> {
    let (end, next) = text.char_indices().nth(max_chars)?;
    let head = &text[..end];
    if next.is_whitespace() {
        return Some(head.trim_end());
    }
    let head = match head.rfind(char::is_whitespace) {
        Some(i) if i > 0 => &head[..i],
        _ => head,
    };
    Some(head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Rust is a systems language. Ownership keeps memory safe without a collector.";

    #[test]
    fn head_keeps_short_text() {
        assert_eq!(HeadSummarizer::default().summarize("short", &[], 20), "short");
    }

    #[test]
    fn head_cuts_on_word_boundary() {
        let summary = HeadSummarizer::default().summarize(TEXT, &[], 12);
        assert_eq!(summary, "Rust is a...");
    }

    #[test]
    fn head_counts_characters_not_bytes() {
        let summary = HeadSummarizer::default().summarize("한국어 검색 엔진", &[], 6);
        assert_eq!(summary, "한국어 검색...");
    }

    #[test]
    fn keyword_window_starts_near_match() {
        let summarizer = KeywordSummarizer { ellipsis: "...".into(), lead_chars: 5 };
        let summary = summarizer.summarize(TEXT, &["OWNERSHIP".to_string()], 20);

        assert!(summary.starts_with("..."));
        assert!(summary.contains("Ownership"));
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn keyword_missing_falls_back_to_head() {
        let summary = KeywordSummarizer::default().summarize(TEXT, &["python".to_string()], 12);
        assert_eq!(summary, "Rust is a...");
    }
}
