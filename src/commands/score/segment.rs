use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{PageType, QueryType, Segments};

/// URL path patterns, checked in order; the first match decides.
const PAGE_PATTERNS: [(PageType, &str); 4] = [
    (PageType::System, r"/(login|app|user)"),
    (PageType::Blog, r"/blog/"),
    (PageType::Template, r"/template"),
    (PageType::Feature, r"/features/"),
];

#[derive(Debug)]
pub struct Segmenter {
    page_patterns: Vec<(PageType, Regex)>,
    brand_pattern: Option<Regex>,
}

impl Segmenter {
    pub fn new(brand_terms: &[String]) -> Result<Self> {
        let mut page_patterns = Vec::with_capacity(PAGE_PATTERNS.len());
        for (page_type, pattern) in PAGE_PATTERNS {
            let regex = Regex::new(&format!("(?i){pattern}")).with_context(|| {
                format!("failed to compile {} page pattern", page_type.as_str())
            })?;
            page_patterns.push((page_type, regex));
        }

        let escaped_terms = brand_terms
            .iter()
            .map(|term| term.trim())
            .filter(|term| !term.is_empty())
            .map(regex::escape)
            .collect::<Vec<String>>();
        let brand_pattern = if escaped_terms.is_empty() {
            None
        } else {
            let pattern = format!("(?i)(?:{})", escaped_terms.join("|"));
            Some(Regex::new(&pattern).context("failed to compile brand term pattern")?)
        };

        Ok(Self {
            page_patterns,
            brand_pattern,
        })
    }

    pub fn page_type(&self, url: Option<&str>) -> PageType {
        let Some(url) = url else {
            return PageType::Other;
        };
        self.page_patterns
            .iter()
            .find(|(_, regex)| regex.is_match(url))
            .map(|(page_type, _)| *page_type)
            .unwrap_or(PageType::Other)
    }

    pub fn query_type(&self, keyword: Option<&str>) -> QueryType {
        match (keyword, &self.brand_pattern) {
            (Some(keyword), Some(pattern)) if pattern.is_match(keyword) => QueryType::Brand,
            _ => QueryType::NonBrand,
        }
    }

    pub fn segment(&self, keyword: Option<&str>, url: Option<&str>) -> Segments {
        Segments {
            page_type: self.page_type(url),
            query_type: self.query_type(keyword),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> Segmenter {
        Segmenter::new(&["jotform".to_string(), "sign in".to_string()])
            .expect("default patterns should compile")
    }

    #[test]
    fn page_type_prefers_system_paths() {
        let segmenter = segmenter();
        assert_eq!(
            segmenter.page_type(Some("https://example.com/login?next=/blog/x")),
            PageType::System
        );
        assert_eq!(
            segmenter.page_type(Some("https://example.com/Blog/how-to")),
            PageType::Blog
        );
        assert_eq!(
            segmenter.page_type(Some("https://example.com/templates/invoice")),
            PageType::Template
        );
        assert_eq!(
            segmenter.page_type(Some("https://example.com/features/pdf")),
            PageType::Feature
        );
        assert_eq!(
            segmenter.page_type(Some("https://example.com/pricing")),
            PageType::Other
        );
        assert_eq!(segmenter.page_type(None), PageType::Other);
    }

    #[test]
    fn brand_terms_match_case_insensitively() {
        let segmenter = segmenter();
        assert_eq!(segmenter.query_type(Some("JotForm pricing")), QueryType::Brand);
        assert_eq!(segmenter.query_type(Some("how to sign in")), QueryType::Brand);
        assert_eq!(segmenter.query_type(Some("form builder")), QueryType::NonBrand);
        assert_eq!(segmenter.query_type(None), QueryType::NonBrand);
    }

    #[test]
    fn brand_terms_are_literal_text() {
        let segmenter = Segmenter::new(&["a+b".to_string(), "  ".to_string()])
            .expect("escaped terms should compile");
        assert_eq!(segmenter.query_type(Some("a+b form")), QueryType::Brand);
        assert_eq!(segmenter.query_type(Some("aab form")), QueryType::NonBrand);

        let empty = Segmenter::new(&[]).expect("empty term list is allowed");
        assert_eq!(empty.query_type(Some("jotform")), QueryType::NonBrand);
    }
}
