use crate::codec::record_codec::RecordCodec;
use crate::core::error::Result;
use crate::schema::schema::CollectionSchema;
use crate::search::results::SearchResult;
use crate::storage::line_source::LineSource;

/// Substring filter and pager over a stream of table lines
pub struct QueryFilter {
    pub schema: CollectionSchema,
}

impl QueryFilter {
    pub fn new(schema: CollectionSchema) -> Self {
        QueryFilter { schema }
    }

    /// Lower-cased query words; whitespace and commas separate them
    pub fn tokenize(query: &str) -> Vec<String> {
        query
            .to_lowercase()
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty())
            .map(String::from)
            .collect()
    }

    /// Every word must occur somewhere in the line, case-insensitively
    pub fn matches(line: &str, words: &[String]) -> bool {
        if words.is_empty() {
            return true;
        }
        let line = line.to_lowercase();
        words.iter().all(|w| line.contains(w.as_str()))
    }

    /// Scan `source` once and return matches `start..start + limit`.
    ///
    /// `num_found` is the total from an earlier full scan of the same table
    /// and query. When given, the scan stops as soon as the page is filled
    /// and that value is reported as the total without being checked. If
    /// the stream ends first, the observed count is reported instead.
    pub fn run(
        &self,
        source: LineSource,
        query: &str,
        start: usize,
        limit: usize,
        num_found: Option<usize>,
    ) -> Result<SearchResult> {
        let words = Self::tokenize(query);
        let end = start.saturating_add(limit);

        let mut fcount = 0usize;
        let mut records = Vec::new();

        for line in source {
            let line = line?;
            if !Self::matches(&line, &words) {
                continue;
            }

            if fcount >= start && fcount < end {
                records.push(RecordCodec::decode(&line, &self.schema)?);
            }
            fcount += 1;

            if let Some(known) = num_found {
                if fcount >= end {
                    fcount = known;
                    break;
                }
            }
        }

        Ok(SearchResult {
            collection: self.schema.name.clone(),
            query: query.to_string(),
            start,
            records,
            num_found: fcount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema::IndexHome;

    fn filter() -> QueryFilter {
        QueryFilter::new(
            CollectionSchema::new("orthologs", "_orthologs", IndexHome::Pangenome)
                .add_text_field("id")
                .add_text_field("function"),
        )
    }

    fn source(lines: &[&str]) -> LineSource {
        LineSource::from_lines(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn tokenizer_splits_on_separators() {
        assert_eq!(QueryFilter::tokenize(" ABC,def\tGhi\r\n"), vec!["abc", "def", "ghi"]);
        assert!(QueryFilter::tokenize(" , ").is_empty());
    }

    #[test]
    fn all_words_must_match() {
        let result = filter()
            .run(source(&["x1\tabc only", "x2\tDEF and abc", "x3\tdef"]), "abc def", 0, 10, None)
            .unwrap();
        assert_eq!(result.num_found, 1);
        assert_eq!(result.column("id"), vec![Some("x2")]);
    }

    #[test]
    fn words_match_inside_longer_tokens() {
        let result = filter().run(source(&["x1\tkinase", "x2\tphosphatase"]), "nas", 0, 10, None).unwrap();
        assert_eq!(result.column("id"), vec![Some("x1")]);
    }

    #[test]
    fn empty_query_matches_everything() {
        let result = filter().run(source(&["a\t", "b\t", "c\t"]), "", 0, 2, None).unwrap();
        assert_eq!(result.num_found, 3);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn pages_past_the_end_are_empty() {
        let result = filter().run(source(&["a\tx", "b\tx"]), "x", 5, 1, None).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.num_found, 2);
        assert_eq!(result.start, 5);
    }

    #[test]
    fn known_total_stops_after_the_page() {
        let result = filter()
            .run(source(&["a\tx", "b\tx"]), "", 0, 1, Some(2))
            .unwrap();
        assert_eq!(result.column("id"), vec![Some("a")]);
        assert_eq!(result.num_found, 2);
    }

    #[test]
    fn known_total_is_trusted_over_the_stream() {
        // Five lines match, but the caller's total wins once the page is full
        let result = filter()
            .run(source(&["a\tx", "b\tx", "c\tx", "d\tx", "e\tx"]), "x", 1, 1, Some(2))
            .unwrap();
        assert_eq!(result.column("id"), vec![Some("b")]);
        assert_eq!(result.num_found, 2);
    }

    #[test]
    fn known_total_is_ignored_when_stream_ends_first() {
        let result = filter().run(source(&["a\tx", "b\tx"]), "", 1, 5, Some(40)).unwrap();
        assert_eq!(result.column("id"), vec![Some("b")]);
        assert_eq!(result.num_found, 2);
    }

    #[test]
    fn malformed_line_in_page_fails() {
        let err = filter().run(source(&["a\tb\tc"]), "", 0, 1, None).unwrap_err();
        assert_eq!(err.kind, crate::core::error::ErrorKind::MalformedRecord);
    }
}
