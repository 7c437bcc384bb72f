//! Page-view counters.
//!
//! The whole table is one CSV blob in the analytics bucket: one
//! `<page-name>,<count>` row per page, rows terminated by CRLF, no header.
//! Every view reads, updates and rewrites the entire blob.

use csv::{ReaderBuilder, Terminator, WriterBuilder};

use crate::backend::Backend;
use crate::error::{WikiError, WikiResult};
use crate::locks::poisoned;

const TABLE_NAME: &str = "popularity table";

/// Ordered `(page, views)` rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PopularityTable {
    rows: Vec<(String, u64)>,
}

impl PopularityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the CSV form. Rows may end in CR, LF or CRLF; blank lines are
    /// ignored and repeated names are merged.
    pub fn parse(data: &[u8]) -> WikiResult<Self> {
        let corrupt = |reason: String| WikiError::CorruptRecord {
            key: TABLE_NAME.into(),
            reason,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .terminator(Terminator::CRLF)
            .from_reader(data);

        let mut table = Self::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| corrupt(e.to_string()))?;
            let (Some(name), Some(count), None) = (record.get(0), record.get(1), record.get(2)) else {
                return Err(corrupt(format!("row {}: expected 2 fields, got {}", line + 1, record.len())));
            };
            let count: u64 = count
                .trim()
                .parse()
                .map_err(|_| corrupt(format!("row {}: bad count {count:?}", line + 1)))?;
            table.add(name, count);
        }
        Ok(table)
    }

    /// Serialize to the CSV form.
    pub fn to_csv(&self) -> WikiResult<Vec<u8>> {
        let failed = |e: String| WikiError::Internal(format!("{TABLE_NAME} encoding: {e}"));
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::CRLF)
            .from_writer(Vec::new());
        for (name, count) in &self.rows {
            writer
                .write_record([name.as_str(), count.to_string().as_str()])
                .map_err(|e| failed(e.to_string()))?;
        }
        writer.into_inner().map_err(|e| failed(e.to_string()))
    }

    pub fn rows(&self) -> &[(String, u64)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        self.rows.iter().find(|(n, _)| n == name).map(|(_, c)| *c)
    }

    fn add(&mut self, name: &str, views: u64) {
        match self.rows.iter_mut().find(|(n, _)| n == name) {
            Some((_, count)) => *count = count.saturating_add(views),
            None => self.rows.push((name.to_string(), views)),
        }
    }

    /// Count one view of `name`, adding the row if it is new.
    pub fn increment(&mut self, name: &str) {
        self.add(name, 1);
    }

    /// Add `name` with zero views unless present. Returns `true` if added.
    pub fn ensure(&mut self, name: &str) -> bool {
        if self.count(name).is_some() {
            return false;
        }
        self.rows.push((name.to_string(), 0));
        true
    }

    /// Page names, most viewed first; ties by name.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut rows: Vec<&(String, u64)> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows.into_iter().map(|(name, _)| name.clone()).collect()
    }
}

impl Backend {
    /// The current table; an absent blob is an empty table.
    pub fn popularity_table(&self) -> WikiResult<PopularityTable> {
        match self
            .store
            .read(&self.config.buckets.analytics, &self.config.popularity_key)?
        {
            Some(data) => PopularityTable::parse(&data),
            None => Ok(PopularityTable::new()),
        }
    }

    fn save_popularity(&self, table: &PopularityTable) -> WikiResult<()> {
        self.store.write(
            &self.config.buckets.analytics,
            &self.config.popularity_key,
            &table.to_csv()?,
        )?;
        Ok(())
    }

    /// Count one view of a page.
    pub fn record_view(&self, name: &str) -> WikiResult<()> {
        let _guard = self.popularity_lock.lock().map_err(poisoned)?;
        let mut table = self.popularity_table()?;
        table.increment(name);
        self.save_popularity(&table)?;
        tracing::debug!(page = name, views = ?table.count(name), "view recorded");
        Ok(())
    }

    /// Give every live page a row, defaulting to zero views.
    pub fn ensure_all_pages_present(&self) -> WikiResult<PopularityTable> {
        let pages = self.list_pages()?;
        let _guard = self.popularity_lock.lock().map_err(poisoned)?;
        let mut table = self.popularity_table()?;
        let added = pages.iter().filter(|page| table.ensure(page)).count();
        if added > 0 {
            self.save_popularity(&table)?;
            tracing::info!(added, "popularity table extended");
        }
        Ok(table)
    }

    /// Page names from the table, most viewed first.
    pub fn sort_by_popularity(&self) -> WikiResult<Vec<String>> {
        Ok(self.popularity_table()?.sorted_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::harness;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use tonewiki_store::BlobStore;

    const SAMPLE: &[u8] = b"hello,1\r\nthere,3\r\nworld,2\r\n";

    #[test]
    fn parse_sample() {
        let table = PopularityTable::parse(SAMPLE).unwrap();
        assert_eq!(
            table.rows(),
            &[
                ("hello".to_string(), 1),
                ("there".to_string(), 3),
                ("world".to_string(), 2)
            ]
        );
    }

    #[test]
    fn parse_accepts_bare_cr_and_blank_lines() {
        let table = PopularityTable::parse(b"hello,1\rthere,3\r\n\r\nworld, 2").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.count("world"), Some(2));
    }

    #[test]
    fn parse_merges_duplicates() {
        let table = PopularityTable::parse(b"hello,1\r\nhello,4\r\n").unwrap();
        assert_eq!(table.rows(), &[("hello".to_string(), 5)]);
    }

    #[test]
    fn parse_rejects_bad_rows() {
        assert!(matches!(
            PopularityTable::parse(b"hello\r\n"),
            Err(WikiError::CorruptRecord { .. })
        ));
        assert!(matches!(
            PopularityTable::parse(b"hello,many\r\n"),
            Err(WikiError::CorruptRecord { .. })
        ));
        assert!(matches!(
            PopularityTable::parse(b"hello,1,2\r\n"),
            Err(WikiError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn names_with_commas_are_quoted() {
        let mut table = PopularityTable::new();
        table.increment("Chords, extended");
        let csv = table.to_csv().unwrap();
        assert_eq!(csv, b"\"Chords, extended\",1\r\n");
        assert_eq!(PopularityTable::parse(&csv).unwrap(), table);
    }

    #[test]
    fn viewing_increments_only_that_page() {
        let h = harness();
        h.store.write("page-analytics", "page_views.csv", SAMPLE).unwrap();
        h.backend.record_view("hello").unwrap();
        assert_eq!(
            h.store.read("page-analytics", "page_views.csv").unwrap().unwrap(),
            b"hello,2\r\nthere,3\r\nworld,2\r\n"
        );
    }

    #[test]
    fn first_view_adds_a_row() {
        let h = harness();
        h.backend.record_view("melody").unwrap();
        assert_eq!(
            h.store.read("page-analytics", "page_views.csv").unwrap().unwrap(),
            b"melody,1\r\n"
        );
    }

    #[test]
    fn sort_by_popularity_descending() {
        let h = harness();
        h.store
            .write("page-analytics", "page_views.csv", b"hello,1\r\nthere,3\r\nworld,4\r\n")
            .unwrap();
        assert_eq!(
            h.backend.sort_by_popularity().unwrap(),
            vec!["world", "there", "hello"]
        );
    }

    #[test]
    fn ties_sort_by_name() {
        let table = PopularityTable::parse(b"b,2\r\na,2\r\nc,9\r\n").unwrap();
        assert_eq!(table.sorted_names(), vec!["c", "a", "b"]);
    }

    #[test]
    fn ensure_all_pages_present_defaults_to_zero() {
        let h = harness();
        for key in ["chord.md", "melody.md", "test_url.md"] {
            h.store.write("content", key, b"x").unwrap();
        }
        h.store.write("page-analytics", "page_views.csv", b"chord,7\r\n").unwrap();

        let table = h.backend.ensure_all_pages_present().unwrap();
        assert_eq!(table.count("chord"), Some(7));
        assert_eq!(table.count("melody"), Some(0));
        assert_eq!(table.count("test_url"), None);
        assert_eq!(
            h.store.read("page-analytics", "page_views.csv").unwrap().unwrap(),
            b"chord,7\r\nmelody,0\r\n"
        );
    }

    #[test]
    fn concurrent_views_are_not_lost() {
        let h = harness();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..25 {
                        h.backend.record_view("rhythm").unwrap();
                    }
                });
            }
        });
        assert_eq!(h.backend.popularity_table().unwrap().count("rhythm"), Some(200));
    }

    proptest! {
        #[test]
        fn csv_roundtrip_preserves_rows(
            rows in proptest::collection::btree_map("[a-zA-Z0-9 ,\"_-]{1,16}", 0u64..1_000_000, 0..20)
        ) {
            let mut table = PopularityTable::new();
            for (name, count) in &rows {
                table.add(name, *count);
            }

            let parsed = PopularityTable::parse(&table.to_csv().unwrap()).unwrap();
            let actual: BTreeMap<String, u64> = parsed.rows().iter().cloned().collect();
            prop_assert_eq!(actual, rows);
        }
    }
}
