//! Archive assembly
//!
//! Entries are accepted in any order while downloads complete, then
//! compressed once at finalization. Finalization consumes the builder and
//! refuses to run until the descriptor and every expected asset have arrived,
//! so a failed operation never yields a partial archive.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};

use bytes::Bytes;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::app::models::{ArchiveEntry, AssetReference};
use crate::app::progress::render_progress_bar;
use crate::constants::archive::{COMPRESSION_LEVEL, DESCRIPTOR_ENTRY};
use crate::errors::{ArchiveError, ArchiveResult};

/// Compression progress event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionProgress {
    /// Whole-number percentage of entries processed
    pub percent: u64,
    /// Entry currently being compressed, if any
    pub entry: Option<String>,
}

impl CompressionProgress {
    /// Status line such as `[====>   ] Compressing Files... 25% cat.svg`
    pub fn message(&self) -> String {
        let mut message = format!(
            "{} Compressing Files... {}%",
            render_progress_bar(self.percent, 100),
            self.percent
        );
        if let Some(entry) = &self.entry {
            message.push(' ');
            message.push_str(entry);
        }
        message
    }
}

/// Forwards compression status lines, dropping consecutive duplicates
pub struct CompressionReporter<F: FnMut(&str)> {
    sink: F,
    last: Option<String>,
}

impl<F: FnMut(&str)> CompressionReporter<F> {
    pub fn new(sink: F) -> Self {
        Self { sink, last: None }
    }

    /// Report one event; returns whether a line was emitted
    pub fn report(&mut self, progress: &CompressionProgress) -> bool {
        let message = progress.message();
        if self.last.as_deref() == Some(message.as_str()) {
            return false;
        }
        (self.sink)(&message);
        self.last = Some(message);
        true
    }
}

/// Finished archive buffer
#[derive(Debug, Clone)]
pub struct BuiltArchive {
    pub bytes: Bytes,
    pub entry_count: usize,
}

impl BuiltArchive {
    /// Total archive size in bytes
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Accumulates archive entries for one project
#[derive(Debug)]
pub struct ArchiveBuilder {
    expected: BTreeSet<String>,
    entries: BTreeMap<String, Bytes>,
}

impl ArchiveBuilder {
    /// Expect the descriptor plus one entry per asset reference
    pub fn new<'a>(assets: impl IntoIterator<Item = &'a AssetReference>) -> Self {
        let mut expected: BTreeSet<String> = assets.into_iter().map(AssetReference::entry_name).collect();
        expected.insert(DESCRIPTOR_ENTRY.to_string());
        Self {
            expected,
            entries: BTreeMap::new(),
        }
    }

    /// Add one entry; each expected name is accepted exactly once
    pub fn add(&mut self, entry: ArchiveEntry) -> ArchiveResult<()> {
        if !self.expected.contains(&entry.name) {
            return Err(ArchiveError::UnexpectedEntry { name: entry.name });
        }
        if self.entries.contains_key(&entry.name) {
            return Err(ArchiveError::DuplicateEntry { name: entry.name });
        }
        debug!("Archive entry added: {} ({} bytes)", entry.name, entry.bytes.len());
        self.entries.insert(entry.name, entry.bytes);
        Ok(())
    }

    pub fn add_descriptor(&mut self, bytes: impl Into<Bytes>) -> ArchiveResult<()> {
        self.add(ArchiveEntry::descriptor(bytes))
    }

    pub fn add_asset(&mut self, reference: &AssetReference, bytes: impl Into<Bytes>) -> ArchiveResult<()> {
        self.add(ArchiveEntry::asset(reference, bytes))
    }

    /// Number of entries added so far
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries the finished archive will hold
    pub fn expected_count(&self) -> usize {
        self.expected.len()
    }

    pub fn is_complete(&self) -> bool {
        self.entries.len() == self.expected.len()
    }

    /// Expected entry names not yet added, in name order
    pub fn missing(&self) -> Vec<String> {
        self.expected
            .iter()
            .filter(|name| !self.entries.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Compress every entry with deflate at maximum level
    ///
    /// `project.json` is written first, followed by assets in name order.
    /// `on_progress` receives one event before each entry and a final event
    /// at 100%.
    pub fn finalize(
        self,
        mut on_progress: impl FnMut(&CompressionProgress),
    ) -> ArchiveResult<BuiltArchive> {
        if !self.is_complete() {
            return Err(ArchiveError::Incomplete {
                missing: self.missing(),
            });
        }

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL));

        let mut entries = self.entries;
        let total = entries.len();
        let mut ordered = Vec::with_capacity(total);
        if let Some(descriptor) = entries.remove(DESCRIPTOR_ENTRY) {
            ordered.push((DESCRIPTOR_ENTRY.to_string(), descriptor));
        }
        ordered.extend(entries);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (index, (name, bytes)) in ordered.iter().enumerate() {
            on_progress(&CompressionProgress {
                percent: (index * 100 / total) as u64,
                entry: Some(name.clone()),
            });
            zip.start_file(name.as_str(), options)?;
            zip.write_all(bytes)?;
        }
        let buffer = zip.finish()?.into_inner();

        on_progress(&CompressionProgress {
            percent: 100,
            entry: None,
        });

        info!("Archive built: {} entries, {} bytes", total, buffer.len());
        Ok(BuiltArchive {
            bytes: Bytes::from(buffer),
            entry_count: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn assets() -> Vec<AssetReference> {
        vec![
            AssetReference::new("cat", "svg"),
            AssetReference::new("meow", "wav"),
        ]
    }

    fn read_back(archive: &BuiltArchive) -> Vec<(String, Vec<u8>)> {
        let mut zip = ZipArchive::new(Cursor::new(archive.bytes.to_vec())).unwrap();
        (0..zip.len())
            .map(|i| {
                let mut file = zip.by_index(i).unwrap();
                assert_eq!(file.compression(), CompressionMethod::Deflated);
                let mut contents = Vec::new();
                file.read_to_end(&mut contents).unwrap();
                (file.name().to_string(), contents)
            })
            .collect()
    }

    #[test]
    fn test_entries_accepted_in_any_order() {
        let assets = assets();
        let mut builder = ArchiveBuilder::new(&assets);
        assert_eq!(builder.expected_count(), 3);

        builder.add_asset(&assets[1], &b"RIFF"[..]).unwrap();
        builder.add_descriptor(&b"{\"targets\":[]}"[..]).unwrap();
        assert!(!builder.is_complete());
        assert_eq!(builder.missing(), vec!["cat.svg"]);
        builder.add_asset(&assets[0], &b"<svg/>"[..]).unwrap();
        assert!(builder.is_complete());

        let archive = builder.finalize(|_| {}).unwrap();
        assert_eq!(archive.entry_count, assets.len() + 1);
        assert_eq!(archive.size(), archive.bytes.len() as u64);

        let entries = read_back(&archive);
        let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["project.json", "cat.svg", "meow.wav"]);
        assert_eq!(entries[1].1, b"<svg/>");
    }

    #[test]
    fn test_finalize_before_complete_fails() {
        let assets = assets();
        let mut builder = ArchiveBuilder::new(&assets);
        builder.add_asset(&assets[0], &b"<svg/>"[..]).unwrap();

        match builder.finalize(|_| {}) {
            Err(ArchiveError::Incomplete { missing }) => {
                assert_eq!(missing, vec!["meow.wav", "project.json"]);
            }
            other => panic!("Expected Incomplete, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_and_unexpected_entries_rejected() {
        let assets = assets();
        let mut builder = ArchiveBuilder::new(&assets);
        builder.add_asset(&assets[0], &b"a"[..]).unwrap();

        assert!(matches!(
            builder.add_asset(&assets[0], &b"b"[..]),
            Err(ArchiveError::DuplicateEntry { .. })
        ));
        assert!(matches!(
            builder.add_asset(&AssetReference::new("dog", "png"), &b"c"[..]),
            Err(ArchiveError::UnexpectedEntry { .. })
        ));
        assert_eq!(builder.entry_count(), 1);
    }

    #[test]
    fn test_descriptor_only_archive() {
        let no_assets: Vec<AssetReference> = Vec::new();
        let mut builder = ArchiveBuilder::new(&no_assets);
        builder.add_descriptor(&b"{}"[..]).unwrap();

        let mut events = Vec::new();
        let archive = builder.finalize(|p| events.push(p.clone())).unwrap();

        assert_eq!(read_back(&archive).len(), 1);
        assert_eq!(
            events,
            vec![
                CompressionProgress { percent: 0, entry: Some("project.json".to_string()) },
                CompressionProgress { percent: 100, entry: None },
            ]
        );
    }

    #[test]
    fn test_compression_messages() {
        let progress = CompressionProgress {
            percent: 50,
            entry: Some("cat.svg".to_string()),
        };
        assert_eq!(
            progress.message(),
            format!("[{}>{}] Compressing Files... 50% cat.svg", "=".repeat(9), " ".repeat(10))
        );

        let done = CompressionProgress { percent: 100, entry: None };
        assert_eq!(
            done.message(),
            format!("[{}] Compressing Files... 100%", "=".repeat(20))
        );
    }

    #[test]
    fn test_reporter_suppresses_consecutive_duplicates() {
        let mut lines = Vec::new();
        {
            let mut reporter = CompressionReporter::new(|line: &str| lines.push(line.to_string()));
            let first = CompressionProgress { percent: 10, entry: None };
            let second = CompressionProgress { percent: 20, entry: None };
            assert!(reporter.report(&first));
            assert!(!reporter.report(&first));
            assert!(reporter.report(&second));
            assert!(reporter.report(&first));
        }
        assert_eq!(lines.len(), 3);
    }
}
