//! Lazy parsing of wire records in query responses.

use meridian_swarm_peer::{AddressParseError, AddressRecord};

use crate::proto;

/// A response entry that could not be parsed.
#[derive(Debug)]
pub struct MalformedEntry {
    /// Position in the response.
    pub index: usize,
    /// The raw address string.
    pub address: String,
    pub error: AddressParseError,
}

/// Iterator over well-formed records, remembering the entries it skipped.
#[derive(Debug)]
pub struct ParseRecords<I> {
    entries: std::iter::Enumerate<I>,
    failures: Vec<MalformedEntry>,
}

/// Parse wire entries lazily, skipping malformed ones.
///
/// Order of the well-formed records is preserved.
pub fn parse_records<I>(entries: I) -> ParseRecords<I::IntoIter>
where
    I: IntoIterator<Item = proto::MultiAddress>,
{
    ParseRecords {
        entries: entries.into_iter().enumerate(),
        failures: Vec::new(),
    }
}

impl<I> ParseRecords<I> {
    pub fn failures(&self) -> &[MalformedEntry] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<MalformedEntry> {
        self.failures
    }
}

impl<I> Iterator for ParseRecords<I>
where
    I: Iterator<Item = proto::MultiAddress>,
{
    type Item = AddressRecord;

    fn next(&mut self) -> Option<AddressRecord> {
        loop {
            let (index, entry) = self.entries.next()?;
            let address = entry.multi_address.clone();
            match AddressRecord::try_from(entry) {
                Ok(record) => return Some(record),
                Err(error) => self.failures.push(MalformedEntry {
                    index,
                    address,
                    error,
                }),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.entries.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn entry(address: &str, nonce: u64) -> proto::MultiAddress {
        proto::MultiAddress {
            multi_address: address.into(),
            signature: Bytes::from_static(b"sig"),
            multi_address_nonce: nonce,
        }
    }

    #[test]
    fn test_skips_malformed() {
        let entries = vec![
            entry("/ip4/10.0.0.1/tcp/1/meridian/aa", 1),
            entry("garbage", 2),
            entry("/ip4/10.0.0.2/tcp/1/meridian/bb", 3),
            entry("", 4),
        ];

        let mut parsed = parse_records(entries);
        let records: Vec<_> = parsed.by_ref().collect();

        let nonces: Vec<u64> = records.iter().map(|r| r.nonce()).collect();
        assert_eq!(nonces, [1, 3]);

        let failures = parsed.into_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].address, "garbage");
        assert_eq!(failures[1].index, 3);
    }

    #[test]
    fn test_lazy() {
        let mut parsed = parse_records(vec![entry("garbage", 1), entry("/ip4/10.0.0.1/tcp/1/meridian/aa", 2)]);
        assert!(parsed.failures().is_empty());

        assert_eq!(parsed.next().map(|r| r.nonce()), Some(2));
        assert_eq!(parsed.failures().len(), 1);
        assert!(parsed.next().is_none());
    }
}
