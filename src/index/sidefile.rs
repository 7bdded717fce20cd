use super::{ContigRecord, SequenceIndex};
use crate::{Error, Result};
use noodles::fasta::fai;
use std::io::{self, BufRead, BufWriter, Write};

/// Parse a `.fai` side-file.
///
/// Anything noodles cannot parse, including non-UTF-8 text, is a
/// `CorruptIndex`; only genuine read failures surface as `Io`.
pub(super) fn read<R: BufRead>(reader: R) -> Result<SequenceIndex> {
    let index = fai::io::Reader::new(reader)
        .read_index()
        .map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
                Error::CorruptIndex(e.to_string())
            }
            _ => Error::Io(e),
        })?;

    let records = index
        .as_ref()
        .iter()
        .map(|record| {
            let record = ContigRecord::try_from(record)?;
            record.check_layout()?;
            Ok(record)
        })
        .collect::<std::result::Result<Vec<_>, String>>()
        .map_err(Error::CorruptIndex)?;

    SequenceIndex::from_records(records).map_err(Error::CorruptIndex)
}

pub(super) fn write<W: Write>(writer: W, records: &[ContigRecord]) -> Result<()> {
    let index = fai::Index::from(records.iter().map(fai::Record::from).collect::<Vec<_>>());
    let mut writer = fai::io::Writer::new(BufWriter::new(writer));
    writer.write_index(&index)?;
    writer.get_mut().flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_str(text: &str) -> Result<SequenceIndex> {
        read(text.as_bytes())
    }

    #[test]
    fn test_read() {
        let index = read_str("chr1\t1000\t6\t60\t61\nchrM\t16569\t1030\t70\t71\n").unwrap();
        assert_eq!(index.len(), 2);
        let chrm = index.lookup("chrM").unwrap();
        assert_eq!(chrm.length, 16569);
        assert_eq!(chrm.offset, 1030);
        assert_eq!(chrm.line_bases, 70);
        assert_eq!(chrm.line_width, 71);
    }

    #[test]
    fn test_missing_field() {
        let err = read_str("chr1\t1000\t6\t60\n").unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));

        let err = read_str("chr1\t1000\t6\t60\t61\nchr2\t1\t2\t3\n").unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_extra_field() {
        let err = read_str("chr2\t1\t2\t3\t4\t5\n").unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_non_integer_field() {
        let err = read_str("chr1\t1000\tsix\t60\t61\n").unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));

        let err = read_str("chr1\t-5\t6\t60\t61\n").unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_blank_line() {
        let err = read_str("chr1\t10\t6\t5\t6\n\n").unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_non_utf8() {
        let err = read(&b"chr\xff\t10\t6\t5\t6\n"[..]).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)), "{:?}", err);
    }

    #[test]
    fn test_inconsistent_layout() {
        assert!(matches!(
            read_str("chr1\t1000\t6\t61\t60\n"),
            Err(Error::CorruptIndex(_))
        ));
        assert!(matches!(
            read_str("chr1\t1000\t6\t0\t0\n"),
            Err(Error::CorruptIndex(_))
        ));
        assert!(read_str("empty\t0\t7\t0\t0\n").is_ok());
    }

    #[test]
    fn test_offset_overflow() {
        let err = read_str(&format!("chr1\t4\t{}\t4\t5\n", u64::MAX)).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));

        let err = read_str(&format!("chr1\t{}\t0\t1\t{}\n", u64::MAX, u64::MAX)).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));

        // A body whose extent ends exactly at u64::MAX is still addressable.
        let index = read_str(&format!("chr1\t4\t{}\t4\t5\n", u64::MAX - 5)).unwrap();
        assert_eq!(index.lookup("chr1").unwrap().byte_offset(3), u64::MAX - 2);
    }

    #[test]
    fn test_duplicate_names() {
        let err = read_str("chr1\t10\t6\t5\t6\nchr1\t10\t30\t5\t6\n").unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_write_layout() {
        let records = vec![ContigRecord {
            name: "chr1".to_string(),
            length: 1000,
            offset: 6,
            line_bases: 60,
            line_width: 61,
        }];
        let mut out = Vec::new();
        write(&mut out, &records).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "chr1\t1000\t6\t60\t61\n");
    }
}
