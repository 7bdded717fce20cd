use super::ContigRecord;
use crate::{Error, Result};
use noodles::fasta::io::Indexer;
use noodles::fasta::record::{definition::ParseError, Definition};
use std::io::{self, BufRead, Read, Seek, SeekFrom};

const DEFINITION_PREFIX: u8 = b'>';

/// Scan a FASTA stream once and return one record per contig in file order.
///
/// Each body is handed to noodles' indexer; headers are parsed here first so
/// that contigs without any sequence still get a record. Duplicate names are
/// checked by the caller when the index is assembled.
pub(super) fn scan<R: BufRead + Seek>(reader: &mut R) -> Result<Vec<ContigRecord>> {
    let mut records = Vec::new();
    let mut header = Vec::new();

    loop {
        let header_start = reader.stream_position()?;
        header.clear();
        if reader.read_until(b'\n', &mut header)? == 0 {
            break;
        }
        let name = parse_name(&header, header_start)?;

        let next = reader.fill_buf()?;
        let record = if next.is_empty() || next[0] == DEFINITION_PREFIX {
            ContigRecord {
                name,
                length: 0,
                offset: header_start + header.len() as u64,
                line_bases: 0,
                line_width: 0,
            }
        } else {
            index_body(reader, &header, header_start, name)?
        };

        tracing::debug!(
            "indexed {} ({} bp) at offset {}",
            record.name,
            record.length,
            record.offset
        );
        records.push(record);
    }

    Ok(records)
}

/// Contig name: the first whitespace-delimited token of the header.
fn parse_name(header: &[u8], at: u64) -> Result<String> {
    let line = std::str::from_utf8(trim_terminator(header)).map_err(|_| {
        Error::MalformedIndex(format!("header at byte {} is not valid UTF-8", at))
    })?;

    let definition: Definition = line.parse().map_err(|e| match e {
        ParseError::Empty | ParseError::MissingPrefix => Error::MalformedIndex(format!(
            "expected a header at byte {}, found {:?}",
            at, line
        )),
        ParseError::MissingName => {
            Error::MalformedIndex(format!("empty contig name at byte {}", at))
        }
    })?;

    Ok(String::from_utf8_lossy(definition.name()).into_owned())
}

fn index_body<R: BufRead + Seek>(
    reader: &mut R,
    header: &[u8],
    header_start: u64,
    name: String,
) -> Result<ContigRecord> {
    // The indexer wants to see the header itself; replay it ahead of the body.
    let indexed = Indexer::new(header.chain(&mut *reader))
        .index_record()
        .map_err(io::Error::from)
        .map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
                Error::MalformedIndex(format!("{}: {}", name, e))
            }
            _ => Error::Io(e),
        })?
        .ok_or_else(|| Error::MalformedIndex(format!("{}: missing sequence", name)))?;

    let record = ContigRecord {
        name,
        length: indexed.length(),
        offset: header_start + indexed.offset(),
        line_bases: indexed.line_bases(),
        line_width: indexed.line_width(),
    };
    record.check_layout().map_err(Error::MalformedIndex)?;
    check_final_line(reader, &record)?;
    Ok(record)
}

/// The indexer never compares the final line against `line_bases`, so a final
/// line holding extra bases (or followed by blank lines) is caught here: the
/// body must end exactly at the line that carries the last base.
fn check_final_line<R: BufRead + Seek>(reader: &mut R, record: &ContigRecord) -> Result<()> {
    let body_end = reader.stream_position()?;
    let full_lines = (record.length - 1) / record.line_bases;
    let last_bases = record.length - full_lines * record.line_bases;
    let last_start = record.offset + full_lines * record.line_width;

    let ok = if last_start > body_end {
        false
    } else {
        let mut line = Vec::new();
        reader.seek(SeekFrom::Start(last_start))?;
        reader
            .by_ref()
            .take(body_end - last_start)
            .read_until(b'\n', &mut line)?;
        line.len() as u64 == body_end - last_start
            && trim_terminator(&line).len() as u64 == last_bases
    };
    reader.seek(SeekFrom::Start(body_end))?;

    if ok {
        Ok(())
    } else {
        Err(Error::MalformedIndex(format!(
            "{}: final line does not match the {}-base layout",
            record.name, record.line_bases
        )))
    }
}

fn trim_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
