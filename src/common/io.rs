//! Common, IO-related code.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{bufread::MultiGzDecoder, write::GzEncoder, Compression};

/// Transparently open a file with gzip decoder.
pub fn open_read_maybe_gz<P>(path: P) -> Result<Box<dyn BufRead>, anyhow::Error>
where
    P: AsRef<Path>,
{
    if path.as_ref().extension().map(|s| s.to_str()) == Some(Some("gz")) {
        tracing::trace!("Opening {:?} as gzip for reading", path.as_ref());
        let file = File::open(path)?;
        let bufreader = BufReader::new(file);
        let decoder = MultiGzDecoder::new(bufreader);
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        tracing::trace!("Opening {:?} as plain text for reading", path.as_ref());
        let file = File::open(path).map(BufReader::new)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Transparently open a file with gzip encoder. Boxed as `Send` so a hit
/// sink can park the writer behind a `Mutex` and be called from worker
/// threads (see `search::WriterSink`).
pub fn open_write_maybe_gz<P>(path: P) -> Result<Box<dyn Write + Send>, anyhow::Error>
where
    P: AsRef<Path>,
{
    if path.as_ref().extension().map(|s| s.to_str()) == Some(Some("gz")) {
        tracing::trace!("Opening {:?} as gzip for writing", path.as_ref());
        let file = File::create(path)?;
        let bufwriter = BufWriter::new(file);
        let encoder = GzEncoder::new(bufwriter, Compression::default());
        Ok(Box::new(encoder))
    } else {
        tracing::trace!("Opening {:?} as plain text for writing", path.as_ref());
        let file = File::create(path)?;
        Ok(Box::new(file))
    }
}

/// Returns an iterator over the lines of a plain-text file (one query
/// pattern per non-empty line in the `search` sub command's `QUERIES_IN`).
pub fn read_lines<P: AsRef<Path>>(
    filename: P,
) -> std::io::Result<std::io::Lines<std::io::BufReader<File>>> {
    let file = File::open(filename)?;
    Ok(std::io::BufReader::new(file).lines())
}

#[cfg(test)]
mod test {
    use std::io::Read;

    #[rstest::rstest]
    #[case(false)]
    #[case(true)]
    fn open_write_maybe_gz(#[case] is_gzip: bool) -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let filename = if is_gzip { "test.txt.gz" } else { "test.txt" };
        let path = tmp_dir.path().join(filename);

        {
            let mut f = super::open_write_maybe_gz(&path)?;
            f.write_all(b"ACGTACGT\n")?;
            f.flush()?;
        }

        let mut f = super::open_read_maybe_gz(&path)?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;

        assert_eq!(buf, "ACGTACGT\n");

        Ok(())
    }

    #[test]
    fn read_lines() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("lines.txt");
        std::fs::write(&path, "ACGT\nTTTT\n")?;

        let lines = super::read_lines(&path)?.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(lines, vec!["ACGT".to_string(), "TTTT".to_string()]);

        Ok(())
    }
}
