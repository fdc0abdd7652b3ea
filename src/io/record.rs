//! Framed binary sample stream.
//!
//! Every record is `[len: i32][payload][len: i32]`, little-endian, where both
//! markers hold the payload byte length. A stream is one header record
//!
//! ```text
//! [site_count: i32][U: f64][mu: f64][n_tau: i32]      24 bytes payload, 32 framed
//! ```
//!
//! followed by one body record per converged sample
//!
//! ```text
//! [field: complex128 x site_count][partner: complex128 x site_count]
//! ```
//!
//! with each complex stored as `re` then `im`.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::Path;

use num_complex::Complex64;

use crate::error::{LangevinError, Result};

const MARKER_BYTES: usize = 4;
/// Payload size of the header record.
pub const HEADER_PAYLOAD_BYTES: usize = 4 + 8 + 8 + 4;
/// Size of the framed header record, markers included.
pub const HEADER_RECORD_BYTES: usize = HEADER_PAYLOAD_BYTES + 2 * MARKER_BYTES;
const COMPLEX_BYTES: usize = 16;

/// Payload size of a body record for `site_count` sites.
pub fn body_payload_bytes(site_count: usize) -> usize {
    2 * COMPLEX_BYTES * site_count
}

/// Run metadata carried by the header record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub site_count: usize,
    pub u: f64,
    pub mu: f64,
    pub n_tau: usize,
}

/// Time-slice-0 projection of one converged sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub field: Vec<Complex64>,
    pub partner: Vec<Complex64>,
}

fn to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| LangevinError::InvalidConfig(format!("{} {} does not fit in i32", what, value)))
}

fn write_record<W: Write>(w: &mut W, payload: &[u8]) -> Result<()> {
    let len = to_i32(payload.len(), "record length")?.to_le_bytes();
    w.write_all(&len)?;
    w.write_all(payload)?;
    w.write_all(&len)?;
    Ok(())
}

/// Append the header record to `w`.
pub fn write_header<W: Write>(w: &mut W, site_count: usize, u: f64, mu: f64, n_tau: usize) -> Result<()> {
    let mut payload = Vec::with_capacity(HEADER_PAYLOAD_BYTES);
    payload.extend_from_slice(&to_i32(site_count, "site count")?.to_le_bytes());
    payload.extend_from_slice(&u.to_le_bytes());
    payload.extend_from_slice(&mu.to_le_bytes());
    payload.extend_from_slice(&to_i32(n_tau, "time slice count")?.to_le_bytes());
    write_record(w, &payload)
}

/// Append one body record to `w`. Both slices must have the same length.
pub fn write_body<W: Write>(w: &mut W, field: &[Complex64], partner: &[Complex64]) -> Result<()> {
    if field.len() != partner.len() {
        return Err(LangevinError::SiteCountMismatch {
            expected: field.len(),
            found: partner.len(),
        });
    }
    let mut payload = Vec::with_capacity(body_payload_bytes(field.len()));
    for z in field.iter().chain(partner.iter()) {
        payload.extend_from_slice(&z.re.to_le_bytes());
        payload.extend_from_slice(&z.im.to_le_bytes());
    }
    write_record(w, &payload)
}

/// Writer enforcing the stream contract: one header, then bodies of the
/// declared site count.
pub struct SampleWriter<W: Write> {
    inner: W,
    site_count: Option<usize>,
    bodies: usize,
}

impl<W: Write> SampleWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            site_count: None,
            bodies: 0,
        }
    }

    pub fn write_header(&mut self, header: &Header) -> Result<()> {
        if self.site_count.is_some() {
            return Err(LangevinError::HeaderAlreadyWritten);
        }
        write_header(&mut self.inner, header.site_count, header.u, header.mu, header.n_tau)?;
        self.site_count = Some(header.site_count);
        Ok(())
    }

    pub fn write_body(&mut self, field: &[Complex64], partner: &[Complex64]) -> Result<()> {
        let expected = self.site_count.ok_or(LangevinError::MissingHeader)?;
        for len in [field.len(), partner.len()] {
            if len != expected {
                return Err(LangevinError::SiteCountMismatch { expected, found: len });
            }
        }
        write_body(&mut self.inner, field, partner)?;
        self.bodies += 1;
        Ok(())
    }

    /// Number of body records written so far.
    pub fn bodies(&self) -> usize {
        self.bodies
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Sequential reader checking both length markers of every record.
pub struct RecordReader<R: Read> {
    inner: R,
    header: Option<Header>,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, header: None }
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    fn read_exact_or_truncated(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => LangevinError::TruncatedRecord,
            _ => LangevinError::Io(e),
        })
    }

    /// Leading marker, or `None` on a clean end of stream.
    fn read_leading_marker(&mut self) -> Result<Option<i32>> {
        let mut buf = [0u8; MARKER_BYTES];
        let mut filled = 0;
        while filled < MARKER_BYTES {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => return Err(LangevinError::TruncatedRecord),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Some(i32::from_le_bytes(buf)))
    }

    /// Payload of the next record, which must be `expected` bytes long.
    fn read_record(&mut self, expected: usize) -> Result<Option<Vec<u8>>> {
        let leading = match self.read_leading_marker()? {
            Some(marker) => marker,
            None => return Ok(None),
        };
        if usize::try_from(leading).ok() != Some(expected) {
            return Err(LangevinError::RecordLength { expected, found: leading });
        }
        let mut payload = vec![0u8; expected];
        self.read_exact_or_truncated(&mut payload)?;
        let mut trailer = [0u8; MARKER_BYTES];
        self.read_exact_or_truncated(&mut trailer)?;
        let trailing = i32::from_le_bytes(trailer);
        if trailing != leading {
            return Err(LangevinError::FramingMismatch { leading, trailing });
        }
        Ok(Some(payload))
    }

    pub fn read_header(&mut self) -> Result<Header> {
        let payload = self
            .read_record(HEADER_PAYLOAD_BYTES)?
            .ok_or(LangevinError::TruncatedRecord)?;
        let i32_at = |at: usize| i32::from_le_bytes([payload[at], payload[at + 1], payload[at + 2], payload[at + 3]]);
        let f64_at = |at: usize| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&payload[at..at + 8]);
            f64::from_le_bytes(bytes)
        };

        let raw_sites = i32_at(0);
        let site_count = usize::try_from(raw_sites)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(LangevinError::InvalidSiteCount(raw_sites))?;
        let raw_tau = i32_at(20);
        let n_tau = usize::try_from(raw_tau).map_err(|_| {
            LangevinError::InvalidConfig(format!("header declares negative time slice count {}", raw_tau))
        })?;

        let header = Header {
            site_count,
            u: f64_at(4),
            mu: f64_at(12),
            n_tau,
        };
        self.header = Some(header);
        Ok(header)
    }

    /// Next body record, or `None` at the end of the stream.
    pub fn read_body(&mut self) -> Result<Option<Sample>> {
        let site_count = self.header.ok_or(LangevinError::MissingHeader)?.site_count;
        let payload = match self.read_record(body_payload_bytes(site_count))? {
            Some(payload) => payload,
            None => return Ok(None),
        };
        let mut values = payload.chunks_exact(COMPLEX_BYTES).map(|c| {
            let mut re = [0u8; 8];
            let mut im = [0u8; 8];
            re.copy_from_slice(&c[..8]);
            im.copy_from_slice(&c[8..]);
            Complex64::new(f64::from_le_bytes(re), f64::from_le_bytes(im))
        });
        let field: Vec<Complex64> = values.by_ref().take(site_count).collect();
        let partner: Vec<Complex64> = values.collect();
        Ok(Some(Sample { field, partner }))
    }

    /// Read every remaining body record.
    pub fn read_all(&mut self) -> Result<Vec<Sample>> {
        let mut samples = Vec::new();
        while let Some(sample) = self.read_body()? {
            samples.push(sample);
        }
        Ok(samples)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Read a whole stream file: header plus all samples in generation order.
pub fn read_stream<P: AsRef<Path>>(path: P) -> Result<(Header, Vec<Sample>)> {
    let file = File::open(path.as_ref())?;
    let mut reader = RecordReader::new(BufReader::new(file));
    let header = reader.read_header()?;
    let samples = reader.read_all()?;
    Ok((header, samples))
}
