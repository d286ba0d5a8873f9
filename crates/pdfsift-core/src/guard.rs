use crate::config::Limits;
use crate::{DocumentBuffer, PipelineError};

/// Largest input accepted by default: 10 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// How far into the file the `%PDF-` header may appear. Some producers emit
/// junk ahead of it and readers tolerate that.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Reject input larger than `limits.max_input_bytes`.
///
/// Runs before any parsing; a failure here is final.
pub fn check_size(buffer: &DocumentBuffer, limits: &Limits) -> Result<(), PipelineError> {
    if buffer.len() > limits.max_input_bytes {
        return Err(PipelineError::OversizedInput {
            size: buffer.len(),
            limit: limits.max_input_bytes,
        });
    }
    Ok(())
}

/// Returns true if a `%PDF-` header appears near the start of `data`.
pub fn looks_like_pdf(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_at_limit_passes() {
        let limits = Limits::default();
        let buf = DocumentBuffer::from(vec![0u8; DEFAULT_MAX_INPUT_BYTES]);
        assert!(check_size(&buf, &limits).is_ok());
    }

    #[test]
    fn one_byte_over_limit_fails() {
        let limits = Limits::default();
        let buf = DocumentBuffer::from(vec![0u8; DEFAULT_MAX_INPUT_BYTES + 1]);
        match check_size(&buf, &limits) {
            Err(PipelineError::OversizedInput { size, limit }) => {
                assert_eq!(size, DEFAULT_MAX_INPUT_BYTES + 1);
                assert_eq!(limit, DEFAULT_MAX_INPUT_BYTES);
            }
            other => panic!("expected OversizedInput, got {other:?}"),
        }
    }

    #[test]
    fn custom_limit() {
        let limits = Limits { max_input_bytes: 4 };
        assert!(check_size(&DocumentBuffer::from(&b"1234"[..]), &limits).is_ok());
        assert!(check_size(&DocumentBuffer::from(&b"12345"[..]), &limits).is_err());
    }

    #[test]
    fn pdf_magic_detection() {
        assert!(looks_like_pdf(b"%PDF-1.7\n"));
        assert!(looks_like_pdf(b"\xef\xbb\xbf%PDF-1.4"));
        assert!(!looks_like_pdf(b"PK\x03\x04"));
        assert!(!looks_like_pdf(b""));

        let mut late = vec![b' '; HEADER_SEARCH_WINDOW];
        late.extend_from_slice(b"%PDF-1.4");
        assert!(!looks_like_pdf(&late));
    }
}
