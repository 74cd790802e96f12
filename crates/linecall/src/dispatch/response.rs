//! Response framing for the dispatch loop.

use std::io::Write;

use super::errors::DispatchError;
use crate::protocol::Response;

/// Writer that frames response envelopes as JSON lines.
///
/// Every envelope is followed by a newline and flushed straight away so the
/// peer can act on it before sending the next request.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one envelope as a JSON line and flushes the stream.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::SerializeResponse`] if the envelope cannot be
    /// encoded and [`DispatchError::Io`] if writing or flushing fails.
    pub fn write_response(&mut self, response: &Response) -> Result<(), DispatchError> {
        let mut line = serde_json::to_vec(response)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use serde_json::json;

    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_surface_as_io_errors() {
        let mut writer = ResponseWriter::new(ClosedPipe);
        let error = writer
            .write_response(&Response::success(json!(1)))
            .expect_err("pipe is closed");
        assert!(
            matches!(&error, DispatchError::Io(source) if source.kind() == io::ErrorKind::BrokenPipe),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn writes_return_line() {
        let mut output = Vec::new();
        let mut writer = ResponseWriter::new(&mut output);
        writer
            .write_response(&Response::success(json!({"rows": []})))
            .expect("write return");

        let text = String::from_utf8(output).expect("valid utf8");
        assert_eq!(text, "{\"rpc\":{\"op\":\"return\"},\"result\":{\"rows\":[]}}\n");
    }

    #[test]
    fn writes_one_line_per_response() {
        let mut writer = ResponseWriter::new(Vec::new());
        writer
            .write_response(&Response::error("KeyError", "multi\nline"))
            .expect("write first");
        writer
            .write_response(&Response::success(json!(1)))
            .expect("write second");

        let text = String::from_utf8(writer.into_inner()).expect("valid utf8");
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(r#""message":"multi\nline""#));
    }
}
