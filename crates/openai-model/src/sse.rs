#[cfg(test)]
use std::collections::VecDeque;
use std::fmt::{self, Display};

use bytes::Bytes;
use reqwest::Response;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The body could not be read, e.g. because the connection dropped.
    Transport(String),
    InvalidPayload,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(reason) => {
                write!(f, "failed to read the event stream: {reason}")
            }
            Error::InvalidPayload => write!(f, "the event stream is not UTF-8"),
        }
    }
}

/// Where the raw bytes of an event stream come from.
enum Body {
    Http(Response),
    #[cfg(test)]
    Fixed(VecDeque<Bytes>),
}

impl Body {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Body::Http(response) => response
                .chunk()
                .await
                .map_err(|err| Error::Transport(err.to_string())),
            #[cfg(test)]
            Body::Fixed(chunks) => Ok(chunks.pop_front()),
        }
    }
}

/// A type for reading server-sent events from a response body.
///
/// Only the `data` field is reported. Comment lines, such as the
/// keep-alive pings some providers send while the model is busy, and
/// events without data are skipped.
pub struct Sse {
    buf: String,
    pending: Vec<u8>,
    body: Body,
}

impl Sse {
    #[inline]
    pub fn from_response(response: Response) -> Self {
        Self::with_body(Body::Http(response))
    }

    /// Reads events from chunks that are already in memory.
    #[cfg(test)]
    pub fn from_chunks<I: IntoIterator<Item = Bytes>>(chunks: I) -> Self {
        Self::with_body(Body::Fixed(chunks.into_iter().collect()))
    }

    fn with_body(body: Body) -> Self {
        Self {
            buf: String::new(),
            pending: Vec::new(),
            body,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain what's already buffered before waiting for more data.
            if let Some(event) = self.try_parse_event() {
                return Ok(Some(event));
            }

            let Some(bytes) = self.body.next_chunk().await? else {
                // A trailing event without a blank line is incomplete and
                // gets dropped.
                return Ok(None);
            };
            self.push_bytes(&bytes)?;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        // A chunk boundary may split a multi-byte character, so keep the
        // incomplete tail around until the next chunk arrives.
        self.pending.extend_from_slice(bytes);
        let valid_len = match str::from_utf8(&self.pending) {
            Ok(s) => s.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::InvalidPayload),
        };
        let valid = self.pending.drain(..valid_len).collect::<Vec<_>>();
        let valid =
            String::from_utf8(valid).map_err(|_| Error::InvalidPayload)?;
        self.buf.push_str(&valid);
        if self.buf.contains('\r') {
            self.buf = self.buf.replace("\r\n", "\n");
        }
        Ok(())
    }

    fn try_parse_event(&mut self) -> Option<String> {
        // event         = *( comment / field ) end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        loop {
            let eol_idx = self.buf.find("\n\n")?;
            let mut data: Option<String> = None;
            for line in self.buf[..eol_idx].lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (name, value) = line.split_once(':').unwrap_or((line, ""));
                if name != "data" {
                    continue;
                }
                let value = value.strip_prefix(' ').unwrap_or(value);
                match &mut data {
                    Some(data) => {
                        data.push('\n');
                        data.push_str(value);
                    }
                    None => data = Some(value.to_owned()),
                }
            }

            // Consume the bytes from the buffer.
            self.buf.drain(..eol_idx + 2);

            if data.is_some() {
                return data;
            }
        }
    }
}
