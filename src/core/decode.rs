// Byte chunk decoding for serial input
// Converts raw reads into text with NULs removed and line endings folded to '\n'.
// Multi-byte characters and CRLF pairs split across reads are stitched together.

/// Stateful decoder for one connection
#[derive(Debug, Default, Clone)]
pub struct ChunkDecoder {
    /// Leading bytes of a UTF-8 sequence cut off at the end of the last read
    partial: Vec<u8>,

    /// Last read ended in '\r', so a leading '\n' belongs to that line ending
    skip_lf: bool,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one read's worth of bytes
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut data = std::mem::take(&mut self.partial);
        data.extend_from_slice(bytes);

        let mut text = String::with_capacity(data.len());
        let mut rest = data.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is UTF-8
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.partial = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        self.normalize(&text)
    }

    /// Flush any held bytes at the end of a connection
    pub fn finish(&mut self) -> String {
        self.skip_lf = false;
        if self.partial.is_empty() {
            return String::new();
        }
        let bytes = std::mem::take(&mut self.partial);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn normalize(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\0' => continue,
                '\n' if self.skip_lf => {
                    self.skip_lf = false;
                    continue;
                }
                '\r' => {
                    out.push('\n');
                    self.skip_lf = true;
                    continue;
                }
                _ => out.push(ch),
            }
            self.skip_lf = false;
        }
        out
    }
}

/// Normalize a complete piece of text without carrying state between calls
pub fn normalize_text(bytes: &[u8]) -> String {
    let mut decoder = ChunkDecoder::new();
    let mut text = decoder.decode(bytes);
    text.push_str(&decoder.finish());
    text
}
