pub const CRLF: &[u8] = b"\r\n";

pub trait FindBytes {
    fn find_bytes(&self, needle: &[u8]) -> Option<usize>;

    /// Offset of the first `\r\n`, if any.
    fn find_crlf(&self) -> Option<usize> {
        self.find_bytes(CRLF)
    }
}

impl FindBytes for [u8] {
    fn find_bytes(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        self.windows(needle.len()).position(|window| window == needle)
    }
}

pub trait SplitOnce {
    /// Splits at the first occurrence of `byte`, dropping the byte itself.
    fn split_once_byte(&self, byte: u8) -> Option<(&[u8], &[u8])>;
}

impl SplitOnce for [u8] {
    fn split_once_byte(&self, byte: u8) -> Option<(&[u8], &[u8])> {
        let pos = self.iter().position(|&b| b == byte)?;
        Some((&self[..pos], &self[pos + 1..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_crlf() {
        assert_eq!(b"Host: x\r\n\r\n"[..].find_crlf(), Some(7));
        assert_eq!(b"\r\n"[..].find_crlf(), Some(0));
        assert_eq!(b"partial\r"[..].find_crlf(), None);
        assert_eq!(b""[..].find_crlf(), None);
    }

    #[test]
    fn splits_on_first_byte() {
        let line = &b"Host: a:b"[..];
        assert_eq!(line.split_once_byte(b':'), Some((&b"Host"[..], &b" a:b"[..])));
        assert_eq!(b"no colon"[..].split_once_byte(b':'), None);
    }
}
