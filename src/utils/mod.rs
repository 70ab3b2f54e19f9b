use bytes::{Bytes, BytesMut};
use url::Url;

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Last path segment of `url`, without query string or fragment.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let segment = url.path_segments()?.next_back()?;
    let name = sanitize_filename(segment);

    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, UNITS[unit])
}

/// Regroups an arbitrary byte stream into fixed-size chunks.
/// Only the final chunk may be shorter.
pub struct ChunkBuffer {
    buf: BytesMut,
    chunk_size: usize,
}

impl ChunkBuffer {
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            buf: BytesMut::with_capacity(chunk_size),
            chunk_size,
        }
    }

    /// Appends `data` and drains every full chunk now available.
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        self.buf.extend_from_slice(data);

        let mut chunks = Vec::new();
        while self.buf.len() >= self.chunk_size {
            chunks.push(self.buf.split_to(self.chunk_size).freeze());
        }
        chunks
    }

    pub fn finish(&mut self) -> Option<Bytes> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test/file.exe"), "test_file.exe");
        assert_eq!(sanitize_filename("normal-name.exe"), "normal-name.exe");
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://host/a/b/winrar-x64-713.exe?mirror=1#top").as_deref(),
            Some("winrar-x64-713.exe")
        );
        assert_eq!(
            file_name_from_url("https://host/Ninite%20Chrome.exe").as_deref(),
            Some("Ninite%20Chrome.exe")
        );
        assert_eq!(file_name_from_url("https://host/dir/"), None);
        assert_eq!(file_name_from_url("https://host"), None);
        assert_eq!(file_name_from_url("not a url"), None);
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0.00 B");
        assert_eq!(human_size(1536), "1.50 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024 * 1024), "3072.00 GB");
    }

    #[test]
    fn test_chunk_buffer_regroups_input() {
        let mut buffer = ChunkBuffer::new(4);
        assert!(buffer.push(b"ab").is_empty());

        let chunks = buffer.push(b"cdefghij");
        assert_eq!(chunks, vec![Bytes::from_static(b"abcd"), Bytes::from_static(b"efgh")]);

        assert_eq!(buffer.finish(), Some(Bytes::from_static(b"ij")));
        assert_eq!(buffer.finish(), None);
    }
}
