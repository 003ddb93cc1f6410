//! Chunk boundary computation and streaming chunk reads

use crate::uploader::error::{UploadError, UploadResult};
use bytes::Bytes;
use futures::Stream;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, BufReader, ReadBuf, SeekFrom};
use tokio_util::io::ReaderStream;

/// A contiguous byte range of the source file, sent in one HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    /// Byte offset in the file
    pub offset: u64,
    /// Number of bytes in this chunk
    pub length: u64,
    /// Whether this chunk closes the upload (`upload, finalize`)
    pub is_final: bool,
}

/// Chunk boundaries for a file of known size.
///
/// Ranges partition `[0, total_size)` contiguously. Every range except the
/// last has exactly `chunk_size` bytes; the last has the remainder, or a
/// full chunk when the size is an exact multiple. Only offsets and lengths
/// are materialized, never bytes, so plans for very large files are free.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlan {
    total_size: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    pub fn new(total_size: u64, chunk_size: u64) -> UploadResult<Self> {
        if chunk_size == 0 {
            return Err(UploadError::InvalidArgument(
                "chunk size must be positive".to_string(),
            ));
        }
        if total_size == 0 {
            return Err(UploadError::EmptyPayload);
        }
        Ok(Self {
            total_size,
            chunk_size,
        })
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn num_chunks(&self) -> u64 {
        self.total_size.div_ceil(self.chunk_size)
    }

    /// Iterate the ranges in upload order. The iterator is cheap to
    /// recreate; callers that abort mid-plan simply start over.
    pub fn ranges(&self) -> ChunkRanges {
        ChunkRanges {
            plan: *self,
            offset: 0,
        }
    }
}

/// Iterator over the ranges of a [`ChunkPlan`]
#[derive(Debug, Clone)]
pub struct ChunkRanges {
    plan: ChunkPlan,
    offset: u64,
}

impl Iterator for ChunkRanges {
    type Item = ChunkRange;

    fn next(&mut self) -> Option<ChunkRange> {
        if self.offset >= self.plan.total_size {
            return None;
        }
        let length = self.plan.chunk_size.min(self.plan.total_size - self.offset);
        let range = ChunkRange {
            offset: self.offset,
            length,
            is_final: self.offset + length == self.plan.total_size,
        };
        self.offset += length;
        Some(range)
    }
}

/// Buffer size for streaming reads (64KB)
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// A limited async reader that reads only a specific byte range from a file
pub struct ChunkReader {
    reader: BufReader<File>,
    remaining: u64,
}

impl ChunkReader {
    /// Create a new chunk reader for a specific byte range
    pub async fn new(path: &Path, offset: u64, length: u64) -> io::Result<Self> {
        let file = File::open(path).await?;
        let mut reader = BufReader::with_capacity(STREAM_BUFFER_SIZE, file);
        reader.seek(SeekFrom::Start(offset)).await?;

        Ok(Self {
            reader,
            remaining: length,
        })
    }
}

impl AsyncRead for ChunkReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.remaining == 0 {
            return Poll::Ready(Ok(()));
        }

        // Limit read to remaining bytes
        let max_read = (self.remaining as usize).min(buf.remaining());
        let mut limited_buf = buf.take(max_read);

        match Pin::new(&mut self.reader).poll_read(cx, &mut limited_buf) {
            Poll::Ready(Ok(())) => {
                let bytes_read = limited_buf.filled().len();
                if bytes_read == 0 {
                    // EOF reached
                    return Poll::Ready(Ok(()));
                }

                unsafe {
                    buf.assume_init(bytes_read);
                }
                buf.advance(bytes_read);
                self.remaining -= bytes_read as u64;

                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// A stream that yields the bytes of one chunk.
/// Uses tokio_util's ReaderStream internally for simplicity.
pub struct ChunkStream {
    inner: ReaderStream<ChunkReader>,
}

impl ChunkStream {
    /// Create a new chunk stream from a reader
    pub fn new(reader: ChunkReader) -> Self {
        Self {
            inner: ReaderStream::with_capacity(reader, STREAM_BUFFER_SIZE),
        }
    }

    /// Create a chunk stream for one range of a file
    pub async fn from_range(path: &Path, range: &ChunkRange) -> io::Result<Self> {
        let reader = ChunkReader::new(path, range.offset, range.length).await?;
        Ok(Self::new(reader))
    }

    /// Create a chunk stream covering a whole file
    pub async fn whole_file(path: &Path, size: u64) -> io::Result<Self> {
        let reader = ChunkReader::new(path, 0, size).await?;
        Ok(Self::new(reader))
    }
}

impl Stream for ChunkStream {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;

    const MIB: u64 = 1024 * 1024;

    fn collect(plan: &ChunkPlan) -> Vec<ChunkRange> {
        plan.ranges().collect()
    }

    #[test]
    fn ranges_partition_the_file_contiguously() {
        for (total, chunk) in [(1, 1), (10, 3), (45 * MIB, 20 * MIB), (7, 100)] {
            let plan = ChunkPlan::new(total, chunk).unwrap();
            let ranges = collect(&plan);

            assert_eq!(ranges.len() as u64, plan.num_chunks());
            assert_eq!(ranges[0].offset, 0);
            let mut expected_offset = 0;
            for range in &ranges {
                assert_eq!(range.offset, expected_offset);
                assert!(range.length > 0);
                expected_offset += range.length;
            }
            assert_eq!(expected_offset, total);
            assert_eq!(ranges.iter().map(|r| r.length).sum::<u64>(), total);
        }
    }

    #[test]
    fn exactly_one_final_range_and_it_is_last() {
        let plan = ChunkPlan::new(45 * MIB, 20 * MIB).unwrap();
        let ranges = collect(&plan);
        assert_eq!(ranges.iter().filter(|r| r.is_final).count(), 1);
        assert!(ranges.last().unwrap().is_final);
    }

    #[test]
    fn remainder_becomes_the_final_range() {
        let plan = ChunkPlan::new(45 * MIB, 20 * MIB).unwrap();
        let ranges = collect(&plan);
        assert_eq!(
            ranges,
            vec![
                ChunkRange {
                    offset: 0,
                    length: 20 * MIB,
                    is_final: false
                },
                ChunkRange {
                    offset: 20 * MIB,
                    length: 20 * MIB,
                    is_final: false
                },
                ChunkRange {
                    offset: 40 * MIB,
                    length: 5 * MIB,
                    is_final: true
                },
            ]
        );
    }

    #[test]
    fn exact_multiple_gets_a_full_final_chunk() {
        let plan = ChunkPlan::new(40 * MIB, 20 * MIB).unwrap();
        let ranges = collect(&plan);
        assert_eq!(
            ranges,
            vec![
                ChunkRange {
                    offset: 0,
                    length: 20 * MIB,
                    is_final: false
                },
                ChunkRange {
                    offset: 20 * MIB,
                    length: 20 * MIB,
                    is_final: true
                },
            ]
        );
    }

    #[test]
    fn zero_chunk_size_is_invalid() {
        assert!(matches!(
            ChunkPlan::new(10, 0),
            Err(UploadError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(matches!(
            ChunkPlan::new(0, 20 * MIB),
            Err(UploadError::EmptyPayload)
        ));
    }

    #[test]
    fn ranges_iterator_is_restartable() {
        let plan = ChunkPlan::new(10, 4).unwrap();
        assert_eq!(collect(&plan), collect(&plan));
    }

    async fn stream_to_vec(mut stream: ChunkStream) -> Vec<u8> {
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk.unwrap());
        }
        data
    }

    #[tokio::test]
    async fn chunk_stream_reads_exactly_one_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let contents: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        file.write_all(&contents).unwrap();

        let range = ChunkRange {
            offset: 300,
            length: 400,
            is_final: false,
        };
        let stream = ChunkStream::from_range(file.path(), &range).await.unwrap();
        assert_eq!(stream_to_vec(stream).await, &contents[300..700]);
    }

    #[tokio::test]
    async fn whole_file_stream_covers_everything() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let contents = vec![7u8; 200_000];
        file.write_all(&contents).unwrap();

        let stream = ChunkStream::whole_file(file.path(), 200_000).await.unwrap();
        assert_eq!(stream_to_vec(stream).await, contents);
    }
}
