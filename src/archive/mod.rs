//! Streaming ZIP assembly.
//!
//! The zip container needs a `Write + Seek` target because each local file
//! header is patched (crc, sizes) after its entry data is written. A fully
//! seekable target would mean buffering the whole archive; instead the sink
//! writes into a shared in-memory buffer that retains only the unsealed
//! suffix of the stream.
//!
//! The key observation: the writer only ever seeks backwards into the entry
//! it most recently finished. Once `start_file` for entry N+1 returns, entry
//! N's header has been patched and every byte before N+1's header is final.
//! The sink captures that boundary, drains the sealed prefix into a bounded
//! channel, and the HTTP layer forwards the chunks to the client while later
//! entries are still being fetched and protected.

mod entry;
mod sink;

pub use entry::ArchiveEntry;
pub use sink::{ArchiveSink, ArchiveStream, DEFAULT_CHUNK_CAPACITY};
