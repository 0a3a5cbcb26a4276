use bytes::Bytes;

/// One finished archive member: final name plus protected bytes.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Bytes,
}

impl ArchiveEntry {
    /// Build an entry for an image at a given position in its set.
    ///
    /// Entries may be appended in completion order rather than set order, so
    /// the name carries the logical position: `007-sunset.jpg` sorts into
    /// place no matter when it was written.
    pub fn new(order_index: u32, image_id: &str, extension: &str, bytes: Bytes) -> Self {
        Self {
            name: Self::entry_name(order_index, image_id, extension),
            bytes,
        }
    }

    /// Deterministic member name: `{order:03}-{id}.{ext}`.
    pub fn entry_name(order_index: u32, image_id: &str, extension: &str) -> String {
        // A slash in the id would create a directory inside the archive.
        let safe_id: String = image_id
            .chars()
            .map(|c| if c == '/' { '_' } else { c })
            .collect();
        format!("{:03}-{}.{}", order_index, safe_id, extension)
    }
}
