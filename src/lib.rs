pub mod archive;
pub mod batch;
pub mod block;
pub mod catalog;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod events;
pub mod extract;
pub mod filelist;
pub mod hash;
pub mod header;
pub mod index;
pub mod profile;

pub use archive::Archive;
pub use batch::{extract_batch, extract_to_dir, BatchReport, ExtractedFile};
pub use block::{BlockWindow, FileRecord, BLOCK_SIZE};
pub use catalog::Catalog;
pub use crypto::{CipherKey, FileKey};
pub use error::{BbfsError, Result};
pub use events::{ArchiveEvent, EventSink, NullSink, TracingSink};
pub use filelist::{parse_file_list, read_file_list};
pub use hash::{normalize_name, BucketChecksum, EntryChecksum};
pub use header::{ContainerHeader, MAGIC};
pub use index::ResolvedEntry;
pub use profile::FormatProfile;
