mod archive;
mod scratch;

pub use archive::{
    copy_to_destination, extract_archive, replace_archive, write_archive,
};
pub use scratch::ScratchDir;
