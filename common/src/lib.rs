//! webp-converter Common Library
//!
//! クライアント側の状態管理（レジストリ・リトライ方針・行表示）と
//! サーバーとの間で共有されるJSON型

pub mod types;
pub mod error;
pub mod compress;
pub mod locator;
pub mod registry;
pub mod session;
pub mod view;

pub use types::{
    mime_from_path, webp_file_name, CompressionLevel, CompressionQuality, ConvertRequest,
    ConvertedArtifact, ConvertedFileInfo, ErrorResponse, FileRef, FilesResponse, IncomingFile,
    Locator, MimeType, UploadedFile, UploadedFileInfo, UPLOAD_FIELD,
};
pub use error::{Error, Result};
pub use compress::{compress_with_retries, quality_for_attempt, Attempt, AttemptOutcome, Compressed, CompressionOptions, Compressor, MAX_ATTEMPTS};
pub use locator::{LocatorStore, MemoryLocators};
pub use registry::{Admission, FileRegistry, RegistryEntry, ViewEvent, MAX_FILE_SIZE};
pub use session::{ConversionJob, JobOutcome, Session};
pub use view::{ConversionStatus, DownloadState, RowViewState};
