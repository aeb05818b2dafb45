//! Domain model (labels, addresses, records, outcomes, errors).

pub mod ids;
pub mod address;
pub mod record;
pub mod outcome;
pub mod report;
pub mod errors;

pub use self::ids::{ArtifactId, ArtifactName, Label, LabelKind, Region};
pub use self::address::{BlobAddress, CatalogLayout};
pub use self::record::{attr, ArtifactRecord, Attributes};
pub use self::outcome::{DeleteOutcome, DownloadOutcome, RegionFailure, RegisterOutcome};
pub use self::report::{Consistency, Finding, VerifyOptions, VerifyReport};
pub use self::errors::{CatalogError, ErrorKind, ValidationError};
