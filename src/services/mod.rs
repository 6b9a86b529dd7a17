pub mod assets;
pub mod certificate;
pub mod roster_cache;

pub use assets::{AssetStore, CertificateAssets};
pub use certificate::{CertificateService, render_certificate};
pub use roster_cache::{RosterCache, StaleRosterPolicy};
