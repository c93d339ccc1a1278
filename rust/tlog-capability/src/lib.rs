#![warn(missing_docs)]

//! Ability algebra for the tamper-evident log.
//!
//! Credentials presented to the log grant a list of [`Capability`] pairs,
//! each naming an _ability_ (what may be done) and a _resource_ (what it may
//! be done to). Abilities are slash-delimited paths, so holding a broader
//! ability grants every ability nested beneath it:
//!
//! ```text
//! *                      → everything
//! tlog/admin             → tlog/admin/revoke, tlog/admin/configure, ...
//! tlog/admin/revoke      → only tlog/admin/revoke
//! ```
//!
//! Resources are never hierarchical: `did:key:zSpace` and
//! `did:key:zSpace/logs` are unrelated as far as [`Capability::allows`] is
//! concerned.
//!
//! The [`AbilityTable`] maps operation names received by the service to the
//! ability they require. Unknown operations require the [`WILDCARD`], so only
//! an omnipotent credential can exercise them.
//!
//! ```rust
//! use tlog_capability::{AbilityTable, Capability, abilities};
//!
//! let table = AbilityTable::default();
//! let held = Capability::new(abilities::ADMIN, "did:key:zSpace");
//!
//! assert!(held.allows(table.required("revoke"), "did:key:zSpace"));
//! assert!(!held.allows(table.required("append"), "did:key:zSpace"));
//! assert!(!held.allows(table.required("revoke"), "did:key:zOther"));
//! ```

mod error;
pub use error::*;

mod ability;
pub use ability::*;

mod capability;
pub use capability::*;

mod table;
pub use table::*;
