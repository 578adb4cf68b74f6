//! # Identity Newtypes
//!
//! Newtype wrappers for every record identifier. Each wraps a `Uuid` and
//! serializes as the bare UUID string, so wire payloads stay flat while the
//! compiler keeps identifier namespaces apart.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID (e.g. one read back from storage).
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_newtype!(
    /// Tenant organization.
    CustomerId,
    "customer"
);
uuid_newtype!(
    /// Compliance domain record (infosec, acceptable use, ...).
    ComplianceId,
    "compliance"
);
uuid_newtype!(
    /// Link between a customer and a compliance domain.
    CustomerComplianceId,
    "customer-compliance"
);
uuid_newtype!(
    /// One version of a named template.
    TemplateId,
    "template"
);
uuid_newtype!(
    /// Employee of a customer.
    EmployeeId,
    "employee"
);
uuid_newtype!(
    /// Default or custom policy.
    PolicyId,
    "policy"
);
uuid_newtype!(
    /// Keyed configuration value attached to a policy.
    ConfigurationId,
    "configuration"
);
uuid_newtype!(
    /// One employee's acknowledgement of one policy version.
    AcknowledgementId,
    "acknowledgement"
);
uuid_newtype!(
    /// Audit trail row.
    HistoryId,
    "history"
);
