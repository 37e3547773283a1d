//! Data models for the lending domain

/// Maps a string-backed enum onto a Postgres TEXT column.
///
/// The type must provide `as_str(&self) -> &'static str` and
/// `FromStr<Err = String>`.
macro_rules! impl_text_type {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = sqlx::Decode::<sqlx::Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod assignment;
pub mod book;
pub mod borrow;
pub mod inventory;
pub mod library;
pub mod permission;
pub mod role;
pub mod user;

// Re-export commonly used types
pub use assignment::{AssignmentStatus, RoleAssignment};
pub use book::Book;
pub use borrow::{BorrowRecord, BorrowStatus};
pub use inventory::InventoryEntry;
pub use library::Library;
pub use permission::{ActionKind, PermissionAction, Resource};
pub use role::{LibraryScope, Role, RoleName};
pub use user::{User, UserShort};
