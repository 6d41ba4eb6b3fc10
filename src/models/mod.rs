//! Data models for Libris

pub mod copy;
pub mod dashboard;
pub mod loan;
pub mod member;
pub mod policy;

// Re-export commonly used types
pub use copy::{BookCopy, NewStock};
pub use loan::{Loan, LoanDetails};
pub use member::{Member, MemberClaims, Role};
pub use policy::{Policy, RenewalBase};
