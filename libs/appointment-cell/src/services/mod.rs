pub mod conflict;
pub mod lifecycle;
pub mod locks;
pub mod notify;
pub mod scheduling;
