pub mod migrate;
pub mod purge_contact;
pub mod serve;
