pub mod ad;
pub mod job;
