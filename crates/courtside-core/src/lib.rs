// League records, configuration and persistence shared by the trade engine
// and its front ends.

pub mod config;
pub mod db;
pub mod league;
