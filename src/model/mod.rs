pub mod constants;
pub mod premade;
pub mod rank_oracle;
pub mod scoring;
pub mod skill;
pub mod structures;
