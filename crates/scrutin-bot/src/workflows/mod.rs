pub mod publishing;
pub mod scrutin;
