pub mod catalog;
pub mod classify;
pub mod integer;
pub mod maximal;
pub mod positive;
pub mod stratify;
pub mod torsion_free;
