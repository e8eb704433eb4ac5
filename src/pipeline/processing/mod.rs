// Pipeline processing: intra-source dedup, filtering, normalization, and cross-source conflation

pub mod conflation;
pub mod dedup;
pub mod filter;
pub mod normalize;
