//! Example lens data for various lenses and optical setups.
pub mod biconvex_lens_finite_object;
pub mod concave_mirror;
pub mod convexplano_lens;
pub mod petzval_lens;
