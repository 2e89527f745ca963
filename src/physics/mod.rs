//! Field kernels and loop geometry.
pub mod circular_filament;
pub mod linear_filament;
pub mod loops;
