//! Procedurally generated solids.  Pure CPU code: nothing here touches a
//! rendering context.

pub mod cone;
pub mod cube;
