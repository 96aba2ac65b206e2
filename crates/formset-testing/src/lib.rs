//! Testing utilities and harness for formset compositions

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
