//! Internal macros: register declarations, and logging that compiles away without `defmt`.

/// Declare a 32-bit register at `BASE + offset` and its named fields, as a module of
/// constants named after the register.
///
/// Example:
/// ```ignore
/// register!(RCC_BASE, CR @ 0x00, "Clock control register", {
///     HSION: 0, 1;
///     HSIRDY: 1, 1;
/// });
/// ```
/// produces `pub mod cr { pub const REG: Reg; pub const HSION: Field; ... }`.
macro_rules! register {
    ($base:ident, $REG:ident @ $offset:expr, $doc:literal, {
        $($FIELD:ident: $bit:expr, $width:expr;)*
    }) => {
        paste::paste! {
            #[doc = $doc]
            pub mod [<$REG:lower>] {
                use $crate::regs::{Field, Reg};

                /// Register location.
                pub const REG: Reg = Reg::new(super::$base + $offset);

                $(
                    pub const $FIELD: Field = Field::new($bit, $width);
                )*
            }
        }
    };
}

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::trace!($s $(, $x)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::debug!($s $(, $x)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::warn!($s $(, $x)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($( & $x ),*);
        }
    };
}
