//! The `fields!` macro reads a fixed-layout record from a `Cur`, binding
//! each field to a local and tracing where it was read from.
//!
//! ```ignore
//! fields!(cur, bone {
//!     name: Name32,
//!     parent: i32,
//!     value: [f32; 6],
//!     end: Cur,
//! });
//! ```
//!
//! `[u8; n]` binds a byte slice, `[T; n]` binds a `View<T>` (`n` may be a
//! previously read field), `(fixed T)` binds a fixed-size array by value,
//! and `Cur` binds the cursor position after the previous fields.

macro_rules! field_helper2 {
    ($cur:ident, [u8; $n:expr]) => { $cur.next_n_u8s($n as usize)? };
    ($cur:ident, [$t:ty; $n:expr]) => { $cur.next_n::<$t>($n as usize)? };
    ($cur:ident, (fixed $t:ty)) => { $cur.next::<$t>()? };
    ($cur:ident, Cur) => { $cur.clone() };
    ($cur:ident, $t:ty) => { $cur.next::<$t>()? };
}

macro_rules! field_helper {
    ($c:ident, $name:ident, $field:ident, Cur) => {
        let $field = field_helper2!($c, Cur);
    };
    ($c:ident, $name:ident, $field:ident, $ty:tt) => {
        let pos = $c.pos();
        let $field = field_helper2!($c, $ty);
        trace!("{}.{}@{:#x}: {:?}",
            stringify!($name),
            stringify!($field),
            pos,
            $field,
        );
    }
}

macro_rules! fields {
    ($cur:expr, $name:ident { $($field:ident : $ty:tt,)* }) => {
        let mut c = $cur;
        $(field_helper!(c, $name, $field, $ty);)*
    };
    ($cur:expr, $name:ident { $($field:ident : $ty:tt),* }) => {
        fields!($cur, $name { $($field : $ty,)* });
    };
}
