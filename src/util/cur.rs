use crate::errors::{ErrorKind, Result};
use std::fmt;
use std::ops::Add;
use crate::util::view::{View, Viewable};

/// A pointer into a buffer of bytes. Used for binary file parsing.
///
/// Moving the cursor never fails; reading past the end of the buffer
/// returns an `OutOfBounds` error instead of panicking.
#[derive(Copy, Clone)]
pub struct Cur<'a> {
    buf_: &'a [u8],
    pos_: usize,
}

impl<'a> Cur<'a> {
    pub fn new(buf: &'a [u8]) -> Cur<'a> {
        Cur { buf_: buf, pos_: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos_
    }

    pub fn buf_len(&self) -> usize {
        self.buf_.len()
    }

    pub fn bytes_remaining(&self) -> usize {
        self.buf_.len().saturating_sub(self.pos_)
    }

    pub fn next<T: Viewable>(&mut self) -> Result<T> {
        let size = <T as Viewable>::size();
        let buf = self.next_n_u8s(size)?;
        Ok(<T as Viewable>::view(buf))
    }

    pub fn nth<T: Viewable>(&self, n: usize) -> Result<T> {
        let size = <T as Viewable>::size();
        let mut cur = *self;
        cur.jump_forward(n.saturating_mul(size));
        cur.next::<T>()
    }

    pub fn next_n<T: Viewable>(&mut self, n: usize) -> Result<View<'a, T>> {
        let size = <T as Viewable>::size();
        let num_bytes = match size.checked_mul(n) {
            Some(x) => x,
            None => bail!(ErrorKind::OutOfBounds(self.pos_, usize::max_value(), self.buf_.len())),
        };
        let buf = self.next_n_u8s(num_bytes)?;
        Ok(View::from_buf(buf))
    }

    pub fn next_n_u8s(&mut self, n: usize) -> Result<&'a [u8]> {
        let end_pos = match self.pos_.checked_add(n) {
            Some(x) if x <= self.buf_.len() => x,
            _ => bail!(ErrorKind::OutOfBounds(self.pos_, n, self.buf_.len())),
        };
        let res = &self.buf_[self.pos_ .. end_pos];
        self.pos_ = end_pos;
        Ok(res)
    }

    pub fn jump_forward(&mut self, amt: usize) {
        let pos = self.pos_;
        self.jump_to(pos.saturating_add(amt));
    }

    pub fn jump_to(&mut self, pos: usize) {
        self.pos_ = pos;
    }

    /// Cursor at a signed offset from this one, as stored in the file.
    /// Negative offsets are an error.
    pub fn at(&self, off: i32) -> Result<Cur<'a>> {
        if off < 0 {
            bail!("negative offset {} from {:#x}", off, self.pos_);
        }
        Ok(*self + off as usize)
    }
}

impl<'a> Add<usize> for Cur<'a> {
    type Output = Cur<'a>;

    fn add(self, amt: usize) -> Cur<'a> {
        let mut cur = self;
        cur.jump_forward(amt);
        cur
    }
}

impl<'a> Add<u16> for Cur<'a> {
    type Output = Cur<'a>;
    fn add(self, amt: u16) -> Cur<'a> { self + amt as usize }
}

impl<'a> fmt::Debug for Cur<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Cur {{ pos: {} }}", self.pos())
    }
}

#[test]
fn test_out_of_bounds_is_an_error() {
    let buf = [1u8, 2, 3, 4, 5];
    let mut cur = Cur::new(&buf);
    assert_eq!(cur.next::<u32>().unwrap(), 0x04030201);
    assert!(cur.next::<u16>().is_err());
    // Failed reads don't move the cursor
    assert_eq!(cur.pos(), 4);
    assert_eq!(cur.next::<u8>().unwrap(), 5);

    let mut far = Cur::new(&buf) + 100usize;
    assert!(far.next::<u8>().is_err());
    assert!(Cur::new(&buf).at(-4).is_err());
    assert!(Cur::new(&buf).next_n::<u32>(usize::max_value()).is_err());
}
