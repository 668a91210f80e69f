use std::fmt::{self, Write};
use crate::util::view::Viewable;

/// Fixed-length NUL-padded ASCII(?) string, used as human-readable names
/// in studio files.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Name<const N: usize>(pub [u8; N]);

/// Bone, attachment and sequence labels.
pub type Name32 = Name<32>;
/// Model, body part, sub-model and texture names.
pub type Name64 = Name<64>;

impl<const N: usize> Name<N> {
    pub fn from_bytes(buf: &[u8]) -> Name<N> {
        let mut name = Name([0; N]);
        name.0.copy_from_slice(buf);
        name
    }

    /// Builds a name from a string, truncating so a NUL always remains.
    pub fn from_str_lossy(s: &str) -> Name<N> {
        let mut name = Name([0; N]);
        let len = s.len().min(N.saturating_sub(1));
        name.0[..len].copy_from_slice(&s.as_bytes()[..len]);
        name
    }

    /// The name up to its first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(N);
        &self.0[..end]
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl<const N: usize> Viewable for Name<N> {
    fn size() -> usize {
        N
    }
    fn view(buf: &[u8]) -> Name<N> {
        Name::from_bytes(buf)
    }
}

impl<const N: usize> fmt::Display for Name<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &b in self.as_bytes() {
            // Convert non-printable characters to periods (which is what
            // hex editors usually do).
            f.write_char(if b < 0x20 || b >= 0x7f { '.' } else { b as char })?;
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for Name<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let trimmed = self.as_bytes();

        // Print "normal" strings without quotes or escaping.
        let normal = !trimmed.is_empty()
            && trimmed.iter().all(|&b| {
                b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.'
            });

        if normal {
            for &b in trimmed {
                f.write_char(b as char)?;
            }
        } else {
            f.write_char('"')?;
            for &b in trimmed {
                for c in (b as char).escape_default() {
                    f.write_char(c)?;
                }
            }
            f.write_char('"')?;
        }
        Ok(())
    }
}

#[test]
fn test_name_stops_at_first_nul() {
    let mut raw = [0u8; 32];
    raw[..4].copy_from_slice(b"Bip0");
    // Garbage after the terminator is common in old tools' output
    raw[6] = b'x';
    let name = Name32::from_bytes(&raw);
    assert_eq!(name.as_bytes(), b"Bip0");
    assert_eq!(format!("{}", name), "Bip0");
    assert_eq!(format!("{:?}", name), "Bip0");

    let long = Name::<4>::from_str_lossy("abcdef");
    assert_eq!(long.as_bytes(), b"abc");
    assert!(Name64::from_str_lossy("").is_empty());
}
