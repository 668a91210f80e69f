error_chain! {
    foreign_links {
        Fmt(::std::fmt::Error);
        Io(::std::io::Error);
    }

    errors {
        OutOfBounds(pos: usize, len: usize, buf_len: usize) {
            description("read ran past the end of the buffer")
            display("read of {} bytes at {:#x} runs past the end of the buffer (length {:#x})",
                len, pos, buf_len)
        }
        UnsupportedVersion(version: i32) {
            description("unsupported studio model version")
            display("unsupported studio model version {} (expected {})",
                version, crate::studio::STUDIO_VERSION)
        }
    }
}

macro_rules! check {
    ($b:expr) => {
        if !$b {
            use crate::errors::Error;
            use crate::errors::ErrorKind;
            Err(Error::from_kind(ErrorKind::Msg(format!(
                "expected: {}",
                stringify!($b)
            ))))
        } else {
            Ok(())
        }
    };
}
