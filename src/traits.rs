use anyhow::Result;

/// Free-running millisecond counter. Wraps at `u32::MAX`.
#[cfg_attr(test, mockall::automock)]
pub trait TickSource {
    fn millis(&self) -> u32;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn millis(&self) -> u32 {
        (**self).millis()
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ByteSource {
    /// Read one byte. Returns Ok(None) if nothing is available right now.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// True once a finite stream has been read to the end.
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Reopen after the stream was handed to another consumer. Default impl does nothing.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }
}
