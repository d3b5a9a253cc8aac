use crate::{
    buffer::Buffer,
    error::{Error, Result},
    hex::Hex,
};

/// Logs `$err` and returns it from the enclosing function.
macro_rules! fail {
    ($err:expr $(,)?) => {{
        let err = $crate::error::Error::from($err);
        ::tracing::error!("{err}");
        return ::core::result::Result::Err(err);
    }};
}
pub(crate) use fail;

/// Fails with [`Error::MissingArgument`] if the field is absent.
pub(crate) fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    match value {
        Some(v) => Ok(v),
        None => fail!(Error::MissingArgument(field)),
    }
}

/// Like [`required`], but zero also counts as absent.
pub(crate) fn nonzero(value: Option<u32>, field: &'static str) -> Result<u32> {
    match value {
        Some(v) if v != 0 => Ok(v),
        _ => fail!(Error::MissingArgument(field)),
    }
}

/// For use with [`Result::inspect_err`].
pub(crate) fn log_err(err: &Error) {
    tracing::error!("{err}");
}

/// Decodes the input field `field` of at most `max` bytes.
pub(crate) fn decode(field: &'static str, hex: &str, max: usize) -> Result<Buffer> {
    let buf = Buffer::from_hex(field, hex, max).inspect_err(log_err)?;
    tracing::debug!(input = field, len = buf.len(), "decoded input");
    tracing::trace!(input = field, value = %Hex::new(buf.as_bytes()));
    Ok(buf)
}

/// Like [`decode`], but an absent field becomes an unallocated
/// buffer.
pub(crate) fn decode_opt(field: &'static str, hex: Option<&str>, max: usize) -> Result<Buffer> {
    hex.map_or(Ok(Buffer::new()), |hex| decode(field, hex, max))
}

/// Allocates an output buffer.
pub(crate) fn output(max: usize) -> Result<Buffer> {
    Buffer::with_capacity(max).inspect_err(log_err)
}
