//===========================================================================//

macro_rules! io_error {
    ($kind:ident, $e:expr) => {
        return Err(::std::io::Error::new(::std::io::ErrorKind::$kind, $e))
    };
    ($kind:ident, $fmt:expr, $($arg:tt)+) => {
        return Err(::std::io::Error::new(
            ::std::io::ErrorKind::$kind,
            format!($fmt, $($arg)+),
        ))
    };
}

/// Returns early with an `InvalidData` error: the bytes being decoded are
/// malformed.
macro_rules! invalid_data {
    ($($arg:tt)+) => {
        io_error!(InvalidData, $($arg)+)
    };
}

/// Returns early with an `InvalidInput` error: the caller asked us to encode
/// something the format can't represent.
macro_rules! invalid_input {
    ($($arg:tt)+) => {
        io_error!(InvalidInput, $($arg)+)
    };
}

//===========================================================================//
