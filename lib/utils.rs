//! Output helpers for binaries.
//!
//! Both macros use `?` internally and so must be called from a function whose
//! error type can be built from [`std::io::Error`] and
//! [`ndarray_npy::WriteNpzError`] (e.g. `anyhow::Result`).

/// Create a directory and all of its parents if they do not already exist.
#[macro_export]
macro_rules! mkdir {
    ( $dir:expr ) => {
        {
            let dir_ref = &$dir;
            let dir: &std::path::Path = dir_ref.as_ref();
            if !dir.is_dir() {
                std::fs::create_dir_all(dir)?;
            }
        }
    }
}

/// Write a set of named arrays to a `.npz` file.
///
/// ```ignore
/// write_npz!(
///     outdir.join("data.npz"),
///     arrays: {
///         "time" => &time,
///         "rho_11" => &p1,
///     }
/// );
/// ```
#[macro_export]
macro_rules! write_npz {
    (
        $outfile:expr,
        arrays: { $( $name:expr => $arr:expr ),* $(,)? }
    ) => {
        {
            let mut npz = ndarray_npy::NpzWriter::new(
                std::fs::File::create($outfile)?);
            $(
                npz.add_array($name, $arr)?;
            )*
            npz.finish()?;
        }
    }
}
