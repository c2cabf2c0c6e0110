//! Utilities for reading and writing data structures from and to disk.
//!
//! Graphs and per node data are stored as flat binary files, one file per vector,
//! containing the raw bytes of the elements (native endianess, no header).
//! To use it you should import the `Load` and `Store` traits and use the
//! `load_from` and `write_to` methods.
//!
//! # Example
//!
//! ```no_run
//! # use graph_contractor::io::*;
//!
//! let head = Vec::<u32>::load_from("head_file_name")?;
//! head.write_to(&"output_file")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    ffi::OsStr,
    fs::{create_dir_all, metadata, File},
    io::{prelude::*, Result},
    mem,
    path::Path,
    slice,
};

/// A trait which allows accessing the data of an object as a slice of bytes.
///
/// Do not use this Trait but rather the `Store` trait.
pub trait DataBytes {
    /// Should return the serialized object as a slice of bytes
    fn data_bytes(&self) -> &[u8];
}

/// A trait which mutably exposes the internal data of an object so that
/// a serialized object can be loaded from disk and written back into a precreated
/// object of the right size.
///
/// Do not use this Trait but rather the `Load` trait.
pub trait DataBytesMut {
    /// Should return a mutable slice of the internal data of the object
    fn data_bytes_mut(&mut self) -> &mut [u8];
}

impl<T: Copy> DataBytes for [T] {
    fn data_bytes(&self) -> &[u8] {
        let num_bytes = mem::size_of_val(self);
        unsafe { slice::from_raw_parts(self.as_ptr() as *const u8, num_bytes) }
    }
}

impl<T: Copy> DataBytes for Vec<T> {
    fn data_bytes(&self) -> &[u8] {
        self[..].data_bytes()
    }
}

impl<T: Copy> DataBytesMut for [T] {
    fn data_bytes_mut(&mut self) -> &mut [u8] {
        let num_bytes = mem::size_of_val(self);
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr() as *mut u8, num_bytes) }
    }
}

impl<T: Copy> DataBytesMut for Vec<T> {
    fn data_bytes_mut(&mut self) -> &mut [u8] {
        self[..].data_bytes_mut()
    }
}

/// A trait which extends the `DataBytes` trait and exposes a method to write objects to disk.
pub trait Store: DataBytes {
    /// Writes the serialized object to the file with the given path
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()> {
        File::create(path)?.write_all(self.data_bytes())
    }
}

impl<T: DataBytes + ?Sized> Store for T {}

/// A trait to load serialized data back into objects.
/// Only implemented for plain number types, where every bit pattern is a valid value.
pub trait Load: DataBytesMut + Sized {
    /// This method must create an object of the correct size for serialized data with the given number of bytes.
    /// It should not be necessary to call this method directly.
    fn new_with_bytes(num_bytes: usize) -> Self;

    /// This method will load serialized data from the disk, create an object of the appropriate size,
    /// deserialize the bytes into the object and return the object.
    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let metadata = metadata(path.as_ref())?;
        let mut file = File::open(path)?;

        let mut object = Self::new_with_bytes(metadata.len() as usize);
        assert_eq!(metadata.len() as usize, object.data_bytes_mut().len());
        file.read_exact(object.data_bytes_mut())?;

        Ok(object)
    }
}

macro_rules! impl_load_for_vec {
    ($($t:ty),*) => {
        $(
            impl Load for Vec<$t> {
                fn new_with_bytes(num_bytes: usize) -> Self {
                    assert_eq!(num_bytes % mem::size_of::<$t>(), 0, "file size is not a multiple of the element size");
                    vec![<$t>::default(); num_bytes / mem::size_of::<$t>()]
                }
            }
        )*
    };
}

impl_load_for_vec!(u8, u32, u64, i32, f32, f64);

/// A trait to allow serializing more complex objects
/// which need more than a single file.
pub trait Deconstruct: Sized {
    /// Will be called indirectly and should call the `store_callback` for each file that should be written to disk.
    /// The first param of the callback is a name to identify the file, the second param the data to be stored.
    fn store_each(&self, store_callback: &dyn Fn(&str, &dyn Store) -> Result<()>) -> Result<()>;

    /// Call with a directory arg to store this object in this directory.
    /// The directory will be created if it does not exist yet.
    fn deconstruct_to<D: AsRef<OsStr>>(&self, dir: &D) -> Result<()> {
        let path = Path::new(dir);
        create_dir_all(path)?;

        self.store_each(&|name, object: &dyn Store| object.write_to(&path.join(name)))
    }
}

/// Helper struct for loading multiple objects back from disk.
/// Basically used as a callback for each object to load.
#[derive(Debug, Clone, Copy)]
pub struct Loader<'a> {
    path: &'a Path,
}

impl<'a> Loader<'a> {
    /// Call this method for each file that should be loaded back from disk.
    /// The path param should be the same name that was used with the `store_each` callback.
    pub fn load<T: Load, P: AsRef<Path>>(&self, path: P) -> Result<T> {
        T::load_from(self.path.join(path))
    }

    /// Like `load`, but a missing file is not an error.
    pub fn load_optional<T: Load, P: AsRef<Path>>(&self, path: P) -> Result<Option<T>> {
        let path = self.path.join(path);
        if path.exists() {
            T::load_from(path).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// A trait to allow deserializing more complex objects which need more than a single file.
pub trait Reconstruct: Sized {
    /// Will be called indirectly and should use the loader passed along to load all the necessary objects back.
    /// Should return the full deserialized object.
    fn reconstruct_with(loader: Loader) -> Result<Self>;

    /// Call with a directory arg to reconstruct an object from this directory.
    fn reconstruct_from<D: AsRef<OsStr>>(dir: &D) -> Result<Self> {
        let path = Path::new(dir);
        Self::reconstruct_with(Loader { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("graph_contractor_io_{}_{}", name, std::process::id()));
        create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn stored_vectors_load_back() {
        let dir = scratch_dir("vectors");
        let weights: Vec<u32> = vec![3, 1, 4, 1, 5, 9, 2, 6];
        weights.write_to(&dir.join("weights")).unwrap();
        assert_eq!(Vec::<u32>::load_from(dir.join("weights")).unwrap(), weights);

        let levels: Vec<f32> = vec![0.0, 2.0, 1.0];
        levels.write_to(&dir.join("levels")).unwrap();
        assert_eq!(Vec::<f32>::load_from(dir.join("levels")).unwrap(), levels);
    }

    #[test]
    fn optional_files_may_be_missing() {
        let dir = scratch_dir("optional");
        let loader = Loader { path: &dir };
        assert_eq!(loader.load_optional::<Vec<u32>, _>("does_not_exist").unwrap(), None);
    }
}
