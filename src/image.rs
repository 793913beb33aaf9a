//! Loads one or more program images into a [`Vm`]'s memory.

use crate::error::LoadError;
use crate::vm::Vm;

use std::fs::File;
use std::path::Path;

/// Loads every image in `paths` into `vm`, in order.
///
/// Images are independent: each carries its own origin address, so later
/// images can sit anywhere in the address space without disturbing earlier
/// ones (this is how a base ROM and an application image are composed).
pub fn load_images<P: AsRef<Path>>(vm: &mut Vm, paths: &[P]) -> Result<(), LoadError> {
    for path in paths {
        load_image(vm, path.as_ref())?;
    }
    Ok(())
}

fn load_image(vm: &mut Vm, path: &Path) -> Result<(), LoadError> {
    let metadata = path.metadata().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.len() == 0 {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    vm.load_program(file).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
