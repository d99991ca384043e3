use std::io;

use windows_sys::Win32::System::Memory::{
    MapViewOfFile, OpenFileMappingA, UnmapViewOfFile, FILE_MAP_ALL_ACCESS,
    MEMORY_MAPPED_VIEW_ADDRESS,
};

use super::handle::KernelHandle;
use super::object_name;

/// An existing named file mapping with one view mapped into this process.
#[derive(Debug)]
pub struct FileMapping {
    handle: KernelHandle,
    view: *mut u8,
    len: usize,
}

impl FileMapping {
    /// Open the mapping called `name` and map its first `len` bytes.
    pub fn open(name: &str, len: usize) -> io::Result<Self> {
        let c_name = object_name(name)?;
        // SAFETY: `c_name` is a valid NUL-terminated string for the duration of the call.
        let raw = unsafe { OpenFileMappingA(FILE_MAP_ALL_ACCESS, 0, c_name.as_ptr().cast()) };
        let handle = KernelHandle::from_raw(raw)?;

        // SAFETY: `handle` is an open file mapping handle.
        let view = unsafe { MapViewOfFile(handle.as_raw(), FILE_MAP_ALL_ACCESS, 0, 0, len) };
        if view.Value.is_null() {
            // `handle` closes on drop.
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            handle,
            view: view.Value.cast(),
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        if self.view.is_null() {
            return &[];
        }
        // SAFETY: `view` points at `len` mapped bytes that stay mapped until
        // `close`, which also nulls `view`.
        unsafe { std::slice::from_raw_parts(self.view, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        if self.view.is_null() {
            return &mut [];
        }
        // SAFETY: as in `as_slice`; `&mut self` makes this the only borrow.
        unsafe { std::slice::from_raw_parts_mut(self.view, self.len) }
    }

    /// Unmap the view and close the mapping handle. Both steps always run.
    pub fn close(&mut self) -> io::Result<()> {
        let unmapped = if self.view.is_null() {
            Ok(())
        } else {
            let address = MEMORY_MAPPED_VIEW_ADDRESS {
                Value: self.view.cast(),
            };
            self.view = std::ptr::null_mut();
            self.len = 0;
            // SAFETY: `address` was returned by MapViewOfFile and not yet unmapped.
            if unsafe { UnmapViewOfFile(address) } == 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(())
            }
        };
        let closed = self.handle.close();
        unmapped.and(closed)
    }
}

impl Drop for FileMapping {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
