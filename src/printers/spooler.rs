use super::PrinterError;
use std::ffi::OsStr;
use std::mem::size_of;
use std::os::windows::ffi::OsStrExt;
use std::ptr;
use winapi::shared::minwindef::{DWORD, LPBYTE};
use winapi::shared::ntdef::HANDLE;
use winapi::um::wingdi::DEVMODEW;
use winapi::um::winspool::{
    ClosePrinter, DocumentPropertiesW, EnumPrintersW, GetDefaultPrinterW, GetPrinterW, OpenPrinterW, SetPrinterW,
    PRINTER_DEFAULTSW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_INFO_2W, PRINTER_INFO_4W,
};

const PRINTER_ALL_ACCESS: DWORD = 0x000F_000C;
const DM_OUT_BUFFER: DWORD = 2;
const DM_IN_BUFFER: DWORD = 8;
const DM_ORIENTATION: DWORD = 0x0000_0001;
const DM_DUPLEX: DWORD = 0x0000_1000;

fn wide(text: &str) -> Vec<u16> {
    OsStr::new(text).encode_wide().chain(Some(0)).collect()
}

unsafe fn from_wide_ptr(p: *const u16) -> String {
    if p.is_null() {
        return String::new();
    }
    let mut len = 0;
    unsafe {
        while *p.add(len) != 0 {
            len += 1;
        }
        String::from_utf16_lossy(std::slice::from_raw_parts(p, len))
    }
}

fn last_os(call: &'static str) -> PrinterError {
    PrinterError::Os {
        call,
        source: std::io::Error::last_os_error(),
    }
}

/// Buffer for variable-size spooler structs, aligned for `T`
fn aligned_buffer<T>(bytes: usize) -> Vec<T> {
    Vec::with_capacity(bytes.div_ceil(size_of::<T>()).max(1))
}

pub(super) fn enum_printers() -> Result<Vec<String>, PrinterError> {
    let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
    let mut needed: DWORD = 0;
    let mut returned: DWORD = 0;
    unsafe {
        EnumPrintersW(flags, ptr::null_mut(), 4, ptr::null_mut(), 0, &mut needed, &mut returned);
    }
    if needed == 0 {
        return Ok(Vec::new());
    }

    let mut buffer: Vec<PRINTER_INFO_4W> = aligned_buffer(needed as usize);
    let ok = unsafe {
        EnumPrintersW(
            flags,
            ptr::null_mut(),
            4,
            buffer.as_mut_ptr() as LPBYTE,
            needed,
            &mut needed,
            &mut returned,
        )
    };
    if ok == 0 {
        return Err(last_os("EnumPrintersW"));
    }

    let infos = unsafe { std::slice::from_raw_parts(buffer.as_ptr(), returned as usize) };
    Ok(infos
        .iter()
        .map(|info| unsafe { from_wide_ptr(info.pPrinterName) })
        .collect())
}

pub(super) fn default_printer() -> Option<String> {
    let mut size: DWORD = 0;
    unsafe {
        GetDefaultPrinterW(ptr::null_mut(), &mut size);
    }
    if size == 0 {
        return None;
    }
    let mut buffer = vec![0u16; size as usize];
    let ok = unsafe { GetDefaultPrinterW(buffer.as_mut_ptr(), &mut size) };
    (ok != 0).then(|| unsafe { from_wide_ptr(buffer.as_ptr()) })
}

struct PrinterHandle(HANDLE);

impl PrinterHandle {
    fn open(name: &mut [u16]) -> Result<Self, PrinterError> {
        let mut defaults = PRINTER_DEFAULTSW {
            pDatatype: ptr::null_mut(),
            pDevMode: ptr::null_mut(),
            DesiredAccess: PRINTER_ALL_ACCESS,
        };
        let mut handle: HANDLE = ptr::null_mut();
        if unsafe { OpenPrinterW(name.as_mut_ptr(), &mut handle, &mut defaults) } == 0 {
            return Err(last_os("OpenPrinterW"));
        }
        Ok(Self(handle))
    }

    /// Level-2 info; the returned buffer owns every pointer inside it
    fn info2(&self) -> Result<Vec<PRINTER_INFO_2W>, PrinterError> {
        let mut needed: DWORD = 0;
        unsafe {
            GetPrinterW(self.0, 2, ptr::null_mut(), 0, &mut needed);
        }
        if needed == 0 {
            return Err(last_os("GetPrinterW"));
        }
        let mut buffer: Vec<PRINTER_INFO_2W> = aligned_buffer(needed as usize);
        if unsafe { GetPrinterW(self.0, 2, buffer.as_mut_ptr() as LPBYTE, needed, &mut needed) } == 0 {
            return Err(last_os("GetPrinterW"));
        }
        Ok(buffer)
    }

    fn set_devmode(&self, devmode: *mut DEVMODEW) -> Result<(), PrinterError> {
        let mut buffer = self.info2()?;
        let info = buffer.as_mut_ptr();
        unsafe {
            (*info).pDevMode = devmode;
            (*info).pSecurityDescriptor = ptr::null_mut();
            if SetPrinterW(self.0, 2, info as LPBYTE, 0) == 0 {
                return Err(last_os("SetPrinterW"));
            }
        }
        Ok(())
    }
}

impl Drop for PrinterHandle {
    fn drop(&mut self) {
        unsafe {
            ClosePrinter(self.0);
        }
    }
}

/// Printer DEVMODE swapped in until drop
pub(super) struct DevModeOverride {
    handle: PrinterHandle,
    original: Vec<u64>,
}

impl DevModeOverride {
    pub(super) fn apply(printer: &str, duplex: i16, orientation: i16) -> Result<Self, PrinterError> {
        let mut name = wide(printer);
        let handle = PrinterHandle::open(&mut name)?;

        let info = handle.info2()?;
        let current = unsafe { (*info.as_ptr()).pDevMode };
        if current.is_null() {
            return Err(PrinterError::Os {
                call: "GetPrinterW",
                source: std::io::Error::other("printer has no DEVMODE"),
            });
        }
        let original = unsafe {
            let bytes = usize::from((*current).dmSize) + usize::from((*current).dmDriverExtra);
            let mut copy: Vec<u64> = vec![0; bytes.div_ceil(size_of::<u64>())];
            ptr::copy_nonoverlapping(current as *const u8, copy.as_mut_ptr() as *mut u8, bytes);
            copy
        };

        let size = unsafe {
            DocumentPropertiesW(
                ptr::null_mut(),
                handle.0,
                name.as_mut_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
                0,
            )
        };
        if size <= 0 {
            return Err(last_os("DocumentPropertiesW"));
        }
        let mut devmode: Vec<u64> = vec![0; (size as usize).div_ceil(size_of::<u64>())];
        let dm = devmode.as_mut_ptr() as *mut DEVMODEW;
        unsafe {
            let mode = DM_IN_BUFFER | DM_OUT_BUFFER;
            if DocumentPropertiesW(ptr::null_mut(), handle.0, name.as_mut_ptr(), dm, current, mode) < 0 {
                return Err(last_os("DocumentPropertiesW"));
            }
            (*dm).dmDuplex = duplex;
            (*dm).u1.s1_mut().dmOrientation = orientation;
            (*dm).dmFields |= DM_DUPLEX | DM_ORIENTATION;
            if DocumentPropertiesW(ptr::null_mut(), handle.0, name.as_mut_ptr(), dm, dm, mode) < 0 {
                return Err(last_os("DocumentPropertiesW"));
            }
        }
        handle.set_devmode(dm)?;
        tracing::info!("Printer {printer}: duplex {duplex}, orientation {orientation}");

        Ok(Self { handle, original })
    }
}

impl Drop for DevModeOverride {
    fn drop(&mut self) {
        let original = self.original.as_mut_ptr() as *mut DEVMODEW;
        match self.handle.set_devmode(original) {
            Ok(()) => tracing::info!("Printer settings restored"),
            Err(e) => tracing::warn!("Printer settings not restored: {e}"),
        }
    }
}
