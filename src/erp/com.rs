//! Late-bound COM automation (`IDispatch`) with owned VARIANTs

use super::ErpError;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use std::ffi::OsStr;
use std::mem;
use std::os::windows::ffi::OsStrExt;
use std::ptr::{self, NonNull};
use winapi::Interface;
use winapi::ctypes::c_void;
use winapi::shared::guiddef::{CLSID, GUID};
use winapi::shared::minwindef::{UINT, WORD};
use winapi::shared::ntdef::HRESULT;
use winapi::shared::winerror::DISP_E_EXCEPTION;
use winapi::shared::wtypes::{
    BSTR, VARENUM, VARTYPE, VT_BOOL, VT_BSTR, VT_CY, VT_DATE, VT_DECIMAL, VT_DISPATCH, VT_EMPTY, VT_I1, VT_I2, VT_I4,
    VT_I8, VT_INT, VT_NULL, VT_R4, VT_R8, VT_UI1, VT_UI2, VT_UI4, VT_UINT, VT_UNKNOWN,
};
use winapi::um::combaseapi::{CLSCTX_ALL, CLSIDFromProgID, CoCreateInstance, CoInitializeEx, CoUninitialize};
use winapi::um::oaidl::{DISPID, DISPPARAMS, EXCEPINFO, IDispatch, IEnumVARIANT, VARIANT};
use winapi::um::objbase::COINIT_APARTMENTTHREADED;
use winapi::um::oleauto::{SysAllocStringLen, SysFreeString, SysStringLen, VariantChangeType, VariantClear};
use winapi::um::unknwnbase::IUnknown;

const IID_NULL: GUID = GUID {
    Data1: 0,
    Data2: 0,
    Data3: 0,
    Data4: [0; 8],
};
const LOCALE_USER_DEFAULT: u32 = 0x0400;
const DISPID_PROPERTYPUT: DISPID = -3;
const DISPID_NEWENUM: DISPID = -4;
const DISPATCH_METHOD: WORD = 0x1;
const DISPATCH_PROPERTYGET: WORD = 0x2;
const DISPATCH_PROPERTYPUT: WORD = 0x4;

/// Days between the OLE epoch (1899-12-30) and the Unix epoch
const OLE_UNIX_OFFSET_DAYS: f64 = 25_569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn wide(text: &str) -> Vec<u16> {
    OsStr::new(text).encode_wide().chain(Some(0)).collect()
}

fn check(member: &str, hr: HRESULT) -> Result<(), ErpError> {
    if hr < 0 {
        Err(com_error(member, hr, None))
    } else {
        Ok(())
    }
}

fn com_error(member: &str, hr: HRESULT, excep: Option<&mut EXCEPINFO>) -> ErpError {
    let described = excep.and_then(|info| unsafe {
        SysFreeString(info.bstrSource);
        SysFreeString(info.bstrHelpFile);
        let text = take_bstr(info.bstrDescription);
        (!text.is_empty()).then_some(text)
    });
    let message = described.unwrap_or_else(|| std::io::Error::from_raw_os_error(hr).to_string());
    ErpError::Com {
        member: member.to_string(),
        hresult: hr,
        message,
    }
}

unsafe fn read_bstr(bstr: BSTR) -> String {
    if bstr.is_null() {
        return String::new();
    }
    unsafe {
        let len = SysStringLen(bstr) as usize;
        String::from_utf16_lossy(std::slice::from_raw_parts(bstr, len))
    }
}

unsafe fn take_bstr(bstr: BSTR) -> String {
    unsafe {
        let text = read_bstr(bstr);
        SysFreeString(bstr);
        text
    }
}

fn to_ole_date(value: NaiveDateTime) -> f64 {
    value.and_utc().timestamp_millis() as f64 / MILLIS_PER_DAY + OLE_UNIX_OFFSET_DAYS
}

fn from_ole_date(days: f64) -> Option<NaiveDateTime> {
    let millis = ((days - OLE_UNIX_OFFSET_DAYS) * MILLIS_PER_DAY).round() as i64;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Single-threaded COM apartment for the current thread
pub(super) struct ComApartment(());

impl ComApartment {
    pub(super) fn init() -> Result<Self, ErpError> {
        check("CoInitializeEx", unsafe {
            CoInitializeEx(ptr::null_mut(), COINIT_APARTMENTTHREADED)
        })?;
        Ok(Self(()))
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe { CoUninitialize() }
    }
}

/// Owned `VARIANT`, cleared on drop
#[repr(transparent)]
pub(super) struct Variant(VARIANT);

impl Variant {
    pub(super) fn empty() -> Self {
        Self(unsafe { mem::zeroed() })
    }

    fn tagged(vt: VARENUM, fill: impl FnOnce(&mut VARIANT)) -> Self {
        let mut variant = Self::empty();
        unsafe {
            variant.0.n1.n2_mut().vt = vt as VARTYPE;
        }
        fill(&mut variant.0);
        variant
    }

    pub(super) fn date(value: NaiveDateTime) -> Self {
        Self::tagged(VT_DATE, |v| unsafe {
            *v.n1.n2_mut().n3.date_mut() = to_ole_date(value);
        })
    }

    fn vt(&self) -> VARENUM {
        unsafe { self.0.n1.n2().vt as VARENUM }
    }

    fn coerce(&self, member: &str, vt: VARENUM) -> Result<Variant, ErpError> {
        let mut out = Variant::empty();
        check(member, unsafe {
            VariantChangeType(&mut out.0, &self.0, 0, vt as VARTYPE)
        })?;
        Ok(out)
    }

    pub(super) fn to_i64(&self, member: &str) -> Result<i64, ErpError> {
        let v = self.coerce(member, VT_I8)?;
        Ok(unsafe { *v.0.n1.n2().n3.llVal() })
    }

    pub(super) fn to_f64(&self, member: &str) -> Result<f64, ErpError> {
        let v = self.coerce(member, VT_R8)?;
        Ok(unsafe { *v.0.n1.n2().n3.dblVal() })
    }

    pub(super) fn to_bool(&self, member: &str) -> Result<bool, ErpError> {
        let v = self.coerce(member, VT_BOOL)?;
        Ok(unsafe { *v.0.n1.n2().n3.boolVal() } != 0)
    }

    pub(super) fn to_text(&self, member: &str) -> Result<String, ErpError> {
        if matches!(self.vt(), VT_EMPTY | VT_NULL) {
            return Ok(String::new());
        }
        let v = self.coerce(member, VT_BSTR)?;
        Ok(unsafe { read_bstr(*v.0.n1.n2().n3.bstrVal()) })
    }

    pub(super) fn to_datetime(&self, member: &str) -> Result<NaiveDateTime, ErpError> {
        let v = self.coerce(member, VT_DATE)?;
        let days = unsafe { *v.0.n1.n2().n3.date() };
        from_ole_date(days).ok_or_else(|| ErpError::conversion(member, format!("OLE date {days} out of range")))
    }

    /// Column value as JSON; integral decimals become integers
    pub(super) fn to_json(&self, member: &str) -> Result<Value, ErpError> {
        Ok(match self.vt() {
            VT_EMPTY | VT_NULL => Value::Null,
            VT_BOOL => Value::Bool(self.to_bool(member)?),
            VT_I1 | VT_I2 | VT_I4 | VT_I8 | VT_INT | VT_UI1 | VT_UI2 | VT_UI4 | VT_UINT => {
                Value::from(self.to_i64(member)?)
            }
            VT_R4 | VT_R8 | VT_CY | VT_DECIMAL => {
                let number = self.to_f64(member)?;
                if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
                    Value::from(number as i64)
                } else {
                    Value::from(number)
                }
            }
            VT_DATE => Value::String(self.to_datetime(member)?.format("%Y-%m-%d %H:%M:%S").to_string()),
            _ => Value::String(self.to_text(member)?),
        })
    }

    pub(super) fn into_dispatch(self, member: &str) -> Result<Dispatch, ErpError> {
        match self.vt() {
            VT_DISPATCH => {
                let raw = unsafe { *self.0.n1.n2().n3.pdispVal() };
                let object = Dispatch::from_raw(member, raw)?;
                object.add_ref();
                Ok(object)
            }
            VT_UNKNOWN => {
                let unknown = unsafe { *self.0.n1.n2().n3.punkVal() };
                Dispatch::query(member, unknown)
            }
            vt => Err(ErpError::conversion(member, format!("expected an object, got VARTYPE {vt}"))),
        }
    }
}

impl Drop for Variant {
    fn drop(&mut self) {
        unsafe {
            VariantClear(&mut self.0);
        }
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Self::tagged(VT_I4, |v| unsafe {
            *v.n1.n2_mut().n3.lVal_mut() = value;
        })
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Self::tagged(VT_BOOL, |v| unsafe {
            *v.n1.n2_mut().n3.boolVal_mut() = if value { -1 } else { 0 };
        })
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        let units: Vec<u16> = value.encode_utf16().collect();
        Self::tagged(VT_BSTR, |v| unsafe {
            *v.n1.n2_mut().n3.bstrVal_mut() = SysAllocStringLen(units.as_ptr(), units.len() as UINT);
        })
    }
}

impl From<&Dispatch> for Variant {
    fn from(object: &Dispatch) -> Self {
        object.add_ref();
        Self::tagged(VT_DISPATCH, |v| unsafe {
            *v.n1.n2_mut().n3.pdispVal_mut() = object.0.as_ptr();
        })
    }
}

/// Counted reference to an automation object
pub(super) struct Dispatch(NonNull<IDispatch>);

impl Dispatch {
    /// Instantiate a registered ProgID, e.g. `InsERT.GT`
    pub(super) fn create(prog_id: &str) -> Result<Self, ErpError> {
        let name = wide(prog_id);
        let mut clsid: CLSID = unsafe { mem::zeroed() };
        check(prog_id, unsafe { CLSIDFromProgID(name.as_ptr(), &mut clsid) })?;

        let mut raw: *mut c_void = ptr::null_mut();
        check(prog_id, unsafe {
            CoCreateInstance(&clsid, ptr::null_mut(), CLSCTX_ALL, &IDispatch::uuidof(), &mut raw)
        })?;
        Self::from_raw(prog_id, raw.cast())
    }

    fn from_raw(member: &str, raw: *mut IDispatch) -> Result<Self, ErpError> {
        NonNull::new(raw)
            .map(Self)
            .ok_or_else(|| ErpError::conversion(member, "null object"))
    }

    fn query(member: &str, unknown: *mut IUnknown) -> Result<Self, ErpError> {
        let unknown = NonNull::new(unknown).ok_or_else(|| ErpError::conversion(member, "null object"))?;
        let mut raw: *mut c_void = ptr::null_mut();
        check(member, unsafe {
            unknown.as_ref().QueryInterface(&IDispatch::uuidof(), &mut raw)
        })?;
        Self::from_raw(member, raw.cast())
    }

    fn add_ref(&self) {
        unsafe {
            self.0.as_ref().AddRef();
        }
    }

    fn dispid(&self, name: &str) -> Result<DISPID, ErpError> {
        let mut wide_name = wide(name);
        let mut names = [wide_name.as_mut_ptr()];
        let mut id: DISPID = 0;
        check(name, unsafe {
            self.0
                .as_ref()
                .GetIDsOfNames(&IID_NULL, names.as_mut_ptr(), 1, LOCALE_USER_DEFAULT, &mut id)
        })?;
        Ok(id)
    }

    fn invoke(&self, member: &str, id: DISPID, flags: WORD, mut args: Vec<Variant>) -> Result<Variant, ErpError> {
        // positional arguments travel right to left
        args.reverse();
        let mut put_id = DISPID_PROPERTYPUT;
        let mut params = DISPPARAMS {
            rgvarg: if args.is_empty() {
                ptr::null_mut()
            } else {
                args.as_mut_ptr().cast()
            },
            rgdispidNamedArgs: ptr::null_mut(),
            cArgs: args.len() as UINT,
            cNamedArgs: 0,
        };
        if flags == DISPATCH_PROPERTYPUT {
            params.rgdispidNamedArgs = &mut put_id;
            params.cNamedArgs = 1;
        }

        let mut result = Variant::empty();
        let mut excep: EXCEPINFO = unsafe { mem::zeroed() };
        let mut arg_err: UINT = 0;
        let hr = unsafe {
            self.0.as_ref().Invoke(
                id,
                &IID_NULL,
                LOCALE_USER_DEFAULT,
                flags,
                &mut params,
                &mut result.0,
                &mut excep,
                &mut arg_err,
            )
        };
        if hr < 0 {
            let info = (hr == DISP_E_EXCEPTION).then_some(&mut excep);
            return Err(com_error(member, hr, info));
        }
        Ok(result)
    }

    pub(super) fn get(&self, name: &str) -> Result<Variant, ErpError> {
        self.invoke(name, self.dispid(name)?, DISPATCH_PROPERTYGET, Vec::new())
    }

    pub(super) fn put(&self, name: &str, value: impl Into<Variant>) -> Result<(), ErpError> {
        self.invoke(name, self.dispid(name)?, DISPATCH_PROPERTYPUT, vec![value.into()])
            .map(drop)
    }

    pub(super) fn call(&self, name: &str, args: Vec<Variant>) -> Result<Variant, ErpError> {
        self.invoke(name, self.dispid(name)?, DISPATCH_METHOD | DISPATCH_PROPERTYGET, args)
    }

    /// Property holding another automation object
    pub(super) fn object(&self, name: &str) -> Result<Dispatch, ErpError> {
        self.get(name)?.into_dispatch(name)
    }

    /// Every element of a collection, through `_NewEnum`
    pub(super) fn items(&self, member: &str) -> Result<Vec<Variant>, ErpError> {
        let enumerator = self.invoke(member, DISPID_NEWENUM, DISPATCH_METHOD | DISPATCH_PROPERTYGET, Vec::new())?;
        let unknown = match enumerator.vt() {
            VT_UNKNOWN => unsafe { *enumerator.0.n1.n2().n3.punkVal() },
            VT_DISPATCH => unsafe { (*enumerator.0.n1.n2().n3.pdispVal()).cast::<IUnknown>() },
            vt => return Err(ErpError::conversion(member, format!("_NewEnum returned VARTYPE {vt}"))),
        };
        let unknown = NonNull::new(unknown).ok_or_else(|| ErpError::conversion(member, "null enumerator"))?;

        let mut raw: *mut c_void = ptr::null_mut();
        check(member, unsafe {
            unknown.as_ref().QueryInterface(&IEnumVARIANT::uuidof(), &mut raw)
        })?;
        let enum_variant = NonNull::new(raw.cast::<IEnumVARIANT>())
            .ok_or_else(|| ErpError::conversion(member, "null enumerator"))?;

        let mut items = Vec::new();
        let outcome = loop {
            let mut item = Variant::empty();
            let mut fetched = 0;
            let hr = unsafe { enum_variant.as_ref().Next(1, &mut item.0, &mut fetched) };
            if hr < 0 {
                break Err(com_error(member, hr, None));
            }
            if fetched == 0 {
                break Ok(());
            }
            items.push(item);
        };
        unsafe {
            enum_variant.as_ref().Release();
        }
        outcome.map(|()| items)
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        unsafe {
            self.0.as_ref().Release();
        }
    }
}
