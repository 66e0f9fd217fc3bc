//! pam_loginkit.so entry points

use std::ffi::{c_char, c_int, CStr, CString};
use std::ptr;

use super::{PamContext, PamOutcome, SessionAdapter};
use crate::backend::BusBackend;
use crate::bus;
use crate::error::{LoginError, Result};

#[repr(C)]
pub struct PamHandle {
    _private: [u8; 0],
}

#[link(name = "pam")]
extern "C" {
    fn pam_get_user(pamh: *mut PamHandle, user: *mut *const c_char, prompt: *const c_char)
        -> c_int;
    fn pam_getenv(pamh: *mut PamHandle, name: *const c_char) -> *const c_char;
    fn pam_putenv(pamh: *mut PamHandle, name_value: *const c_char) -> c_int;
}

struct Handle(*mut PamHandle);

impl PamContext for Handle {
    fn user(&self) -> Result<String> {
        let mut user: *const c_char = ptr::null();
        // SAFETY: the handle comes from libpam and outlives this call
        let ret = unsafe { pam_get_user(self.0, &mut user, ptr::null()) };
        if ret != super::PAM_SUCCESS || user.is_null() {
            return Err(LoginError::InvalidArgument("pam_get_user() failed".into()));
        }
        // SAFETY: libpam returned a NUL-terminated string it owns
        let user = unsafe { CStr::from_ptr(user) };
        Ok(user.to_string_lossy().into_owned())
    }

    fn getenv(&self, name: &str) -> Option<String> {
        let name = CString::new(name).ok()?;
        // SAFETY: valid handle and NUL-terminated name
        let value = unsafe { pam_getenv(self.0, name.as_ptr()) };
        if value.is_null() {
            return None;
        }
        // SAFETY: non-null result is a NUL-terminated string owned by libpam
        Some(unsafe { CStr::from_ptr(value) }.to_string_lossy().into_owned())
    }

    fn putenv(&mut self, name: &str, value: &str) -> Result<()> {
        let entry = CString::new(format!("{}={}", name, value))
            .map_err(|_| LoginError::InvalidArgument(format!("{} contains NUL", name)))?;
        // SAFETY: libpam copies the entry
        let ret = unsafe { pam_putenv(self.0, entry.as_ptr()) };
        if ret != super::PAM_SUCCESS {
            return Err(LoginError::InvalidArgument(format!("pam_putenv({}) failed", name)));
        }
        Ok(())
    }
}

fn adapter() -> Result<SessionAdapter<BusBackend>> {
    let conn = bus::shared().get()?;
    Ok(SessionAdapter::new(BusBackend::new(conn)))
}

#[no_mangle]
pub extern "C" fn pam_sm_open_session(
    pamh: *mut PamHandle,
    _flags: c_int,
    _argc: c_int,
    _argv: *const *const c_char,
) -> c_int {
    if pamh.is_null() {
        return PamOutcome::SessionError.code();
    }
    let Ok(adapter) = adapter() else {
        return PamOutcome::SessionError.code();
    };

    let mut handle = Handle(pamh);
    zbus::block_on(adapter.open_session(&mut handle)).code()
}

#[no_mangle]
pub extern "C" fn pam_sm_close_session(
    pamh: *mut PamHandle,
    _flags: c_int,
    _argc: c_int,
    _argv: *const *const c_char,
) -> c_int {
    if pamh.is_null() {
        return PamOutcome::SessionError.code();
    }
    let Ok(adapter) = adapter() else {
        return PamOutcome::SessionError.code();
    };

    let handle = Handle(pamh);
    zbus::block_on(adapter.close_session(&handle)).code()
}
