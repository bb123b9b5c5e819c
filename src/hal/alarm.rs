//! One-shot alarm on the ESP high-resolution timer.
//!
//! `esp_timer_get_time()` is the clock (µs since boot). The callback is
//! dispatched straight from the timer ISR (`ESP_TIMER_ISR`, enabled in
//! `sdkconfig.defaults`), so a firing costs one interrupt and no task switch.
//! Each `arm()` programs the one-shot timer with the remaining delay to the
//! requested deadline.

use core::ffi::c_void;
use core::ptr;

use esp_idf_svc::sys::{self, esp, esp_timer_create_args_t, esp_timer_handle_t, EspError};

use crate::error::AlarmError;
use crate::scheduler::AlarmTimer;

/// Alarm callback signature expected by `esp_timer`.
pub type AlarmCallback = unsafe extern "C" fn(arg: *mut c_void);

/// `AlarmTimer` backed by one `esp_timer` instance.
pub struct EspAlarm {
    handle: esp_timer_handle_t,
    /// A firing is programmed and has not been acknowledged yet
    pending: bool,
}

// SAFETY: the handle is only used by the context that owns the EspAlarm.
unsafe impl Send for EspAlarm {}

impl EspAlarm {
    /// Create a stopped one-shot timer that calls `callback` from the ISR.
    pub fn new(callback: AlarmCallback) -> Result<Self, EspError> {
        let args = esp_timer_create_args_t {
            callback: Some(callback),
            arg: ptr::null_mut(),
            dispatch_method: sys::esp_timer_dispatch_t_ESP_TIMER_ISR,
            name: b"dds_tick\0".as_ptr() as *const _,
            skip_unhandled_events: false,
        };

        let mut handle: esp_timer_handle_t = ptr::null_mut();
        // SAFETY: args outlives the call, handle is a valid out-pointer.
        esp!(unsafe { sys::esp_timer_create(&args, &mut handle) })?;

        Ok(Self {
            handle,
            pending: false,
        })
    }
}

impl AlarmTimer for EspAlarm {
    #[inline]
    fn now(&self) -> u64 {
        // SAFETY: always safe to call
        unsafe { sys::esp_timer_get_time() as u64 }
    }

    #[inline]
    fn arm(&mut self, deadline: u64) -> Result<(), AlarmError> {
        let delay = deadline.saturating_sub(self.now()).max(1);

        if self.pending {
            // Only reached when replacing a deadline armed earlier in the same
            // tick. ESP_ERR_INVALID_STATE here means it already expired, which
            // start_once below supersedes.
            // SAFETY: handle was created in new() and is not deleted before drop.
            unsafe {
                sys::esp_timer_stop(self.handle);
            }
            self.pending = false;
        }

        // SAFETY: as above
        esp!(unsafe { sys::esp_timer_start_once(self.handle, delay) })
            .map_err(|err| AlarmError { code: err.code() })?;
        self.pending = true;
        Ok(())
    }

    #[inline]
    fn acknowledge(&mut self) {
        // A one-shot timer is idle once its callback runs.
        self.pending = false;
    }
}

impl Drop for EspAlarm {
    fn drop(&mut self) {
        // SAFETY: handle is valid until here
        unsafe {
            sys::esp_timer_stop(self.handle);
            sys::esp_timer_delete(self.handle);
        }
    }
}
